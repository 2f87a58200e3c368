//! Density reference for ethanol/water mixtures.
//!
//! A [`DensityTable`] maps proof to the weight of one wine gallon at the
//! reference temperature. Queries between two samples are linearly
//! interpolated. The table also carries the hydrometer temperature
//! coefficient used to correct an observed proof to true proof.
//!
//! Tables are plain values: build the default one with
//! [`DensityTable::default`] or load an alternate one with
//! [`DensityTable::new`] and hand it to the engine builder.

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// Highest legal proof (pure ethanol).
pub const MAX_PROOF: f64 = 200.0;

/// Temperature at which the table values are defined.
pub const REFERENCE_TEMPERATURE_F: f64 = 60.0;

/// Distance between two consecutive samples of a table.
pub const PROOF_STEP: f64 = 10.0;

/// One row of the density table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DensitySample {
    pub proof: f64,
    /// Pounds per wine gallon at the reference temperature.
    pub pounds_per_gallon: f64,
    /// Apparent proof gained per degree Fahrenheit above the reference
    /// temperature.
    #[serde(default)]
    pub proof_per_degree_f: f64,
}

const fn sample(proof: f64, pounds_per_gallon: f64, proof_per_degree_f: f64) -> DensitySample {
    DensitySample {
        proof,
        pounds_per_gallon,
        proof_per_degree_f,
    }
}

const DEFAULT_SAMPLES: [DensitySample; 21] = [
    sample(0.0, 8.3374, 0.00),
    sample(10.0, 8.2828, 0.02),
    sample(20.0, 8.2385, 0.05),
    sample(30.0, 8.1893, 0.09),
    sample(40.0, 8.1468, 0.13),
    sample(50.0, 8.1046, 0.16),
    sample(60.0, 8.0574, 0.19),
    sample(70.0, 8.0040, 0.21),
    sample(80.0, 7.9430, 0.23),
    sample(90.0, 7.8721, 0.24),
    sample(100.0, 7.7938, 0.25),
    sample(110.0, 7.7078, 0.25),
    sample(120.0, 7.6151, 0.25),
    sample(130.0, 7.5158, 0.24),
    sample(140.0, 7.4098, 0.23),
    sample(150.0, 7.2972, 0.22),
    sample(160.0, 7.1770, 0.20),
    sample(170.0, 7.0468, 0.18),
    sample(180.0, 6.9049, 0.15),
    sample(190.0, 6.7464, 0.11),
    sample(200.0, 6.6229, 0.00),
];

/// Immutable proof → density lookup table.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityTable {
    samples: Vec<DensitySample>,
    reference_temperature_f: f64,
}

impl Default for DensityTable {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLES.to_vec(),
            reference_temperature_f: REFERENCE_TEMPERATURE_F,
        }
    }
}

/// Reject proofs outside `[0, 200]` (and NaN).
pub fn validate_proof(proof: f64) -> ResultEngine<()> {
    if !proof.is_finite() || !(0.0..=MAX_PROOF).contains(&proof) {
        return Err(EngineError::Validation(format!(
            "proof must be within [0, {MAX_PROOF}], got {proof}"
        )));
    }
    Ok(())
}

impl DensityTable {
    /// Build a table from explicit samples.
    ///
    /// The samples must cover every multiple of ten from 0 to 200 proof, in
    /// order, with a strictly decreasing weight per gallon (ethanol is lighter
    /// than water).
    pub fn new(samples: Vec<DensitySample>, reference_temperature_f: f64) -> ResultEngine<Self> {
        if !reference_temperature_f.is_finite() {
            return Err(EngineError::Validation(
                "reference temperature must be finite".to_string(),
            ));
        }
        let expected = (MAX_PROOF / PROOF_STEP) as usize + 1;
        if samples.len() != expected {
            return Err(EngineError::Validation(format!(
                "density table needs {expected} samples, got {}",
                samples.len()
            )));
        }
        for (index, sample) in samples.iter().enumerate() {
            let proof = index as f64 * PROOF_STEP;
            if (sample.proof - proof).abs() > f64::EPSILON {
                return Err(EngineError::Validation(format!(
                    "density sample {index} must be at proof {proof}, got {}",
                    sample.proof
                )));
            }
            if !sample.pounds_per_gallon.is_finite() || sample.pounds_per_gallon <= 0.0 {
                return Err(EngineError::Validation(format!(
                    "density at proof {proof} must be > 0"
                )));
            }
            if !sample.proof_per_degree_f.is_finite() || sample.proof_per_degree_f < 0.0 {
                return Err(EngineError::Validation(format!(
                    "temperature coefficient at proof {proof} must be >= 0"
                )));
            }
        }
        if samples
            .windows(2)
            .any(|pair| pair[1].pounds_per_gallon >= pair[0].pounds_per_gallon)
        {
            return Err(EngineError::Validation(
                "density must strictly decrease with proof".to_string(),
            ));
        }
        Ok(Self {
            samples,
            reference_temperature_f,
        })
    }

    pub fn samples(&self) -> &[DensitySample] {
        &self.samples
    }

    pub fn reference_temperature_f(&self) -> f64 {
        self.reference_temperature_f
    }

    /// Find the two samples bounding `proof` and the position between them.
    fn bracket(&self, proof: f64) -> (DensitySample, DensitySample, f64) {
        let upper = self
            .samples
            .partition_point(|s| s.proof <= proof)
            .clamp(1, self.samples.len() - 1);
        let low = self.samples[upper - 1];
        let high = self.samples[upper];
        let t = (proof - low.proof) / (high.proof - low.proof);
        (low, high, t)
    }

    /// Pounds per wine gallon at `proof`, interpolated between samples.
    pub fn density_factor(&self, proof: f64) -> ResultEngine<f64> {
        validate_proof(proof)?;
        let (low, high, t) = self.bracket(proof);
        Ok(low.pounds_per_gallon + t * (high.pounds_per_gallon - low.pounds_per_gallon))
    }

    fn proof_per_degree(&self, proof: f64) -> f64 {
        let (low, high, t) = self.bracket(proof);
        low.proof_per_degree_f + t * (high.proof_per_degree_f - low.proof_per_degree_f)
    }

    /// Correct a proof read at `temperature_f` to true proof at the
    /// reference temperature.
    ///
    /// Warm spirit reads high, cold spirit reads low. The corrected value is
    /// clamped to the legal proof range.
    pub fn true_proof(&self, observed_proof: f64, temperature_f: f64) -> ResultEngine<f64> {
        validate_proof(observed_proof)?;
        if !temperature_f.is_finite() {
            return Err(EngineError::Validation(
                "temperature must be finite".to_string(),
            ));
        }
        let delta = temperature_f - self.reference_temperature_f;
        if delta == 0.0 || observed_proof == 0.0 {
            return Ok(observed_proof);
        }
        let corrected = observed_proof - self.proof_per_degree(observed_proof) * delta;
        Ok(corrected.clamp(0.0, MAX_PROOF))
    }
}
