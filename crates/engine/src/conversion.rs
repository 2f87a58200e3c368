//! Weight ↔ volume conversions.
//!
//! Three symmetric entry points turn one measured quantity into the full
//! [`Gauge`] of a container. They are pure: the density table is passed in,
//! nothing is read from or written to the store.
//!
//! Every entry point corrects the observed proof to true proof first (see
//! [`DensityTable::true_proof`]); densities and proof gallons are always
//! computed at true proof.

use serde::{Deserialize, Serialize};

use crate::{DensityTable, EngineError, ResultEngine};

/// Relative tolerance used when comparing derived quantities.
pub const TOLERANCE: f64 = 1e-6;

/// Relative slack allowed on hard limits (capacity, available volume) to
/// absorb floating-point noise from weight round-trips.
pub const LIMIT_SLACK: f64 = 1e-9;

/// Gallons in one millilitre.
pub const GALLONS_PER_ML: f64 = 1.0 / 3785.411784;

/// Full set of derived quantities for one container measurement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Gauge {
    pub tare_weight: f64,
    pub gross_weight: f64,
    pub net_weight: f64,
    /// Proof corrected to the reference temperature.
    pub true_proof: f64,
    pub wine_gallons: f64,
    pub proof_gallons: f64,
}

impl Gauge {
    fn empty(tare_weight: f64, net_weight: f64, true_proof: f64) -> Self {
        Self {
            tare_weight,
            gross_weight: tare_weight + net_weight,
            net_weight,
            true_proof,
            wine_gallons: 0.0,
            proof_gallons: 0.0,
        }
    }
}

/// `a == b` within [`TOLERANCE`], relative to the larger magnitude (absolute
/// near zero).
pub fn approx_eq(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= TOLERANCE * scale
}

/// `value > limit`, ignoring floating-point noise.
pub fn exceeds(value: f64, limit: f64) -> bool {
    value > limit + limit.abs().max(1.0) * LIMIT_SLACK
}

/// `value` is indistinguishable from zero next to `reference`.
pub fn is_negligible(value: f64, reference: f64) -> bool {
    value.abs() <= reference.abs().max(1.0) * LIMIT_SLACK
}

pub(crate) fn validate_quantity(value: f64, label: &str) -> ResultEngine<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::Validation(format!(
            "{label} must be a finite value >= 0, got {value}"
        )));
    }
    Ok(())
}

/// Gauge a container from its tare and gross weight.
///
/// With a true proof of zero the liquid has no alcohol content: the net
/// weight is still reported, wine and proof gallons are zero.
pub fn from_weight(
    table: &DensityTable,
    tare_weight: f64,
    gross_weight: f64,
    proof: f64,
    temperature_f: f64,
) -> ResultEngine<Gauge> {
    validate_quantity(tare_weight, "tare weight")?;
    validate_quantity(gross_weight, "gross weight")?;
    if gross_weight < tare_weight {
        return Err(EngineError::Validation(format!(
            "gross weight {gross_weight} is below tare weight {tare_weight}"
        )));
    }
    let true_proof = table.true_proof(proof, temperature_f)?;
    let net_weight = gross_weight - tare_weight;
    if true_proof <= 0.0 || net_weight == 0.0 {
        return Ok(Gauge::empty(tare_weight, net_weight, true_proof));
    }

    let wine_gallons = net_weight / table.density_factor(true_proof)?;
    Ok(Gauge {
        tare_weight,
        gross_weight,
        net_weight,
        true_proof,
        wine_gallons,
        proof_gallons: wine_gallons * true_proof / 100.0,
    })
}

/// Gauge a container holding `wine_gallons` of spirit.
pub fn from_wine_gallons(
    table: &DensityTable,
    wine_gallons: f64,
    proof: f64,
    tare_weight: f64,
    temperature_f: f64,
) -> ResultEngine<Gauge> {
    validate_quantity(wine_gallons, "wine gallons")?;
    validate_quantity(tare_weight, "tare weight")?;
    let true_proof = table.true_proof(proof, temperature_f)?;
    if true_proof <= 0.0 || wine_gallons == 0.0 {
        return Ok(Gauge::empty(tare_weight, 0.0, true_proof));
    }

    let net_weight = wine_gallons * table.density_factor(true_proof)?;
    Ok(Gauge {
        tare_weight,
        gross_weight: tare_weight + net_weight,
        net_weight,
        true_proof,
        wine_gallons,
        proof_gallons: wine_gallons * true_proof / 100.0,
    })
}

/// Gauge a container holding `proof_gallons` of spirit.
pub fn from_proof_gallons(
    table: &DensityTable,
    proof_gallons: f64,
    proof: f64,
    tare_weight: f64,
    temperature_f: f64,
) -> ResultEngine<Gauge> {
    validate_quantity(proof_gallons, "proof gallons")?;
    validate_quantity(tare_weight, "tare weight")?;
    let true_proof = table.true_proof(proof, temperature_f)?;
    if true_proof <= 0.0 || proof_gallons == 0.0 {
        return Ok(Gauge::empty(tare_weight, 0.0, true_proof));
    }

    let wine_gallons = proof_gallons * 100.0 / true_proof;
    let net_weight = wine_gallons * table.density_factor(true_proof)?;
    Ok(Gauge {
        tare_weight,
        gross_weight: tare_weight + net_weight,
        net_weight,
        true_proof,
        wine_gallons,
        proof_gallons,
    })
}

/// Gauge liquid already at true proof (temperature correction applied).
pub(crate) fn from_net_weight_at_true_proof(
    table: &DensityTable,
    net_weight: f64,
    true_proof: f64,
) -> ResultEngine<Gauge> {
    let reference = table.reference_temperature_f();
    from_weight(table, 0.0, net_weight, true_proof, reference)
}

/// Net weight of `wine_gallons` at true proof.
pub(crate) fn net_weight_at_true_proof(
    table: &DensityTable,
    wine_gallons: f64,
    true_proof: f64,
) -> ResultEngine<f64> {
    let reference = table.reference_temperature_f();
    Ok(from_wine_gallons(table, wine_gallons, true_proof, 0.0, reference)?.net_weight)
}
