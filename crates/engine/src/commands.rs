//! Command structs for engine operations.
//!
//! Each operation takes one strongly typed command. The five content
//! operations are also grouped in the closed [`Operation`] union so a caller
//! can route any of them through [`Engine::execute`](crate::Engine::execute).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Account, DensityTable, EngineError, ResultEngine, conversion};

/// A measured amount of spirit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Quantity {
    NetWeight(f64),
    /// Tare plus liquid. Only meaningful when describing a whole container.
    GrossWeight(f64),
    WineGallons(f64),
    ProofGallons(f64),
}

impl Quantity {
    pub fn value(self) -> f64 {
        match self {
            Self::NetWeight(v) | Self::GrossWeight(v) | Self::WineGallons(v) | Self::ProofGallons(v) => {
                v
            }
        }
    }

    pub(crate) fn validate(self) -> ResultEngine<()> {
        let label = match self {
            Self::NetWeight(_) => "net weight",
            Self::GrossWeight(_) => "gross weight",
            Self::WineGallons(_) => "wine gallons",
            Self::ProofGallons(_) => "proof gallons",
        };
        conversion::validate_quantity(self.value(), label)
    }

    /// Wine gallons drawn out of a container whose contents are at
    /// `true_proof`.
    pub(crate) fn drawn_wine_gallons(
        self,
        table: &DensityTable,
        true_proof: f64,
    ) -> ResultEngine<f64> {
        let reference = table.reference_temperature_f();
        let gauge = match self {
            Self::NetWeight(weight) => {
                conversion::from_weight(table, 0.0, weight, true_proof, reference)?
            }
            Self::WineGallons(gallons) => {
                conversion::from_wine_gallons(table, gallons, true_proof, 0.0, reference)?
            }
            Self::ProofGallons(gallons) => {
                conversion::from_proof_gallons(table, gallons, true_proof, 0.0, reference)?
            }
            Self::GrossWeight(_) => {
                return Err(EngineError::Validation(
                    "gross weight cannot describe a partial withdrawal".to_string(),
                ));
            }
        };
        Ok(gauge.wine_gallons)
    }
}

/// Fill data for a container: what goes in and how it was measured.
#[derive(Clone, Debug)]
pub struct FillSpec {
    pub product_id: String,
    /// Proof as read at `temperature_f`.
    pub proof: f64,
    /// Defaults to the reference temperature.
    pub temperature_f: Option<f64>,
    pub quantity: Quantity,
    /// Defaults to the commit time.
    pub fill_date: Option<DateTime<Utc>>,
}

impl FillSpec {
    #[must_use]
    pub fn new(product_id: impl Into<String>, proof: f64, quantity: Quantity) -> Self {
        Self {
            product_id: product_id.into(),
            proof,
            temperature_f: None,
            quantity,
            fill_date: None,
        }
    }

    #[must_use]
    pub fn temperature_f(mut self, temperature_f: f64) -> Self {
        self.temperature_f = Some(temperature_f);
        self
    }

    #[must_use]
    pub fn fill_date(mut self, fill_date: DateTime<Utc>) -> Self {
        self.fill_date = Some(fill_date);
        self
    }
}

/// Register a new container, optionally filled.
#[derive(Clone, Debug)]
pub struct NewContainerCmd {
    pub kind_id: Uuid,
    pub name: String,
    pub container_type: String,
    /// Overrides the kind's tare weight.
    pub tare_weight: Option<f64>,
    pub account: Account,
    pub fill: Option<FillSpec>,
    pub notes: Option<String>,
}

impl NewContainerCmd {
    #[must_use]
    pub fn new(kind_id: Uuid, name: impl Into<String>, container_type: impl Into<String>) -> Self {
        Self {
            kind_id,
            name: name.into(),
            container_type: container_type.into(),
            tare_weight: None,
            account: Account::default(),
            fill: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn tare_weight(mut self, tare_weight: f64) -> Self {
        self.tare_weight = Some(tare_weight);
        self
    }

    #[must_use]
    pub fn account(mut self, account: Account) -> Self {
        self.account = account;
        self
    }

    #[must_use]
    pub fn fill(mut self, fill: FillSpec) -> Self {
        self.fill = Some(fill);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Fill an existing empty container.
#[derive(Clone, Debug)]
pub struct FillCmd {
    pub container_id: Uuid,
    pub fill: FillSpec,
    /// Keeps the container's account when `None`.
    pub account: Option<Account>,
    pub notes: Option<String>,
}

impl FillCmd {
    #[must_use]
    pub fn new(container_id: Uuid, fill: FillSpec) -> Self {
        Self {
            container_id,
            fill,
            account: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn account(mut self, account: Account) -> Self {
        self.account = Some(account);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Change descriptive fields of a container.
#[derive(Clone, Debug, Default)]
pub struct EditContainerCmd {
    pub container_id: Uuid,
    pub name: Option<String>,
    /// `Some("")` clears the notes.
    pub notes: Option<String>,
    pub tare_weight: Option<f64>,
}

impl EditContainerCmd {
    #[must_use]
    pub fn new(container_id: Uuid) -> Self {
        Self {
            container_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[must_use]
    pub fn tare_weight(mut self, tare_weight: f64) -> Self {
        self.tare_weight = Some(tare_weight);
        self
    }
}

/// Move spirit from one container to another.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub source_id: Uuid,
    pub destination_id: Uuid,
    /// `None` moves the whole contents of the source.
    pub amount: Option<Quantity>,
    /// Proof gallons measured as lost in transit.
    pub loss_proof_gallons: f64,
    /// Account of the destination after the transfer.
    pub destination_account: Option<Account>,
    pub notes: Option<String>,
}

impl TransferCmd {
    #[must_use]
    pub fn new(source_id: Uuid, destination_id: Uuid) -> Self {
        Self {
            source_id,
            destination_id,
            amount: None,
            loss_proof_gallons: 0.0,
            destination_account: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn amount(mut self, amount: Quantity) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn loss_proof_gallons(mut self, loss: f64) -> Self {
        self.loss_proof_gallons = loss;
        self
    }

    #[must_use]
    pub fn destination_account(mut self, account: Account) -> Self {
        self.destination_account = Some(account);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Dilute a container with water down to `new_proof`.
#[derive(Clone, Debug)]
pub struct ProofDownCmd {
    pub container_id: Uuid,
    /// Target true proof.
    pub new_proof: f64,
    pub notes: Option<String>,
}

impl ProofDownCmd {
    #[must_use]
    pub fn new(container_id: Uuid, new_proof: f64) -> Self {
        Self {
            container_id,
            new_proof,
            notes: None,
        }
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// What came off the bottling line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BottledOutput {
    pub bottle_count: u32,
    pub bottle_size_ml: f64,
    /// Labeled proof of the bottled product.
    pub proof: f64,
}

impl BottledOutput {
    pub fn proof_gallons(&self) -> f64 {
        f64::from(self.bottle_count) * self.bottle_size_ml * conversion::GALLONS_PER_ML * self.proof
            / 100.0
    }
}

/// Draw spirit out of a container into bottles.
#[derive(Clone, Debug)]
pub struct BottleCmd {
    pub container_id: Uuid,
    /// `None` bottles the whole contents.
    pub amount: Option<Quantity>,
    pub declared: Option<BottledOutput>,
    pub notes: Option<String>,
}

impl BottleCmd {
    #[must_use]
    pub fn new(container_id: Uuid) -> Self {
        Self {
            container_id,
            amount: None,
            declared: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn amount(mut self, amount: Quantity) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn declared(mut self, declared: BottledOutput) -> Self {
        self.declared = Some(declared);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Correct a container to a newly measured state.
#[derive(Clone, Debug)]
pub struct TankAdjustCmd {
    pub container_id: Uuid,
    /// Measured net or gross weight.
    pub weight: Option<Quantity>,
    /// Measured proof, read at `temperature_f`.
    pub proof: Option<f64>,
    pub temperature_f: Option<f64>,
    pub notes: Option<String>,
}

impl TankAdjustCmd {
    #[must_use]
    pub fn new(container_id: Uuid) -> Self {
        Self {
            container_id,
            weight: None,
            proof: None,
            temperature_f: None,
            notes: None,
        }
    }

    #[must_use]
    pub fn weight(mut self, weight: Quantity) -> Self {
        self.weight = Some(weight);
        self
    }

    #[must_use]
    pub fn proof(mut self, proof: f64) -> Self {
        self.proof = Some(proof);
        self
    }

    #[must_use]
    pub fn temperature_f(mut self, temperature_f: f64) -> Self {
        self.temperature_f = Some(temperature_f);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Move a filled container to another account.
#[derive(Clone, Debug)]
pub struct ChangeAccountCmd {
    pub container_id: Uuid,
    pub account: Account,
    pub notes: Option<String>,
}

impl ChangeAccountCmd {
    #[must_use]
    pub fn new(container_id: Uuid, account: Account) -> Self {
        Self {
            container_id,
            account,
            notes: None,
        }
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Which operation a reversal compensates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReverseTarget {
    /// The operation that wrote this transaction record.
    Transaction(Uuid),
    Operation(Uuid),
}

/// Compensate a previous operation.
#[derive(Clone, Debug)]
pub struct ReverseCmd {
    pub target: ReverseTarget,
    pub notes: Option<String>,
}

impl ReverseCmd {
    /// Reverse the operation that wrote `transaction_id`.
    #[must_use]
    pub fn new(transaction_id: Uuid) -> Self {
        Self {
            target: ReverseTarget::Transaction(transaction_id),
            notes: None,
        }
    }

    #[must_use]
    pub fn operation(operation_id: Uuid) -> Self {
        Self {
            target: ReverseTarget::Operation(operation_id),
            notes: None,
        }
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// The five content operations.
#[derive(Clone, Debug)]
pub enum Operation {
    Transfer(TransferCmd),
    ProofDown(ProofDownCmd),
    Bottle(BottleCmd),
    TankAdjust(TankAdjustCmd),
    ChangeAccount(ChangeAccountCmd),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transfer(_) => "transfer",
            Self::ProofDown(_) => "proof_down",
            Self::Bottle(_) => "bottle",
            Self::TankAdjust(_) => "tank_adjust",
            Self::ChangeAccount(_) => "change_account",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_output_in_proof_gallons() {
        let output = BottledOutput {
            bottle_count: 1000,
            bottle_size_ml: 750.0,
            proof: 90.0,
        };
        let expected = 750_000.0 / 3785.411784 * 0.9;
        assert!((output.proof_gallons() - expected).abs() < 1e-9);
    }

    #[test]
    fn gross_weight_cannot_be_drawn() {
        let table = DensityTable::default();
        assert!(matches!(
            Quantity::GrossWeight(300.0).drawn_wine_gallons(&table, 110.0),
            Err(EngineError::Validation(_))
        ));
        let gallons = Quantity::ProofGallons(11.0)
            .drawn_wine_gallons(&table, 110.0)
            .unwrap();
        assert!((gallons - 10.0).abs() < 1e-9);
    }
}
