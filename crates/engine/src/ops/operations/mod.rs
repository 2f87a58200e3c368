//! The content operations: transfer, proof-down, bottle, tank-adjust,
//! change-account and reversal.
//!
//! Each one follows the same shape: validate the command, lock the touched
//! containers, then inside one DB transaction load them, compute the new
//! states and hand them to `commit_changes`.

use crate::{Container, EngineError, Gauge, Operation, Quantity, ResultEngine, conversion};

use super::{Engine, OperationOutcome};

mod bottle;
mod change_account;
mod proof_down;
mod reverse;
mod tank_adjust;
mod transfer;

impl Engine {
    /// Run any of the five content operations.
    pub async fn execute(&self, operation: Operation) -> ResultEngine<OperationOutcome> {
        match operation {
            Operation::Transfer(cmd) => self.transfer(cmd).await,
            Operation::ProofDown(cmd) => self.proof_down(cmd).await,
            Operation::Bottle(cmd) => self.bottle(cmd).await,
            Operation::TankAdjust(cmd) => self.tank_adjust(cmd).await,
            Operation::ChangeAccount(cmd) => self.change_account(cmd).await,
        }
    }

    /// Wine gallons to draw out of `container`; `None` draws everything.
    fn drawn_wine_gallons(
        &self,
        container: &Container,
        gauge: &Gauge,
        amount: Option<Quantity>,
    ) -> ResultEngine<f64> {
        let drawn = match amount {
            None => gauge.wine_gallons,
            Some(amount) => amount.drawn_wine_gallons(&self.density, gauge.true_proof)?,
        };
        if drawn <= 0.0 {
            return Err(EngineError::Validation(
                "amount to draw must be > 0".to_string(),
            ));
        }
        if conversion::exceeds(drawn, gauge.wine_gallons) {
            return Err(EngineError::Precondition(format!(
                "container '{}' holds {:.3} wine gallons, cannot draw {drawn:.3}",
                container.name, gauge.wine_gallons
            )));
        }
        Ok(drawn.min(gauge.wine_gallons))
    }
}

fn require_filled(container: &Container) -> ResultEngine<()> {
    if !container.is_filled() {
        return Err(EngineError::Precondition(format!(
            "container '{}' is EMPTY",
            container.name
        )));
    }
    Ok(())
}
