use chrono::Utc;
use sea_orm::TransactionTrait;

use crate::{
    ContainerStatus, EngineError, Quantity, ResultEngine, TankAdjustCmd, TransactionType,
    conversion,
    transactions::RecordDraft,
    util::{format_proof, join_notes},
};

use super::super::{Engine, OperationOutcome, store::ContainerChange, with_tx};
use super::require_filled;

impl Engine {
    /// Correct a container to a newly measured weight and/or proof, e.g.
    /// after evaporation or sampling. A zero weight empties it.
    pub async fn tank_adjust(&self, cmd: TankAdjustCmd) -> ResultEngine<OperationOutcome> {
        let result = self.apply_tank_adjust(cmd).await;
        self.finish("tank_adjust", result)
    }

    async fn apply_tank_adjust(&self, cmd: TankAdjustCmd) -> ResultEngine<OperationOutcome> {
        if cmd.weight.is_none() && cmd.proof.is_none() {
            return Err(EngineError::Validation(
                "tank adjust needs a measured weight or proof".to_string(),
            ));
        }
        if cmd.proof.is_none() && cmd.temperature_f.is_some() {
            return Err(EngineError::Validation(
                "a temperature needs a proof reading".to_string(),
            ));
        }
        match cmd.weight {
            Some(weight @ (Quantity::NetWeight(_) | Quantity::GrossWeight(_))) => {
                weight.validate()?
            }
            Some(_) => {
                return Err(EngineError::Validation(
                    "tank adjust takes a net or gross weight".to_string(),
                ));
            }
            None => {}
        }
        let _locks = self.locks.acquire(&[cmd.container_id]).await;

        with_tx!(self, |db_tx| {
            let now = Utc::now();
            let (container, kind) = self.load_container(&db_tx, cmd.container_id).await?;
            require_filled(&container)?;
            let before = container.gauge(&self.density)?;

            let net_weight = match cmd.weight {
                Some(Quantity::GrossWeight(gross)) => {
                    if gross < container.tare_weight {
                        return Err(EngineError::Validation(format!(
                            "gross weight {gross} is below tare weight {}",
                            container.tare_weight
                        )));
                    }
                    gross - container.tare_weight
                }
                Some(weight) => weight.value(),
                None => container.net_weight,
            };
            let (proof, temperature_f) = match cmd.proof {
                Some(proof) => (
                    proof,
                    cmd.temperature_f
                        .unwrap_or_else(|| self.density.reference_temperature_f()),
                ),
                None => (container.proof, container.temperature_f),
            };
            let true_proof = self.density.true_proof(proof, temperature_f)?;

            let mut change = ContainerChange::new(kind, container);
            if conversion::is_negligible(net_weight, before.net_weight) {
                change.after.drain(&self.density, now);
            } else {
                if true_proof <= 0.0 {
                    return Err(EngineError::Validation(format!(
                        "a filled container needs a proof above 0, got {} at {temperature_f}F",
                        format_proof(proof)
                    )));
                }
                let target = &mut change.after;
                target.status = ContainerStatus::Filled;
                target.net_weight = net_weight;
                target.proof = proof;
                target.temperature_f = temperature_f;
            }
            let after = change.after.gauge(&self.density)?;

            let generated = format!(
                "net {:.2} -> {:.2} lbs, proof {} -> {}",
                before.net_weight,
                after.net_weight,
                format_proof(before.true_proof),
                format_proof(after.true_proof)
            );
            let draft = RecordDraft::new(TransactionType::TankAdjust, after.true_proof)
                .deltas(
                    after.wine_gallons - before.wine_gallons,
                    after.proof_gallons - before.proof_gallons,
                )
                .notes(Some(join_notes(generated, cmd.notes.as_deref())));
            self.commit_changes(&db_tx, vec![change.record(draft)], None, now)
                .await
        })
    }
}
