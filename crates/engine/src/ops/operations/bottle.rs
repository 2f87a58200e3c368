use chrono::Utc;
use sea_orm::TransactionTrait;

use crate::{
    BottleCmd, BottledOutput, EngineError, ResultEngine, TransactionType, conversion,
    density::validate_proof,
    transactions::RecordDraft,
    util::{format_proof, join_notes, normalize_optional_text},
};

use super::super::{Engine, OperationOutcome, store::ContainerChange, with_tx};
use super::require_filled;

fn validate_declared(declared: &BottledOutput) -> ResultEngine<()> {
    if declared.bottle_count == 0 {
        return Err(EngineError::Validation(
            "declared bottle count must be > 0".to_string(),
        ));
    }
    if !declared.bottle_size_ml.is_finite() || declared.bottle_size_ml <= 0.0 {
        return Err(EngineError::Validation(format!(
            "bottle size must be > 0 ml, got {}",
            declared.bottle_size_ml
        )));
    }
    validate_proof(declared.proof)
}

impl Engine {
    /// Draw spirit into bottles.
    ///
    /// Emits BOTTLE_EMPTY when the container is drained, BOTTLE_PARTIAL
    /// otherwise. With a declared output that differs from what left the
    /// container, a BOTTLING_GAIN or BOTTLING_LOSS record follows carrying the
    /// signed difference in proof gallons.
    pub async fn bottle(&self, cmd: BottleCmd) -> ResultEngine<OperationOutcome> {
        let result = self.apply_bottle(cmd).await;
        self.finish("bottle", result)
    }

    async fn apply_bottle(&self, cmd: BottleCmd) -> ResultEngine<OperationOutcome> {
        if let Some(amount) = cmd.amount {
            amount.validate()?;
        }
        if let Some(declared) = &cmd.declared {
            validate_declared(declared)?;
        }
        let user_notes = normalize_optional_text(cmd.notes.as_deref());
        let _locks = self.locks.acquire(&[cmd.container_id]).await;

        with_tx!(self, |db_tx| {
            let now = Utc::now();
            let (container, kind) = self.load_container(&db_tx, cmd.container_id).await?;
            require_filled(&container)?;
            let before = container.gauge(&self.density)?;
            let drawn = self.drawn_wine_gallons(&container, &before, cmd.amount)?;

            let mut change = ContainerChange::new(kind, container);
            change.after.set_contents(
                &self.density,
                before.wine_gallons - drawn,
                before.true_proof,
                now,
            )?;
            let after = change.after.gauge(&self.density)?;
            let removed_pg = before.proof_gallons - after.proof_gallons;

            let transaction_type = if change.after.is_filled() {
                TransactionType::BottlePartial
            } else {
                TransactionType::BottleEmpty
            };
            let mut change = change.record(
                RecordDraft::new(transaction_type, before.true_proof)
                    .deltas(after.wine_gallons - before.wine_gallons, -removed_pg)
                    .notes(user_notes.clone()),
            );

            if let Some(declared) = cmd.declared {
                let declared_pg = declared.proof_gallons();
                if !conversion::approx_eq(declared_pg, removed_pg) {
                    let difference = declared_pg - removed_pg;
                    let transaction_type = if difference > 0.0 {
                        TransactionType::BottlingGain
                    } else {
                        TransactionType::BottlingLoss
                    };
                    let generated = format!(
                        "{} x {} ml at {}: declared {declared_pg:.3} proof gallons, removed {removed_pg:.3}",
                        declared.bottle_count,
                        declared.bottle_size_ml,
                        format_proof(declared.proof)
                    );
                    change = change.record(
                        RecordDraft::new(transaction_type, declared.proof)
                            .deltas(0.0, difference)
                            .notes(Some(join_notes(generated, user_notes.as_deref()))),
                    );
                }
            }

            self.commit_changes(&db_tx, vec![change], None, now).await
        })
    }
}
