use chrono::Utc;
use sea_orm::TransactionTrait;

use crate::{
    EngineError, ProofDownCmd, ResultEngine, TransactionType, conversion,
    density::MAX_PROOF,
    transactions::RecordDraft,
    util::{format_proof, join_notes},
};

use super::super::{Engine, OperationOutcome, store::ContainerChange, with_tx};
use super::require_filled;

impl Engine {
    /// Dilute a container with water. Proof gallons are conserved; wine
    /// gallons grow to `proof gallons * 100 / new proof`.
    pub async fn proof_down(&self, cmd: ProofDownCmd) -> ResultEngine<OperationOutcome> {
        let result = self.apply_proof_down(cmd).await;
        self.finish("proof_down", result)
    }

    async fn apply_proof_down(&self, cmd: ProofDownCmd) -> ResultEngine<OperationOutcome> {
        let new_proof = cmd.new_proof;
        if !new_proof.is_finite() || new_proof <= 0.0 || new_proof > MAX_PROOF {
            return Err(EngineError::Validation(format!(
                "target proof must be in (0, {MAX_PROOF}], got {new_proof}"
            )));
        }
        let _locks = self.locks.acquire(&[cmd.container_id]).await;

        with_tx!(self, |db_tx| {
            let now = Utc::now();
            let (container, kind) = self.load_container(&db_tx, cmd.container_id).await?;
            require_filled(&container)?;
            let before = container.gauge(&self.density)?;
            if new_proof >= before.true_proof {
                return Err(EngineError::Precondition(format!(
                    "proof-down only dilutes: container '{}' is at {}, target {}",
                    container.name,
                    format_proof(before.true_proof),
                    format_proof(new_proof)
                )));
            }

            let mut change = ContainerChange::new(kind, container);
            let wine_gallons = before.proof_gallons * 100.0 / new_proof;
            change
                .after
                .set_contents(&self.density, wine_gallons, new_proof, now)?;

            let after = change.after.gauge(&self.density)?;
            if !conversion::approx_eq(after.proof_gallons, before.proof_gallons) {
                return Err(EngineError::Precondition(format!(
                    "proof-down changed proof gallons from {:.6} to {:.6}",
                    before.proof_gallons, after.proof_gallons
                )));
            }

            let generated = format!(
                "{} -> {}",
                format_proof(before.true_proof),
                format_proof(new_proof)
            );
            let draft = RecordDraft::new(TransactionType::ProofDown, new_proof)
                .deltas(after.wine_gallons - before.wine_gallons, 0.0)
                .notes(Some(join_notes(generated, cmd.notes.as_deref())));
            self.commit_changes(&db_tx, vec![change.record(draft)], None, now)
                .await
        })
    }
}
