use chrono::Utc;
use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, ReverseCmd, ReverseTarget, TransactionRecord, TransactionType,
    transactions::RecordDraft, util::join_notes,
};

use super::super::{Engine, OperationOutcome, store::ContainerChange, with_tx};

impl Engine {
    /// Compensate a previous operation, given its id or any of its transaction ids.
    ///
    /// Every container the operation touched goes back to the state it had
    /// before, provided nothing was written to it since. One REVERSAL record
    /// is emitted per container, plus one per bottling gain or loss the
    /// operation declared. Reversals cannot be reversed.
    pub async fn reverse_operation(&self, cmd: ReverseCmd) -> ResultEngine<OperationOutcome> {
        let result = self.apply_reversal(cmd).await;
        self.finish("reversal", result)
    }

    async fn apply_reversal(&self, cmd: ReverseCmd) -> ResultEngine<OperationOutcome> {
        let operation_id = match cmd.target {
            ReverseTarget::Transaction(transaction_id) => {
                self.transaction(transaction_id).await?.operation_id
            }
            ReverseTarget::Operation(operation_id) => operation_id,
        };
        let original = self.transactions_for_operation(operation_id).await?;
        if original
            .iter()
            .any(|record| record.transaction_type == TransactionType::Reversal)
        {
            return Err(EngineError::Precondition(
                "a reversal cannot be reversed".to_string(),
            ));
        }

        // Containers in the order the operation touched them.
        let mut container_ids: Vec<Uuid> = Vec::new();
        for record in &original {
            if !container_ids.contains(&record.container_id) {
                container_ids.push(record.container_id);
            }
        }
        let _locks = self.locks.acquire(&container_ids).await;

        with_tx!(self, |db_tx| {
            let now = Utc::now();
            let mut changes = Vec::with_capacity(container_ids.len());
            for container_id in &container_ids {
                let records: Vec<&TransactionRecord> = original
                    .iter()
                    .filter(|record| record.container_id == *container_id)
                    .collect();
                let (current, kind) = self.load_container(&db_tx, *container_id).await?;

                let produced_version = records
                    .iter()
                    .map(|record| record.container_version)
                    .max()
                    .unwrap_or_default();
                if current.version != produced_version {
                    return Err(EngineError::Precondition(format!(
                        "container '{}' changed after operation {operation_id}",
                        current.name
                    )));
                }
                let prior = records
                    .iter()
                    .find_map(|record| record.prior_state.clone())
                    .ok_or_else(|| {
                        EngineError::Precondition(format!(
                            "operation {operation_id} kept no snapshot of container '{}'",
                            current.name
                        ))
                    })?;

                let before = current.gauge(&self.density)?;
                let mut change = ContainerChange::new(kind, current);
                change.after = prior;
                let after = change.after.gauge(&self.density)?;

                let draft = RecordDraft::new(TransactionType::Reversal, after.true_proof)
                    .deltas(
                        after.wine_gallons - before.wine_gallons,
                        after.proof_gallons - before.proof_gallons,
                    )
                    .notes(Some(join_notes(
                        format!("reverses {}", records[0].transaction_type.as_str()),
                        cmd.notes.as_deref(),
                    )));
                let mut change = change.record(draft);
                // Gain/loss records move no spirit, so the gauge difference misses them.
                for record in records.iter().filter(|record| {
                    matches!(
                        record.transaction_type,
                        TransactionType::BottlingGain | TransactionType::BottlingLoss
                    )
                }) {
                    change = change.record(
                        RecordDraft::new(TransactionType::Reversal, record.proof)
                            .deltas(-record.volume_gallons_delta, -record.proof_gallons_delta)
                            .notes(Some(join_notes(
                                format!("reverses {}", record.transaction_type.as_str()),
                                cmd.notes.as_deref(),
                            ))),
                    );
                }
                changes.push(change);
            }

            self.commit_changes(&db_tx, changes, Some(operation_id), now)
                .await
        })
    }
}
