//! Container record store and transaction log.
//!
//! Operations never touch the tables directly: they load state through
//! [`Engine::load_container`] and hand the planned changes to
//! [`Engine::commit_changes`], which checks the container invariants,
//! writes the new state and appends the records inside the caller's DB
//! transaction.

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    Container, ContainerKind, ContainerView, EngineError, ResultEngine, TransactionRecord,
    container_kinds, containers, transactions, transactions::RecordDraft,
};

use super::{Engine, OperationOutcome};

/// The planned effect of an operation on one container.
#[derive(Clone, Debug)]
pub(crate) struct ContainerChange {
    pub kind: ContainerKind,
    pub before: Container,
    pub after: Container,
    pub records: Vec<RecordDraft>,
}

impl ContainerChange {
    pub fn new(kind: ContainerKind, before: Container) -> Self {
        Self {
            kind,
            after: before.clone(),
            before,
            records: Vec::new(),
        }
    }

    pub fn record(mut self, draft: RecordDraft) -> Self {
        self.records.push(draft);
        self
    }
}

impl Engine {
    pub(super) async fn load_kind(
        &self,
        db_tx: &DatabaseTransaction,
        kind_id: Uuid,
    ) -> ResultEngine<ContainerKind> {
        let model = container_kinds::Entity::find_by_id(kind_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("container kind not exists".to_string()))?;
        ContainerKind::try_from(model)
    }

    /// Read the current state of a container and its kind.
    pub(super) async fn load_container(
        &self,
        db_tx: &DatabaseTransaction,
        container_id: Uuid,
    ) -> ResultEngine<(Container, ContainerKind)> {
        let model = containers::Entity::find_by_id(container_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("container not exists".to_string()))?;
        let container = Container::try_from(model)?;
        let kind = self.load_kind(db_tx, container.kind_id).await?;
        Ok((container, kind))
    }

    pub(super) async fn insert_container(
        &self,
        db_tx: &DatabaseTransaction,
        container: &Container,
    ) -> ResultEngine<()> {
        containers::ActiveModel::from(container).insert(db_tx).await?;
        Ok(())
    }

    /// Overwrite a container, provided nobody wrote it since `expected_version`.
    async fn update_container(
        &self,
        db_tx: &DatabaseTransaction,
        container: &Container,
        expected_version: i64,
    ) -> ResultEngine<()> {
        let result = containers::Entity::update_many()
            .set(containers::ActiveModel::from(container))
            .filter(containers::Column::Id.eq(container.id.to_string()))
            .filter(containers::Column::Version.eq(expected_version))
            .exec(db_tx)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::Conflict(format!(
                "container '{}' changed during the operation",
                container.name
            )));
        }
        Ok(())
    }

    async fn append_record(
        &self,
        db_tx: &DatabaseTransaction,
        record: &TransactionRecord,
    ) -> ResultEngine<()> {
        transactions::ActiveModel::try_from(record)?
            .insert(db_tx)
            .await?;
        Ok(())
    }

    /// Validate and persist every change, then append its records.
    ///
    /// Nothing is written until all changes pass their invariant checks, so
    /// a rejected operation leaves the transaction untouched.
    pub(super) async fn commit_changes(
        &self,
        db_tx: &DatabaseTransaction,
        changes: Vec<ContainerChange>,
        reverses_operation_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> ResultEngine<OperationOutcome> {
        let operation_id = Uuid::new_v4();

        let mut views = Vec::with_capacity(changes.len());
        for change in &changes {
            let gauge = change.after.check_invariants(&change.kind, &self.density)?;
            views.push(gauge);
        }

        let mut outcome = OperationOutcome {
            operation_id,
            containers: Vec::with_capacity(changes.len()),
            transactions: Vec::new(),
        };
        let mut sequence = 0;
        for (change, gauge) in changes.into_iter().zip(views) {
            let ContainerChange {
                kind,
                before,
                mut after,
                records,
            } = change;
            after.version = before.version + 1;
            after.updated_at = now;
            self.update_container(db_tx, &after, before.version).await?;

            for draft in records {
                let record = TransactionRecord {
                    id: Uuid::new_v4(),
                    operation_id,
                    sequence,
                    container_id: after.id,
                    container_version: after.version,
                    transaction_type: draft.transaction_type,
                    proof: draft.proof,
                    volume_gallons_delta: draft.volume_gallons_delta,
                    proof_gallons_delta: draft.proof_gallons_delta,
                    notes: draft.notes,
                    reverses_operation_id,
                    prior_state: Some(before.clone()),
                    created_at: now,
                };
                self.append_record(db_tx, &record).await?;
                outcome.transactions.push(record);
                sequence += 1;
            }

            outcome.containers.push(ContainerView {
                container: after,
                capacity_gallons: kind.capacity_gallons,
                gauge,
            });
        }

        Ok(outcome)
    }

    pub(super) async fn records_for_operation(
        &self,
        db_tx: &DatabaseTransaction,
        operation_id: Uuid,
    ) -> ResultEngine<Vec<TransactionRecord>> {
        transactions::Entity::find()
            .filter(transactions::Column::OperationId.eq(operation_id.to_string()))
            .order_by_asc(transactions::Column::Sequence)
            .all(db_tx)
            .await?
            .into_iter()
            .map(TransactionRecord::try_from)
            .collect()
    }
}
