use chrono::Utc;
use sea_orm::TransactionTrait;

use crate::{
    ChangeAccountCmd, EngineError, ResultEngine, TransactionType, transactions::RecordDraft,
    util::join_notes,
};

use super::super::{Engine, OperationOutcome, store::ContainerChange, with_tx};
use super::require_filled;

impl Engine {
    /// Move a filled container to another account. No quantity changes.
    pub async fn change_account(&self, cmd: ChangeAccountCmd) -> ResultEngine<OperationOutcome> {
        let result = self.apply_change_account(cmd).await;
        self.finish("change_account", result)
    }

    async fn apply_change_account(&self, cmd: ChangeAccountCmd) -> ResultEngine<OperationOutcome> {
        let _locks = self.locks.acquire(&[cmd.container_id]).await;

        with_tx!(self, |db_tx| {
            let now = Utc::now();
            let (container, kind) = self.load_container(&db_tx, cmd.container_id).await?;
            require_filled(&container)?;
            if container.account == cmd.account {
                return Err(EngineError::Precondition(format!(
                    "container '{}' is already in {}",
                    container.name,
                    cmd.account.as_str()
                )));
            }
            let proof = container.gauge(&self.density)?.true_proof;

            let generated = format!("{} -> {}", container.account.as_str(), cmd.account.as_str());
            let mut change = ContainerChange::new(kind, container);
            change.after.account = cmd.account;
            let draft = RecordDraft::new(TransactionType::ChangeAccount, proof)
                .notes(Some(join_notes(generated, cmd.notes.as_deref())));
            self.commit_changes(&db_tx, vec![change.record(draft)], None, now)
                .await
        })
    }
}
