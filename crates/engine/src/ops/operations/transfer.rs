use chrono::Utc;
use sea_orm::TransactionTrait;

use crate::{
    EngineError, ResultEngine, TransactionType, TransferCmd, conversion,
    density::MAX_PROOF,
    transactions::RecordDraft,
    util::{join_notes, normalize_optional_text},
};

use super::super::{Engine, OperationOutcome, store::ContainerChange, with_tx};
use super::require_filled;

impl Engine {
    /// Move spirit from one container to another.
    ///
    /// The destination receives the drawn proof gallons minus the declared
    /// loss. An EMPTY destination takes the source product, proof and
    /// account; a FILLED one must hold the same product and ends at the
    /// blended proof `total proof gallons * 100 / total wine gallons`.
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<OperationOutcome> {
        let result = self.apply_transfer(cmd).await;
        self.finish("transfer", result)
    }

    async fn apply_transfer(&self, cmd: TransferCmd) -> ResultEngine<OperationOutcome> {
        if cmd.source_id == cmd.destination_id {
            return Err(EngineError::Validation(
                "source and destination must differ".to_string(),
            ));
        }
        if let Some(amount) = cmd.amount {
            amount.validate()?;
        }
        let loss = cmd.loss_proof_gallons;
        conversion::validate_quantity(loss, "transfer loss")?;
        let user_notes = normalize_optional_text(cmd.notes.as_deref());
        if loss > 0.0 && user_notes.is_none() {
            return Err(EngineError::Validation(
                "a transfer loss must be explained in the notes".to_string(),
            ));
        }
        let _locks = self
            .locks
            .acquire(&[cmd.source_id, cmd.destination_id])
            .await;

        with_tx!(self, |db_tx| {
            let now = Utc::now();
            let (source, source_kind) = self.load_container(&db_tx, cmd.source_id).await?;
            let (destination, destination_kind) =
                self.load_container(&db_tx, cmd.destination_id).await?;
            require_filled(&source)?;

            let source_before = source.gauge(&self.density)?;
            let destination_before = destination.gauge(&self.density)?;
            let proof = source_before.true_proof;
            let drawn_wg = self.drawn_wine_gallons(&source, &source_before, cmd.amount)?;
            let drawn_pg = drawn_wg * proof / 100.0;
            if conversion::exceeds(loss, drawn_pg) {
                return Err(EngineError::Validation(format!(
                    "loss of {loss:.3} proof gallons exceeds the {drawn_pg:.3} transferred"
                )));
            }
            let received_pg = (drawn_pg - loss).max(0.0);
            let received_wg = received_pg * 100.0 / proof;

            if destination.is_filled() && destination.product_id != source.product_id {
                return Err(EngineError::Precondition(format!(
                    "cannot blend product {} into container '{}' holding {}",
                    source.product_id.as_deref().unwrap_or("-"),
                    destination.name,
                    destination.product_id.as_deref().unwrap_or("-"),
                )));
            }

            let mut source_change = ContainerChange::new(source_kind, source);
            source_change.after.set_contents(
                &self.density,
                source_before.wine_gallons - drawn_wg,
                proof,
                now,
            )?;

            let mut destination_change = ContainerChange::new(destination_kind, destination);
            let target = &mut destination_change.after;
            if target.is_filled() {
                let total_wg = destination_before.wine_gallons + received_wg;
                let total_pg = destination_before.proof_gallons + received_pg;
                let blended = (total_pg * 100.0 / total_wg).min(MAX_PROOF);
                target.set_contents(&self.density, total_wg, blended, now)?;
                if let Some(account) = cmd.destination_account {
                    target.account = account;
                }
            } else {
                target.product_id = source_change.before.product_id.clone();
                target.account = cmd
                    .destination_account
                    .unwrap_or(source_change.before.account);
                target.fill_date = Some(now);
                target.emptied_date = None;
                target.set_contents(&self.density, received_wg, proof, now)?;
            }

            let source_after = source_change.after.gauge(&self.density)?;
            let destination_after = destination_change.after.gauge(&self.density)?;
            let out_pg = source_before.proof_gallons - source_after.proof_gallons;
            let in_pg = destination_after.proof_gallons - destination_before.proof_gallons;
            if !conversion::approx_eq(out_pg, in_pg + loss) {
                return Err(EngineError::Precondition(format!(
                    "transfer does not balance: {out_pg:.6} out, {in_pg:.6} in, {loss:.6} lost"
                )));
            }

            let mut generated = format!("to '{}'", destination_change.before.name);
            if loss > 0.0 {
                generated.push_str(&format!(", loss {loss:.3} proof gallons"));
            }
            let out_record = RecordDraft::new(TransactionType::TransferOut, proof)
                .deltas(
                    source_after.wine_gallons - source_before.wine_gallons,
                    -out_pg,
                )
                .notes(Some(join_notes(generated, user_notes.as_deref())));
            let in_record = RecordDraft::new(TransactionType::TransferIn, destination_after.true_proof)
                .deltas(
                    destination_after.wine_gallons - destination_before.wine_gallons,
                    in_pg,
                )
                .notes(Some(join_notes(
                    format!("from '{}'", source_change.before.name),
                    user_notes.as_deref(),
                )));

            let changes = vec![
                source_change.record(out_record),
                destination_change.record(in_record),
            ];
            self.commit_changes(&db_tx, changes, None, now).await
        })
    }
}
