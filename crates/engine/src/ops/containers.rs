use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Container, ContainerKind, ContainerStatus, ContainerView, EditContainerCmd, EngineError,
    FillCmd, FillSpec, NewContainerCmd, Quantity, ResultEngine, TransactionType, container_kinds,
    containers, conversion,
    transactions::RecordDraft,
    util::{format_proof, normalize_optional_text, normalize_required_name},
};

use super::{Engine, OperationOutcome, store::ContainerChange, with_tx};

impl Engine {
    /// Register a container, optionally filling it in the same operation.
    ///
    /// Always emits one CREATE record; without fill data the container stays
    /// EMPTY and the record carries zero deltas.
    pub async fn new_container(&self, cmd: NewContainerCmd) -> ResultEngine<OperationOutcome> {
        let result = self.create_container(cmd).await;
        self.finish("create", result)
    }

    async fn create_container(&self, cmd: NewContainerCmd) -> ResultEngine<OperationOutcome> {
        let name = normalize_required_name(&cmd.name, "container")?;
        let container_type = normalize_required_name(&cmd.container_type, "container type")?;
        let notes = normalize_optional_text(cmd.notes.as_deref());

        with_tx!(self, |db_tx| {
            let now = Utc::now();
            let kind = self.load_kind(&db_tx, cmd.kind_id).await?;
            let mut container = Container::new(
                &kind,
                name,
                container_type,
                cmd.tare_weight,
                cmd.account,
                self.density.reference_temperature_f(),
                now,
            )?;
            container.notes = notes.clone();
            self.insert_container(&db_tx, &container).await?;

            let mut change = ContainerChange::new(kind, container);
            let draft = match &cmd.fill {
                Some(fill) => self.apply_fill(&mut change.after, fill, now)?,
                None => RecordDraft::new(TransactionType::Create, 0.0),
            };
            let change = change.record(draft.notes(notes));
            self.commit_changes(&db_tx, vec![change], None, now).await
        })
    }

    /// Fill an EMPTY container. Emits CREATE.
    pub async fn fill_container(&self, cmd: FillCmd) -> ResultEngine<OperationOutcome> {
        let result = self.fill_existing(cmd).await;
        self.finish("fill", result)
    }

    async fn fill_existing(&self, cmd: FillCmd) -> ResultEngine<OperationOutcome> {
        cmd.fill.quantity.validate()?;
        if cmd.fill.quantity.value() == 0.0 {
            return Err(EngineError::Validation(
                "fill quantity must be > 0".to_string(),
            ));
        }
        let _locks = self.locks.acquire(&[cmd.container_id]).await;

        with_tx!(self, |db_tx| {
            let now = Utc::now();
            let (container, kind) = self.load_container(&db_tx, cmd.container_id).await?;
            if container.is_filled() {
                return Err(EngineError::Precondition(format!(
                    "container '{}' is not EMPTY",
                    container.name
                )));
            }

            let mut change = ContainerChange::new(kind, container);
            if let Some(account) = cmd.account {
                change.after.account = account;
            }
            let draft = self.apply_fill(&mut change.after, &cmd.fill, now)?;
            let change = change.record(draft.notes(normalize_optional_text(cmd.notes.as_deref())));
            self.commit_changes(&db_tx, vec![change], None, now).await
        })
    }

    /// Put the measured fill into `container` and return the CREATE record.
    ///
    /// The observed proof and temperature are stored as given; the record
    /// carries the true proof.
    fn apply_fill(
        &self,
        container: &mut Container,
        fill: &FillSpec,
        now: DateTime<Utc>,
    ) -> ResultEngine<RecordDraft> {
        fill.quantity.validate()?;
        let temperature_f = fill
            .temperature_f
            .unwrap_or_else(|| self.density.reference_temperature_f());
        let true_proof = self.density.true_proof(fill.proof, temperature_f)?;
        if fill.quantity.value() == 0.0 {
            return Ok(RecordDraft::new(TransactionType::Create, true_proof));
        }
        if true_proof <= 0.0 {
            return Err(EngineError::Validation(format!(
                "a fill needs a proof above 0, got {} at {temperature_f}F",
                format_proof(fill.proof)
            )));
        }
        let product_id = normalize_optional_text(Some(&fill.product_id)).ok_or_else(|| {
            EngineError::Validation("a fill needs a product id".to_string())
        })?;

        let tare = container.tare_weight;
        let gauge = match fill.quantity {
            Quantity::NetWeight(net) => {
                conversion::from_weight(&self.density, tare, tare + net, fill.proof, temperature_f)?
            }
            Quantity::GrossWeight(gross) => {
                conversion::from_weight(&self.density, tare, gross, fill.proof, temperature_f)?
            }
            Quantity::WineGallons(gallons) => conversion::from_wine_gallons(
                &self.density,
                gallons,
                fill.proof,
                tare,
                temperature_f,
            )?,
            Quantity::ProofGallons(gallons) => conversion::from_proof_gallons(
                &self.density,
                gallons,
                fill.proof,
                tare,
                temperature_f,
            )?,
        };
        if gauge.net_weight == 0.0 {
            return Err(EngineError::Validation(
                "gross weight equals tare weight, nothing to fill".to_string(),
            ));
        }

        container.status = ContainerStatus::Filled;
        container.net_weight = gauge.net_weight;
        container.proof = fill.proof;
        container.temperature_f = temperature_f;
        container.product_id = Some(product_id);
        container.fill_date = Some(fill.fill_date.unwrap_or(now));
        container.emptied_date = None;

        Ok(RecordDraft::new(TransactionType::Create, gauge.true_proof)
            .deltas(gauge.wine_gallons, gauge.proof_gallons))
    }

    /// Change descriptive fields. Emits EDIT with zero deltas.
    pub async fn edit_container(&self, cmd: EditContainerCmd) -> ResultEngine<OperationOutcome> {
        let result = self.apply_edit(cmd).await;
        self.finish("edit", result)
    }

    async fn apply_edit(&self, cmd: EditContainerCmd) -> ResultEngine<OperationOutcome> {
        if cmd.name.is_none() && cmd.notes.is_none() && cmd.tare_weight.is_none() {
            return Err(EngineError::Validation("nothing to edit".to_string()));
        }
        let name = cmd
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "container"))
            .transpose()?;
        if let Some(tare_weight) = cmd.tare_weight {
            conversion::validate_quantity(tare_weight, "tare weight")?;
        }
        let _locks = self.locks.acquire(&[cmd.container_id]).await;

        with_tx!(self, |db_tx| {
            let now = Utc::now();
            let (container, kind) = self.load_container(&db_tx, cmd.container_id).await?;
            let proof = container.gauge(&self.density)?.true_proof;
            let mut change = ContainerChange::new(kind, container);
            let mut edited = Vec::new();

            if let Some(name) = name {
                edited.push(format!("name: {} -> {name}", change.after.name));
                change.after.name = name;
            }
            if let Some(tare_weight) = cmd.tare_weight {
                edited.push(format!(
                    "tare: {} -> {tare_weight}",
                    change.after.tare_weight
                ));
                change.after.tare_weight = tare_weight;
            }
            if let Some(notes) = cmd.notes.as_deref() {
                change.after.notes = normalize_optional_text(Some(notes));
                edited.push("notes updated".to_string());
            }

            let draft = RecordDraft::new(TransactionType::Edit, proof).notes(Some(edited.join(", ")));
            self.commit_changes(&db_tx, vec![change.record(draft)], None, now)
                .await
        })
    }

    /// Current state of a container with its derived quantities.
    pub async fn container(&self, container_id: Uuid) -> ResultEngine<ContainerView> {
        with_tx!(self, |db_tx| {
            let (container, kind) = self.load_container(&db_tx, container_id).await?;
            self.view(container, &kind)
        })
    }

    /// Every container, by name.
    pub async fn containers(&self) -> ResultEngine<Vec<ContainerView>> {
        let kinds: HashMap<Uuid, ContainerKind> = container_kinds::Entity::find()
            .all(&self.database)
            .await?
            .into_iter()
            .map(|model| ContainerKind::try_from(model).map(|kind| (kind.id, kind)))
            .collect::<ResultEngine<_>>()?;

        let models = containers::Entity::find()
            .order_by_asc(containers::Column::Name)
            .all(&self.database)
            .await?;
        let mut views = Vec::with_capacity(models.len());
        for model in models {
            let container = Container::try_from(model)?;
            let kind = kinds.get(&container.kind_id).ok_or_else(|| {
                EngineError::KeyNotFound("container kind not exists".to_string())
            })?;
            views.push(self.view(container, kind)?);
        }
        Ok(views)
    }

    pub(super) fn view(
        &self,
        container: Container,
        kind: &ContainerKind,
    ) -> ResultEngine<ContainerView> {
        let gauge = container.gauge(&self.density)?;
        Ok(ContainerView {
            container,
            capacity_gallons: kind.capacity_gallons,
            gauge,
        })
    }
}
