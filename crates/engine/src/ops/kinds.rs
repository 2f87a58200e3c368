use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    ContainerKind, EngineError, ResultEngine, container_kinds, util::normalize_required_name,
};

use super::{Engine, with_tx};

impl Engine {
    /// Register a container kind. Names are unique, case-insensitively.
    pub async fn new_container_kind(
        &self,
        name: &str,
        capacity_gallons: f64,
        tare_weight: f64,
    ) -> ResultEngine<ContainerKind> {
        let name = normalize_required_name(name, "container kind")?;
        let kind = ContainerKind::new(name, capacity_gallons, tare_weight)?;
        with_tx!(self, |db_tx| {
            let exists = container_kinds::Entity::find()
                .filter(Expr::cust("LOWER(name)").eq(kind.name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(kind.name));
            }

            container_kinds::ActiveModel::from(&kind)
                .insert(&db_tx)
                .await?;
            tracing::info!(kind_id = %kind.id, name = %kind.name, "container kind registered");
            Ok(kind)
        })
    }

    pub async fn container_kind(&self, kind_id: Uuid) -> ResultEngine<ContainerKind> {
        with_tx!(self, |db_tx| self.load_kind(&db_tx, kind_id).await)
    }

    /// All container kinds, by name.
    pub async fn container_kinds(&self) -> ResultEngine<Vec<ContainerKind>> {
        container_kinds::Entity::find()
            .order_by_asc(container_kinds::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(ContainerKind::try_from)
            .collect()
    }
}
