//! The module contains `Container` and its implementation.
//!
//! A container stores only what is measured (net weight, observed proof and
//! the temperature it was read at). Wine gallons, proof gallons and gross
//! weight are always derived through [`Container::gauge`].

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    ContainerKind, DensityTable, EngineError, ResultEngine,
    conversion::{self, Gauge},
    density::validate_proof,
    util::parse_uuid,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerStatus {
    Empty,
    Filled,
}

impl ContainerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "EMPTY",
            Self::Filled => "FILLED",
        }
    }
}

impl TryFrom<&str> for ContainerStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "EMPTY" => Ok(Self::Empty),
            "FILLED" => Ok(Self::Filled),
            other => Err(EngineError::Validation(format!(
                "invalid container status: {other}"
            ))),
        }
    }
}

/// Regulatory account the spirit is held in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Account {
    #[default]
    Storage,
    Production,
    Bottling,
    Sampling,
}

impl Account {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Storage => "storage",
            Self::Production => "production",
            Self::Bottling => "bottling",
            Self::Sampling => "sampling",
        }
    }
}

impl TryFrom<&str> for Account {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "storage" => Ok(Self::Storage),
            "production" => Ok(Self::Production),
            "bottling" => Ok(Self::Bottling),
            "sampling" => Ok(Self::Sampling),
            other => Err(EngineError::Validation(format!("invalid account: {other}"))),
        }
    }
}

/// A physical vessel: barrel, tote or tank.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub id: Uuid,
    pub kind_id: Uuid,
    pub name: String,
    /// Free-form type tag ("barrel", "tote", ...).
    pub container_type: String,
    pub status: ContainerStatus,
    pub tare_weight: f64,
    /// Weight of the liquid only.
    pub net_weight: f64,
    /// Proof as read at `temperature_f`.
    pub proof: f64,
    pub temperature_f: f64,
    pub product_id: Option<String>,
    pub account: Account,
    pub fill_date: Option<DateTime<Utc>>,
    pub emptied_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    /// Bumped by every committed write; used to detect concurrent writers.
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl Container {
    /// A new, empty container of `kind`.
    pub fn new(
        kind: &ContainerKind,
        name: String,
        container_type: String,
        tare_weight: Option<f64>,
        account: Account,
        reference_temperature_f: f64,
        now: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        let tare_weight = tare_weight.unwrap_or(kind.tare_weight);
        conversion::validate_quantity(tare_weight, "tare weight")?;
        Ok(Self {
            id: Uuid::new_v4(),
            kind_id: kind.id,
            name,
            container_type,
            status: ContainerStatus::Empty,
            tare_weight,
            net_weight: 0.0,
            proof: 0.0,
            temperature_f: reference_temperature_f,
            product_id: None,
            account,
            fill_date: None,
            emptied_date: None,
            notes: None,
            version: 1,
            updated_at: now,
        })
    }

    pub fn is_filled(&self) -> bool {
        self.status == ContainerStatus::Filled
    }

    /// Derived quantities for the current contents.
    pub fn gauge(&self, table: &DensityTable) -> ResultEngine<Gauge> {
        if !self.is_filled() {
            return Ok(Gauge {
                tare_weight: self.tare_weight,
                gross_weight: self.tare_weight,
                ..Gauge::default()
            });
        }
        conversion::from_weight(
            table,
            self.tare_weight,
            self.tare_weight + self.net_weight,
            self.proof,
            self.temperature_f,
        )
    }

    /// Replace the contents with `wine_gallons` at `true_proof`.
    ///
    /// The proof is stored as read at the reference temperature, so it needs
    /// no further correction. Zero gallons empties the container.
    pub(crate) fn set_contents(
        &mut self,
        table: &DensityTable,
        wine_gallons: f64,
        true_proof: f64,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        if conversion::is_negligible(wine_gallons, self.gauge(table)?.wine_gallons) {
            self.drain(table, now);
            return Ok(());
        }
        self.net_weight = conversion::net_weight_at_true_proof(table, wine_gallons, true_proof)?;
        self.proof = true_proof;
        self.temperature_f = table.reference_temperature_f();
        self.status = ContainerStatus::Filled;
        Ok(())
    }

    /// Mark the container as emptied.
    pub(crate) fn drain(&mut self, table: &DensityTable, now: DateTime<Utc>) {
        self.status = ContainerStatus::Empty;
        self.net_weight = 0.0;
        self.proof = 0.0;
        self.temperature_f = table.reference_temperature_f();
        self.product_id = None;
        self.emptied_date = Some(now);
    }

    /// Check the container invariants against its kind.
    ///
    /// Called on every state about to be persisted.
    pub(crate) fn check_invariants(
        &self,
        kind: &ContainerKind,
        table: &DensityTable,
    ) -> ResultEngine<Gauge> {
        conversion::validate_quantity(self.tare_weight, "tare weight")?;
        conversion::validate_quantity(self.net_weight, "net weight")?;
        validate_proof(self.proof)?;

        match self.status {
            ContainerStatus::Empty => {
                if self.net_weight != 0.0 {
                    return Err(EngineError::Precondition(format!(
                        "container '{}' is EMPTY but holds {} lbs",
                        self.name, self.net_weight
                    )));
                }
                if self.product_id.is_some() {
                    return Err(EngineError::Precondition(format!(
                        "container '{}' is EMPTY but references a product",
                        self.name
                    )));
                }
            }
            ContainerStatus::Filled => {
                if self.net_weight == 0.0 {
                    return Err(EngineError::Precondition(format!(
                        "container '{}' is FILLED but holds no liquid",
                        self.name
                    )));
                }
                if self.product_id.is_none() {
                    return Err(EngineError::Precondition(format!(
                        "container '{}' is FILLED without a product",
                        self.name
                    )));
                }
            }
        }

        let gauge = self.gauge(table)?;
        if conversion::exceeds(gauge.wine_gallons, kind.capacity_gallons) {
            return Err(EngineError::Precondition(format!(
                "container '{}' would hold {:.3} wine gallons, capacity is {}",
                self.name, gauge.wine_gallons, kind.capacity_gallons
            )));
        }
        Ok(gauge)
    }
}

/// A container together with its derived quantities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContainerView {
    pub container: Container,
    pub capacity_gallons: f64,
    pub gauge: Gauge,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "containers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind_id: String,
    pub name: String,
    pub container_type: String,
    pub status: String,
    pub tare_weight: f64,
    pub net_weight: f64,
    pub proof: f64,
    pub temperature_f: f64,
    pub product_id: Option<String>,
    pub account: String,
    pub fill_date: Option<DateTimeUtc>,
    pub emptied_date: Option<DateTimeUtc>,
    pub notes: Option<String>,
    pub version: i64,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::container_kinds::Entity",
        from = "Column::KindId",
        to = "super::container_kinds::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Kinds,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::container_kinds::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Kinds.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Container> for ActiveModel {
    fn from(value: &Container) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            kind_id: ActiveValue::Set(value.kind_id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            container_type: ActiveValue::Set(value.container_type.clone()),
            status: ActiveValue::Set(value.status.as_str().to_string()),
            tare_weight: ActiveValue::Set(value.tare_weight),
            net_weight: ActiveValue::Set(value.net_weight),
            proof: ActiveValue::Set(value.proof),
            temperature_f: ActiveValue::Set(value.temperature_f),
            product_id: ActiveValue::Set(value.product_id.clone()),
            account: ActiveValue::Set(value.account.as_str().to_string()),
            fill_date: ActiveValue::Set(value.fill_date),
            emptied_date: ActiveValue::Set(value.emptied_date),
            notes: ActiveValue::Set(value.notes.clone()),
            version: ActiveValue::Set(value.version),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Container {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "container")?,
            kind_id: parse_uuid(&model.kind_id, "container kind")?,
            name: model.name,
            container_type: model.container_type,
            status: ContainerStatus::try_from(model.status.as_str())?,
            tare_weight: model.tare_weight,
            net_weight: model.net_weight,
            proof: model.proof,
            temperature_f: model.temperature_f,
            product_id: model.product_id,
            account: Account::try_from(model.account.as_str())?,
            fill_date: model.fill_date,
            emptied_date: model.emptied_date,
            notes: model.notes,
            version: model.version,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn barrel() -> ContainerKind {
        ContainerKind::new("Barrel".to_string(), 53.0, 100.0).unwrap()
    }

    fn container(kind: &ContainerKind) -> Container {
        Container::new(
            kind,
            "B-001".to_string(),
            "barrel".to_string(),
            None,
            Account::Storage,
            60.0,
            Utc.timestamp_opt(0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn new_container_takes_kind_tare() {
        let kind = barrel();
        let c = container(&kind);
        assert_eq!(c.tare_weight, 100.0);
        assert_eq!(c.status, ContainerStatus::Empty);
        let gauge = c.gauge(&DensityTable::default()).unwrap();
        assert_eq!(gauge.gross_weight, 100.0);
        assert_eq!(gauge.wine_gallons, 0.0);
    }

    #[test]
    fn set_contents_fills_and_drains() {
        let table = DensityTable::default();
        let kind = barrel();
        let mut c = container(&kind);
        c.product_id = Some("bourbon".to_string());
        let now = Utc.timestamp_opt(10, 0).unwrap();

        c.set_contents(&table, 50.0, 110.0, now).unwrap();
        assert_eq!(c.status, ContainerStatus::Filled);
        let gauge = c.check_invariants(&kind, &table).unwrap();
        assert!(conversion::approx_eq(gauge.wine_gallons, 50.0));
        assert!(conversion::approx_eq(gauge.proof_gallons, 55.0));

        c.set_contents(&table, 0.0, 110.0, now).unwrap();
        assert_eq!(c.status, ContainerStatus::Empty);
        assert_eq!(c.net_weight, 0.0);
        assert_eq!(c.product_id, None);
        assert_eq!(c.emptied_date, Some(now));
        c.check_invariants(&kind, &table).unwrap();
    }

    #[test]
    fn capacity_is_a_hard_limit() {
        let table = DensityTable::default();
        let kind = barrel();
        let mut c = container(&kind);
        c.product_id = Some("bourbon".to_string());
        let now = Utc.timestamp_opt(10, 0).unwrap();

        c.set_contents(&table, 53.0, 120.0, now).unwrap();
        assert!(c.check_invariants(&kind, &table).is_ok());

        c.set_contents(&table, 53.01, 120.0, now).unwrap();
        assert!(matches!(
            c.check_invariants(&kind, &table),
            Err(EngineError::Precondition(_))
        ));
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [ContainerStatus::Empty, ContainerStatus::Filled] {
            assert_eq!(ContainerStatus::try_from(status.as_str()).unwrap(), status);
        }
        for account in [
            Account::Storage,
            Account::Production,
            Account::Bottling,
            Account::Sampling,
        ] {
            assert_eq!(Account::try_from(account.as_str()).unwrap(), account);
        }
        assert!(Account::try_from("vault").is_err());
    }
}
