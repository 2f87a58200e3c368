//! The module contains `ContainerKind`, the capacity/tare template shared by
//! containers of the same size.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::parse_uuid};

/// A container template, e.g. a 53 gallon barrel or a 275 gallon tote.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContainerKind {
    pub id: Uuid,
    pub name: String,
    /// Rated capacity in wine gallons.
    pub capacity_gallons: f64,
    /// Default empty weight in pounds.
    pub tare_weight: f64,
}

impl ContainerKind {
    pub fn new(name: String, capacity_gallons: f64, tare_weight: f64) -> ResultEngine<Self> {
        if !capacity_gallons.is_finite() || capacity_gallons <= 0.0 {
            return Err(EngineError::Validation(format!(
                "capacity must be > 0, got {capacity_gallons}"
            )));
        }
        if !tare_weight.is_finite() || tare_weight < 0.0 {
            return Err(EngineError::Validation(format!(
                "tare weight must be >= 0, got {tare_weight}"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            capacity_gallons,
            tare_weight,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "container_kinds")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub capacity_gallons: f64,
    pub tare_weight: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::containers::Entity")]
    Containers,
}

impl Related<super::containers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Containers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&ContainerKind> for ActiveModel {
    fn from(kind: &ContainerKind) -> Self {
        Self {
            id: ActiveValue::Set(kind.id.to_string()),
            name: ActiveValue::Set(kind.name.clone()),
            capacity_gallons: ActiveValue::Set(kind.capacity_gallons),
            tare_weight: ActiveValue::Set(kind.tare_weight),
        }
    }
}

impl TryFrom<Model> for ContainerKind {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "container kind")?,
            name: model.name,
            capacity_gallons: model.capacity_gallons,
            tare_weight: model.tare_weight,
        })
    }
}
