//! Transaction records.
//!
//! A `TransactionRecord` is the immutable audit entry emitted for one
//! container touched by one operation. Records of the same operation share an
//! `operation_id` and are ordered by `sequence` (source before destination).

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Container, EngineError, util::parse_uuid};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Create,
    Edit,
    ProofDown,
    TransferIn,
    TransferOut,
    BottlePartial,
    BottleEmpty,
    BottlingGain,
    BottlingLoss,
    TankAdjust,
    ChangeAccount,
    Reversal,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Edit => "EDIT",
            Self::ProofDown => "PROOF_DOWN",
            Self::TransferIn => "TRANSFER_IN",
            Self::TransferOut => "TRANSFER_OUT",
            Self::BottlePartial => "BOTTLE_PARTIAL",
            Self::BottleEmpty => "BOTTLE_EMPTY",
            Self::BottlingGain => "BOTTLING_GAIN",
            Self::BottlingLoss => "BOTTLING_LOSS",
            Self::TankAdjust => "TANK_ADJUST",
            Self::ChangeAccount => "CHANGE_ACCOUNT",
            Self::Reversal => "REVERSAL",
        }
    }
}

impl TryFrom<&str> for TransactionType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "CREATE" => Ok(Self::Create),
            "EDIT" => Ok(Self::Edit),
            "PROOF_DOWN" => Ok(Self::ProofDown),
            "TRANSFER_IN" => Ok(Self::TransferIn),
            "TRANSFER_OUT" => Ok(Self::TransferOut),
            "BOTTLE_PARTIAL" => Ok(Self::BottlePartial),
            "BOTTLE_EMPTY" => Ok(Self::BottleEmpty),
            "BOTTLING_GAIN" => Ok(Self::BottlingGain),
            "BOTTLING_LOSS" => Ok(Self::BottlingLoss),
            "TANK_ADJUST" => Ok(Self::TankAdjust),
            "CHANGE_ACCOUNT" => Ok(Self::ChangeAccount),
            "REVERSAL" => Ok(Self::Reversal),
            other => Err(EngineError::Validation(format!(
                "invalid transaction type: {other}"
            ))),
        }
    }
}

/// The fields an operation decides for one record; the commit step fills in
/// identity, ordering and the container snapshot.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RecordDraft {
    pub transaction_type: TransactionType,
    pub proof: f64,
    pub volume_gallons_delta: f64,
    pub proof_gallons_delta: f64,
    pub notes: Option<String>,
}

impl RecordDraft {
    pub fn new(transaction_type: TransactionType, proof: f64) -> Self {
        Self {
            transaction_type,
            proof,
            volume_gallons_delta: 0.0,
            proof_gallons_delta: 0.0,
            notes: None,
        }
    }

    pub fn deltas(mut self, volume_gallons_delta: f64, proof_gallons_delta: f64) -> Self {
        self.volume_gallons_delta = volume_gallons_delta;
        self.proof_gallons_delta = proof_gallons_delta;
        self
    }

    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub operation_id: Uuid,
    pub sequence: i32,
    pub container_id: Uuid,
    /// Container version this record produced.
    pub container_version: i64,
    pub transaction_type: TransactionType,
    /// True proof of the container after the operation.
    pub proof: f64,
    pub volume_gallons_delta: f64,
    pub proof_gallons_delta: f64,
    pub notes: Option<String>,
    /// Set on compensating records.
    pub reverses_operation_id: Option<Uuid>,
    /// Container state right before the operation.
    pub prior_state: Option<Container>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub operation_id: String,
    pub sequence: i32,
    pub container_id: String,
    pub container_version: i64,
    pub transaction_type: String,
    pub proof: f64,
    pub volume_gallons_delta: f64,
    pub proof_gallons_delta: f64,
    pub notes: Option<String>,
    pub reverses_operation_id: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub prior_state: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::containers::Entity",
        from = "Column::ContainerId",
        to = "super::containers::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Containers,
}

impl Related<super::containers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Containers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&TransactionRecord> for ActiveModel {
    type Error = EngineError;

    fn try_from(record: &TransactionRecord) -> Result<Self, Self::Error> {
        let prior_state = record
            .prior_state
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| {
                EngineError::Validation(format!("cannot encode container snapshot: {err}"))
            })?;
        Ok(Self {
            id: ActiveValue::Set(record.id.to_string()),
            operation_id: ActiveValue::Set(record.operation_id.to_string()),
            sequence: ActiveValue::Set(record.sequence),
            container_id: ActiveValue::Set(record.container_id.to_string()),
            container_version: ActiveValue::Set(record.container_version),
            transaction_type: ActiveValue::Set(record.transaction_type.as_str().to_string()),
            proof: ActiveValue::Set(record.proof),
            volume_gallons_delta: ActiveValue::Set(record.volume_gallons_delta),
            proof_gallons_delta: ActiveValue::Set(record.proof_gallons_delta),
            notes: ActiveValue::Set(record.notes.clone()),
            reverses_operation_id: ActiveValue::Set(
                record.reverses_operation_id.map(|id| id.to_string()),
            ),
            prior_state: ActiveValue::Set(prior_state),
            created_at: ActiveValue::Set(record.created_at),
        })
    }
}

impl TryFrom<Model> for TransactionRecord {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let prior_state = model
            .prior_state
            .as_deref()
            .map(serde_json::from_str::<Container>)
            .transpose()
            .map_err(|err| {
                EngineError::Validation(format!("corrupt container snapshot: {err}"))
            })?;
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            operation_id: parse_uuid(&model.operation_id, "operation")?,
            sequence: model.sequence,
            container_id: parse_uuid(&model.container_id, "container")?,
            container_version: model.container_version,
            transaction_type: TransactionType::try_from(model.transaction_type.as_str())?,
            proof: model.proof,
            volume_gallons_delta: model.volume_gallons_delta,
            proof_gallons_delta: model.proof_gallons_delta,
            notes: model.notes,
            reverses_operation_id: model
                .reverses_operation_id
                .as_deref()
                .map(|id| parse_uuid(id, "operation"))
                .transpose()?,
            prior_state,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_type_strings_round_trip() {
        for kind in [
            TransactionType::Create,
            TransactionType::Edit,
            TransactionType::ProofDown,
            TransactionType::TransferIn,
            TransactionType::TransferOut,
            TransactionType::BottlePartial,
            TransactionType::BottleEmpty,
            TransactionType::BottlingGain,
            TransactionType::BottlingLoss,
            TransactionType::TankAdjust,
            TransactionType::ChangeAccount,
            TransactionType::Reversal,
        ] {
            assert_eq!(TransactionType::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(TransactionType::try_from("VOID").is_err());
    }
}
