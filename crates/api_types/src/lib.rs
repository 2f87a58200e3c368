use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A measured amount, e.g. `{"wine_gallons": 20.0}`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    NetWeight(f64),
    GrossWeight(f64),
    WineGallons(f64),
    ProofGallons(f64),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Account {
    #[default]
    Storage,
    Production,
    Bottling,
    Sampling,
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// One of `validation`, `precondition`, `conflict`, `store`.
    pub kind: String,
    pub error: String,
    /// The same request may succeed if sent again.
    pub retryable: bool,
}

pub mod container_kind {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContainerKindNew {
        pub name: String,
        pub capacity_gallons: f64,
        pub tare_weight: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContainerKindView {
        pub id: Uuid,
        pub name: String,
        pub capacity_gallons: f64,
        pub tare_weight: f64,
    }
}

pub mod container {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
    pub enum ContainerStatus {
        Empty,
        Filled,
    }

    /// What goes into a container and how it was measured.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct FillData {
        pub product_id: String,
        /// Proof as read at `temperature_f`.
        pub proof: f64,
        /// Defaults to 60 F.
        pub temperature_f: Option<f64>,
        pub quantity: Quantity,
        pub fill_date: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContainerNew {
        pub kind_id: Uuid,
        pub name: String,
        pub container_type: String,
        /// Overrides the kind's tare weight.
        pub tare_weight: Option<f64>,
        pub account: Option<Account>,
        pub fill: Option<FillData>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContainerFill {
        #[serde(flatten)]
        pub fill: FillData,
        pub account: Option<Account>,
        pub notes: Option<String>,
    }

    /// `notes: ""` clears the notes.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ContainerUpdate {
        pub name: Option<String>,
        pub notes: Option<String>,
        pub tare_weight: Option<f64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContainerView {
        pub id: Uuid,
        pub kind_id: Uuid,
        pub name: String,
        pub container_type: String,
        pub status: ContainerStatus,
        pub account: Account,
        pub product_id: Option<String>,
        pub capacity_gallons: f64,
        pub tare_weight: f64,
        pub net_weight: f64,
        pub gross_weight: f64,
        /// Proof as last read, at `temperature_f`.
        pub proof: f64,
        pub temperature_f: f64,
        /// Proof corrected to 60 F.
        pub true_proof: f64,
        pub wine_gallons: f64,
        pub proof_gallons: f64,
        pub fill_date: Option<DateTime<Utc>>,
        pub emptied_date: Option<DateTime<Utc>>,
        pub notes: Option<String>,
        pub version: i64,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ContainersResponse {
        pub containers: Vec<ContainerView>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
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

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub operation_id: Uuid,
        pub sequence: i32,
        pub container_id: Uuid,
        pub container_version: i64,
        pub transaction_type: TransactionType,
        pub proof: f64,
        pub volume_gallons_delta: f64,
        pub proof_gallons_delta: f64,
        pub notes: Option<String>,
        pub reverses_operation_id: Option<Uuid>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
    }
}

pub mod operation {
    use super::{container::ContainerView, transaction::TransactionView, *};

    /// Bottles that came off the line.
    #[derive(Clone, Copy, Debug, Serialize, Deserialize)]
    pub struct BottledOutput {
        pub bottle_count: u32,
        pub bottle_size_ml: f64,
        pub proof: f64,
    }

    /// The five content operations, tagged by `type`.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    pub enum OperationRequest {
        Transfer {
            source_id: Uuid,
            destination_id: Uuid,
            /// Absent: move everything.
            amount: Option<Quantity>,
            loss_proof_gallons: Option<f64>,
            destination_account: Option<Account>,
            notes: Option<String>,
        },
        ProofDown {
            container_id: Uuid,
            new_proof: f64,
            notes: Option<String>,
        },
        Bottle {
            container_id: Uuid,
            /// Absent: bottle everything.
            amount: Option<Quantity>,
            declared: Option<BottledOutput>,
            notes: Option<String>,
        },
        TankAdjust {
            container_id: Uuid,
            /// `net_weight` or `gross_weight`.
            weight: Option<Quantity>,
            proof: Option<f64>,
            temperature_f: Option<f64>,
            notes: Option<String>,
        },
        ChangeAccount {
            container_id: Uuid,
            account: Account,
            notes: Option<String>,
        },
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ReverseRequest {
        pub notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OperationResponse {
        pub operation_id: Uuid,
        pub containers: Vec<ContainerView>,
        pub transactions: Vec<TransactionView>,
    }
}

pub mod conversion {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ConversionRequest {
        pub quantity: Quantity,
        pub proof: f64,
        pub temperature_f: Option<f64>,
        pub tare_weight: Option<f64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ConversionResponse {
        pub tare_weight: f64,
        pub gross_weight: f64,
        pub net_weight: f64,
        pub true_proof: f64,
        pub wine_gallons: f64,
        pub proof_gallons: f64,
    }
}

#[cfg(test)]
mod tests {
    use super::{operation::OperationRequest, *};

    #[test]
    fn operation_request_is_tagged_by_type() {
        let body = r#"{
            "type": "transfer",
            "source_id": "6f1c1d3e-0b7a-4f4f-9d5e-2b1c3a4d5e6f",
            "destination_id": "0a9b8c7d-6e5f-4a3b-8c2d-1e0f9a8b7c6d",
            "amount": {"wine_gallons": 20.0}
        }"#;
        let request: OperationRequest = serde_json::from_str(body).unwrap();
        match request {
            OperationRequest::Transfer {
                amount,
                loss_proof_gallons,
                notes,
                ..
            } => {
                assert_eq!(amount, Some(Quantity::WineGallons(20.0)));
                assert_eq!(loss_proof_gallons, None);
                assert_eq!(notes, None);
            }
            other => panic!("unexpected request: {other:?}"),
        }

        let unknown = r#"{"type": "distill", "container_id": "6f1c1d3e-0b7a-4f4f-9d5e-2b1c3a4d5e6f"}"#;
        assert!(serde_json::from_str::<OperationRequest>(unknown).is_err());
    }

    #[test]
    fn fill_body_is_flat() {
        let body = r#"{
            "product_id": "bourbon",
            "proof": 110.0,
            "quantity": {"net_weight": 400.0},
            "account": "production"
        }"#;
        let fill: container::ContainerFill = serde_json::from_str(body).unwrap();
        assert_eq!(fill.fill.quantity, Quantity::NetWeight(400.0));
        assert_eq!(fill.fill.temperature_f, None);
        assert_eq!(fill.account, Some(Account::Production));
    }
}
