use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Gauge, Quantity, ResultEngine, TransactionRecord, conversion, transactions,
};

use super::{Engine, with_tx};

/// A single measurement to gauge, without touching any container.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConversionRequest {
    pub quantity: Quantity,
    /// Proof as read at `temperature_f`.
    pub proof: f64,
    /// Defaults to the reference temperature.
    pub temperature_f: Option<f64>,
    pub tare_weight: f64,
}

impl Engine {
    /// Gauge a measurement with this engine's density table.
    pub fn convert(&self, request: ConversionRequest) -> ResultEngine<Gauge> {
        let table = &self.density;
        let temperature_f = request
            .temperature_f
            .unwrap_or_else(|| table.reference_temperature_f());
        let tare = request.tare_weight;
        match request.quantity {
            Quantity::NetWeight(net) => {
                conversion::from_weight(table, tare, tare + net, request.proof, temperature_f)
            }
            Quantity::GrossWeight(gross) => {
                conversion::from_weight(table, tare, gross, request.proof, temperature_f)
            }
            Quantity::WineGallons(gallons) => {
                conversion::from_wine_gallons(table, gallons, request.proof, tare, temperature_f)
            }
            Quantity::ProofGallons(gallons) => {
                conversion::from_proof_gallons(table, gallons, request.proof, tare, temperature_f)
            }
        }
    }

    pub async fn transaction(&self, transaction_id: Uuid) -> ResultEngine<TransactionRecord> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
        TransactionRecord::try_from(model)
    }

    /// History of a container in commit order.
    pub async fn transactions_for_container(
        &self,
        container_id: Uuid,
    ) -> ResultEngine<Vec<TransactionRecord>> {
        with_tx!(self, |db_tx| {
            // Unknown containers are an error, not an empty history.
            self.load_container(&db_tx, container_id).await?;
            transactions::Entity::find()
                .filter(transactions::Column::ContainerId.eq(container_id.to_string()))
                .order_by_asc(transactions::Column::ContainerVersion)
                .order_by_asc(transactions::Column::Sequence)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(TransactionRecord::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Records of one operation in the order they were written.
    pub async fn transactions_for_operation(
        &self,
        operation_id: Uuid,
    ) -> ResultEngine<Vec<TransactionRecord>> {
        with_tx!(self, |db_tx| {
            let records = self.records_for_operation(&db_tx, operation_id).await?;
            if records.is_empty() {
                return Err(EngineError::KeyNotFound("operation not exists".to_string()));
            }
            Ok(records)
        })
    }
}
