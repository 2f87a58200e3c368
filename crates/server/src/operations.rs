//! Operation endpoints.

use api_types::{
    conversion::{ConversionRequest, ConversionResponse},
    operation::{OperationRequest, OperationResponse, ReverseRequest},
    transaction::TransactionListResponse,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::ReverseCmd;
use uuid::Uuid;

use crate::{ServerError, mapping, server::ServerState};

pub async fn operation_run(
    State(state): State<ServerState>,
    Json(payload): Json<OperationRequest>,
) -> Result<(StatusCode, Json<OperationResponse>), ServerError> {
    let outcome = state.engine.execute(mapping::operation(payload)).await?;
    Ok((StatusCode::CREATED, Json(mapping::outcome(outcome))))
}

pub async fn operation_transactions(
    State(state): State<ServerState>,
    Path(operation_id): Path<Uuid>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let records = state.engine.transactions_for_operation(operation_id).await?;
    Ok(Json(TransactionListResponse {
        transactions: records.into_iter().map(mapping::transaction_view).collect(),
    }))
}

pub async fn operation_reverse(
    State(state): State<ServerState>,
    Path(operation_id): Path<Uuid>,
    payload: Option<Json<ReverseRequest>>,
) -> Result<(StatusCode, Json<OperationResponse>), ServerError> {
    let mut cmd = ReverseCmd::operation(operation_id);
    if let Some(notes) = payload.and_then(|Json(body)| body.notes) {
        cmd = cmd.notes(notes);
    }

    let outcome = state.engine.reverse_operation(cmd).await?;
    Ok((StatusCode::CREATED, Json(mapping::outcome(outcome))))
}

pub async fn convert(
    State(state): State<ServerState>,
    Json(payload): Json<ConversionRequest>,
) -> Result<Json<ConversionResponse>, ServerError> {
    let gauge = state.engine.convert(engine::ConversionRequest {
        quantity: mapping::quantity(payload.quantity),
        proof: payload.proof,
        temperature_f: payload.temperature_f,
        tare_weight: payload.tare_weight.unwrap_or_default(),
    })?;
    Ok(Json(mapping::gauge(gauge)))
}
