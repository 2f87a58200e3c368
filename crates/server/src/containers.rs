//! Container endpoints: registration, fill, edit and read models.

use api_types::{
    container::{ContainerFill, ContainerNew, ContainerUpdate, ContainerView, ContainersResponse, FillData},
    operation::OperationResponse,
    transaction::TransactionListResponse,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{EditContainerCmd, FillCmd, FillSpec, NewContainerCmd};
use uuid::Uuid;

use crate::{ServerError, mapping, server::ServerState};

fn fill_spec(fill: FillData) -> FillSpec {
    FillSpec {
        product_id: fill.product_id,
        proof: fill.proof,
        temperature_f: fill.temperature_f,
        quantity: mapping::quantity(fill.quantity),
        fill_date: fill.fill_date,
    }
}

pub async fn container_new(
    State(state): State<ServerState>,
    Json(payload): Json<ContainerNew>,
) -> Result<(StatusCode, Json<OperationResponse>), ServerError> {
    let cmd = NewContainerCmd {
        kind_id: payload.kind_id,
        name: payload.name,
        container_type: payload.container_type,
        tare_weight: payload.tare_weight,
        account: payload.account.map(mapping::account).unwrap_or_default(),
        fill: payload.fill.map(fill_spec),
        notes: payload.notes,
    };
    let outcome = state.engine.new_container(cmd).await?;
    Ok((StatusCode::CREATED, Json(mapping::outcome(outcome))))
}

pub async fn container_list(
    State(state): State<ServerState>,
) -> Result<Json<ContainersResponse>, ServerError> {
    let containers = state.engine.containers().await?;
    Ok(Json(ContainersResponse {
        containers: containers.into_iter().map(mapping::container_view).collect(),
    }))
}

pub async fn container_get(
    State(state): State<ServerState>,
    Path(container_id): Path<Uuid>,
) -> Result<Json<ContainerView>, ServerError> {
    let view = state.engine.container(container_id).await?;
    Ok(Json(mapping::container_view(view)))
}

pub async fn container_update(
    State(state): State<ServerState>,
    Path(container_id): Path<Uuid>,
    Json(payload): Json<ContainerUpdate>,
) -> Result<Json<OperationResponse>, ServerError> {
    let cmd = EditContainerCmd {
        container_id,
        name: payload.name,
        notes: payload.notes,
        tare_weight: payload.tare_weight,
    };
    let outcome = state.engine.edit_container(cmd).await?;
    Ok(Json(mapping::outcome(outcome)))
}

pub async fn container_fill(
    State(state): State<ServerState>,
    Path(container_id): Path<Uuid>,
    Json(payload): Json<ContainerFill>,
) -> Result<(StatusCode, Json<OperationResponse>), ServerError> {
    let cmd = FillCmd {
        container_id,
        fill: fill_spec(payload.fill),
        account: payload.account.map(mapping::account),
        notes: payload.notes,
    };
    let outcome = state.engine.fill_container(cmd).await?;
    Ok((StatusCode::CREATED, Json(mapping::outcome(outcome))))
}

pub async fn container_transactions(
    State(state): State<ServerState>,
    Path(container_id): Path<Uuid>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let records = state.engine.transactions_for_container(container_id).await?;
    Ok(Json(TransactionListResponse {
        transactions: records.into_iter().map(mapping::transaction_view).collect(),
    }))
}
