//! Container kind endpoints.

use api_types::container_kind::{ContainerKindNew, ContainerKindView};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, mapping, server::ServerState};

pub async fn kind_new(
    State(state): State<ServerState>,
    Json(payload): Json<ContainerKindNew>,
) -> Result<(StatusCode, Json<ContainerKindView>), ServerError> {
    let kind = state
        .engine
        .new_container_kind(&payload.name, payload.capacity_gallons, payload.tare_weight)
        .await?;
    Ok((StatusCode::CREATED, Json(mapping::kind_view(kind))))
}

pub async fn kind_list(
    State(state): State<ServerState>,
) -> Result<Json<Vec<ContainerKindView>>, ServerError> {
    let kinds = state.engine.container_kinds().await?;
    Ok(Json(kinds.into_iter().map(mapping::kind_view).collect()))
}

pub async fn kind_get(
    State(state): State<ServerState>,
    Path(kind_id): Path<Uuid>,
) -> Result<Json<ContainerKindView>, ServerError> {
    let kind = state.engine.container_kind(kind_id).await?;
    Ok(Json(mapping::kind_view(kind)))
}
