use axum::{
    Router,
    routing::{get, post},
};

use std::sync::Arc;

use crate::{containers, kinds, operations};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

pub fn router(engine: Arc<Engine>) -> Router {
    let state = ServerState { engine };
    Router::new()
        .route(
            "/container_kinds",
            post(kinds::kind_new).get(kinds::kind_list),
        )
        .route("/container_kinds/{id}", get(kinds::kind_get))
        .route(
            "/containers",
            post(containers::container_new).get(containers::container_list),
        )
        .route(
            "/containers/{id}",
            get(containers::container_get).patch(containers::container_update),
        )
        .route("/containers/{id}/fill", post(containers::container_fill))
        .route(
            "/containers/{id}/transactions",
            get(containers::container_transactions),
        )
        .route("/operations", post(operations::operation_run))
        .route(
            "/operations/{operation_id}",
            get(operations::operation_transactions),
        )
        .route(
            "/operations/{operation_id}/reverse",
            post(operations::operation_reverse),
        )
        .route("/convert", post(operations::convert))
        .with_state(state)
}

pub async fn run(engine: Engine, addr: &str) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener on {addr}: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(Arc::new(engine))).await
}

pub fn spawn_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
