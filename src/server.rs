use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{
    Extension, Router,
    routing::{get, post},
};
use tracing::info;

use crate::{Res, api, management::Dialog};

pub fn build_router(dialog: Arc<Dialog>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route(
            "/sessions/{user}",
            get(api::get_session).delete(api::delete_session),
        )
        .route("/sessions/{user}/text", post(api::post_text))
        .route("/sessions/{user}/file", post(api::post_file))
        .layer(Extension(dialog))
}

pub async fn start_api_server(dialog: Arc<Dialog>, addr: &str) -> Res<()> {
    let addr = SocketAddr::from_str(addr)?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "server.listening");

    axum::serve(listener, build_router(dialog)).await?;
    Ok(())
}
