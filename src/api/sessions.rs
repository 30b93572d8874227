use std::sync::Arc;

use axum::{
    Extension,
    body::Bytes,
    extract::Path,
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use crate::management::{Dialog, Reply, SessionView, UserId};

#[derive(Debug, Deserialize)]
pub struct TextSubmission {
    pub text: String,
}

fn status_for(reply: &Reply) -> StatusCode {
    match reply {
        Reply::AwaitingSecond { .. } | Reply::Cancelled => StatusCode::OK,
        Reply::Comparing { .. } => StatusCode::ACCEPTED,
        Reply::Busy => StatusCode::CONFLICT,
        Reply::Overloaded { .. } => StatusCode::SERVICE_UNAVAILABLE,
        Reply::Rejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

pub async fn get_session(
    Path(user): Path<UserId>,
    Extension(dialog): Extension<Arc<Dialog>>,
) -> Json<SessionView> {
    Json(dialog.status(user).await)
}

pub async fn post_text(
    Path(user): Path<UserId>,
    Extension(dialog): Extension<Arc<Dialog>>,
    Json(body): Json<TextSubmission>,
) -> (StatusCode, Json<Reply>) {
    let reply = dialog.submit_text(user, &body.text).await;
    (status_for(&reply), Json(reply))
}

/// The request body is the exported file itself.
pub async fn post_file(
    Path(user): Path<UserId>,
    Extension(dialog): Extension<Arc<Dialog>>,
    body: Bytes,
) -> (StatusCode, Json<Reply>) {
    let reply = dialog.submit_upload(user, &body).await;
    (status_for(&reply), Json(reply))
}

pub async fn delete_session(
    Path(user): Path<UserId>,
    Extension(dialog): Extension<Arc<Dialog>>,
) -> Json<Reply> {
    Json(dialog.cancel(user).await)
}
