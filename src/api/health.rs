use std::sync::Arc;

use axum::{Extension, response::Json};
use serde_json::{Value, json};

use crate::management::Dialog;

pub async fn health(Extension(dialog): Extension<Arc<Dialog>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "capacity": dialog.capacity()
    }))
}
