use std::sync::Arc;

use crate::{error, info, management::Dialog, pipeline::Pipeline, server};

pub async fn serve(pipeline: Pipeline, addr: Option<String>) {
    let addr = addr.unwrap_or_else(|| pipeline.config().server_addr.clone());
    let dialog = Arc::new(Dialog::from_pipeline(pipeline));

    info!("Listening on http://{}", addr);
    if let Err(e) = server::start_api_server(dialog, &addr).await {
        error!("Server stopped: {}", e);
    }
}
