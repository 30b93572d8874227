use crate::{error, pipeline::Pipeline, success};

pub async fn resolve(pipeline: &Pipeline, text: String) {
    match pipeline.canonicalize(&text).await {
        Ok(reference) => success!("{}: {}", reference.service(), reference.canonical_id()),
        Err(e) => error!("{}", e.user_message()),
    }
}
