use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tabled::Table;

use crate::{
    Res, error, info, pipeline::Pipeline, success, track::TrackList, utils, warning,
};

pub(super) fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

/// Reads an exported file when `arg` names one, otherwise canonicalizes and
/// fetches it.
pub(super) async fn load(pipeline: &Pipeline, arg: &str, pb: &ProgressBar) -> Res<TrackList> {
    if utils::is_upload_path(arg) {
        pb.set_message(format!("Reading {arg}..."));
        let bytes = async_fs::read(arg).await?;
        return Ok(pipeline.fetch_from_file(&bytes));
    }

    pb.set_message(format!("Resolving {arg}..."));
    let reference = pipeline.canonicalize(arg).await?;
    pb.set_message(format!("Fetching {reference}..."));
    Ok(pipeline.fetch(&reference).await?)
}

pub async fn fetch(pipeline: &Pipeline, reference: String) {
    let pb = spinner("Starting...");
    let list = match load(pipeline, &reference, &pb).await {
        Ok(list) => list,
        Err(e) => {
            pb.finish_and_clear();
            error!("Cannot read {}: {}", reference, e);
        }
    };
    pb.finish_and_clear();

    if list.is_empty() {
        warning!("No tracks found for {}", reference);
        return;
    }

    info!("Tracks of {}", reference);
    println!("{}", Table::new(utils::track_rows(&list)));
    success!("{}", utils::tracks_label(list.len()));
}
