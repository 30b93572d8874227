use tabled::Table;

use crate::{error, info, pipeline::Pipeline, success, utils, warning};

use super::fetch::{load, spinner};

pub async fn compare(pipeline: &Pipeline, first: String, second: String, show_matches: bool) {
    let pb = spinner("Starting...");

    let a = match load(pipeline, &first, &pb).await {
        Ok(list) => list,
        Err(e) => {
            pb.finish_and_clear();
            error!("Cannot read the first playlist: {}", e);
        }
    };
    pb.println(format!("first: {}; fetching second", utils::tracks_label(a.len())));

    let b = match load(pipeline, &second, &pb).await {
        Ok(list) => list,
        Err(e) => {
            pb.finish_and_clear();
            error!("Cannot read the second playlist: {}", e);
        }
    };
    pb.finish_and_clear();

    if a.is_empty() || b.is_empty() {
        warning!("One of the playlists has no tracks; similarity is 0.0%");
    }

    let result = pipeline.compare(&a, &b);
    println!("{}", Table::new(utils::summary_rows(&result)));

    if result.match_count == 0 {
        info!("No shared tracks.");
        return;
    }

    success!("{} in common", utils::tracks_label(result.match_count));
    if show_matches {
        println!("{}", Table::new(utils::match_rows(&result)));
    }
}
