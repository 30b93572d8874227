//! Playlist comparison across Yandex Music, VK, Spotify and exported files.
//!
//! A comparison takes two playlist references, reduces each to a deduplicated
//! list of tracks and reports the shared tracks together with how much of each
//! playlist they cover.
//!
//! # Modules
//!
//! - `reference` - recognizes pasted links and embed snippets
//! - `normalize` - the matching key of an artist/title pair
//! - `track` - tracks and deduplicated track lists
//! - `services` - per-service fetchers, windowed paging, file import
//! - `compare` - exact-key comparison and similarity ratios
//! - `pipeline` - the four operations above behind one shared HTTP client
//! - `management` - per-user sessions, the job pool and the dialog
//! - `api` / `server` - the HTTP dialog surface
//! - `cli` - command bodies of the `plmatch` binary
//! - `config` / `logging` / `error` - settings, diagnostics, error taxonomy
//!
//! # Example
//!
//! ```ignore
//! use plmatch::{config::Config, pipeline::Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> plmatch::Res<()> {
//!     plmatch::config::load_env().await?;
//!     let pipeline = Pipeline::new(Config::from_env())?;
//!     let a = pipeline.canonicalize("https://music.yandex.ru/users/me/playlists/3").await?;
//!     let b = pipeline.fetch_from_file(b"1. Artist - Song");
//!     let result = pipeline.compare(&pipeline.fetch(&a).await?, &b);
//!     println!("{} shared", result.match_count);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod compare;
pub mod config;
pub mod error;
pub mod logging;
pub mod management;
pub mod normalize;
pub mod pipeline;
pub mod reference;
pub mod server;
pub mod services;
pub mod track;
pub mod types;
pub mod utils;

/// Result alias for the binary and the outer surfaces, where errors of
/// different kinds (I/O, address parsing, pipeline) meet.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints a status line with a blue bullet.
///
/// ```ignore
/// info!("Tracks of {}", reference);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a result line with a green checkmark.
///
/// ```ignore
/// success!("{} in common", utils::tracks_label(count));
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a red error line to stderr and exits with status 1.
///
/// Only for the binary's command bodies; library code returns
/// [`error::PipelineError`] instead.
///
/// ```ignore
/// error!("Cannot read the first playlist: {}", e);
/// // not reached
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a yellow warning line that does not stop the command.
///
/// ```ignore
/// warning!("No tracks found for {}", reference);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
