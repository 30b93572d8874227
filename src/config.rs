//! Configuration management for plmatch.
//!
//! Values come from three places, highest priority first:
//! 1. Environment variables
//! 2. A `.env` file in the local data directory (`<data_local_dir>/plmatch/.env`)
//! 3. The defaults in this module
//!
//! Credentials are optional at load time. A fetcher that needs one and does not
//! find it fails with [`PipelineError::CredentialsMissing`], so a deployment
//! without a VK token can still compare Yandex playlists and uploaded files.

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::{
    error::{PipelineError, PipelineResult},
    management::DEFAULT_SESSION_IDLE,
    reference::BOOM_SHARE_ORIGIN,
};

pub const DEFAULT_USER_AGENT: &str =
    "KateMobileAndroid/112 (Android 14; SDK 34; arm64-v8a; samsung SM-G998B; ru)";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "ru-RU,ru;q=0.9";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8080";

/// Loads environment variables from `.env` in the local data directory.
///
/// The directory is created when missing. A missing `.env` file is not an
/// error: every setting has a default and credentials are checked lazily.
/// A `.env` in the working directory is read afterwards and never overrides
/// values that are already set.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/plmatch/.env`
/// - macOS: `~/Library/Application Support/plmatch/.env`
/// - Windows: `%LOCALAPPDATA%/plmatch/.env`
///
/// # Errors
///
/// Returns an error string if the directory cannot be created or the file
/// exists but cannot be parsed.
pub async fn load_env() -> Result<(), String> {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("plmatch/.env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    dotenv::dotenv().ok();
    Ok(())
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_secret(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Pagination policy of one fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagingConfig {
    /// Entries requested per page.
    pub page_size: usize,
    /// Pages requested concurrently before the next batch starts.
    pub window: usize,
    /// Hard cap on pages per fetch.
    pub max_pages: usize,
    /// Wall-clock ceiling for the whole fetch.
    pub budget: Duration,
}

impl PagingConfig {
    pub const fn new(page_size: usize, window: usize, max_pages: usize, budget_secs: u64) -> Self {
        Self {
            page_size,
            window,
            max_pages,
            budget: Duration::from_secs(budget_secs),
        }
    }

    /// Reads `<PREFIX>_PAGE_SIZE`, `<PREFIX>_WINDOW`, `<PREFIX>_MAX_PAGES` and
    /// `<PREFIX>_BUDGET_SECS`, keeping `defaults` for anything unset.
    pub fn from_env(prefix: &str, defaults: Self) -> Self {
        let budget_secs = env_or(&format!("{prefix}_BUDGET_SECS"), defaults.budget.as_secs());
        Self {
            page_size: env_or(&format!("{prefix}_PAGE_SIZE"), defaults.page_size).max(1),
            window: env_or(&format!("{prefix}_WINDOW"), defaults.window).max(1),
            max_pages: env_or(&format!("{prefix}_MAX_PAGES"), defaults.max_pages).max(1),
            budget: Duration::from_secs(budget_secs),
        }
    }
}

pub const YANDEX_PAGING: PagingConfig = PagingConfig::new(200, 3, 30, 60);
pub const VK_PLAYLIST_PAGING: PagingConfig = PagingConfig::new(100, 4, 50, 60);
pub const VK_UPLOADS_PAGING: PagingConfig = PagingConfig::new(200, 4, 25, 60);
pub const SPOTIFY_PAGING: PagingConfig = PagingConfig::new(100, 4, 100, 60);

/// Base URLs of the external services. Overridable so a local stand-in can be
/// used instead of the real service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub yandex_web: String,
    pub yandex_api: String,
    pub vk_api: String,
    pub spotify_api: String,
    pub spotify_token: String,
    /// Origin of BOOM share links, followed to find the VK playlist behind them.
    pub boom_share: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            yandex_web: "https://music.yandex.ru".to_string(),
            yandex_api: "https://api.music.yandex.net".to_string(),
            vk_api: "https://api.vk.com/method".to_string(),
            spotify_api: "https://api.spotify.com/v1".to_string(),
            spotify_token: "https://accounts.spotify.com/api/token".to_string(),
            boom_share: BOOM_SHARE_ORIGIN.to_string(),
        }
    }
}

impl Endpoints {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            yandex_web: env::var("YANDEX_MUSIC_WEB_URL").unwrap_or(defaults.yandex_web),
            yandex_api: env::var("YANDEX_MUSIC_API_URL").unwrap_or(defaults.yandex_api),
            vk_api: env::var("VK_API_URL").unwrap_or(defaults.vk_api),
            spotify_api: env::var("SPOTIFY_API_URL").unwrap_or(defaults.spotify_api),
            spotify_token: env::var("SPOTIFY_API_TOKEN_URL").unwrap_or(defaults.spotify_token),
            boom_share: env::var("BOOM_SHARE_URL").unwrap_or(defaults.boom_share),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub vk_access_token: Option<String>,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    pub yandex_token: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            vk_access_token: env_secret("VK_ACCESS_TOKEN"),
            spotify_client_id: env_secret("SPOTIFY_CLIENT_ID"),
            spotify_client_secret: env_secret("SPOTIFY_CLIENT_SECRET"),
            yandex_token: env_secret("YANDEX_MUSIC_TOKEN"),
        }
    }

    pub fn vk(&self) -> PipelineResult<&str> {
        self.vk_access_token
            .as_deref()
            .ok_or(PipelineError::CredentialsMissing("VK_ACCESS_TOKEN"))
    }

    pub fn spotify(&self) -> PipelineResult<(&str, &str)> {
        let id = self
            .spotify_client_id
            .as_deref()
            .ok_or(PipelineError::CredentialsMissing("SPOTIFY_CLIENT_ID"))?;
        let secret = self
            .spotify_client_secret
            .as_deref()
            .ok_or(PipelineError::CredentialsMissing("SPOTIFY_CLIENT_SECRET"))?;
        Ok((id, secret))
    }

    pub fn yandex(&self) -> Option<&str> {
        self.yandex_token.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub user_agent: String,
    pub accept_language: String,
    /// Per-request timeout. A page that exceeds it fails alone.
    pub http_timeout: Duration,
    /// Timeout of the share-link redirect hop.
    pub link_timeout: Duration,
    pub yandex: PagingConfig,
    pub vk_playlist: PagingConfig,
    pub vk_uploads: PagingConfig,
    pub spotify: PagingConfig,
    /// Comparison jobs running at once.
    pub workers: usize,
    /// Comparison jobs allowed to wait for a worker.
    pub backlog: usize,
    /// Sessions untouched for this long are dropped.
    pub session_idle: Duration,
    pub server_addr: String,
    pub endpoints: Endpoints,
    pub credentials: Credentials,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            http_timeout: Duration::from_secs(10),
            link_timeout: Duration::from_secs(10),
            yandex: YANDEX_PAGING,
            vk_playlist: VK_PLAYLIST_PAGING,
            vk_uploads: VK_UPLOADS_PAGING,
            spotify: SPOTIFY_PAGING,
            workers: 4,
            backlog: 16,
            session_idle: DEFAULT_SESSION_IDLE,
            server_addr: DEFAULT_SERVER_ADDRESS.to_string(),
            endpoints: Endpoints::default(),
            credentials: Credentials::default(),
        }
    }
}

impl Config {
    /// Builds the configuration from the process environment. Call
    /// [`load_env`] first to pick up the `.env` file.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            user_agent: env::var("PLMATCH_USER_AGENT").unwrap_or(defaults.user_agent),
            accept_language: env::var("PLMATCH_ACCEPT_LANGUAGE")
                .unwrap_or(defaults.accept_language),
            http_timeout: Duration::from_secs(env_or("PLMATCH_HTTP_TIMEOUT_SECS", 10)),
            link_timeout: Duration::from_secs(env_or("PLMATCH_LINK_TIMEOUT_SECS", 10)),
            yandex: PagingConfig::from_env("PLMATCH_YANDEX", defaults.yandex),
            vk_playlist: PagingConfig::from_env("PLMATCH_VK_PLAYLIST", defaults.vk_playlist),
            vk_uploads: PagingConfig::from_env("PLMATCH_VK_UPLOADS", defaults.vk_uploads),
            spotify: PagingConfig::from_env("PLMATCH_SPOTIFY", defaults.spotify),
            workers: env_or("PLMATCH_WORKERS", defaults.workers).max(1),
            backlog: env_or("PLMATCH_BACKLOG", defaults.backlog),
            session_idle: Duration::from_secs(env_or(
                "PLMATCH_SESSION_IDLE_SECS",
                defaults.session_idle.as_secs(),
            )),
            server_addr: env::var("SERVER_ADDRESS").unwrap_or(defaults.server_addr),
            endpoints: Endpoints::from_env(),
            credentials: Credentials::from_env(),
        }
    }
}
