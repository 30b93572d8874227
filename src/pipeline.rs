use std::sync::Arc;

use reqwest::Client;
use tracing::{debug, info};

use crate::{
    compare,
    config::Config,
    error::{PipelineError, PipelineResult},
    reference::{self, Parsed},
    services,
    track::TrackList,
    types::{ComparisonResult, PlaylistReference},
};

/// Entry point to canonicalizing, fetching and comparing.
///
/// Cheap to clone: the HTTP client and the configuration are shared, so a
/// clone can be moved into a spawned comparison job.
#[derive(Debug, Clone)]
pub struct Pipeline {
    http: Client,
    config: Arc<Config>,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self, reqwest::Error> {
        let http = services::build_client(&config)?;
        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Turns free-form user text into a reference. BOOM share links cost one
    /// HTTP round trip bounded by the link timeout.
    pub async fn canonicalize(&self, text: &str) -> PipelineResult<PlaylistReference> {
        match reference::parse(text)? {
            Parsed::Ready(reference) => {
                debug!(reference = %reference, "canonicalize.ready");
                Ok(reference)
            }
            Parsed::NeedsRedirect(url) => self.follow_share_link(&self.share_url(url)).await,
        }
    }

    // Share links are followed at the configured origin.
    fn share_url(&self, url: String) -> String {
        if let Some(path) = url.strip_prefix(reference::BOOM_SHARE_ORIGIN) {
            let origin = self.config.endpoints.boom_share.trim_end_matches('/');
            return format!("{origin}{path}");
        }
        url
    }

    async fn follow_share_link(&self, url: &str) -> PipelineResult<PlaylistReference> {
        let response = self
            .http
            .get(url)
            .timeout(self.config.link_timeout)
            .send()
            .await
            .map_err(|e| PipelineError::LinkResolutionFailed(e.to_string()))?;
        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::LinkResolutionFailed(e.to_string()))?;

        let reference = reference::vk_playlist_behind_redirect(&final_url, &body).ok_or_else(
            || PipelineError::LinkResolutionFailed(format!("no VK playlist behind {url}")),
        )?;
        info!(share_link = url, reference = %reference, "canonicalize.redirect");
        Ok(reference)
    }

    pub async fn fetch(&self, reference: &PlaylistReference) -> PipelineResult<TrackList> {
        services::fetch(&self.http, &self.config, reference).await
    }

    pub fn fetch_from_file(&self, bytes: &[u8]) -> TrackList {
        services::file::import(bytes)
    }

    pub fn compare(&self, a: &TrackList, b: &TrackList) -> ComparisonResult {
        compare::compare(a, b)
    }
}
