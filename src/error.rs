//! Error taxonomy shared by the canonicalizer, the fetchers and the dialog
//! controller.
//!
//! Every variant carries a user-facing meaning: the first two are fixed by the
//! person who pasted the link, `ServiceUnavailable` by trying again later,
//! `PrivacyRestricted` only by the playlist owner and `CredentialsMissing` only
//! by whoever runs the service.

use thiserror::Error;

use crate::types::Service;

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("unrecognized playlist reference")]
    UnrecognizedReference,

    #[error("could not resolve share link: {0}")]
    LinkResolutionFailed(String),

    #[error("{service} unavailable: {detail}")]
    ServiceUnavailable { service: Service, detail: String },

    #[error("{service} playlist is not accessible: {detail}")]
    PrivacyRestricted { service: Service, detail: String },

    #[error("missing credentials: {0} is not set")]
    CredentialsMissing(&'static str),
}

impl PipelineError {
    pub fn unavailable(service: Service, detail: impl Into<String>) -> Self {
        PipelineError::ServiceUnavailable {
            service,
            detail: detail.into(),
        }
    }

    pub fn restricted(service: Service, detail: impl Into<String>) -> Self {
        PipelineError::PrivacyRestricted {
            service,
            detail: detail.into(),
        }
    }

    /// Whether a staged fetch may move on to its next, weaker strategy.
    pub fn allows_fallback(&self) -> bool {
        matches!(
            self,
            PipelineError::ServiceUnavailable { .. } | PipelineError::PrivacyRestricted { .. }
        )
    }

    pub fn is_privacy(&self) -> bool {
        matches!(self, PipelineError::PrivacyRestricted { .. })
    }

    /// Text safe to show to the person on the other side of the dialog.
    ///
    /// Transport and parse details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::UnrecognizedReference => {
                "Send a Yandex Music, VK or Spotify playlist link, or upload a .txt/.csv export."
                    .to_string()
            }
            PipelineError::LinkResolutionFailed(_) => {
                "Could not open the BOOM share link. Try again or send the VK playlist link itself."
                    .to_string()
            }
            PipelineError::ServiceUnavailable { service, .. } => {
                format!("{service} did not answer properly. Please try again later.")
            }
            PipelineError::PrivacyRestricted { service, .. } => format!(
                "The {service} playlist is not accessible. Check that it is open to everyone."
            ),
            PipelineError::CredentialsMissing(_) => {
                "This service is not configured here. Upload an exported .txt/.csv file instead."
                    .to_string()
            }
        }
    }
}
