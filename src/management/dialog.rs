use serde::Serialize;
use tracing::{info, warn};

use super::{
    dispatch::JobPool,
    session::{Job, PlaylistSource, SessionStore, SessionView, SourceView, Submission, UserId},
};
use crate::{
    error::PipelineResult, pipeline::Pipeline, track::TrackList, types::ComparisonResult,
    utils::tracks_label,
};

const GENERIC_FAILURE: &str = "Something went wrong while comparing. Please start again.";
const OVERLOADED: &str = "Too many comparisons are running right now. Send the second playlist again in a minute.";

/// What the user gets back right after sending something.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum Reply {
    /// First playlist stored, waiting for the second one.
    AwaitingSecond { first: SourceView },
    /// Both playlists are in and the comparison was queued.
    Comparing { job_id: u64 },
    /// A comparison for this user is still running.
    Busy,
    /// The workers and the backlog are full; the second playlist was dropped.
    Overloaded { message: String },
    /// The input was not usable; the session did not change.
    Rejected { message: String },
    Cancelled,
}

/// Drives the two-playlist conversation for every user.
///
/// Inputs are validated right away so a bad link is answered immediately.
/// Fetching and comparing happen on the job pool; the outcome lands in the
/// session, where [`Dialog::status`] picks it up.
#[derive(Debug, Clone)]
pub struct Dialog {
    pipeline: Pipeline,
    sessions: SessionStore,
    pool: JobPool,
}

impl Dialog {
    pub fn new(pipeline: Pipeline, sessions: SessionStore, pool: JobPool) -> Self {
        Self {
            pipeline,
            sessions,
            pool,
        }
    }

    /// A dialog with a fresh store and a pool sized from the configuration.
    pub fn from_pipeline(pipeline: Pipeline) -> Self {
        let config = pipeline.config();
        let pool = JobPool::new(config.workers, config.backlog);
        let sessions = SessionStore::with_idle_timeout(config.session_idle);
        Self::new(pipeline, sessions, pool)
    }

    pub async fn submit_text(&self, user: UserId, text: &str) -> Reply {
        match self.pipeline.canonicalize(text).await {
            Ok(reference) => {
                info!(user, reference = %reference, "dialog.link");
                self.accept(user, PlaylistSource::Link(reference)).await
            }
            Err(e) => {
                info!(user, error = %e, "dialog.rejected");
                Reply::Rejected {
                    message: e.user_message(),
                }
            }
        }
    }

    pub async fn submit_upload(&self, user: UserId, bytes: &[u8]) -> Reply {
        let list = self.pipeline.fetch_from_file(bytes);
        info!(user, tracks = list.len(), "dialog.upload");
        self.accept(user, PlaylistSource::Upload(list)).await
    }

    pub async fn cancel(&self, user: UserId) -> Reply {
        self.sessions.reset(user).await;
        info!(user, "dialog.cancelled");
        Reply::Cancelled
    }

    pub async fn status(&self, user: UserId) -> SessionView {
        self.sessions.view(user).await
    }

    /// Comparisons that would still be accepted right now.
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    async fn accept(&self, user: UserId, source: PlaylistSource) -> Reply {
        let first = source.view();
        match self.sessions.submit(user, source).await {
            Submission::Busy => Reply::Busy,
            Submission::AwaitingSecond => Reply::AwaitingSecond { first },
            Submission::Ready(job) => self.dispatch(job).await,
        }
    }

    async fn dispatch(&self, job: Job) -> Reply {
        let job_id = job.id;
        let run = run_job(self.pipeline.clone(), self.sessions.clone(), job.clone());

        match self.pool.submit(run) {
            Ok(_) => Reply::Comparing { job_id },
            Err(e) => {
                warn!(user = job.user, job_id, error = %e, "dialog.overloaded");
                self.sessions.withdraw(&job, OVERLOADED).await;
                Reply::Overloaded {
                    message: OVERLOADED.to_string(),
                }
            }
        }
    }
}

async fn load(pipeline: &Pipeline, source: &PlaylistSource) -> PipelineResult<TrackList> {
    match source {
        PlaylistSource::Link(reference) => pipeline.fetch(reference).await,
        PlaylistSource::Upload(list) => Ok(list.clone()),
    }
}

async fn compare_sources(
    pipeline: Pipeline,
    sessions: SessionStore,
    job: Job,
) -> PipelineResult<ComparisonResult> {
    let a = load(&pipeline, &job.first).await?;
    sessions
        .set_progress(
            &job,
            format!("first: {}; fetching second", tracks_label(a.len())),
        )
        .await;
    let b = load(&pipeline, &job.second).await?;
    Ok(pipeline.compare(&a, &b))
}

// The inner task isolates panics so a crashed comparison still resets the
// session instead of leaving it in `Comparing`.
async fn run_job(pipeline: Pipeline, sessions: SessionStore, job: Job) {
    let inner = tokio::spawn(compare_sources(pipeline, sessions.clone(), job.clone()));

    match inner.await {
        Ok(Ok(result)) => {
            info!(
                user = job.user,
                job_id = job.id,
                matches = result.match_count,
                "job.done"
            );
            sessions.complete(&job, result).await;
        }
        Ok(Err(e)) => {
            warn!(user = job.user, job_id = job.id, error = %e, "job.failed");
            sessions.fail(&job, e.user_message()).await;
        }
        Err(e) => {
            warn!(user = job.user, job_id = job.id, error = %e, "job.crashed");
            sessions.fail(&job, GENERIC_FAILURE).await;
        }
    }
}
