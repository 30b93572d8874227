use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    track::TrackList,
    types::{ComparisonResult, PlaylistReference, Service},
};

pub type UserId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    AwaitFirst,
    AwaitSecond,
    Comparing,
    Done,
}

/// One side of a comparison as the user supplied it.
#[derive(Debug, Clone)]
pub enum PlaylistSource {
    Link(PlaylistReference),
    Upload(TrackList),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceView {
    Link {
        service: Service,
        canonical_id: String,
    },
    Upload {
        tracks: usize,
    },
}

impl PlaylistSource {
    pub fn view(&self) -> SourceView {
        match self {
            PlaylistSource::Link(reference) => SourceView::Link {
                service: reference.service(),
                canonical_id: reference.canonical_id().to_string(),
            },
            PlaylistSource::Upload(list) => SourceView::Upload { tracks: list.len() },
        }
    }
}

#[derive(Debug, Clone)]
struct Session {
    stage: Stage,
    first: Option<PlaylistSource>,
    second: Option<PlaylistSource>,
    job_id: u64,
    progress: Option<String>,
    result: Option<ComparisonResult>,
    notice: Option<String>,
    updated_at: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            stage: Stage::AwaitFirst,
            first: None,
            second: None,
            job_id: 0,
            progress: None,
            result: None,
            notice: None,
            updated_at: Utc::now(),
        }
    }
}

/// Snapshot of a session, safe to hand out.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub user: UserId,
    pub stage: Stage,
    pub first: Option<SourceView>,
    pub second: Option<SourceView>,
    pub progress: Option<String>,
    pub result: Option<ComparisonResult>,
    pub notice: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    fn view(&self, user: UserId) -> SessionView {
        SessionView {
            user,
            stage: self.stage,
            first: self.first.as_ref().map(PlaylistSource::view),
            second: self.second.as_ref().map(PlaylistSource::view),
            progress: self.progress.clone(),
            result: self.result.clone(),
            notice: self.notice.clone(),
            updated_at: self.updated_at,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    // A running job still writes into its session, so it is never idle.
    fn is_idle(&self, now: DateTime<Utc>, idle: TimeDelta) -> bool {
        self.stage != Stage::Comparing && now - self.updated_at >= idle
    }
}

/// How long an untouched session is kept by default.
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

/// A comparison ready to run. `id` ties its writes to the session that
/// created it.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: u64,
    pub user: UserId,
    pub first: PlaylistSource,
    pub second: PlaylistSource,
}

#[derive(Debug)]
pub enum Submission {
    /// The first playlist was stored.
    AwaitingSecond,
    /// Both playlists are in; the job must be dispatched.
    Ready(Job),
    /// A comparison is already running for this user.
    Busy,
}

/// Per-user stage machines.
///
/// Every transition happens under one lock, and writes coming from a job are
/// dropped unless the job id still matches, so a job finishing after a cancel
/// never touches the fresh session.
///
/// Only a submission creates an entry. Reading a user that has none yields a
/// fresh view without storing it, and entries left alone for longer than the
/// idle timeout are dropped on the next submission.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<UserId, Session>>>,
    next_job: Arc<AtomicU64>,
    idle: TimeDelta,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_SESSION_IDLE)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            next_job: Arc::new(AtomicU64::new(0)),
            idle: TimeDelta::from_std(idle).unwrap_or(TimeDelta::MAX),
        }
    }

    pub async fn view(&self, user: UserId) -> SessionView {
        let sessions = self.sessions.lock().await;
        match sessions.get(&user) {
            Some(session) => session.view(user),
            None => Session::default().view(user),
        }
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops every idle session and returns how many went.
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        self.evict_locked(&mut sessions, None)
    }

    fn evict_locked(&self, sessions: &mut HashMap<UserId, Session>, keep: Option<UserId>) -> usize {
        let now = Utc::now();
        let before = sessions.len();
        sessions.retain(|user, session| Some(*user) == keep || !session.is_idle(now, self.idle));
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, remaining = sessions.len(), "sessions.evicted");
        }
        evicted
    }

    pub async fn submit(&self, user: UserId, source: PlaylistSource) -> Submission {
        let mut sessions = self.sessions.lock().await;
        self.evict_locked(&mut sessions, Some(user));
        let session = sessions.entry(user).or_default();

        match session.stage {
            Stage::Comparing => return Submission::Busy,
            Stage::Done => *session = Session::default(),
            Stage::AwaitFirst | Stage::AwaitSecond => {}
        }
        session.notice = None;
        session.touch();

        let Some(first) = session.first.clone() else {
            session.first = Some(source);
            session.stage = Stage::AwaitSecond;
            return Submission::AwaitingSecond;
        };

        let id = self.next_job.fetch_add(1, Ordering::Relaxed) + 1;
        session.second = Some(source.clone());
        session.stage = Stage::Comparing;
        session.job_id = id;
        session.progress = None;
        Submission::Ready(Job {
            id,
            user,
            first,
            second: source,
        })
    }

    /// Puts a job that could not be dispatched back to waiting for the
    /// second playlist.
    pub async fn withdraw(&self, job: &Job, notice: impl Into<String>) {
        self.update(job, |session| {
            session.stage = Stage::AwaitSecond;
            session.second = None;
            session.job_id = 0;
            session.notice = Some(notice.into());
        })
        .await;
    }

    pub async fn set_progress(&self, job: &Job, progress: impl Into<String>) -> bool {
        self.update(job, |session| session.progress = Some(progress.into()))
            .await
    }

    pub async fn complete(&self, job: &Job, result: ComparisonResult) -> bool {
        self.update(job, |session| {
            session.stage = Stage::Done;
            session.progress = None;
            session.result = Some(result);
        })
        .await
    }

    /// Resets the session after a failed job, leaving `notice` for the user.
    pub async fn fail(&self, job: &Job, notice: impl Into<String>) -> bool {
        self.update(job, |session| {
            *session = Session {
                notice: Some(notice.into()),
                ..Session::default()
            };
        })
        .await
    }

    pub async fn reset(&self, user: UserId) -> SessionView {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(&user);
        Session::default().view(user)
    }

    async fn update(&self, job: &Job, change: impl FnOnce(&mut Session)) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(&job.user) {
            Some(session) if session.job_id == job.id && session.stage == Stage::Comparing => {
                change(session);
                session.touch();
                true
            }
            _ => false,
        }
    }
}
