mod dialog;
mod dispatch;
mod session;

pub use dialog::Dialog;
pub use dialog::Reply;
pub use dispatch::JobPool;
pub use dispatch::PoolSaturated;
pub use session::DEFAULT_SESSION_IDLE;
pub use session::Job;
pub use session::PlaylistSource;
pub use session::SessionStore;
pub use session::SessionView;
pub use session::SourceView;
pub use session::Stage;
pub use session::Submission;
pub use session::UserId;
