//! # API Module
//!
//! HTTP endpoints of the dialog server. A chat front end, or anything else
//! that speaks HTTP, relays each user's messages here and polls the session
//! for the outcome.
//!
//! ## Endpoints
//!
//! - `GET /health` - status, version and how many more comparisons would be
//!   accepted right now
//! - `GET /sessions/{user}` - the user's current stage, progress and result
//! - `POST /sessions/{user}/text` - a pasted link or embed snippet as
//!   `{"text": "..."}`
//! - `POST /sessions/{user}/file` - an exported track list as the raw body
//! - `DELETE /sessions/{user}` - cancel and start over
//!
//! Submissions answer with a tagged [`crate::management::Reply`]. The status
//! code follows the reply: `202` once a comparison is queued, `409` while one
//! is still running, `422` for input that is not a playlist, `503` when the
//! job pool is full.

mod health;
mod sessions;

pub use health::health;
pub use sessions::TextSubmission;
pub use sessions::delete_session;
pub use sessions::get_session;
pub use sessions::post_file;
pub use sessions::post_text;
