//! # CLI Module
//!
//! Command bodies for the `plmatch` binary. Each command prints through the
//! crate's output macros, shows a spinner while the network is busy and
//! renders track lists with `tabled`.
//!
//! - [`compare`] - both playlists, the overlap and the similarity per side
//! - [`fetch`] - the deduplicated tracks of one playlist or file
//! - [`resolve`] - the canonical form of a pasted link
//! - [`serve`] - the HTTP dialog server
//!
//! Arguments that name an existing file are imported as exported track lists;
//! everything else goes through the canonicalizer.

mod compare;
mod fetch;
mod resolve;
mod serve;

pub use compare::compare;
pub use fetch::fetch;
pub use resolve::resolve;
pub use serve::serve;
