//! Data models for the study catalog.
//!
//! Field names follow the remote backend interface so snapshots can be passed through unchanged.

mod account;
mod catalog;
mod requests;

pub use account::*;
pub use catalog::*;
pub use requests::*;
