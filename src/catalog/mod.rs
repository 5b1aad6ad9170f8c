//! Catalog logic that runs entirely on this side of the remote interface.
//!
//! Nothing here touches the transport: classification, semester ordering, search
//! filtering and page views all operate on plain snapshots.

mod classify;
mod search;
mod semester;
mod views;

pub use search::*;
pub use views::*;
