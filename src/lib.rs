pub mod config;
pub mod dupes;
pub mod error;
pub mod listing;
pub mod live;
pub mod logging;
pub mod reconcile;
pub mod venues;
