//! Periodic refresh with exponential backoff.
//!
//! [`RefreshTimer`] decides *when* the next refresh is due — one interval
//! after a success, a jittered exponential backoff after a failure.
//! [`RefreshService`] runs the loop: it drives any [`Refreshable`] source
//! off the timer as a background task with a shutdown signal and an
//! optional failure callback.

pub mod service;
pub mod timer;

pub use service::{RefreshFailureCallback, RefreshService, Refreshable};
pub use timer::{RefreshError, RefreshTimer, RefreshTimerConfig};
