//! Shared utility helpers.
//!
//! Currently this is environment variable access with validation; see
//! [`env`] for the rules applied to values sourced from the process
//! environment.

pub mod env;
