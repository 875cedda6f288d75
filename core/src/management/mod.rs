//! Management-plane REST client: typed models, paged list operations,
//! and the typed error family for service HTTP failures.

pub mod client;
pub mod errors;
pub mod models;

pub use client::{ManagementClient, ManagementClientBuilder};
pub use errors::ManagementError;
pub use models::{ListResponse, Resource, ResourceGroup, Subscription};
