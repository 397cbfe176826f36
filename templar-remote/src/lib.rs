//! # templar-remote
//!
//! Blocking HTTP implementations of the `templar-core` capability traits:
//! [`GithubClient`] (repository), [`ControllerClient`] (Lab/Prod controllers)
//! and [`WebhookNotifier`]. Every request carries an explicit timeout.

pub mod controller;
pub mod github;
mod http;
pub mod notify;

pub use controller::ControllerClient;
pub use github::GithubClient;
pub use notify::WebhookNotifier;
