pub mod client;
pub mod loader;
pub mod models;
pub mod source;
pub(crate) mod wire;

#[cfg(test)]
mod client_test;

pub use client::AzureDevOpsClient;
pub use loader::{FetchQuery, LoaderOptions, PullRequestLoader};
pub use models::*;
