mod client;
mod error;
#[cfg(test)]
pub mod mock;
pub mod payload;

pub use client::{DashboardApi, HttpApi};
pub use error::{FetchError, FetchResult};
