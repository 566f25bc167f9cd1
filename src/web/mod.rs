//! HTTP surface for the transfer workflows.

mod error;
mod handlers;
mod server;
mod upload;

pub use error::ApiError;
pub use server::{router, serve, AppState};
