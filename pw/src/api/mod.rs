//! HTTP API surface consumed by the chat layer

mod routes;
mod server;

pub use server::{AppState, router, run};
