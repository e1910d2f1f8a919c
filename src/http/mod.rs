//! HTTP transport boundary.

mod handlers;
mod server;

pub use handlers::router;
pub use server::HttpServer;
