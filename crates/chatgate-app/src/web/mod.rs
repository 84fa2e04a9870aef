// Web frontend module - HTTP surface of the gateway
pub mod encoder;
pub mod error;
pub mod routes;
pub mod server;

pub use error::GatewayError;
pub use routes::{create_router, AppState, GatewaySettings};
pub use server::{WebServer, WebServerConfig};
