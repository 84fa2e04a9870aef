pub mod models;
pub mod web_server;

pub use models::print_models;
pub use web_server::run_web_server;
