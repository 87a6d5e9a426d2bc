pub mod config;
pub mod error;
pub mod http;
pub mod mcp;
pub mod server;
pub mod tools;
pub mod types;

pub use config::Config;
pub use error::ApiError;
pub use http::ApiClient;
