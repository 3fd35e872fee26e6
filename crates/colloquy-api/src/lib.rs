pub mod bootstrap;
pub mod config;
pub mod error;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod state;

pub use bootstrap::{build_assistant, Storage};
pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use server::{build_router, init_logging, serve};
pub use state::AppState;
