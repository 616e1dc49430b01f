//! HTTP surface for the transformed-entity cache and sync protocol
//! (spec.md §4.9, §6): a thin translation of `(path, body)` into the core
//! operations defined in `prowhey-store`/`prowhey-ingest`.

pub mod config;
pub mod error;
pub mod macros;
pub mod middleware;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use state::AppState;
