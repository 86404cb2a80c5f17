//! HTTP surface for the item store.
//!
//! `api` maps REST requests onto `itemstore_core`; `server` runs it on
//! tiny_http; `config` and `app` wire a deployment together.

pub mod api;
pub mod app;
pub mod config;
pub mod http;
pub mod server;

pub use api::{ApiSettings, ItemApi, MutationResponse};
pub use app::{build_api, open_repository, run, AppError};
pub use config::{load_config, AppConfig, ConfigError, StorageBackend};
pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpService, HttpStatus};
pub use server::{start_server, ServerError, ServerHandle};
