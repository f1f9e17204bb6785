//! SharedFiles API Library
//!
//! HTTP surface of the file service: handlers, authentication, error rendering
//! and application setup.

mod api_doc;
mod handlers;
pub mod setup;

pub mod auth;
pub mod error;
pub mod state;

pub use api_doc::get_openapi_spec;
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
