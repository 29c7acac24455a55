//! The resource store and JSON:API document handling.
//!
//! - [`ResourceStore`]: Identity map plus find, query, find-all, save and
//!   delete orchestration over a [`Transport`](crate::clients::Transport)
//! - [`ClassRegistry`]: Type names to [`ResourceSchema`](crate::ResourceSchema)s
//! - [`validate_top_level_json_response`] / [`handle_top_level_error_response`]:
//!   Envelope checks and error classification
//! - [`resource_address`]: `{type}` and `{type}/{id}` request paths

mod address;
mod document;
mod registry;
#[allow(clippy::module_inception)]
mod store;

pub use address::resource_address;
pub use document::{handle_top_level_error_response, validate_top_level_json_response};
pub use registry::ClassRegistry;
pub use store::{QueryParams, ResourceStore};
