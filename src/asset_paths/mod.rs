//! Helpers for classifying and rewriting asset paths before they reach the file provider.
//!
//! The responsibilities are split into focused submodules so that external-reference filtering,
//! query string handling and application-name normalisation can be tested independently of the
//! version provider that combines them.

mod app_name;
mod filters;
mod query;

pub use app_name::strip_app_name;
pub use filters::is_external_path;
pub use query::{AssetPathParts, append_query_parameter, split_asset_path};
