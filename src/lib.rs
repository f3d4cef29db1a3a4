#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod asset_paths;
pub mod cache;
pub mod change_token;
pub mod config;
pub mod configure;
pub mod file_provider;
pub mod logging;
pub mod markup;
pub mod version;

pub use cache::{CacheEntryContext, MemoryVersionCache, VersionCache};
pub use change_token::ChangeToken;
pub use configure::{
    ConfigureError, ConfigureTagHelper, TagHelper, TagHelperConfigurator, ViewContext,
};
pub use file_provider::{FileInfo, FileProvider, MemoryFileProvider, PhysicalFileProvider};
pub use version::{FileVersionProvider, VERSION_KEY, VersionError};
