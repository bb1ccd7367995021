//! Loading settings from files and the environment into a [`FlatMap`](crate::FlatMap)
//! and binding the result.

mod builder;
mod env;
mod error;
mod file;
mod resolve;
mod source;

pub use builder::Config;
pub use env::EnvSource;
pub use error::ConfigError;
pub use file::{flatten_toml, FileFormat, FileSource};
pub use resolve::resolve_references;
pub use source::ConfigSource;
