//! Binds flat `Key = Value` settings into typed, nested objects.
//!
//! Keys name a path through the target: `Server.Port` is the `Port` property
//! of a `Server` root, `Server.Hosts[0]` the first element of its `Hosts`
//! list and `Server.Limits[Upload]` the `Upload` entry of a map. Mappings
//! from several places are layered with [`combine`], the first mapping to
//! define a key winning, and [`Config`] wires files and environment
//! variables into that pipeline.

pub mod bind;
pub mod config;
mod error;
mod key;
mod mapping;
pub mod validate;

pub use bind::{create_object, BindError, BindOptions};
pub use config::{Config, ConfigError};
pub use error::Error;
pub use mapping::{combine, FlatMap};
pub use validate::{Validate, ValidationError};
