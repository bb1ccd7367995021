use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::env::EnvSource;
use super::file::FileSource;
use super::resolve;
use super::source::ConfigSource;
use crate::bind::{self, BindOptions};
use crate::{Error, FlatMap, Validate};

/// Builder for binding a typed object from layered settings sources.
///
/// Sources are combined in registration order and the FIRST source that
/// defines a key wins, so register overrides before defaults.
///
/// ## Key References
///
/// With [`resolve_references(true)`](Self::resolve_references), values can
/// reference other keys using `${Path.To.Key}` syntax:
///
/// ```toml
/// [Server]
/// Host = "localhost"
/// Port = 8080
/// Url = "http://${Server.Host}:${Server.Port}/api"
/// ```
///
/// Use `$$` to escape a literal `$` (e.g., `$${VAR}` becomes `${VAR}`).
///
/// ## Example
///
/// ```no_run
/// use dotbind::{Config, Validate};
/// use serde::Deserialize;
///
/// #[derive(Debug, Default, Deserialize)]
/// #[serde(default, rename_all = "PascalCase")]
/// struct Server {
///     host: String,
///     port: u16,
/// }
///
/// impl Validate for Server {}
///
/// let server: Server = Config::builder()
///     .with_env("MYAPP", "__")
///     .with_file("config/local.toml", false)
///     .with_file("config/default.toml", true)
///     .build()?;
/// # Ok::<(), dotbind::Error>(())
/// ```
#[derive(Debug, Default)]
#[must_use = "builders do nothing until .build() is called"]
pub struct Config {
    sources: Vec<Box<dyn ConfigSource>>,
    options: BindOptions,
    resolve_references: bool,
}

impl Config {
    /// Creates a new configuration builder.
    pub fn builder() -> Self {
        Self::default()
    }

    /// Adds an in-memory mapping.
    pub fn with_mapping(self, map: FlatMap) -> Self {
        self.with_source(map)
    }

    /// Adds a settings file, TOML or INI by extension.
    ///
    /// If `required` is `true`, the build will fail if the file doesn't exist.
    /// Optional files that are missing are silently skipped.
    pub fn with_file(self, path: impl AsRef<Path>, required: bool) -> Self {
        self.with_source(FileSource::new(path, required))
    }

    /// Adds environment variables starting with `{prefix}{separator}`.
    ///
    /// With prefix `MYAPP` and separator `__`, `MYAPP__Server__Port=8080`
    /// supplies the key `Server.Port`.
    pub fn with_env(self, prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        self.with_source(EnvSource::new(prefix, separator))
    }

    pub fn with_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Root key prefix. Defaults to the target type's name.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options = self.options.prefix(prefix);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.options = self.options.required(required);
        self
    }

    pub fn validate(mut self, validate: bool) -> Self {
        self.options = self.options.validate(validate);
        self
    }

    /// Expand `${Key}` references after combining. Off by default, leaving
    /// every value exactly as its source supplied it.
    pub fn resolve_references(mut self, enabled: bool) -> Self {
        self.resolve_references = enabled;
        self
    }

    /// Loads every source, combines them, optionally resolves references and
    /// binds `T`.
    pub fn build<T>(self) -> Result<T, Error>
    where
        T: DeserializeOwned + Default + Validate,
    {
        let map = self.load()?;
        Ok(bind::create_object(&map, &self.options)?)
    }

    /// Loads and combines the sources without binding.
    pub fn load(&self) -> Result<FlatMap, Error> {
        let mut layers = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            let layer = source.mapping()?;
            debug!(?source, keys = layer.len(), "loaded config source");
            layers.push(layer);
        }

        let mut merged = match layers.split_first() {
            Some((first, rest)) => first.combine(&rest.iter().collect::<Vec<_>>()),
            None => FlatMap::new(),
        };

        if self.resolve_references {
            resolve::resolve_references(&mut merged)?;
        }
        Ok(merged)
    }
}
