//! File-based configuration source.

use std::path::{Path, PathBuf};

use toml::{Table, Value};
use tracing::debug;

use super::source::ConfigSource;
use super::ConfigError;
use crate::FlatMap;

/// How a settings file is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// TOML, flattened into dotted keys: `[server] port = 1` becomes
    /// `server.port`, array items become `hosts[0]`.
    Toml,
    /// `key = value` lines. `#` and `;` start comments, and a `[Section]`
    /// header prefixes the keys below it with `Section.`.
    Ini,
}

impl FileFormat {
    /// `.toml` files are TOML; anything else is read as INI.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Ini,
        }
    }
}

/// A configuration source that loads a settings file.
///
/// Files can be marked as required or optional. Required files that don't exist
/// cause an error; optional files that don't exist are silently skipped.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    required: bool,
    format: FileFormat,
}

impl FileSource {
    /// Creates a new file source, picking the format from the extension.
    ///
    /// If `required` is true, loading fails if the file doesn't exist.
    pub fn new(path: impl AsRef<Path>, required: bool) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            format: FileFormat::from_path(&path),
            path,
            required,
        }
    }

    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = format;
        self
    }
}

impl ConfigSource for FileSource {
    fn mapping(&self) -> Result<FlatMap, ConfigError> {
        let Some(contents) = read_config_file(&self.path, self.required)? else {
            debug!(path = %self.path.display(), "optional config file missing, skipping");
            return Ok(FlatMap::new());
        };

        let map = match self.format {
            FileFormat::Toml => {
                let table: Table = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                    path: self.path.clone(),
                    source: e,
                })?;
                flatten_toml(&table)
            }
            FileFormat::Ini => parse_ini(&self.path, &contents)?,
        };

        debug!(path = %self.path.display(), keys = map.len(), "loaded config file");
        Ok(map)
    }
}

/// Reads a config file.
///
/// Returns `Ok(None)` if the file doesn't exist and `required` is false.
fn read_config_file(path: &Path, required: bool) -> Result<Option<String>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if required {
                Err(ConfigError::FileNotFound(path.to_path_buf()))
            } else {
                Ok(None)
            }
        }
        Err(e) => Err(ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Flattens a TOML table into dotted/bracketed keys.
pub fn flatten_toml(table: &Table) -> FlatMap {
    let mut map = FlatMap::new();
    for (key, value) in table {
        flatten_value(&mut map, key.clone(), value);
    }
    map
}

fn flatten_value(map: &mut FlatMap, key: String, value: &Value) {
    match value {
        Value::Table(table) => {
            for (child, value) in table {
                flatten_value(map, format!("{key}.{child}"), value);
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_value(map, format!("{key}[{i}]"), item);
            }
        }
        Value::String(s) => map.push(key, s.as_str()),
        Value::Integer(i) => map.push(key, i.to_string()),
        Value::Float(f) => map.push(key, f.to_string()),
        Value::Boolean(b) => map.push(key, b.to_string()),
        Value::Datetime(dt) => map.push(key, dt.to_string()),
    }
}

fn parse_ini(path: &Path, contents: &str) -> Result<FlatMap, ConfigError> {
    let mut map = FlatMap::new();
    let mut section: Option<&str> = None;

    for (number, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let name = header.strip_suffix(']').ok_or_else(|| ConfigError::IniError {
                path: path.to_path_buf(),
                line: number + 1,
                message: "unclosed section header".to_string(),
            })?;
            section = Some(name.trim()).filter(|name| !name.is_empty());
            continue;
        }

        let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::IniError {
            path: path.to_path_buf(),
            line: number + 1,
            message: "expected 'key = value'".to_string(),
        })?;

        let key = key.trim();
        let value = value.trim();
        match section {
            Some(section) => map.push(format!("{section}.{key}"), value),
            None => map.push(key, value),
        }
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    #[test]
    fn test_file_source_loads_toml() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            [Server]
            Host = "localhost"
            Port = 8080
            Tags = ["a", "b"]

            [[Server.Routes]]
            Path = "/api"
            "#
        )
        .unwrap();

        let map = FileSource::new(file.path(), true).mapping().unwrap();

        assert_eq!(map.get("Server.Host"), Some("localhost"));
        assert_eq!(map.get("Server.Port"), Some("8080"));
        assert_eq!(map.get("Server.Tags[1]"), Some("b"));
        assert_eq!(map.get("Server.Routes[0].Path"), Some("/api"));
    }

    #[test]
    fn test_file_source_loads_ini() {
        let mut file = Builder::new().suffix(".ini").tempfile().unwrap();
        writeln!(
            file,
            "# comment\nTop = 1\n\n[Server]\nHost = example.com\n; another\nHosts[0] = a\nEmpty ="
        )
        .unwrap();

        let map = FileSource::new(file.path(), true).mapping().unwrap();

        assert_eq!(map.get("Top"), Some("1"));
        assert_eq!(map.get("Server.Host"), Some("example.com"));
        assert_eq!(map.get("Server.Hosts[0]"), Some("a"));
        assert_eq!(map.get("Server.Empty"), Some(""));
    }

    #[test]
    fn test_ini_line_without_equals() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Good = 1\nbad line").unwrap();

        let result = FileSource::new(file.path(), true)
            .with_format(FileFormat::Ini)
            .mapping();

        assert!(matches!(result, Err(ConfigError::IniError { line: 2, .. })));
    }

    #[test]
    fn test_invalid_toml() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "key = ").unwrap();

        let result = FileSource::new(file.path(), true).mapping();
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_file_source_required_missing() {
        let source = FileSource::new("/nonexistent/path/config.toml", true);
        let result = source.mapping();

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_file_source_optional_missing() {
        let source = FileSource::new("/nonexistent/path/config.toml", false);
        let map = source.mapping().unwrap();

        assert!(map.is_empty());
    }
}
