use super::source::ConfigSource;
use super::ConfigError;
use crate::FlatMap;

/// Reads settings from environment variables.
///
/// `{prefix}{separator}Server{separator}Port=8080` becomes the key
/// `Server.Port`. Letter case is preserved since keys are case-sensitive.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    separator: String,
}

impl EnvSource {
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        assert!(!separator.is_empty(), "separator must not be empty");
        Self {
            prefix: prefix.into(),
            separator,
        }
    }

    /// Builds the mapping from an explicit list of variables.
    pub fn entries_from<I>(&self, vars: I) -> FlatMap
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let prefix_with_sep = format!("{}{}", self.prefix, self.separator);
        let mut map = FlatMap::new();

        for (name, value) in vars {
            if let Some(path) = name.strip_prefix(&prefix_with_sep) {
                if path.is_empty() {
                    continue;
                }
                map.push(path.replace(&self.separator, "."), value);
            }
        }

        map
    }
}

impl ConfigSource for EnvSource {
    fn mapping(&self) -> Result<FlatMap, ConfigError> {
        Ok(self.entries_from(std::env::vars()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_prefix_is_stripped_and_separator_becomes_dot() {
        let source = EnvSource::new("MYAPP", "__");
        let map = source.entries_from(vars(&[
            ("MYAPP__Server__Port", "8080"),
            ("MYAPP__Name", "demo"),
            ("OTHER__Name", "skip"),
            ("MYAPP__", "skip"),
        ]));

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("Server.Port"), Some("8080"));
        assert_eq!(map.get("Name"), Some("demo"));
    }

    #[test]
    fn test_case_is_preserved() {
        let source = EnvSource::new("APP", "_");
        let map = source.entries_from(vars(&[("APP_Db_Host", "h")]));
        assert_eq!(map.get("Db.Host"), Some("h"));
        assert_eq!(map.get("db.host"), None);
    }

    #[test]
    #[should_panic(expected = "separator must not be empty")]
    fn test_empty_separator_panics() {
        EnvSource::new("APP", "");
    }
}
