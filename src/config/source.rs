use crate::FlatMap;

use super::ConfigError;

/// Something that produces a flat mapping of settings.
pub trait ConfigSource: Send + Sync + std::fmt::Debug {
    fn mapping(&self) -> Result<FlatMap, ConfigError>;
}

impl ConfigSource for FlatMap {
    fn mapping(&self) -> Result<FlatMap, ConfigError> {
        Ok(self.clone())
    }
}
