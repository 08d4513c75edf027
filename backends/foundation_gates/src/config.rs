//! TOML configuration for a set of gates.
//!
//! Every section and key is optional; missing values fall back to the
//! classic parameters (a 300-unit, 5-occupant trampoline shared by two
//! categories, a three-group museum, a 12-slot buffer).
//!
//! ```toml
//! [trampoline]
//! capacity_weight = 300
//! capacity_count = 5
//! categories = 2
//!
//! [museum]
//! categories = 3
//!
//! [readers_writers]
//! policy = "writer_preference"
//!
//! [buffer]
//! capacity = 12
//!
//! [salon]
//! max_waiting_clients = 4
//! ```

use std::str::FromStr;

use derive_more::From;
use serde::{Deserialize, Serialize};

use crate::errors::{GateError, GateResult};
use crate::gates::{
    BoundedQueue, CategoryGate, CombinedGate, GuardedCapacityPool, GuardedCountPool,
    ReadersWritersLock, RendezvousConfig, RendezvousPoint, RwPolicy,
};

#[derive(Debug, From)]
pub enum ConfigError {
    IOError(std::io::Error),

    DeserializationFailed(toml::de::Error),

    /// The file parsed but describes gates that cannot be built.
    Invalid(GateError),
}

impl std::error::Error for ConfigError {}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrampolineConfig {
    pub capacity_weight: usize,
    pub capacity_count: usize,
    pub categories: usize,
}

impl Default for TrampolineConfig {
    fn default() -> Self {
        Self {
            capacity_weight: 300,
            capacity_count: 5,
            categories: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MuseumConfig {
    pub categories: usize,
}

impl Default for MuseumConfig {
    fn default() -> Self {
        Self { categories: 3 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadersWritersConfig {
    pub policy: RwPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    pub capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self { capacity: 12 }
    }
}

/// Construction parameters for every gate kind, read once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatesConfig {
    pub trampoline: TrampolineConfig,
    pub museum: MuseumConfig,
    pub readers_writers: ReadersWritersConfig,
    pub buffer: BufferConfig,
    pub salon: RendezvousConfig,
}

impl GatesConfig {
    /// Reads and validates a TOML file.
    ///
    /// # Errors
    ///
    /// IO and parse failures, or [`ConfigError::Invalid`] when a capacity or
    /// category count is zero.
    pub fn from_path<V: Into<std::path::PathBuf>>(target: V) -> ConfigResult<Self> {
        let target_path = target.into();
        let config_content = std::fs::read_to_string(&target_path)?;
        let config: Self = config_content.parse()?;
        crate::info!(path = %target_path.display(), "loaded gates config");
        Ok(config)
    }

    /// Checks every section without building anything.
    ///
    /// # Errors
    ///
    /// The first section that could not be turned into a gate.
    pub fn validate(&self) -> GateResult<()> {
        self.combined_gate()?;
        self.museum_gate()?;
        BoundedQueue::<()>::new(self.buffer.capacity)?;
        Ok(())
    }

    /// The trampoline: weight, count and category rules together.
    ///
    /// # Errors
    ///
    /// Zero weight capacity, count capacity or categories.
    pub fn combined_gate(&self) -> GateResult<CombinedGate> {
        let trampoline = self.trampoline;
        CombinedGate::new(
            trampoline.capacity_weight,
            trampoline.capacity_count,
            trampoline.categories,
        )
    }

    /// # Errors
    ///
    /// Zero weight capacity.
    pub fn capacity_pool(&self) -> GateResult<GuardedCapacityPool> {
        GuardedCapacityPool::new(self.trampoline.capacity_weight)
    }

    /// # Errors
    ///
    /// Zero count capacity.
    pub fn count_pool(&self) -> GateResult<GuardedCountPool> {
        GuardedCountPool::new(self.trampoline.capacity_count)
    }

    /// # Errors
    ///
    /// Zero museum categories.
    pub fn museum_gate(&self) -> GateResult<CategoryGate> {
        CategoryGate::new(self.museum.categories)
    }

    #[must_use]
    pub fn readers_writers(&self) -> ReadersWritersLock {
        ReadersWritersLock::new(self.readers_writers.policy)
    }

    /// # Errors
    ///
    /// Zero buffer capacity.
    pub fn buffer<T>(&self) -> GateResult<BoundedQueue<T>> {
        BoundedQueue::new(self.buffer.capacity)
    }

    #[must_use]
    pub fn salon(&self) -> RendezvousPoint {
        RendezvousPoint::new(self.salon)
    }
}

impl FromStr for GatesConfig {
    type Err = ConfigError;

    fn from_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// WHY: An empty file must still describe the classic gates
    /// WHAT: Parsing "" yields the default parameters
    #[test]
    fn test_empty_config_uses_defaults() {
        let config: GatesConfig = "".parse().unwrap();
        assert_eq!(config, GatesConfig::default());
        assert_eq!(config.trampoline.capacity_weight, 300);
        assert_eq!(config.trampoline.capacity_count, 5);
        assert_eq!(config.buffer.capacity, 12);
        assert_eq!(config.salon.max_waiting_clients, None);
    }

    /// WHY: Partial sections keep defaults for the keys they omit
    /// WHAT: Overriding one key leaves its siblings at their defaults
    #[test]
    fn test_partial_sections() {
        let config: GatesConfig = r#"
            [trampoline]
            capacity_count = 8

            [readers_writers]
            policy = "writer_preference"

            [salon]
            max_waiting_clients = 4
        "#
        .parse()
        .unwrap();

        assert_eq!(config.trampoline.capacity_count, 8);
        assert_eq!(config.trampoline.capacity_weight, 300);
        assert_eq!(config.readers_writers.policy, RwPolicy::WriterPreference);
        assert_eq!(config.salon.max_waiting_clients, Some(4));
        assert_eq!(config.readers_writers().policy(), RwPolicy::WriterPreference);
        assert_eq!(config.combined_gate().unwrap().capacity_count(), 8);
    }

    /// WHY: Zero capacities must be caught when the file is loaded, not at first use
    /// WHAT: A zero buffer capacity is reported as `Invalid`
    #[test]
    fn test_zero_capacity_is_invalid() {
        let err = "[buffer]\ncapacity = 0".parse::<GatesConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref inner) if inner.is_invalid()));
    }

    /// WHY: Malformed files must surface the parser's error
    /// WHAT: A string where a number belongs is `DeserializationFailed`
    #[test]
    fn test_malformed_file() {
        let err = "[museum]\ncategories = \"three\""
            .parse::<GatesConfig>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DeserializationFailed(_)));
    }

    /// WHY: Configuration is normally read from disk
    /// WHAT: `from_path` loads a file and a missing file is an IO error
    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[museum]\ncategories = 4").unwrap();
        file.flush().unwrap();

        let config = GatesConfig::from_path(file.path()).unwrap();
        assert_eq!(config.museum_gate().unwrap().categories(), 4);

        let path = file.path().to_path_buf();
        file.close().unwrap();

        assert!(matches!(
            GatesConfig::from_path(&path).unwrap_err(),
            ConfigError::IOError(_)
        ));
    }
}
