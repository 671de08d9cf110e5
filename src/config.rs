use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::table::PageSize;

/// Dashboard tuning knobs. Every field has a default, so a partial (or
/// missing) config file is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Assignment groups shown in the backlog-by-group breakdown.
    pub top_groups: usize,
    /// Assignees shown in the backlog-by-assignee breakdown.
    pub top_assignees: usize,
    /// Leaderboard rows shown after ranking.
    pub leaderboard_limit: usize,
    pub default_page_size: u32,
    /// Daily series over an unbounded range are clamped to this many days.
    pub max_series_days: u32,

    pub backlog_high: usize,
    pub backlog_moderate: usize,
    pub sla_high_below: f64,
    pub sla_moderate_below: f64,
    pub mttr_high_hours: f64,
    pub mttr_moderate_hours: f64,
    pub reopen_high_pct: f64,
    pub reopen_moderate_pct: f64,
    pub high_hop_high: usize,
    pub high_hop_moderate: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            top_groups: 10,
            top_assignees: 10,
            leaderboard_limit: 50,
            default_page_size: 50,
            max_series_days: 90,
            backlog_high: 400,
            backlog_moderate: 200,
            sla_high_below: 85.0,
            sla_moderate_below: 95.0,
            mttr_high_hours: 24.0,
            mttr_moderate_hours: 12.0,
            reopen_high_pct: 5.0,
            reopen_moderate_pct: 3.0,
            high_hop_high: 50,
            high_hop_moderate: 30,
        }
    }
}

/// `~/.ticketdash`. Not created here; [`Config::save_to`] creates it on write.
pub fn data_dir() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .ok_or_else(|| Error::Config("cannot determine home directory".into()))?
        .join(".ticketdash"))
}

impl Config {
    /// Load from the default path (`~/.ticketdash/config.json`).
    pub fn load() -> Result<Self> {
        Self::load_from(data_dir()?.join("config.json"))
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn page_size(&self) -> PageSize {
        PageSize::from_rows(self.default_page_size).unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        if PageSize::from_rows(self.default_page_size).is_none() {
            return Err(Error::Config(format!(
                "default_page_size must be one of {:?}, got {}",
                PageSize::ALL.map(|p| p.rows()),
                self.default_page_size
            )));
        }
        if self.backlog_moderate > self.backlog_high
            || self.high_hop_moderate > self.high_hop_high
            || self.mttr_moderate_hours > self.mttr_high_hours
            || self.reopen_moderate_pct > self.reopen_high_pct
            || self.sla_high_below > self.sla_moderate_below
        {
            return Err(Error::Config(
                "moderate thresholds must sit between low and high".into(),
            ));
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = serde_json::to_value(self)?;
        Ok(value.get(key).map(|v| v.to_string()))
    }

    /// Set one key from its textual form. The value must parse as the
    /// field's type, and the resulting config must validate.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut map = match serde_json::to_value(&*self)? {
            serde_json::Value::Object(map) => map,
            _ => return Err(Error::Other("config did not serialize to an object".into())),
        };
        if !map.contains_key(key) {
            return Err(Error::NotFound(format!("config key {key}")));
        }
        let parsed: serde_json::Value = serde_json::from_str(value.trim())
            .map_err(|_| Error::Config(format!("{key}: not a number: {value}")))?;
        map.insert(key.to_string(), parsed);
        let updated: Config = serde_json::from_value(serde_json::Value::Object(map))
            .map_err(|e| Error::Config(format!("{key}: {e}")))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// All keys and values, sorted by key.
    pub fn list(&self) -> Result<Vec<(String, String)>> {
        let value = serde_json::to_value(self)?;
        let mut items: Vec<(String, String)> = value
            .as_object()
            .map(|map| map.iter().map(|(k, v)| (k.clone(), v.to_string())).collect())
            .unwrap_or_default();
        items.sort();
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path().join("nope.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"top_groups": 5}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.top_groups, 5);
        assert_eq!(config.leaderboard_limit, 50);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::default();
        config.set("leaderboard_limit", "25").unwrap();
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().leaderboard_limit, 25);
    }

    #[test]
    fn test_reading_never_creates_the_data_dir() {
        let home = tempfile::tempdir().unwrap();
        std::env::set_var("HOME", home.path());
        let dir = data_dir().unwrap();
        assert_eq!(dir, home.path().join(".ticketdash"));

        assert_eq!(Config::load().unwrap(), Config::default());
        assert!(!dir.exists());

        Config::default().save_to(dir.join("config.json")).unwrap();
        assert!(dir.join("config.json").exists());
    }

    #[test]
    fn test_get_and_list() {
        let config = Config::default();
        assert_eq!(config.get("top_groups").unwrap().as_deref(), Some("10"));
        assert_eq!(config.get("missing").unwrap(), None);
        let items = config.list().unwrap();
        assert!(items.windows(2).all(|w| w[0].0 <= w[1].0));
        assert!(items.iter().any(|(k, _)| k == "max_series_days"));
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("unknown_key", "1").is_err());
        assert!(config.set("top_groups", "ten").is_err());
        assert!(config.set("top_groups", "-1").is_err());
        assert!(config.set("default_page_size", "30").is_err());
        assert!(config.set("backlog_moderate", "1000").is_err());
        assert_eq!(config, Config::default());

        config.set("default_page_size", "100").unwrap();
        assert_eq!(config.page_size(), PageSize::Hundred);
    }
}
