//! TOML configuration read by the command-line adapter.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use last_stand_core::{LevelConfig, LevelNumber, Loadout};
use last_stand_system_health::{RemovalTiming, DEFAULT_HITS_TO_DIE, DEFAULT_PLAYER_HEALTH};
use last_stand_system_levels::{LevelTable, TableError};
use last_stand_system_records::RecordLayout;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Reasons the configuration file may be rejected.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid level table")]
    Levels(#[from] TableError),
    #[error("`{field}` must be a finite, non-negative number of seconds")]
    InvalidDuration { field: &'static str },
}

/// One row of the `[[levels]]` table.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LevelEntry {
    pub(crate) level: u32,
    pub(crate) entity_count: u32,
    pub(crate) time_limit_secs: u64,
    #[serde(default)]
    pub(crate) magazine_size: Option<u32>,
    #[serde(default)]
    pub(crate) reserve_ammo: Option<u32>,
}

impl LevelEntry {
    fn loadout(&self) -> Loadout {
        Loadout::new(
            self.magazine_size.unwrap_or(Loadout::DEFAULT.magazine_size()),
            self.reserve_ammo.unwrap_or(Loadout::DEFAULT.reserve()),
        )
    }
}

/// Settings shared by every subcommand.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfig {
    pub(crate) store_path: PathBuf,
    pub(crate) record_layout: RecordLayout,
    pub(crate) default_time_limit_secs: u64,
    pub(crate) default_hits_to_die: u32,
    pub(crate) player_max_health: f32,
    pub(crate) fade_delay_secs: f32,
    pub(crate) fade_duration_secs: f32,
    pub(crate) reload_time_secs: f32,
    pub(crate) levels: Option<Vec<LevelEntry>>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("last_stand_prefs.json"),
            record_layout: RecordLayout::default(),
            default_time_limit_secs: 180,
            default_hits_to_die: DEFAULT_HITS_TO_DIE,
            player_max_health: DEFAULT_PLAYER_HEALTH,
            fade_delay_secs: 2.0,
            fade_duration_secs: 2.0,
            reload_time_secs: 3.0,
            levels: None,
        }
    }
}

impl GameConfig {
    /// Loads the configuration at `path`. A missing file yields the defaults.
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "config_missing_using_defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config = Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let _ = config.level_table()?;
        let _ = config.removal_timing()?;
        let _ = seconds("reload_time_secs", config.reload_time_secs)?;
        Ok(config)
    }

    /// Parses configuration text without validating it.
    pub(crate) fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Level table declared by the file, or the built-in one.
    pub(crate) fn level_table(&self) -> Result<LevelTable, ConfigError> {
        let Some(entries) = &self.levels else {
            return Ok(LevelTable::default());
        };

        let levels = entries
            .iter()
            .map(|entry| {
                LevelConfig::new(
                    LevelNumber::new(entry.level),
                    entry.entity_count,
                    Duration::from_secs(entry.time_limit_secs),
                )
                .with_loadout(entry.loadout())
            })
            .collect();
        Ok(LevelTable::new(levels)?)
    }

    /// Corpse fade timing.
    pub(crate) fn removal_timing(&self) -> Result<RemovalTiming, ConfigError> {
        Ok(RemovalTiming::new(
            seconds("fade_delay_secs", self.fade_delay_secs)?,
            seconds("fade_duration_secs", self.fade_duration_secs)?,
        ))
    }

    /// Arena configuration derived from the file.
    pub(crate) fn arena_config(&self) -> Result<last_stand_world::Config, ConfigError> {
        Ok(last_stand_world::Config::new(
            last_stand_system_health::Config::new(self.default_hits_to_die, self.removal_timing()?),
            last_stand_system_session::Config::new(Duration::from_secs(
                self.default_time_limit_secs,
            )),
            self.player_max_health,
            seconds("reload_time_secs", self.reload_time_secs)?,
        ))
    }
}

fn seconds(field: &'static str, value: f32) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f32(value).map_err(|_| ConfigError::InvalidDuration { field })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = GameConfig::parse("").expect("parse");
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.level_table().expect("table"), LevelTable::default());
    }

    #[test]
    fn custom_levels_replace_the_built_in_table() {
        let config = GameConfig::parse(
            r#"
            record_layout = "flat"

            [[levels]]
            level = 1
            entity_count = 5
            time_limit_secs = 60

            [[levels]]
            level = 2
            entity_count = 8
            time_limit_secs = 90
            "#,
        )
        .expect("parse");

        let table = config.level_table().expect("table");
        assert_eq!(config.record_layout, RecordLayout::Flat);
        assert_eq!(table.max_level(), LevelNumber::new(2));
        assert_eq!(table.config(LevelNumber::new(2)).entity_count(), 8);
    }

    #[test]
    fn gaps_in_level_numbers_are_rejected() {
        let config = GameConfig::parse(
            r#"
            [[levels]]
            level = 1
            entity_count = 5
            time_limit_secs = 60

            [[levels]]
            level = 3
            entity_count = 8
            time_limit_secs = 90
            "#,
        )
        .expect("parse");

        assert!(matches!(
            config.level_table(),
            Err(ConfigError::Levels(TableError::NonContiguous { index: 1, .. }))
        ));
    }

    #[test]
    fn levels_without_ammo_fields_get_the_default_loadout() {
        let config = GameConfig::parse(
            r#"
            reload_time_secs = 1.5

            [[levels]]
            level = 1
            entity_count = 5
            time_limit_secs = 60

            [[levels]]
            level = 2
            entity_count = 8
            time_limit_secs = 90
            magazine_size = 12
            reserve_ammo = 48
            "#,
        )
        .expect("parse");

        let table = config.level_table().expect("table");
        assert_eq!(table.config(LevelNumber::new(1)).loadout(), Loadout::DEFAULT);
        assert_eq!(
            table.config(LevelNumber::new(2)).loadout(),
            Loadout::new(12, 48)
        );
        assert_eq!(
            config.arena_config().expect("arena").reload_time(),
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn negative_reload_time_is_rejected() {
        let config = GameConfig::parse("reload_time_secs = -2.0").expect("parse");
        assert!(matches!(
            config.arena_config(),
            Err(ConfigError::InvalidDuration {
                field: "reload_time_secs"
            })
        ));
    }

    #[test]
    fn negative_fade_is_rejected() {
        let config = GameConfig::parse("fade_delay_secs = -1.0").expect("parse");
        assert!(matches!(
            config.removal_timing(),
            Err(ConfigError::InvalidDuration {
                field: "fade_delay_secs"
            })
        ));
    }

    #[test]
    fn unknown_keys_fail_to_parse() {
        assert!(GameConfig::parse("zombies = 3").is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join(format!(
            "last-stand-missing-config-{}.toml",
            std::process::id()
        ));
        assert_eq!(GameConfig::load(&path).expect("load"), GameConfig::default());
    }
}
