#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level registry that parameterises play sessions and remembers the
//! player's current level across restarts.

use std::time::Duration;

use last_stand_core::{KeyValueStore, LevelConfig, LevelNumber, Loadout, SelectedLevel};
use thiserror::Error;
use tracing::{info, warn};

/// Key under which the current level selection is persisted.
pub const CURRENT_LEVEL_KEY: &str = "CurrentLevel";

const DEFAULT_LEVELS: [LevelConfig; 3] = [
    LevelConfig::new(LevelNumber::new(1), 20, Duration::from_secs(180)),
    LevelConfig::new(LevelNumber::new(2), 30, Duration::from_secs(240))
        .with_loadout(Loadout::new(25, 225)),
    LevelConfig::new(LevelNumber::new(3), 40, Duration::from_secs(300))
        .with_loadout(Loadout::new(30, 360)),
];

/// Reasons a level table may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TableError {
    /// The table contained no levels.
    #[error("level table is empty")]
    Empty,
    /// Level numbers must start at one and increase by one.
    #[error("level at position {index} is numbered {}, expected {}", found.get(), index + 1)]
    NonContiguous {
        /// Zero-based position of the offending entry.
        index: usize,
        /// Level number found at that position.
        found: LevelNumber,
    },
    /// A level declared a zero time limit.
    #[error("level {} has a zero time limit", level.get())]
    ZeroTimeLimit {
        /// Level carrying the invalid limit.
        level: LevelNumber,
    },
}

/// Ordered, non-empty table of level configurations.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelTable {
    levels: Vec<LevelConfig>,
}

impl LevelTable {
    /// Validates and wraps the provided configurations.
    pub fn new(levels: Vec<LevelConfig>) -> Result<Self, TableError> {
        if levels.is_empty() {
            return Err(TableError::Empty);
        }

        for (index, config) in levels.iter().enumerate() {
            let expected = u32::try_from(index + 1).unwrap_or(u32::MAX);
            if config.level().get() != expected {
                return Err(TableError::NonContiguous {
                    index,
                    found: config.level(),
                });
            }
            if config.time_limit().is_zero() {
                return Err(TableError::ZeroTimeLimit {
                    level: config.level(),
                });
            }
        }

        Ok(Self { levels })
    }

    /// Highest level number contained in the table.
    #[must_use]
    pub fn max_level(&self) -> LevelNumber {
        LevelNumber::new(u32::try_from(self.levels.len()).unwrap_or(u32::MAX))
    }

    /// Reports whether the level number exists in the table.
    #[must_use]
    pub fn contains(&self, level: LevelNumber) -> bool {
        level.get() >= 1 && level <= self.max_level()
    }

    /// Iterator over the configurations in level order.
    pub fn iter(&self) -> impl Iterator<Item = &LevelConfig> {
        self.levels.iter()
    }

    /// Configuration for `level`, falling back to the first level when out of range.
    #[must_use]
    pub fn config(&self, level: LevelNumber) -> LevelConfig {
        if !self.contains(level) {
            return self.levels[0];
        }
        let index = usize::try_from(level.get() - 1).unwrap_or(0);
        self.levels.get(index).copied().unwrap_or(self.levels[0])
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self {
            levels: DEFAULT_LEVELS.to_vec(),
        }
    }
}

/// Registry of level configurations plus the persisted current selection.
#[derive(Clone, Debug)]
pub struct LevelRegistry {
    table: LevelTable,
    current: LevelNumber,
}

impl LevelRegistry {
    /// Creates a registry whose current level is the first one.
    #[must_use]
    pub fn new(table: LevelTable) -> Self {
        Self {
            table,
            current: LevelNumber::FIRST,
        }
    }

    /// Creates a registry and restores the persisted current level.
    ///
    /// Stale or corrupted selections outside the table reset to the first level.
    #[must_use]
    pub fn load<S: KeyValueStore>(table: LevelTable, store: &S) -> Self {
        let mut registry = Self::new(table);
        registry.current = registry.restore(store);
        registry
    }

    /// Level table backing the registry.
    #[must_use]
    pub const fn table(&self) -> &LevelTable {
        &self.table
    }

    /// Configuration for `level`, or the first level's configuration when out of range.
    #[must_use]
    pub fn config(&self, level: LevelNumber) -> LevelConfig {
        self.table.config(level)
    }

    /// Currently selected level.
    #[must_use]
    pub const fn current_level(&self) -> LevelNumber {
        self.current
    }

    /// Configuration of the currently selected level.
    #[must_use]
    pub fn current_config(&self) -> LevelConfig {
        self.table.config(self.current)
    }

    /// Highest level in the table.
    #[must_use]
    pub fn max_level(&self) -> LevelNumber {
        self.table.max_level()
    }

    /// Reports whether the current level is the last one.
    #[must_use]
    pub fn is_last_level(&self) -> bool {
        self.current >= self.table.max_level()
    }

    /// Selects and persists `level`. Returns `false` and keeps the current
    /// selection when the level is not part of the table.
    pub fn set_current_level<S: KeyValueStore>(
        &mut self,
        level: LevelNumber,
        store: &mut S,
    ) -> bool {
        if !self.table.contains(level) {
            warn!(
                level = level.get(),
                max_level = self.table.max_level().get(),
                "level_selection_rejected"
            );
            return false;
        }

        self.current = level;
        persist(store, level);
        true
    }

    /// Advances to the following level. Returns `false` on the last level.
    pub fn next_level<S: KeyValueStore>(&mut self, store: &mut S) -> bool {
        if self.is_last_level() {
            return false;
        }
        let next = LevelNumber::new(self.current.get() + 1);
        self.set_current_level(next, store)
    }

    /// Returns to the first level and persists the choice.
    pub fn reset_to_first_level<S: KeyValueStore>(&mut self, store: &mut S) {
        self.current = LevelNumber::FIRST;
        persist(store, LevelNumber::FIRST);
    }

    /// Starts `level`: persists it as current and captures the parameters
    /// session setup reads. Unknown levels start the current level instead.
    pub fn select<S: KeyValueStore>(
        &mut self,
        level: LevelNumber,
        store: &mut S,
    ) -> SelectedLevel {
        let _ = self.set_current_level(level, store);
        let selection = SelectedLevel::from_config(&self.current_config());
        info!(
            level = selection.level.get(),
            entity_count = selection.entity_count,
            time_limit_secs = selection.time_limit.as_secs_f32(),
            "level_selected"
        );
        selection
    }

    fn restore<S: KeyValueStore>(&self, store: &S) -> LevelNumber {
        let Some(raw) = store.get_int(CURRENT_LEVEL_KEY) else {
            return LevelNumber::FIRST;
        };

        match u32::try_from(raw).map(LevelNumber::new) {
            Ok(level) if self.table.contains(level) => level,
            _ => {
                warn!(persisted = raw, "stale_level_selection_reset");
                LevelNumber::FIRST
            }
        }
    }
}

impl Default for LevelRegistry {
    fn default() -> Self {
        Self::new(LevelTable::default())
    }
}

fn persist<S: KeyValueStore>(store: &mut S, level: LevelNumber) {
    store.set_int(CURRENT_LEVEL_KEY, i32::try_from(level.get()).unwrap_or(i32::MAX));
    if let Err(error) = store.save() {
        warn!(error = %error, level = level.get(), "level_selection_not_saved");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(value: u32) -> LevelNumber {
        LevelNumber::new(value)
    }

    #[test]
    fn default_table_matches_shipped_levels() {
        let table = LevelTable::default();
        assert_eq!(table.max_level(), level(3));

        let third = table.config(level(3));
        assert_eq!(third.entity_count(), 40);
        assert_eq!(third.time_limit(), Duration::from_secs(300));
    }

    #[test]
    fn out_of_range_config_falls_back_to_first_level() {
        let table = LevelTable::default();
        assert_eq!(table.config(level(0)).level(), LevelNumber::FIRST);
        assert_eq!(table.config(level(9)).level(), LevelNumber::FIRST);
    }

    #[test]
    fn table_rejects_gaps_and_zero_limits() {
        let gap = LevelTable::new(vec![
            LevelConfig::new(level(1), 5, Duration::from_secs(10)),
            LevelConfig::new(level(3), 5, Duration::from_secs(10)),
        ]);
        assert_eq!(
            gap,
            Err(TableError::NonContiguous {
                index: 1,
                found: level(3)
            })
        );

        let zero = LevelTable::new(vec![LevelConfig::new(level(1), 5, Duration::ZERO)]);
        assert_eq!(zero, Err(TableError::ZeroTimeLimit { level: level(1) }));

        assert_eq!(LevelTable::new(Vec::new()), Err(TableError::Empty));
    }
}
