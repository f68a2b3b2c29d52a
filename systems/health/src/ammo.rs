//! Magazine and reserve of the player's gun.

use std::time::Duration;

use last_stand_core::Loadout;

/// Rounds added to the reserve by one ammunition pickup.
pub const AMMO_PICKUP_AMOUNT: u32 = 30;

const DEFAULT_RELOAD_TIME: Duration = Duration::from_secs(3);

/// Result of a trigger pull.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FireOutcome {
    /// A round was spent.
    Fired {
        /// Rounds left in the magazine.
        magazine: u32,
    },
    /// The magazine is empty; nothing was spent.
    Empty,
    /// A reload is in progress; nothing was spent.
    Reloading,
}

/// Completed reload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reload {
    /// Rounds moved from the reserve into the magazine.
    pub loaded: u32,
    /// Rounds in the magazine afterwards.
    pub magazine: u32,
    /// Rounds left in the reserve afterwards.
    pub reserve: u32,
}

/// Gun ammunition: a magazine fed from a reserve by timed reloads.
///
/// A round can only be fired while the magazine holds one and no reload is
/// running. A reload moves `min(missing, reserve)` rounds once its timer
/// elapses; the magazine never exceeds its size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ammo {
    magazine_size: u32,
    magazine: u32,
    reserve: u32,
    reload_time: Duration,
    reloading: Option<Duration>,
}

impl Ammo {
    /// Creates a gun with a full magazine. A zero magazine size is raised to one.
    #[must_use]
    pub const fn new(loadout: Loadout, reload_time: Duration) -> Self {
        let magazine_size = if loadout.magazine_size() == 0 {
            1
        } else {
            loadout.magazine_size()
        };
        Self {
            magazine_size,
            magazine: magazine_size,
            reserve: loadout.reserve(),
            reload_time,
            reloading: None,
        }
    }

    /// Reports whether a trigger pull would spend a round.
    #[must_use]
    pub const fn can_shoot(&self) -> bool {
        self.magazine > 0 && self.reloading.is_none()
    }

    /// Spends one round if possible.
    pub fn fire(&mut self) -> FireOutcome {
        if self.reloading.is_some() {
            return FireOutcome::Reloading;
        }
        if self.magazine == 0 {
            return FireOutcome::Empty;
        }
        self.magazine -= 1;
        FireOutcome::Fired {
            magazine: self.magazine,
        }
    }

    /// Starts a reload. Returns `false` when one is already running, the
    /// magazine is full or the reserve is empty.
    pub fn reload(&mut self) -> bool {
        if self.reloading.is_some() || self.magazine == self.magazine_size || self.reserve == 0 {
            return false;
        }
        self.reloading = Some(Duration::ZERO);
        true
    }

    /// Advances a running reload, completing it once the reload time elapsed.
    pub fn advance(&mut self, dt: Duration) -> Option<Reload> {
        let elapsed = self.reloading?.saturating_add(dt);
        if elapsed < self.reload_time {
            self.reloading = Some(elapsed);
            return None;
        }

        self.reloading = None;
        let loaded = (self.magazine_size - self.magazine).min(self.reserve);
        self.magazine += loaded;
        self.reserve -= loaded;
        Some(Reload {
            loaded,
            magazine: self.magazine,
            reserve: self.reserve,
        })
    }

    /// Adds `amount` rounds to the reserve and returns the new reserve.
    pub fn add_reserve(&mut self, amount: u32) -> u32 {
        self.reserve = self.reserve.saturating_add(amount);
        self.reserve
    }

    /// Rounds left in the magazine.
    #[must_use]
    pub const fn magazine(&self) -> u32 {
        self.magazine
    }

    /// Rounds held by a full magazine.
    #[must_use]
    pub const fn magazine_size(&self) -> u32 {
        self.magazine_size
    }

    /// Spare rounds outside the magazine.
    #[must_use]
    pub const fn reserve(&self) -> u32 {
        self.reserve
    }

    /// Reports whether a reload is running.
    #[must_use]
    pub const fn is_reloading(&self) -> bool {
        self.reloading.is_some()
    }
}

impl Default for Ammo {
    fn default() -> Self {
        Self::new(Loadout::DEFAULT, DEFAULT_RELOAD_TIME)
    }
}
