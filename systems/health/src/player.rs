//! Health pool of the player character.

/// Health granted to the player when no configuration overrides it.
pub const DEFAULT_PLAYER_HEALTH: f32 = 100.0;

/// Result of damage applied to the player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlayerDamage {
    /// The player was already dead or the amount was invalid.
    Ignored,
    /// The player survived the hit.
    Hurt {
        /// Health left after the hit.
        health: f32,
    },
    /// The hit drained the remaining health.
    Died,
}

/// Player health that clamps to `[0, max]` and dies exactly once.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerHealth {
    max: f32,
    current: f32,
    dead: bool,
}

impl PlayerHealth {
    /// Creates a player at full health. Non-positive maxima use the default pool.
    #[must_use]
    pub fn new(max: f32) -> Self {
        let max = if max.is_finite() && max > 0.0 {
            max
        } else {
            DEFAULT_PLAYER_HEALTH
        };
        Self {
            max,
            current: max,
            dead: false,
        }
    }

    /// Removes `amount` health.
    pub fn take_damage(&mut self, amount: f32) -> PlayerDamage {
        if self.dead || !amount.is_finite() || amount <= 0.0 {
            return PlayerDamage::Ignored;
        }

        self.current = (self.current - amount).max(0.0);
        if self.current <= 0.0 {
            self.dead = true;
            return PlayerDamage::Died;
        }
        PlayerDamage::Hurt {
            health: self.current,
        }
    }

    /// Restores `amount` health. Returns `false` when dead or already full.
    pub fn heal(&mut self, amount: f32) -> bool {
        if self.dead || !amount.is_finite() || amount <= 0.0 || self.current >= self.max {
            return false;
        }
        self.current = (self.current + amount).min(self.max);
        true
    }

    /// Health currently left.
    #[must_use]
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Maximum health.
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Reports whether the player has died.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }
}

impl Default for PlayerHealth {
    fn default() -> Self {
        Self::new(DEFAULT_PLAYER_HEALTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_clamps_and_kills_once() {
        let mut player = PlayerHealth::new(50.0);
        assert_eq!(player.take_damage(20.0), PlayerDamage::Hurt { health: 30.0 });
        assert_eq!(player.take_damage(80.0), PlayerDamage::Died);
        assert_eq!(player.current(), 0.0);
        assert_eq!(player.take_damage(1.0), PlayerDamage::Ignored);
    }

    #[test]
    fn healing_respects_the_cap() {
        let mut player = PlayerHealth::default();
        assert!(!player.heal(10.0), "full health cannot heal");

        let _ = player.take_damage(30.0);
        assert!(player.heal(50.0));
        assert_eq!(player.current(), player.max());
    }

    #[test]
    fn dead_player_cannot_heal() {
        let mut player = PlayerHealth::new(10.0);
        assert_eq!(player.take_damage(10.0), PlayerDamage::Died);
        assert!(!player.heal(5.0));
        assert!(player.is_dead());
    }

    #[test]
    fn invalid_maximum_uses_default_pool() {
        assert_eq!(PlayerHealth::new(-1.0).max(), DEFAULT_PLAYER_HEALTH);
        assert_eq!(PlayerHealth::new(f32::NAN).max(), DEFAULT_PLAYER_HEALTH);
    }
}
