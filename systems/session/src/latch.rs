/// Write-once flag guarding session termination.
///
/// Victory and defeat race within a single frame; whichever path claims the
/// latch first persists its record and requests its transition, every later
/// claim is refused. Updates are single-threaded, so a plain test-and-set is
/// sufficient.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TerminationLatch {
    claimed: bool,
}

impl TerminationLatch {
    /// Creates an unclaimed latch.
    #[must_use]
    pub const fn new() -> Self {
        Self { claimed: false }
    }

    /// Claims the latch. Returns `true` only for the first caller.
    #[must_use]
    pub fn claim(&mut self) -> bool {
        if self.claimed {
            return false;
        }
        self.claimed = true;
        true
    }

    /// Reports whether the latch was claimed.
    #[must_use]
    pub const fn is_claimed(&self) -> bool {
        self.claimed
    }
}

#[cfg(test)]
mod tests {
    use super::TerminationLatch;

    #[test]
    fn only_first_claim_wins() {
        let mut latch = TerminationLatch::new();
        assert!(!latch.is_claimed());
        assert!(latch.claim());
        assert!(!latch.claim());
        assert!(latch.is_claimed());
    }
}
