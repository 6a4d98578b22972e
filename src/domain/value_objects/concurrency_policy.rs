use serde::{Deserialize, Serialize};

/// How many repository tasks may run their external process at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcurrencyPolicy {
    /// At most `n` processes at any instant (`n >= 1`)
    Bounded(usize),
    /// One process per target, all at once
    Unbounded,
}

impl Default for ConcurrencyPolicy {
    fn default() -> Self {
        Self::Bounded(num_cpus::get())
    }
}

impl ConcurrencyPolicy {
    /// `0` means unbounded, matching the `maxConcurrency` config setting.
    pub fn from_limit(limit: usize) -> Self {
        if limit == 0 {
            Self::Unbounded
        } else {
            Self::Bounded(limit)
        }
    }

    /// Semaphore permits needed for `targets` tasks.
    pub fn permits_for(&self, targets: usize) -> usize {
        match self {
            Self::Bounded(n) => (*n).max(1).min(targets.max(1)),
            Self::Unbounded => targets.max(1),
        }
    }
}
