//! GPU memory accounting shared by every feeder of a scene.
//!
//! The tracker does not allocate anything. Feeders ask it whether a planned
//! allocation fits the budget, report the bytes they actually acquired, and
//! report them again when the buffers are deleted.

use meshview_core::profiling::profile_plot;
use parking_lot::RwLock;

/// Snapshot of the tracker counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryInfo {
    /// Budget in bytes. `None` means unbounded.
    pub budget: Option<u64>,
    /// Bytes currently accounted.
    pub used: u64,
    /// Largest value `used` ever reached.
    pub peak: u64,
}

impl MemoryInfo {
    /// Bytes left before the budget is exhausted.
    pub fn available(&self) -> Option<u64> {
        self.budget.map(|b| b.saturating_sub(self.used))
    }
}

#[derive(Debug)]
struct MemoryState {
    budget: Option<u64>,
    used: u64,
    peak: u64,
}

/// Thread-safe accumulator of GPU memory acquired by buffer allocations.
#[derive(Debug)]
pub struct MemoryTracker {
    state: RwLock<MemoryState>,
}

impl Default for MemoryTracker {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl MemoryTracker {
    /// Create a tracker with a budget in bytes.
    pub fn new(budget: u64) -> Self {
        Self::with_budget(Some(budget))
    }

    /// Create a tracker that never refuses an allocation.
    pub fn unbounded() -> Self {
        Self::with_budget(None)
    }

    fn with_budget(budget: Option<u64>) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                budget,
                used: 0,
                peak: 0,
            }),
        }
    }

    /// Whether `bytes` more would still fit the budget.
    pub fn is_additional_memory_available(&self, bytes: u64) -> bool {
        let state = self.state.read();
        match state.budget {
            Some(budget) => state.used.saturating_add(bytes) <= budget,
            None => true,
        }
    }

    /// Account `bytes` if they fit the budget. Returns whether they did.
    ///
    /// The check and the update happen under one write lock, so two feeders
    /// racing for the last free bytes cannot both succeed.
    pub fn acquire(&self, bytes: u64) -> bool {
        let mut state = self.state.write();
        let next = state.used.saturating_add(bytes);
        if state.budget.is_some_and(|budget| next > budget) {
            return false;
        }
        state.used = next;
        state.peak = state.peak.max(next);
        profile_plot!("gpu_memory_used", next);
        true
    }

    /// Give back bytes previously acquired.
    pub fn release(&self, bytes: u64) {
        let mut state = self.state.write();
        if bytes > state.used {
            log::warn!(
                "MemoryTracker: releasing {} bytes but only {} are accounted",
                bytes,
                state.used
            );
        }
        state.used = state.used.saturating_sub(bytes);
        profile_plot!("gpu_memory_used", state.used);
    }

    /// Bytes currently accounted.
    pub fn used(&self) -> u64 {
        self.state.read().used
    }

    pub fn budget(&self) -> Option<u64> {
        self.state.read().budget
    }

    /// Change the budget. Already accounted bytes are kept even if they
    /// now exceed it.
    pub fn set_budget(&self, budget: Option<u64>) {
        self.state.write().budget = budget;
    }

    pub fn snapshot(&self) -> MemoryInfo {
        let state = self.state.read();
        MemoryInfo {
            budget: state.budget,
            used: state.used,
            peak: state.peak,
        }
    }
}

static_assertions::assert_impl_all!(MemoryTracker: Send, Sync);
