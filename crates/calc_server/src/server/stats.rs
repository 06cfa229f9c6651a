//! Session counters shared between the admission loop and session tasks.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Live and cumulative session counts.
#[derive(Debug, Default)]
pub struct SessionStats {
    active: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicU64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an admitted session and returns the new active count.
    pub(crate) fn session_started(&self) -> usize {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::Relaxed);
        active
    }

    /// Records a finished session and returns the new active count.
    pub(crate) fn session_finished(&self) -> usize {
        self.active.fetch_sub(1, Ordering::SeqCst) - 1
    }

    /// Sessions currently holding an admission slot.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest `active` value observed since startup.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Sessions admitted since startup.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_tracks_high_water_mark() {
        let stats = SessionStats::new();
        assert_eq!(stats.session_started(), 1);
        assert_eq!(stats.session_started(), 2);
        assert_eq!(stats.session_finished(), 1);
        assert_eq!(stats.session_started(), 2);
        assert_eq!(stats.session_finished(), 1);
        assert_eq!(stats.session_finished(), 0);

        assert_eq!(stats.active(), 0);
        assert_eq!(stats.peak(), 2);
        assert_eq!(stats.total(), 3);
    }
}
