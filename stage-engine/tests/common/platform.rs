//! Counting platform observers.
//!
//! Each probe records how many watches were created and disconnected, and
//! keeps the callbacks so tests can deliver notifications by hand.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use stage_core::{
    ElementHandle, IntersectionCallback, IntersectionEntry, IntersectionObserving,
    ObservationHandle, ResizeCallback, ResizeEntry, ResizeObserving, Size,
};

/// Watch counters shared by a probe and its handles.
#[derive(Debug, Default)]
pub struct WatchStats {
    created: AtomicUsize,
    disconnected: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl WatchStats {
    /// Watches created.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Watches disconnected.
    pub fn disconnected(&self) -> usize {
        self.disconnected.load(Ordering::SeqCst)
    }

    /// Watches currently live.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously live watches.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    fn open(self: &Arc<Self>) -> Box<dyn ObservationHandle> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        Box::new(ProbeHandle {
            stats: Arc::clone(self),
            connected: true,
        })
    }
}

struct ProbeHandle {
    stats: Arc<WatchStats>,
    connected: bool,
}

impl ObservationHandle for ProbeHandle {
    fn disconnect(&mut self) {
        if std::mem::take(&mut self.connected) {
            self.stats.active.fetch_sub(1, Ordering::SeqCst);
            self.stats.disconnected.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Resize observer that records every watch.
#[derive(Default)]
pub struct ResizeProbe {
    /// Watch counters.
    pub stats: Arc<WatchStats>,
    watches: Mutex<Vec<(ElementHandle, ResizeCallback)>>,
}

impl ResizeProbe {
    /// Deliver a size change to the most recent watch.
    pub fn fire(&self, width: f64, height: f64) {
        let latest = self
            .watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned();
        let (target, callback) = latest.expect("a resize watch exists");
        callback(&[ResizeEntry {
            target,
            size: Size::new(width, height),
        }]);
    }

    /// Identities observed, in order.
    pub fn targets(&self) -> Vec<String> {
        self.watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(el, _)| el.id().to_string())
            .collect()
    }
}

impl ResizeObserving for ResizeProbe {
    fn observe(
        &self,
        target: &ElementHandle,
        callback: ResizeCallback,
    ) -> Box<dyn ObservationHandle> {
        self.watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((target.clone(), callback));
        self.stats.open()
    }
}

/// Intersection observer that records every watch.
#[derive(Default)]
pub struct IntersectionProbe {
    /// Watch counters.
    pub stats: Arc<WatchStats>,
    watches: Mutex<Vec<(ElementHandle, IntersectionCallback)>>,
}

impl IntersectionProbe {
    /// Deliver a visibility report to the most recent watch.
    pub fn fire(&self, ratio: f64) {
        let latest = self
            .watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned();
        let (target, callback) = latest.expect("an intersection watch exists");
        callback(&[IntersectionEntry {
            target,
            intersection_ratio: ratio,
        }]);
    }

    /// Identities observed, in order.
    pub fn targets(&self) -> Vec<String> {
        self.watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(el, _)| el.id().to_string())
            .collect()
    }
}

impl IntersectionObserving for IntersectionProbe {
    fn observe(
        &self,
        target: &ElementHandle,
        callback: IntersectionCallback,
    ) -> Box<dyn ObservationHandle> {
        self.watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((target.clone(), callback));
        self.stats.open()
    }
}
