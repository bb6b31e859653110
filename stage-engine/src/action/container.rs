//! Drop-container marking.
//!
//! While a drag hovers over a container, a dwell timer is armed. If the timer
//! is not cancelled before it expires, the container is marked: it receives
//! the configured marker class and becomes the `parent_el` of the drop.
//!
//! ```text
//!   arm(c) ──▶ pending(c) ──dwell──▶ marked(c)
//!                 │  ▲
//!        cancel ◀─┘  └─ arm(c) again: same timer, not restarted
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use stage_core::{
    ContainerHighlightType, ElementHandle, PointerEvent, StageHooks, StageOptions, StageResult,
};
use tokio::task::AbortHandle;

/// A cancellable dwell timer for one container.
///
/// Clones share the same timer.
#[derive(Debug, Clone)]
pub struct ContainerMarkTimer {
    seq: u64,
    container: ElementHandle,
    cancelled: Arc<AtomicBool>,
    abort: AbortHandle,
}

impl ContainerMarkTimer {
    /// Wrap a spawned dwell task.
    #[must_use]
    pub fn new(
        seq: u64,
        container: ElementHandle,
        cancelled: Arc<AtomicBool>,
        abort: AbortHandle,
    ) -> Self {
        Self {
            seq,
            container,
            cancelled,
            abort,
        }
    }

    /// Stop the timer. The container will not be marked by it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.abort.abort();
    }

    /// Whether [`cancel`](Self::cancel) was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Whether the timer can still fire.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.is_cancelled() && !self.abort.is_finished()
    }

    /// Container the timer will mark.
    #[must_use]
    pub fn container(&self) -> &ElementHandle {
        &self.container
    }

    /// Arming sequence number.
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Outcome of asking to arm a timer for a container.
#[derive(Debug)]
pub enum ArmPlan {
    /// The container is already marked.
    AlreadyMarked,
    /// A timer for the same container is running.
    Running(ContainerMarkTimer),
    /// Spawn a new timer with this sequence number.
    Arm(u64),
}

/// Pending and confirmed container marks.
#[derive(Debug)]
pub struct ContainerMarker {
    class_name: String,
    duration: Duration,
    highlight_type: ContainerHighlightType,
    pending: Option<ContainerMarkTimer>,
    marked: Option<ElementHandle>,
    next_seq: u64,
}

impl ContainerMarker {
    /// Create a marker from stage options.
    #[must_use]
    pub fn new(options: &StageOptions) -> Self {
        Self {
            class_name: options.container_highlight_class_name.clone(),
            duration: options.container_highlight_duration(),
            highlight_type: options.container_highlight_type,
            pending: None,
            marked: None,
            next_seq: 1,
        }
    }

    /// Dwell before a container is marked.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Whether marking may be armed for this pointer event.
    #[must_use]
    pub fn can_arm(&self, event: &PointerEvent) -> bool {
        match self.highlight_type {
            ContainerHighlightType::Default => true,
            ContainerHighlightType::Alt => event.modifiers.alt,
        }
    }

    /// The topmost eligible container among `hits`, skipping `exclude`.
    ///
    /// # Errors
    ///
    /// Propagates `is_container` hook failures.
    pub fn find_candidate(
        hooks: &dyn StageHooks,
        hits: &[ElementHandle],
        event: &PointerEvent,
        exclude: &[ElementHandle],
    ) -> StageResult<Option<ElementHandle>> {
        for el in hits {
            if exclude.iter().any(|skip| skip.same_id(el)) {
                continue;
            }
            if hooks.is_container(el, event)? {
                return Ok(Some(el.clone()));
            }
        }
        Ok(None)
    }

    /// Decide how to arm a timer for `container`.
    ///
    /// A timer already running for another container is cancelled.
    pub fn plan(&mut self, container: &ElementHandle) -> ArmPlan {
        if self.marked.as_ref().is_some_and(|marked| marked.ptr_eq(container)) {
            self.cancel_pending();
            return ArmPlan::AlreadyMarked;
        }
        if let Some(pending) = &self.pending {
            if pending.is_active() && pending.container().ptr_eq(container) {
                return ArmPlan::Running(pending.clone());
            }
        }
        self.cancel_pending();
        let seq = self.next_seq;
        self.next_seq += 1;
        ArmPlan::Arm(seq)
    }

    /// Record a freshly spawned timer as the pending one.
    pub fn attach(&mut self, timer: ContainerMarkTimer) {
        self.pending = Some(timer);
    }

    /// The pending timer, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&ContainerMarkTimer> {
        self.pending.as_ref()
    }

    /// Cancel the pending timer, if any.
    pub fn cancel_pending(&mut self) {
        if let Some(timer) = self.pending.take() {
            timer.cancel();
        }
    }

    /// A dwell timer expired.
    ///
    /// Marks its container if the timer is still the pending one and was not
    /// cancelled, and returns the newly marked container.
    pub fn confirm(&mut self, seq: u64) -> Option<ElementHandle> {
        let pending = self.pending.as_ref()?;
        if pending.seq() != seq || pending.is_cancelled() {
            return None;
        }
        let container = pending.container().clone();
        self.pending = None;
        if !container.is_alive() {
            return None;
        }

        if let Some(previous) = self.marked.take() {
            previous.remove_class(&self.class_name);
        }
        container.add_class(&self.class_name);
        tracing::debug!(id = %container.id(), "container marked");
        self.marked = Some(container.clone());
        Some(container)
    }

    /// The marked container.
    #[must_use]
    pub fn marked(&self) -> Option<&ElementHandle> {
        self.marked.as_ref()
    }

    /// Unmark the marked container, returning it.
    pub fn take_mark(&mut self) -> Option<ElementHandle> {
        let marked = self.marked.take()?;
        marked.remove_class(&self.class_name);
        Some(marked)
    }

    /// Cancel any pending timer and drop any mark.
    pub fn reset(&mut self) {
        self.cancel_pending();
        self.take_mark();
    }
}
