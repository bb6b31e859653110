//! Host hooks consulted by the action manager.
//!
//! Hooks run synchronously inside pointer handling, before any interaction
//! state is mutated. They must be pure with respect to the stage: reading the
//! handle is fine, calling back into the stage is not. A hook error aborts the
//! gesture and propagates to the caller of `handle_pointer`.

use crate::element::ElementHandle;
use crate::error::StageResult;
use crate::event::PointerEvent;

/// Host policy for selection, drop targets and drag targets.
pub trait StageHooks: Send + Sync {
    /// May `el` be selected by this pointer event?
    ///
    /// # Errors
    ///
    /// Host-defined; propagated unchanged.
    fn can_select(&self, _el: &ElementHandle, _event: &PointerEvent) -> StageResult<bool> {
        Ok(true)
    }

    /// May `el` accept dropped children?
    ///
    /// # Errors
    ///
    /// Host-defined; propagated unchanged.
    fn is_container(&self, el: &ElementHandle, _event: &PointerEvent) -> StageResult<bool> {
        Ok(el.is_container_hint())
    }

    /// Which element a drag started on `el` actually moves.
    ///
    /// # Errors
    ///
    /// Host-defined; propagated unchanged.
    fn update_drag_el(&self, el: &ElementHandle) -> StageResult<ElementHandle> {
        Ok(el.clone())
    }
}

/// Hooks with every default: everything selectable, containers as advertised.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl StageHooks for DefaultHooks {}
