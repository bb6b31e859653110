//! Selection state.

use crate::element::ElementHandle;

/// What is currently selected.
///
/// In a multi selection the last handle is the layout anchor: the mask
/// outlines it and auto-scroll follows it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SelectionState {
    /// Nothing selected.
    #[default]
    None,
    /// One element.
    Single(ElementHandle),
    /// Several elements, in selection order.
    Multi(Vec<ElementHandle>),
}

impl SelectionState {
    /// The single selection, if any. `None` for multi selections.
    #[must_use]
    pub fn single(&self) -> Option<&ElementHandle> {
        match self {
            Self::Single(el) => Some(el),
            Self::None | Self::Multi(_) => None,
        }
    }

    /// Every selected handle, in order.
    #[must_use]
    pub fn handles(&self) -> Vec<ElementHandle> {
        match self {
            Self::None => Vec::new(),
            Self::Single(el) => vec![el.clone()],
            Self::Multi(els) => els.clone(),
        }
    }

    /// Number of selected elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Single(_) => 1,
            Self::Multi(els) => els.len(),
        }
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this is a multi selection.
    #[must_use]
    pub fn is_multi(&self) -> bool {
        matches!(self, Self::Multi(_))
    }

    /// The handle the mask positions on.
    #[must_use]
    pub fn layout_anchor(&self) -> Option<&ElementHandle> {
        match self {
            Self::None => None,
            Self::Single(el) => Some(el),
            Self::Multi(els) => els.last(),
        }
    }

    /// Whether an element with the same identity is selected.
    ///
    /// Compares identities, not nodes: a re-rendered element is still selected.
    #[must_use]
    pub fn contains_id(&self, el: &ElementHandle) -> bool {
        match self {
            Self::None => false,
            Self::Single(selected) => selected.same_id(el),
            Self::Multi(els) => els.iter().any(|selected| selected.same_id(el)),
        }
    }

    /// Swap in a fresh handle for a member with the same identity.
    ///
    /// Returns whether a member was replaced.
    pub fn refresh(&mut self, el: &ElementHandle) -> bool {
        match self {
            Self::None => false,
            Self::Single(selected) => {
                if selected.same_id(el) {
                    *selected = el.clone();
                    true
                } else {
                    false
                }
            }
            Self::Multi(els) => {
                let mut replaced = false;
                for selected in els.iter_mut().filter(|selected| selected.same_id(el)) {
                    *selected = el.clone();
                    replaced = true;
                }
                replaced
            }
        }
    }
}
