//! Content mutation payloads handed to the render runtime.

use serde::{Deserialize, Serialize};

use crate::element::ElementId;
use crate::error::{StageError, StageResult};

/// A node to add or update, in page-description form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateData {
    /// Node configuration; must carry an `id`.
    pub config: serde_json::Value,
    /// Parent node, if known.
    #[serde(default)]
    pub parent_id: Option<ElementId>,
}

impl UpdateData {
    /// Create a payload from a node configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration has no usable `id`.
    pub fn new(config: serde_json::Value) -> StageResult<Self> {
        if ElementId::from_value(&config["id"]).is_none() {
            return Err(StageError::InvalidConfig(
                "node configuration is missing an id".to_string(),
            ));
        }
        Ok(Self {
            config,
            parent_id: None,
        })
    }

    /// Set the parent node.
    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<ElementId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Identity of the node being added or updated.
    #[must_use]
    pub fn id(&self) -> Option<ElementId> {
        ElementId::from_value(&self.config["id"])
    }
}

/// A node to remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveData {
    /// Node being removed.
    pub id: ElementId,
    /// Its parent, if known.
    #[serde(default)]
    pub parent_id: Option<ElementId>,
}

impl RemoveData {
    /// Create a removal payload.
    #[must_use]
    pub fn new(id: impl Into<ElementId>) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
        }
    }
}
