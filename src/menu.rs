//! Menu Collaborator
//!
//! The operation menu itself is rendered by an external collaborator; this
//! module only defines the seam: a list of labelled operations plus a
//! position goes in, the chosen operation (or nothing) comes out.

use async_trait::async_trait;
use tracing::debug;

use crate::ops::Operation;

/// One entry in the operation menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub operation: Operation,
}

/// Black-box menu renderer
#[async_trait]
pub trait MenuPresenter: Send + Sync {
    /// Display the menu at `position` and return the user's choice
    async fn present(&self, items: &[MenuItem], position: (i32, i32)) -> Option<Operation>;
}

/// Build the menu from what the backend currently supports, preserving the
/// canonical operation order
pub fn build_items(supported: &[String]) -> Vec<MenuItem> {
    Operation::ALL
        .iter()
        .filter(|op| supported.iter().any(|s| s == op.method_name()))
        .map(|op| MenuItem {
            label: op.label().to_string(),
            operation: *op,
        })
        .collect()
}

/// Headless presenter that picks a fixed operation when it is offered.
///
/// Used by the daemon when no menu renderer is attached: the invoke
/// gesture then always runs the configured default operation.
pub struct DefaultOperationPresenter {
    operation: Operation,
}

impl DefaultOperationPresenter {
    pub fn new(operation: Operation) -> Self {
        Self { operation }
    }
}

#[async_trait]
impl MenuPresenter for DefaultOperationPresenter {
    async fn present(&self, items: &[MenuItem], _position: (i32, i32)) -> Option<Operation> {
        let offered = items.iter().any(|item| item.operation == self.operation);
        if !offered {
            debug!(
                "Default operation {} not offered by backend",
                self.operation.method_name()
            );
            return None;
        }
        Some(self.operation)
    }
}
