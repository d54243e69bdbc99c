//! Text Operations
//!
//! The closed set of operations offered on a selection, plus the
//! request/response pair exchanged with the processing backend.
//! Method strings are part of the D-Bus wire contract and must not change.

use uuid::Uuid;

/// A text operation the backend can perform on a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Translate,
    FixGrammar,
    Enhance,
    Summarize,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Translate,
        Operation::FixGrammar,
        Operation::Enhance,
        Operation::Summarize,
    ];

    /// Backend method name on the wire
    pub fn method_name(&self) -> &'static str {
        match self {
            Operation::Translate => "translate",
            Operation::FixGrammar => "fix_grammar",
            Operation::Enhance => "enhance",
            Operation::Summarize => "summarize",
        }
    }

    /// Human-readable menu label
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Translate => "Translate",
            Operation::FixGrammar => "Fix Grammar",
            Operation::Enhance => "Enhance",
            Operation::Summarize => "Summarize",
        }
    }

    /// Parse a wire method name back into an operation
    pub fn from_method(name: &str) -> Option<Operation> {
        Operation::ALL.iter().copied().find(|op| op.method_name() == name)
    }
}

/// A single request to the processing backend.
///
/// `request_id` is fresh per dispatch and never reused, so retries stay
/// idempotent and late responses can be discarded by id mismatch.
#[derive(Debug, Clone)]
pub struct OperationRequest {
    pub operation: Operation,
    pub text: String,
    pub source_app: String,
    pub request_id: Uuid,
}

impl OperationRequest {
    pub fn new(operation: Operation, text: impl Into<String>, source_app: impl Into<String>) -> Self {
        Self {
            operation,
            text: text.into(),
            source_app: source_app.into(),
            request_id: Uuid::new_v4(),
        }
    }
}

/// Why a dispatch failed without a usable result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// No response within the dispatch deadline
    Timeout,
    /// Service not found or connection lost mid-call
    BackendUnavailable(String),
    /// Superseded or selection went stale before the response arrived
    Cancelled,
    /// The backend answered with an error
    Backend(String),
}

/// Outcome of a dispatched operation, correlated by `request_id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    pub request_id: Uuid,
    pub status: OperationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    Ok(String),
    Failed(FailureReason),
}

impl OperationResult {
    pub fn ok(request_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            request_id,
            status: OperationStatus::Ok(text.into()),
        }
    }

    pub fn failed(request_id: Uuid, reason: FailureReason) -> Self {
        Self {
            request_id,
            status: OperationStatus::Failed(reason),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.status, OperationStatus::Ok(_))
    }
}
