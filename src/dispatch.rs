//! Operation Dispatcher
//!
//! Sends a chosen operation to the processing backend and awaits the
//! result, with a bounded deadline and cooperative cancellation. At most
//! one request may be outstanding per source handle: a newer dispatch for
//! the same handle supersedes (cancels) the prior pending one, and a
//! watcher-reported change cancels the pending request for that handle.
//!
//! Cancellation only signals intent to ignore the response; the backend
//! may still finish server-side, in which case the late result is dropped
//! here because its request id no longer matches the live pending set.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::TextProcessor;
use crate::error::WandError;
use crate::ops::{FailureReason, Operation, OperationRequest, OperationResult};
use crate::selection::{Selection, SourceHandle};

struct Pending {
    request_id: Uuid,
    cancel: CancellationToken,
}

/// Dispatches operations to the backend, one in flight per source handle
pub struct OperationDispatcher<P: TextProcessor> {
    processor: Arc<P>,
    timeout: Duration,
    // Short-held lock per mutation, never held across an IPC round trip
    pending: Mutex<HashMap<SourceHandle, Pending>>,
}

impl<P: TextProcessor> OperationDispatcher<P> {
    pub fn new(processor: Arc<P>, timeout: Duration) -> Self {
        Self {
            processor,
            timeout,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Dispatch one operation for the captured selection.
    ///
    /// Fails fast with `BackendUnavailable` when the backend's health probe
    /// does not answer, rather than burning the full timeout. Every call
    /// gets a fresh request id; ids are never reused.
    pub async fn dispatch(
        &self,
        operation: Operation,
        selection: &Selection,
        source_app: &str,
    ) -> OperationResult {
        let request = OperationRequest::new(operation, selection.text.clone(), source_app);
        let request_id = request.request_id;

        // Fail fast on a dead backend
        if let Err(e) = self.processor.get_status().await {
            warn!("Backend health probe failed: {}", e);
            return OperationResult::failed(
                request_id,
                FailureReason::BackendUnavailable(e.to_string()),
            );
        }

        let cancel = self.register(selection.handle.clone(), request_id);

        info!(
            "📤 Dispatching {} ({} chars) as {}",
            operation.method_name(),
            request.text.chars().count(),
            request_id
        );

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Request {} cancelled", request_id);
                OperationResult::failed(request_id, FailureReason::Cancelled)
            }
            outcome = tokio::time::timeout(
                self.timeout,
                self.processor.process_text(
                    request.operation.method_name(),
                    &request.text,
                    &request.source_app,
                ),
            ) => match outcome {
                Err(_) => {
                    warn!("Request {} timed out after {:?}", request_id, self.timeout);
                    OperationResult::failed(request_id, FailureReason::Timeout)
                }
                Ok(Err(WandError::BackendUnavailable(msg))) => {
                    OperationResult::failed(request_id, FailureReason::BackendUnavailable(msg))
                }
                Ok(Err(e)) => {
                    OperationResult::failed(request_id, FailureReason::Backend(e.to_string()))
                }
                Ok(Ok(text)) => OperationResult::ok(request_id, text),
            }
        };

        self.unregister(&selection.handle, request_id);
        result
    }

    /// Cancel the pending request for a handle, if any.
    ///
    /// Called when the watcher reports the originating selection changed
    /// or cleared before the response arrived.
    pub fn cancel_for(&self, handle: &SourceHandle) {
        let removed = self
            .pending
            .lock()
            .expect("pending lock poisoned")
            .remove(handle);
        if let Some(prev) = removed {
            debug!("Cancelling pending request {} for {:?}", prev.request_id, handle);
            prev.cancel.cancel();
        }
    }

    /// Whether a request is currently in flight for this handle
    pub fn has_pending(&self, handle: &SourceHandle) -> bool {
        self.pending
            .lock()
            .expect("pending lock poisoned")
            .contains_key(handle)
    }

    fn register(&self, handle: SourceHandle, request_id: Uuid) -> CancellationToken {
        let cancel = CancellationToken::new();
        let prev = self.pending.lock().expect("pending lock poisoned").insert(
            handle,
            Pending {
                request_id,
                cancel: cancel.clone(),
            },
        );
        // Supersede: only one outstanding request per handle
        if let Some(prev) = prev {
            debug!("Request {} superseded by {}", prev.request_id, request_id);
            prev.cancel.cancel();
        }
        cancel
    }

    fn unregister(&self, handle: &SourceHandle, request_id: Uuid) {
        let mut pending = self.pending.lock().expect("pending lock poisoned");
        // A newer dispatch may have replaced the entry; only remove our own
        if pending.get(handle).is_some_and(|p| p.request_id == request_id) {
            pending.remove(handle);
        }
    }
}
