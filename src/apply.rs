//! Text Applier
//!
//! Replaces the originally-selected span with the backend's result through
//! the host editing surface. The write-back is transactional from the
//! user's point of view: either the exact captured span is still selected
//! and gets replaced as one undoable edit, or nothing is written. A write
//! that fails midway is rolled back by restoring the original text before
//! the failure is surfaced.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::error::{WandError, WandResult};
use crate::ops::{OperationResult, OperationStatus};
use crate::selection::Selection;

/// The live selected span inside the host editing surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Failure modes of the underlying write primitive
#[derive(Error, Debug)]
pub enum SurfaceError {
    /// The old span was removed but only the first `written` bytes of the
    /// new text made it in; the target needs restoring. `written` is a
    /// byte count on a char boundary of the new text, in the same units
    /// as `replace_range` offsets.
    #[error("write stopped after {written} bytes")]
    Partial { written: usize },

    /// The surface failed without touching the target
    #[error("{0}")]
    Failed(String),
}

/// Host text-editing collaborator.
///
/// The applier never edits text directly; it only reads the selected span
/// and replaces ranges through this interface.
#[async_trait]
pub trait EditSurface: Send + Sync {
    /// Currently selected span, or None when nothing is selected
    async fn selection(&self) -> Result<Option<SelectionSpan>, SurfaceError>;

    /// Replace `[start, end)` with `text` as a single logical edit
    async fn replace_range(&self, start: usize, end: usize, text: &str)
        -> Result<(), SurfaceError>;
}

/// Why an apply was refused without writing anything
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Live selection no longer matches the captured text
    Stale,
    /// Nothing is selected anymore
    NoSelection,
    /// The operation result carried no text to apply
    ResultFailed,
}

/// Outcome of an apply attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Rejected(RejectReason),
}

/// Writes operation results back over the original selection
pub struct TextApplier<E: EditSurface> {
    surface: Arc<E>,
}

impl<E: EditSurface> TextApplier<E> {
    pub fn new(surface: Arc<E>) -> Self {
        Self { surface }
    }

    /// Apply a result over the selection it was computed from.
    ///
    /// Rejects with `Stale` when the user edited or moved on since capture;
    /// that race is absorbed silently upstream. A partial write is rolled
    /// back before `PartialWrite` is returned.
    pub async fn apply(
        &self,
        selection: &Selection,
        result: &OperationResult,
    ) -> WandResult<ApplyOutcome> {
        let OperationStatus::Ok(new_text) = &result.status else {
            return Ok(ApplyOutcome::Rejected(RejectReason::ResultFailed));
        };

        let span = match self.surface.selection().await {
            Ok(Some(span)) => span,
            Ok(None) => {
                debug!("Nothing selected at apply time, rejecting {}", result.request_id);
                return Ok(ApplyOutcome::Rejected(RejectReason::NoSelection));
            }
            Err(e) => {
                // Unreadable surface: treat like a vanished selection
                debug!("Surface read failed at apply time: {}", e);
                return Ok(ApplyOutcome::Rejected(RejectReason::NoSelection));
            }
        };

        if span.text != selection.text {
            debug!(
                "Live selection differs from captured text, rejecting {}",
                result.request_id
            );
            return Ok(ApplyOutcome::Rejected(RejectReason::Stale));
        }

        match self.surface.replace_range(span.start, span.end, new_text).await {
            Ok(()) => {
                info!(
                    "✏️ Applied result {} ({} -> {} chars)",
                    result.request_id,
                    selection.text.chars().count(),
                    new_text.chars().count()
                );
                Ok(ApplyOutcome::Applied)
            }
            Err(SurfaceError::Partial { written }) => {
                self.restore(&span, written).await;
                Err(WandError::PartialWrite(format!(
                    "write stopped after {} bytes, original text restored",
                    written
                )))
            }
            Err(SurfaceError::Failed(msg)) => Err(WandError::Surface(msg)),
        }
    }

    /// Put the original text back after a partial write. The partial edit
    /// removed the old span and inserted `written` bytes at its start.
    async fn restore(&self, span: &SelectionSpan, written: usize) {
        match self
            .surface
            .replace_range(span.start, span.start + written, &span.text)
            .await
        {
            Ok(()) => debug!("Original text restored after partial write"),
            Err(e) => error!("Could not restore original text after partial write: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::FailureReason;
    use crate::selection::SourceHandle;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// In-memory document with a selected range. `fail_after` makes the
    /// next write stop partway to exercise the restore path.
    struct MemorySurface {
        state: Mutex<DocState>,
    }

    struct DocState {
        document: String,
        selected: Option<(usize, usize)>,
        fail_after: Option<usize>,
    }

    impl MemorySurface {
        fn new(document: &str, selected: (usize, usize)) -> Arc<Self> {
            Arc::new(Self {
                state: Mutex::new(DocState {
                    document: document.to_string(),
                    selected: Some(selected),
                    fail_after: None,
                }),
            })
        }

        fn document(&self) -> String {
            self.state.lock().unwrap().document.clone()
        }

        fn deselect(&self) {
            self.state.lock().unwrap().selected = None;
        }

        fn select(&self, start: usize, end: usize) {
            self.state.lock().unwrap().selected = Some((start, end));
        }

        /// Make the next write stop after `chars` characters of the new text
        fn fail_next_write_after(&self, chars: usize) {
            self.state.lock().unwrap().fail_after = Some(chars);
        }
    }

    #[async_trait]
    impl EditSurface for MemorySurface {
        async fn selection(&self) -> Result<Option<SelectionSpan>, SurfaceError> {
            let state = self.state.lock().unwrap();
            Ok(state.selected.map(|(start, end)| SelectionSpan {
                start,
                end,
                text: state.document[start..end].to_string(),
            }))
        }

        async fn replace_range(
            &self,
            start: usize,
            end: usize,
            text: &str,
        ) -> Result<(), SurfaceError> {
            let mut state = self.state.lock().unwrap();
            if let Some(chars) = state.fail_after.take() {
                let partial: String = text.chars().take(chars).collect();
                state.document.replace_range(start..end, &partial);
                state.selected = Some((start, start + partial.len()));
                // Partial reports bytes, in replace_range units
                return Err(SurfaceError::Partial {
                    written: partial.len(),
                });
            }
            state.document.replace_range(start..end, text);
            state.selected = Some((start, start + text.len()));
            Ok(())
        }
    }

    fn ok_result(text: &str) -> OperationResult {
        OperationResult::ok(Uuid::new_v4(), text)
    }

    fn captured(text: &str) -> Selection {
        Selection::new(text, SourceHandle::new("editor"))
    }

    #[tokio::test]
    async fn test_apply_replaces_exact_span() {
        let surface = MemorySurface::new("say hello world now", (4, 15));
        let applier = TextApplier::new(surface.clone());

        let outcome = applier
            .apply(&captured("hello world"), &ok_result("bonjour monde"))
            .await
            .unwrap();

        assert_eq!(outcome, ApplyOutcome::Applied);
        // Surrounding text is byte-for-byte unchanged
        assert_eq!(surface.document(), "say bonjour monde now");
    }

    #[tokio::test]
    async fn test_rejects_when_live_text_differs() {
        let surface = MemorySurface::new("hello world", (0, 11));
        // User shrank the selection to just "hello"
        surface.select(0, 5);
        let applier = TextApplier::new(surface.clone());

        let outcome = applier
            .apply(&captured("hello world"), &ok_result("HELLO WORLD"))
            .await
            .unwrap();

        assert_eq!(outcome, ApplyOutcome::Rejected(RejectReason::Stale));
        assert_eq!(surface.document(), "hello world");
    }

    #[tokio::test]
    async fn test_rejects_when_nothing_selected() {
        let surface = MemorySurface::new("hello world", (0, 11));
        surface.deselect();
        let applier = TextApplier::new(surface.clone());

        let outcome = applier
            .apply(&captured("hello world"), &ok_result("x"))
            .await
            .unwrap();

        assert_eq!(outcome, ApplyOutcome::Rejected(RejectReason::NoSelection));
    }

    #[tokio::test]
    async fn test_failed_result_is_never_written() {
        let surface = MemorySurface::new("hello world", (0, 11));
        let applier = TextApplier::new(surface.clone());

        let result = OperationResult::failed(Uuid::new_v4(), FailureReason::Timeout);
        let outcome = applier.apply(&captured("hello world"), &result).await.unwrap();

        assert_eq!(outcome, ApplyOutcome::Rejected(RejectReason::ResultFailed));
        assert_eq!(surface.document(), "hello world");
    }

    #[tokio::test]
    async fn test_partial_write_restores_original() {
        let surface = MemorySurface::new("keep hello world keep", (5, 16));
        surface.fail_next_write_after(3);
        let applier = TextApplier::new(surface.clone());

        let err = applier
            .apply(&captured("hello world"), &ok_result("replacement"))
            .await
            .unwrap_err();

        assert!(matches!(err, WandError::PartialWrite(_)));
        // Document rolled back, no half-written state left behind
        assert_eq!(surface.document(), "keep hello world keep");
    }

    #[tokio::test]
    async fn test_partial_multibyte_write_restores_original() {
        // Translation output is routinely non-ASCII; the rollback must
        // cover exactly the bytes that landed, not a character count
        let surface = MemorySurface::new("keep hello world keep", (5, 16));
        surface.fail_next_write_after(2);
        let applier = TextApplier::new(surface.clone());

        let err = applier
            .apply(&captured("hello world"), &ok_result("héllö wörld"))
            .await
            .unwrap_err();

        assert!(matches!(err, WandError::PartialWrite(_)));
        assert_eq!(surface.document(), "keep hello world keep");
    }
}
