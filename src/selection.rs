//! Selection Types and Source
//!
//! Models the OS-level "currently highlighted text" primitive. The
//! `SelectionSource` trait abstracts the platform probe; `XclipSource` is
//! the X11 primary-selection implementation used by the daemon.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

use crate::x11;

/// Opaque identifier for the application/field that owns a selection.
///
/// Weak by design: it targets write-back and names the source app, but is
/// never assumed to outlive the selection event that carried it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceHandle(String);

impl SourceHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn unknown() -> Self {
        Self("unknown".to_string())
    }

    /// Application name for backend requests
    pub fn app(&self) -> &str {
        &self.0
    }
}

/// An immutable snapshot of highlighted text.
///
/// Created on each poll, compared against the previous snapshot, and
/// discarded once superseded. Replace, don't mutate.
#[derive(Debug, Clone)]
pub struct Selection {
    pub text: String,
    pub captured_at: Instant,
    pub handle: SourceHandle,
}

impl Selection {
    pub fn new(text: impl Into<String>, handle: SourceHandle) -> Self {
        Self {
            text: text.into(),
            captured_at: Instant::now(),
            handle,
        }
    }
}

/// One probe of the OS selection state
#[derive(Debug, Clone)]
pub enum SelectionRead {
    /// Non-empty highlighted text
    Text(Selection),
    /// Nothing highlighted
    Empty,
    /// The selection mechanism could not be reached; callers treat this
    /// the same as Empty
    Unavailable,
}

/// Read-only probe of the current text selection.
///
/// Must return within a short bounded time; a wedged platform probe is
/// reported as `Unavailable`, never propagated as an error.
#[async_trait]
pub trait SelectionSource: Send + Sync {
    async fn read(&self) -> SelectionRead;
}

/// X11 primary-selection source backed by `xclip`
pub struct XclipSource {
    probe_timeout: Duration,
}

impl XclipSource {
    pub fn new() -> Self {
        Self {
            probe_timeout: Duration::from_secs(1),
        }
    }
}

impl Default for XclipSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SelectionSource for XclipSource {
    async fn read(&self) -> SelectionRead {
        match x11::read_selection("primary", self.probe_timeout).await {
            Ok(Some(text)) => {
                let handle = x11::active_window_class(self.probe_timeout)
                    .await
                    .map(SourceHandle::new)
                    .unwrap_or_else(SourceHandle::unknown);
                SelectionRead::Text(Selection::new(text, handle))
            }
            Ok(None) => SelectionRead::Empty,
            Err(e) => {
                debug!("Selection probe unavailable: {}", e);
                SelectionRead::Unavailable
            }
        }
    }
}
