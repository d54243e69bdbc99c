//! Clipboard-swap Edit Surface
//!
//! `EditSurface` implementation for arbitrary X11 applications, where no
//! range-addressed editing API exists. The selected span is the primary
//! selection itself, and replacement works by parking the result on the
//! clipboard, simulating Ctrl+V over the highlighted text, then restoring
//! the user's clipboard. The paste lands as a single edit in the target
//! application, so it stays one undo step.

use std::time::Duration;

use async_trait::async_trait;

use crate::apply::{EditSurface, SelectionSpan, SurfaceError};
use crate::x11;

/// Delay for the target application to process the synthetic paste
const PASTE_SETTLE: Duration = Duration::from_millis(100);

pub struct PasteSurface {
    probe_timeout: Duration,
}

impl PasteSurface {
    pub fn new() -> Self {
        Self {
            probe_timeout: Duration::from_secs(1),
        }
    }
}

impl Default for PasteSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EditSurface for PasteSurface {
    async fn selection(&self) -> Result<Option<SelectionSpan>, SurfaceError> {
        let text = x11::read_selection("primary", self.probe_timeout)
            .await
            .map_err(|e| SurfaceError::Failed(e.to_string()))?;
        Ok(text.map(|text| SelectionSpan {
            start: 0,
            end: text.len(),
            text,
        }))
    }

    async fn replace_range(
        &self,
        _start: usize,
        _end: usize,
        text: &str,
    ) -> Result<(), SurfaceError> {
        // Park the user's clipboard so the swap is invisible afterwards
        let saved = x11::read_selection("clipboard", self.probe_timeout)
            .await
            .unwrap_or(None);

        x11::set_clipboard(text, self.probe_timeout)
            .await
            .map_err(|e| SurfaceError::Failed(e.to_string()))?;

        // Clipboard holds the new text but nothing is pasted yet, so a
        // paste failure here leaves the target untouched
        x11::paste_key(self.probe_timeout)
            .await
            .map_err(|e| SurfaceError::Failed(e.to_string()))?;

        tokio::time::sleep(PASTE_SETTLE).await;

        if let Some(saved) = saved {
            // Restore is cosmetic; the edit itself already landed
            let _ = x11::set_clipboard(&saved, self.probe_timeout).await;
        }

        Ok(())
    }
}
