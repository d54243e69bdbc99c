//! Shared test doubles for the pipeline integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use textwand::apply::{EditSurface, SelectionSpan, SurfaceError};
use textwand::backend::TextProcessor;
use textwand::error::{WandError, WandResult};
use textwand::notify::Notifier;
use textwand::ops::Operation;
use textwand::selection::{SelectionRead, SelectionSource};

/// Selection source fed from a script: queued reads first, then a steady
/// state repeated forever (until replaced)
pub struct ScriptedSource {
    queue: Mutex<VecDeque<SelectionRead>>,
    steady: Mutex<SelectionRead>,
}

impl ScriptedSource {
    pub fn steady(read: SelectionRead) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            steady: Mutex::new(read),
        })
    }

    pub fn push(&self, read: SelectionRead) {
        self.queue.lock().unwrap().push_back(read);
    }

    pub fn set_steady(&self, read: SelectionRead) {
        *self.steady.lock().unwrap() = read;
    }
}

#[async_trait]
impl SelectionSource for ScriptedSource {
    async fn read(&self) -> SelectionRead {
        if let Some(read) = self.queue.lock().unwrap().pop_front() {
            return read;
        }
        self.steady.lock().unwrap().clone()
    }
}

/// Processing backend double. Records every request; replies with a canned
/// string when one is set, otherwise echoes `[operation] text`.
pub struct MockProcessor {
    pub delay: Duration,
    /// Never answer ProcessText (drives the timeout path)
    pub hang: bool,
    /// Health probe result
    pub healthy: bool,
    pub reply: Mutex<Option<String>>,
    pub supported: Vec<String>,
    pub requests: Mutex<Vec<(String, String, String)>>,
}

impl Default for MockProcessor {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            hang: false,
            healthy: true,
            reply: Mutex::new(None),
            supported: Operation::ALL
                .iter()
                .map(|op| op.method_name().to_string())
                .collect(),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl MockProcessor {
    pub fn replying(reply: &str) -> Arc<Self> {
        let processor = Self::default();
        *processor.reply.lock().unwrap() = Some(reply.to_string());
        Arc::new(processor)
    }

    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            hang: true,
            ..Self::default()
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl TextProcessor for MockProcessor {
    async fn process_text(
        &self,
        operation: &str,
        text: &str,
        source_app: &str,
    ) -> WandResult<String> {
        self.requests.lock().unwrap().push((
            operation.to_string(),
            text.to_string(),
            source_app.to_string(),
        ));
        if self.hang {
            futures::future::pending::<()>().await;
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let reply = self.reply.lock().unwrap().clone();
        Ok(reply.unwrap_or_else(|| format!("[{}] {}", operation, text)))
    }

    async fn get_status(&self) -> WandResult<String> {
        if self.healthy {
            Ok("ready".to_string())
        } else {
            Err(WandError::BackendUnavailable("service not found".to_string()))
        }
    }

    async fn get_supported_operations(&self) -> WandResult<Vec<String>> {
        if self.healthy {
            Ok(self.supported.clone())
        } else {
            Err(WandError::BackendUnavailable("service not found".to_string()))
        }
    }
}

/// In-memory document with a selected range standing in for the host
/// editing surface
pub struct MemorySurface {
    state: Mutex<DocState>,
}

struct DocState {
    document: String,
    selected: Option<(usize, usize)>,
    fail_after: Option<usize>,
}

impl MemorySurface {
    pub fn new(document: &str, selected: (usize, usize)) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(DocState {
                document: document.to_string(),
                selected: Some(selected),
                fail_after: None,
            }),
        })
    }

    pub fn document(&self) -> String {
        self.state.lock().unwrap().document.clone()
    }

    pub fn select(&self, start: usize, end: usize) {
        self.state.lock().unwrap().selected = Some((start, end));
    }

    pub fn deselect(&self) {
        self.state.lock().unwrap().selected = None;
    }

    /// Make the next write stop after `chars` characters of the new text
    pub fn fail_next_write_after(&self, chars: usize) {
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

/// Captures transient notices for assertions
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notices(&self) -> Vec<(String, String)> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, summary: &str, body: &str) {
        self.notices
            .lock()
            .unwrap()
            .push((summary.to_string(), body.to_string()));
    }
}
