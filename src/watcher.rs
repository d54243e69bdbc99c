//! Selection Watcher
//!
//! Polls the selection source at a fixed interval, debounces transient
//! reads, and emits stabilized selection events in strict poll order.
//!
//! The debounce is the key correctness property here: a new text must be
//! observed for a minimum number of consecutive polls before an event is
//! emitted, which suppresses the intermediate selections produced while the
//! user is still drag-selecting.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::selection::{Selection, SelectionRead, SelectionSource};

/// Channel depth for the event stream. The supervisor drains between poll
/// ticks, so this only absorbs short consumer stalls.
const EVENT_CHANNEL_DEPTH: usize = 32;

/// A stabilized change in the user's selection
#[derive(Debug, Clone)]
pub enum SelectionEvent {
    /// A selection appeared where there was none
    Appeared(Selection),
    /// The active selection was replaced by a different one
    Changed { old: Selection, new: Selection },
    /// The active selection went away
    Cleared,
}

/// Debouncing state machine over {Idle, Active}.
///
/// Pure with respect to I/O: `step` is fed one poll result at a time and
/// returns at most one event, which keeps the ordering guarantee trivial.
pub struct Debouncer {
    stability_polls: u32,
    active: Option<Selection>,
    pending: Option<(Selection, u32)>,
}

impl Debouncer {
    pub fn new(stability_polls: u32) -> Self {
        Self {
            stability_polls: stability_polls.max(1),
            active: None,
            pending: None,
        }
    }

    /// Currently stabilized selection, if any
    pub fn active(&self) -> Option<&Selection> {
        self.active.as_ref()
    }

    /// Feed one poll result; returns the event to emit, if any
    pub fn step(&mut self, read: SelectionRead) -> Option<SelectionEvent> {
        match read {
            SelectionRead::Text(sel) => self.step_text(sel),
            // Unavailable is absorbed as "no selection"
            SelectionRead::Empty | SelectionRead::Unavailable => self.step_empty(),
        }
    }

    fn step_text(&mut self, sel: Selection) -> Option<SelectionEvent> {
        // Identical to the active selection: settle, and drop any tentative
        // change so a brief identical reappearance emits nothing
        if let Some(active) = &self.active {
            if active.text == sel.text {
                self.pending = None;
                return None;
            }
        }

        let seen = match &self.pending {
            Some((candidate, count)) if candidate.text == sel.text => count + 1,
            _ => 1,
        };

        if seen >= self.stability_polls {
            self.pending = None;
            let old = self.active.replace(sel.clone());
            return Some(match old {
                Some(old) => SelectionEvent::Changed { old, new: sel },
                None => SelectionEvent::Appeared(sel),
            });
        }

        // Keep the freshest snapshot so the emitted event carries a recent
        // capture timestamp and handle
        self.pending = Some((sel, seen));
        None
    }

    fn step_empty(&mut self) -> Option<SelectionEvent> {
        self.pending = None;
        if self.active.take().is_some() {
            Some(SelectionEvent::Cleared)
        } else {
            None
        }
    }
}

/// Polls a `SelectionSource` on its own schedule and emits stabilized
/// events over a single-producer single-consumer channel.
pub struct SelectionWatcher<S: SelectionSource> {
    source: Arc<S>,
    poll_interval: Duration,
    stability_polls: u32,
}

impl<S: SelectionSource + 'static> SelectionWatcher<S> {
    pub fn new(source: Arc<S>, poll_interval: Duration, stability_polls: u32) -> Self {
        Self {
            source,
            poll_interval,
            stability_polls,
        }
    }

    /// Start the polling loop as a background task.
    ///
    /// The loop runs until `cancel` fires or the consumer drops the
    /// receiver. No shared mutable state: everything the loop touches is
    /// owned by the task, and the only output is the ordered event stream.
    pub fn spawn(self, cancel: CancellationToken) -> mpsc::Receiver<SelectionEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_DEPTH);

        tokio::spawn(async move {
            let mut debouncer = Debouncer::new(self.stability_polls);
            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            info!(
                "👀 Selection watcher started ({}ms poll)",
                self.poll_interval.as_millis()
            );

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Selection watcher cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        let read = self.source.read().await;
                        if let Some(event) = debouncer.step(read) {
                            debug!("Selection event: {:?}", event);
                            if tx.send(event).await.is_err() {
                                warn!("Selection event consumer dropped, stopping watcher");
                                break;
                            }
                        }
                    }
                }
            }

            info!("👋 Selection watcher stopped");
        });

        rx
    }
}
