//! Trigger Policy
//!
//! Decides when the operation menu may be offered. The menu is strictly
//! user-initiated: an invoke gesture only surfaces it while a stabilized
//! selection is active, long enough to be worth processing, and still live
//! at the moment of the gesture.
//!
//! Auto-triggering after a fixed stability delay was considered and
//! rejected: it surfaces UI the user never asked for. This policy only
//! reacts to explicit gestures.

use std::sync::Arc;

use tracing::debug;

use crate::selection::{Selection, SelectionRead, SelectionSource, SourceHandle};
use crate::watcher::SelectionEvent;

/// An explicit "user requested the menu" gesture, delivered by a
/// collaborator outside this crate (hotkey daemon, secondary click, ...)
#[derive(Debug, Clone)]
pub struct InvokeSignal {
    /// Screen position to anchor the menu at
    pub position: (i32, i32),
    /// Window/field the gesture landed on, when the collaborator knows
    /// it. A gesture carrying a handle other than the active selection's
    /// is ignored; `None` means "wherever the selection is".
    pub handle: Option<SourceHandle>,
}

/// What to do with an invoke gesture
#[derive(Debug, Clone)]
pub enum TriggerDecision {
    /// Offer the menu for this selection at this position
    Show {
        selection: Selection,
        position: (i32, i32),
    },
    /// No active selection, too short, or gone stale: do nothing
    Ignore,
}

/// Gates menu display on selection liveness and an explicit user gesture
pub struct TriggerPolicy<S: SelectionSource> {
    source: Arc<S>,
    min_trigger_len: usize,
    active: Option<Selection>,
}

impl<S: SelectionSource> TriggerPolicy<S> {
    pub fn new(source: Arc<S>, min_trigger_len: usize) -> Self {
        Self {
            source,
            min_trigger_len,
            active: None,
        }
    }

    /// Track the stabilized selection state from the watcher's event stream
    pub fn observe(&mut self, event: &SelectionEvent) {
        match event {
            SelectionEvent::Appeared(sel) => self.active = Some(sel.clone()),
            SelectionEvent::Changed { new, .. } => self.active = Some(new.clone()),
            SelectionEvent::Cleared => self.active = None,
        }
    }

    /// Currently tracked selection, if any
    pub fn active(&self) -> Option<&Selection> {
        self.active.as_ref()
    }

    /// Decide whether an invoke gesture should surface the menu.
    ///
    /// Re-reads the source at the moment of trigger: if the captured text
    /// no longer matches what is highlighted, the selection is treated as
    /// cleared and the gesture is ignored.
    pub async fn on_invoke(&mut self, signal: &InvokeSignal) -> TriggerDecision {
        let Some(selection) = self.active.clone() else {
            debug!("Invoke with no active selection, ignoring");
            return TriggerDecision::Ignore;
        };

        if selection.text.chars().count() <= self.min_trigger_len {
            debug!(
                "Invoke on short selection ({} chars), ignoring",
                selection.text.chars().count()
            );
            return TriggerDecision::Ignore;
        }

        // A gesture aimed at a different app than the one holding the
        // selection must not operate on that selection
        if let Some(target) = &signal.handle {
            if *target != selection.handle {
                debug!(
                    "Invoke targeted {:?} but selection belongs to {:?}, ignoring",
                    target, selection.handle
                );
                return TriggerDecision::Ignore;
            }
        }

        let live_matches = match self.source.read().await {
            SelectionRead::Text(live) => live.text == selection.text,
            SelectionRead::Empty | SelectionRead::Unavailable => false,
        };

        if !live_matches {
            debug!("Selection went stale before invoke, treating as cleared");
            self.active = None;
            return TriggerDecision::Ignore;
        }

        TriggerDecision::Show {
            selection,
            position: signal.position,
        }
    }
}
