//! Pipeline Supervisor
//!
//! Owns the selection → trigger → dispatch → apply pipeline. Consumes the
//! watcher's ordered event stream and the external invoke-gesture stream,
//! runs the trigger policy inline, and spawns one task per accepted invoke
//! so dispatch and apply never stall event processing.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::apply::{ApplyOutcome, EditSurface, TextApplier};
use crate::backend::TextProcessor;
use crate::dispatch::OperationDispatcher;
use crate::error::WandError;
use crate::menu::{self, MenuPresenter};
use crate::notify::Notifier;
use crate::ops::{FailureReason, OperationStatus};
use crate::selection::{Selection, SelectionSource, SourceHandle};
use crate::trigger::{InvokeSignal, TriggerDecision, TriggerPolicy};
use crate::watcher::SelectionEvent;

/// Drives the pipeline until cancelled or an input stream closes
pub struct Supervisor<S, P, E>
where
    S: SelectionSource,
    P: TextProcessor + 'static,
    E: EditSurface + 'static,
{
    trigger: TriggerPolicy<S>,
    processor: Arc<P>,
    dispatcher: Arc<OperationDispatcher<P>>,
    applier: Arc<TextApplier<E>>,
    menu: Arc<dyn MenuPresenter>,
    notifier: Arc<dyn Notifier>,
    events: mpsc::Receiver<SelectionEvent>,
    invokes: mpsc::Receiver<InvokeSignal>,
    last_handle: Option<SourceHandle>,
}

impl<S, P, E> Supervisor<S, P, E>
where
    S: SelectionSource,
    P: TextProcessor + 'static,
    E: EditSurface + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        trigger: TriggerPolicy<S>,
        processor: Arc<P>,
        dispatcher: Arc<OperationDispatcher<P>>,
        applier: Arc<TextApplier<E>>,
        menu: Arc<dyn MenuPresenter>,
        notifier: Arc<dyn Notifier>,
        events: mpsc::Receiver<SelectionEvent>,
        invokes: mpsc::Receiver<InvokeSignal>,
    ) -> Self {
        Self {
            trigger,
            processor,
            dispatcher,
            applier,
            menu,
            notifier,
            events,
            invokes,
            last_handle: None,
        }
    }

    /// Event loop. Returns when cancelled or when both inputs close.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("🪄 Pipeline supervisor running");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = self.events.recv() => match event {
                    Some(event) => self.on_event(event),
                    None => {
                        debug!("Watcher stream closed, stopping supervisor");
                        break;
                    }
                },
                signal = self.invokes.recv() => match signal {
                    Some(signal) => self.on_invoke(signal).await,
                    None => {
                        debug!("Invoke stream closed, stopping supervisor");
                        break;
                    }
                },
            }
        }

        info!("🪄 Pipeline supervisor stopped");
    }

    /// A superseding or vanished selection makes any in-flight request for
    /// its source stale, so cancel before updating trigger state
    fn on_event(&mut self, event: SelectionEvent) {
        match &event {
            SelectionEvent::Appeared(sel) => {
                self.last_handle = Some(sel.handle.clone());
            }
            SelectionEvent::Changed { old, new } => {
                self.dispatcher.cancel_for(&old.handle);
                self.last_handle = Some(new.handle.clone());
            }
            SelectionEvent::Cleared => {
                if let Some(handle) = self.last_handle.take() {
                    self.dispatcher.cancel_for(&handle);
                }
            }
        }
        self.trigger.observe(&event);
    }

    async fn on_invoke(&mut self, signal: InvokeSignal) {
        match self.trigger.on_invoke(&signal).await {
            TriggerDecision::Ignore => {}
            TriggerDecision::Show {
                selection,
                position,
            } => {
                let processor = self.processor.clone();
                let dispatcher = self.dispatcher.clone();
                let applier = self.applier.clone();
                let menu = self.menu.clone();
                let notifier = self.notifier.clone();
                tokio::spawn(async move {
                    run_operation(
                        processor, dispatcher, applier, menu, notifier, selection, position,
                    )
                    .await;
                });
            }
        }
    }
}

/// Menu → dispatch → apply for one accepted invoke.
///
/// Timeout and backend failures surface as a transient notice and are
/// never retried automatically; stale-selection races abort silently.
async fn run_operation<P, E>(
    processor: Arc<P>,
    dispatcher: Arc<OperationDispatcher<P>>,
    applier: Arc<TextApplier<E>>,
    menu: Arc<dyn MenuPresenter>,
    notifier: Arc<dyn Notifier>,
    selection: Selection,
    position: (i32, i32),
) where
    P: TextProcessor,
    E: EditSurface,
{
    let supported = match processor.get_supported_operations().await {
        Ok(supported) => supported,
        Err(e) => {
            notifier.notify("Text operations unavailable", &e.to_string());
            return;
        }
    };

    let items = menu::build_items(&supported);
    if items.is_empty() {
        debug!("Backend offers no known operations, not showing menu");
        return;
    }

    let Some(operation) = menu.present(&items, position).await else {
        debug!("Menu dismissed without a choice");
        return;
    };

    let source_app = selection.handle.app().to_string();
    let result = dispatcher.dispatch(operation, &selection, &source_app).await;

    match &result.status {
        OperationStatus::Ok(_) => match applier.apply(&selection, &result).await {
            Ok(ApplyOutcome::Applied) => {
                info!("✅ {} applied for {}", operation.method_name(), source_app);
            }
            Ok(ApplyOutcome::Rejected(reason)) => {
                // User kept typing or moved on; their race, stay silent
                debug!("Apply rejected ({:?}) for {}", reason, result.request_id);
            }
            Err(WandError::PartialWrite(msg)) => {
                notifier.notify("Text replacement failed", &msg);
            }
            Err(e) => {
                notifier.notify("Text replacement failed", &e.to_string());
            }
        },
        OperationStatus::Failed(FailureReason::Timeout) => {
            notifier.notify(
                "Operation timed out",
                "The processing backend did not respond; your text is unchanged.",
            );
        }
        OperationStatus::Failed(FailureReason::BackendUnavailable(msg)) => {
            notifier.notify("Processing backend unavailable", msg);
        }
        OperationStatus::Failed(FailureReason::Backend(msg)) => {
            notifier.notify("Operation failed", msg);
        }
        OperationStatus::Failed(FailureReason::Cancelled) => {
            debug!("Request {} cancelled before completion", result.request_id);
        }
    }
}
