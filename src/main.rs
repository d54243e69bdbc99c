//! TextWand - Selection-aware AI text operations for the Linux desktop
//!
//! Background daemon: watches the X11 primary selection, and on an invoke
//! gesture (SIGUSR1, typically bound to a hotkey daemon) sends the
//! selected text to the processing backend over D-Bus and pastes the
//! result back in place.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use textwand::apply::TextApplier;
use textwand::backend::DbusProcessor;
use textwand::config::Config;
use textwand::dispatch::OperationDispatcher;
use textwand::menu::DefaultOperationPresenter;
use textwand::notify::DesktopNotifier;
use textwand::ops::Operation;
use textwand::selection::XclipSource;
use textwand::supervisor::Supervisor;
use textwand::surface::PasteSurface;
use textwand::trigger::{InvokeSignal, TriggerPolicy};
use textwand::watcher::SelectionWatcher;
use textwand::x11;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Selection poll interval in milliseconds
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Well-known bus name of the processing backend
    #[arg(long)]
    service: Option<String>,

    /// Operation to run on invoke when no menu renderer is attached
    #[arg(long)]
    operation: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load()?;
    if let Some(ms) = args.poll_interval {
        config.poll_interval_ms = ms;
    }
    if let Some(service) = &args.service {
        config.backend_service = service.clone();
    }
    if let Some(operation) = &args.operation {
        config.default_operation = operation.clone();
    }

    // Setup logging
    let level = if args.verbose {
        Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(Level::INFO)
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("🪄 TextWand v{} starting...", env!("CARGO_PKG_VERSION"));

    let default_operation =
        Operation::from_method(&config.default_operation).unwrap_or_else(|| {
            warn!(
                "Unknown default operation '{}', falling back to fix_grammar",
                config.default_operation
            );
            Operation::FixGrammar
        });

    let processor = Arc::new(DbusProcessor::connect_to(&config.backend_service).await?);
    let source = Arc::new(XclipSource::new());

    let cancel = CancellationToken::new();
    let events = SelectionWatcher::new(
        source.clone(),
        config.poll_interval(),
        config.stability_polls,
    )
    .spawn(cancel.child_token());

    // SIGUSR1 is the invoke gesture hook: a hotkey daemon or window-manager
    // binding delivers the user's explicit "show me the menu" request
    let (invoke_tx, invoke_rx) = mpsc::channel::<InvokeSignal>(8);
    let mut usr1 = signal(SignalKind::user_defined1())?;
    tokio::spawn(async move {
        while usr1.recv().await.is_some() {
            let position = x11::mouse_position(Duration::from_secs(1))
                .await
                .unwrap_or((0, 0));
            if invoke_tx
                .send(InvokeSignal {
                    position,
                    handle: None,
                })
                .await
                .is_err()
            {
                break;
            }
        }
    });

    let dispatcher = Arc::new(OperationDispatcher::new(
        processor.clone(),
        config.dispatch_timeout(),
    ));
    let applier = Arc::new(TextApplier::new(Arc::new(PasteSurface::new())));
    let trigger = TriggerPolicy::new(source, config.min_trigger_len);

    let supervisor = Supervisor::new(
        trigger,
        processor,
        dispatcher,
        applier,
        Arc::new(DefaultOperationPresenter::new(default_operation)),
        Arc::new(DesktopNotifier),
        events,
        invoke_rx,
    );
    let pipeline = tokio::spawn(supervisor.run(cancel.child_token()));

    info!(
        "✅ TextWand ready - select text and send SIGUSR1 to run '{}'",
        default_operation.method_name()
    );

    tokio::signal::ctrl_c().await?;
    info!("🛑 Shutting down...");
    cancel.cancel();
    pipeline.await?;

    Ok(())
}
