//! User Notifications
//!
//! Transient failure notices (backend timeout, backend unavailable) are
//! the only errors the user ever sees; everything else is absorbed or
//! logged. Delivery is best-effort and must never block the pipeline.

use std::process::{Command, Stdio};

use tracing::{debug, warn};

/// Delivers short transient notices to the user
pub trait Notifier: Send + Sync {
    fn notify(&self, summary: &str, body: &str);
}

/// Desktop notifications via `notify-send`, fire-and-forget
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, summary: &str, body: &str) {
        warn!("🔔 {}: {}", summary, body);
        let spawned = Command::new("notify-send")
            .args(["--app-name=textwand", "--expire-time=4000", summary, body])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        if let Err(e) = spawned {
            debug!("notify-send unavailable: {}", e);
        }
    }
}

/// Log-only notifier for tests and headless sessions
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, summary: &str, body: &str) {
        warn!("🔔 {}: {}", summary, body);
    }
}
