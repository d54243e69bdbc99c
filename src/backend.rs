//! D-Bus client for the text-processing backend
//!
//! Uses zbus for async D-Bus communication with the external processor
//! service on the session bus. The wire contract (method names, argument
//! order, types) is fixed for compatibility; the backend's internal
//! algorithm is its own business.

use async_trait::async_trait;
use tracing::{info, warn};
use zbus::{proxy, Connection};

use crate::error::{WandError, WandResult};

/// Well-known bus name of the processing backend
pub const DEFAULT_SERVICE: &str = "org.textwand.Processor";

/// D-Bus proxy for the processor service
#[proxy(
    interface = "org.textwand.Processor",
    default_service = "org.textwand.Processor",
    default_path = "/org/textwand/Processor"
)]
trait Processor {
    /// Run one operation over the given text
    fn process_text(&self, operation: &str, text: &str, source_app: &str) -> zbus::Result<String>;

    /// Health indicator
    fn get_status(&self) -> zbus::Result<String>;

    /// Operations the backend currently supports
    fn get_supported_operations(&self) -> zbus::Result<Vec<String>>;
}

/// Seam between the dispatcher and the IPC transport.
///
/// The daemon talks to `DbusProcessor`; tests substitute mock processors.
#[async_trait]
pub trait TextProcessor: Send + Sync {
    async fn process_text(&self, operation: &str, text: &str, source_app: &str)
        -> WandResult<String>;

    async fn get_status(&self) -> WandResult<String>;

    async fn get_supported_operations(&self) -> WandResult<Vec<String>>;
}

/// Client for the processor service over the session bus
#[derive(Debug, Clone)]
pub struct DbusProcessor {
    proxy: ProcessorProxy<'static>,
}

impl DbusProcessor {
    /// Connect to the session bus and bind the default service name.
    ///
    /// The backend may not be registered yet; binding succeeds regardless
    /// and individual calls report `BackendUnavailable` until it appears.
    pub async fn connect() -> WandResult<Self> {
        Self::connect_to(DEFAULT_SERVICE).await
    }

    /// Connect with an explicit well-known service name
    pub async fn connect_to(service: &str) -> WandResult<Self> {
        let connection = Connection::session()
            .await
            .map_err(|e| WandError::BackendUnavailable(e.to_string()))?;

        let proxy = ProcessorProxy::builder(&connection)
            .destination(service.to_string())
            .map_err(|e| WandError::BackendUnavailable(e.to_string()))?
            .build()
            .await
            .map_err(|e| WandError::BackendUnavailable(e.to_string()))?;

        let client = Self { proxy };

        // Liveness probe, informational only
        match client.proxy.get_status().await {
            Ok(status) => info!("🔌 Connected to processor backend: {}", status),
            Err(e) => warn!("⚠️ Processor backend not responding yet: {}", e),
        }

        Ok(client)
    }
}

/// Both "service not found" and "connection lost mid-call" surface as
/// dispatch failures of the same kind
fn backend_err(e: zbus::Error) -> WandError {
    WandError::BackendUnavailable(e.to_string())
}

#[async_trait]
impl TextProcessor for DbusProcessor {
    async fn process_text(
        &self,
        operation: &str,
        text: &str,
        source_app: &str,
    ) -> WandResult<String> {
        self.proxy
            .process_text(operation, text, source_app)
            .await
            .map_err(backend_err)
    }

    async fn get_status(&self) -> WandResult<String> {
        self.proxy.get_status().await.map_err(backend_err)
    }

    async fn get_supported_operations(&self) -> WandResult<Vec<String>> {
        self.proxy.get_supported_operations().await.map_err(backend_err)
    }
}
