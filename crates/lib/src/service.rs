//! Process-wide assistant state: the API client and the workspace it talks to.
//!
//! Both are created lazily on first use and published together through a `OnceCell`.
//! Concurrent first callers wait for a single initialization; a failed initialization
//! leaves the cell empty so the next request starts over from credential resolution.
//! Initialization runs on its own task, so a caller that goes away mid-provisioning does
//! not abort it; the next caller waits on the same task instead of starting another.

use crate::assistant::{AssistantApi, AssistantError, ClientFactory, HttpClientFactory};
use crate::config::AssistantSettings;
use crate::credentials::{self, CredentialsError};
use crate::forward::{self, InboundMessage};
use crate::provision::{self, ProvisionError, Provisioned};
use crate::training::TrainingDefinition;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tokio::task::JoinHandle;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Configuration(#[from] CredentialsError),
    #[error("provisioning error: {0}")]
    Provisioning(#[from] ProvisionError),
    #[error(transparent)]
    Remote(#[from] AssistantError),
    #[error("initialization task failed: {0}")]
    Initialization(#[from] tokio::task::JoinError),
}

/// Client plus resolved workspace. Never observable half-built.
#[derive(Clone)]
pub struct Ready {
    pub client: Arc<dyn AssistantApi>,
    pub workspace: Provisioned,
}

/// Lazily initialized assistant client and workspace, shared by all requests.
pub struct AssistantService {
    settings: AssistantSettings,
    factory: Arc<dyn ClientFactory>,
    ready: OnceCell<Ready>,
    pending: Mutex<Option<JoinHandle<Result<Ready, ServiceError>>>>,
}

impl AssistantService {
    /// Service backed by the HTTP client for the configured API version.
    pub fn new(settings: AssistantSettings) -> Self {
        let factory = Arc::new(HttpClientFactory::new(settings.version.clone()));
        Self::with_factory(settings, factory)
    }

    pub fn with_factory(settings: AssistantSettings, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            settings,
            factory,
            ready: OnceCell::new(),
            pending: Mutex::new(None),
        }
    }

    /// Workspace id once initialization has completed.
    pub fn workspace_id(&self) -> Option<&str> {
        self.ready.get().map(|r| r.workspace.workspace_id.as_str())
    }

    /// Client and workspace, initializing them on first call.
    pub async fn ready(&self) -> Result<&Ready, ServiceError> {
        self.ready.get_or_try_init(|| self.join_initialization()).await
    }

    /// Wait for the in-flight initialization task, spawning one if none is running.
    /// The handle stays stored if this caller is dropped while waiting.
    async fn join_initialization(&self) -> Result<Ready, ServiceError> {
        let mut pending = self.pending.lock().await;
        let task = pending.get_or_insert_with(|| {
            tokio::spawn(initialize(self.settings.clone(), self.factory.clone()))
        });
        let result = task.await;
        *pending = None;
        result?
    }

    /// Ensure the service is initialized, then forward the turn. `None` in, `None` out.
    pub async fn message(
        &self,
        inbound: Option<InboundMessage>,
    ) -> Result<Option<serde_json::Value>, ServiceError> {
        let ready = self.ready().await?;
        let response = forward::forward(
            ready.client.as_ref(),
            &ready.workspace.workspace_id,
            inbound,
        )
        .await?;
        Ok(response)
    }
}

async fn initialize(
    settings: AssistantSettings,
    factory: Arc<dyn ClientFactory>,
) -> Result<Ready, ServiceError> {
    let creds = credentials::resolve(&settings)?;
    let client = factory.connect(creds);
    let training_file = settings.training_file.as_deref();
    let workspace = provision::provision_workspace(
        client.as_ref(),
        settings.workspace_id.as_deref(),
        || TrainingDefinition::load(training_file),
    )
    .await?;
    log::info!(
        "assistant ready: workspace {} ({:?})",
        workspace.workspace_id,
        workspace.source
    );
    Ok(Ready { client, workspace })
}
