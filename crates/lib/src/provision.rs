//! Workspace selection. Rules are tried in order and the first that yields an id wins:
//!
//! 1. a configured workspace id, returned as-is with no remote check;
//! 2. the first workspace the service lists, in the service's order;
//! 3. a new workspace created from the training definition.

use crate::assistant::{AssistantApi, AssistantError};
use crate::training::{TrainingDefinition, TrainingError};

/// Opaque remote workspace identifier.
pub type WorkspaceId = String;

/// Which rule produced the workspace id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceSource {
    Configured,
    Existing,
    Created,
}

/// Outcome of provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioned {
    pub workspace_id: WorkspaceId,
    pub source: WorkspaceSource,
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("listing workspaces failed: {0}")]
    List(#[source] AssistantError),
    #[error("loading training definition failed: {0}")]
    Training(#[from] TrainingError),
    #[error("creating workspace failed: {0}")]
    Create(#[source] AssistantError),
}

/// Resolve the workspace to talk to. `load_training` is only called when a workspace must be created.
pub async fn provision_workspace<F>(
    api: &dyn AssistantApi,
    configured: Option<&str>,
    load_training: F,
) -> Result<Provisioned, ProvisionError>
where
    F: FnOnce() -> Result<TrainingDefinition, TrainingError>,
{
    if let Some(id) = configured {
        log::debug!("using configured workspace {}", id);
        return Ok(Provisioned {
            workspace_id: id.to_string(),
            source: WorkspaceSource::Configured,
        });
    }

    let workspaces = api.list_workspaces().await.map_err(|e| {
        log::error!("error getting the workspaces: {}", e);
        ProvisionError::List(e)
    })?;
    if let Some(first) = workspaces.into_iter().next() {
        log::info!("using existing workspace {}", first.workspace_id);
        return Ok(Provisioned {
            workspace_id: first.workspace_id,
            source: WorkspaceSource::Existing,
        });
    }

    log::info!("no workspace found, creating a new one");
    let definition = load_training()?;
    let created = api
        .create_workspace(&definition)
        .await
        .map_err(ProvisionError::Create)?;
    log::info!("workspace created, id: {}", created.workspace_id);
    Ok(Provisioned {
        workspace_id: created.workspace_id,
        source: WorkspaceSource::Created,
    })
}
