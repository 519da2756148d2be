//! Agent selection: which backend agents are active.

use crate::client::{AgentCatalog, AgentInfo, ApiClient, ApiError};

/// Most agents the backend runs at once.
pub const MAX_SELECTED_AGENTS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// Selection is full; nothing changed.
    LimitReached,
}

/// Local copy of the catalog plus the user's pending selection.
#[derive(Debug, Clone, Default)]
pub struct AgentSelection {
    pub available: Vec<AgentInfo>,
    pub selected: Vec<String>,
}

impl AgentSelection {
    pub fn from_catalog(catalog: AgentCatalog) -> Self {
        Self {
            available: catalog.available,
            selected: catalog.selected,
        }
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.iter().any(|s| s == name)
    }

    /// Whether `name` can be ticked right now.
    pub fn can_add(&self, name: &str) -> bool {
        self.is_selected(name) || self.selected.len() < MAX_SELECTED_AGENTS
    }

    pub fn toggle(&mut self, name: &str) -> ToggleOutcome {
        if self.is_selected(name) {
            self.selected.retain(|s| s != name);
            ToggleOutcome::Removed
        } else if self.selected.len() >= MAX_SELECTED_AGENTS {
            tracing::warn!(agent = name, "agent selection limit reached");
            ToggleOutcome::LimitReached
        } else {
            self.selected.push(name.to_string());
            ToggleOutcome::Added
        }
    }
}

/// Persist the selection. `Ok(true)` means the backend accepted it and the
/// client should reload.
pub async fn save_selection(client: &ApiClient, selected: &[String]) -> Result<bool, ApiError> {
    if selected.len() > MAX_SELECTED_AGENTS {
        return Err(ApiError::InvalidInput(format!(
            "You can only select up to {} agents at a time",
            MAX_SELECTED_AGENTS
        )));
    }

    let resp = client.set_selected_agents(selected).await?;
    tracing::info!(status = %resp.status, agents = ?resp.agents, "agent selection saved");
    Ok(resp.status == "success")
}
