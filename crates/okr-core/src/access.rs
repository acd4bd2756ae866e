//! Role-based permission gate for configured members.
//!
//! This is a client-side gate: it decides what the CLI and API offer to a
//! named user, it does not secure the files on disk.

use crate::config::Config;
use crate::error::{OkrError, Result};
use crate::types::Role;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ManageCycles,
    EditObjectives,
    CheckIn,
    ManageTeams,
    ManageConfig,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::ManageCycles => "manage cycles",
            Action::EditObjectives => "edit objectives",
            Action::CheckIn => "check in",
            Action::ManageTeams => "manage teams",
            Action::ManageConfig => "manage config",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn role_allows(role: Role, action: Action) -> bool {
    match role {
        Role::Admin => true,
        Role::Champion => action != Action::ManageConfig,
        Role::Collaborator => action == Action::CheckIn,
    }
}

/// Check that `user` may perform `action`.
///
/// With no members configured every action is allowed. Once members exist a
/// missing or unknown user is rejected.
pub fn authorize(config: &Config, user: Option<&str>, action: Action) -> Result<()> {
    if config.members.is_empty() {
        return Ok(());
    }
    let name = user.unwrap_or_default();
    let member = config
        .member(name)
        .ok_or_else(|| OkrError::UnknownUser(if name.is_empty() { "<none>".into() } else { name.into() }))?;
    if role_allows(member.role, action) {
        Ok(())
    } else {
        Err(OkrError::PermissionDenied {
            user: member.name.clone(),
            role: member.role.to_string(),
            action: action.to_string(),
        })
    }
}
