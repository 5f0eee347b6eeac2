use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Expert,
    Collaborateur,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "expert" => Ok(Role::Expert),
            "collaborateur" => Ok(Role::Collaborateur),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "admin",
            Role::Expert => "expert",
            Role::Collaborateur => "collaborateur",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ViewDashboard,
    ViewClients,
    RecordTimesheet,
    ManageClients,
    ViewCollaborators,
    ManageCollaborators,
    ViewOrgChart,
    ViewStatistics,
    ManageFixedCosts,
    ManageSettings,
    ViewTeamTimesheets,
    InviteUsers,
}

impl Role {
    pub fn can(self, capability: Capability) -> bool {
        use Capability::*;

        match capability {
            ViewDashboard | ViewClients | RecordTimesheet => true,
            ManageClients | ViewCollaborators | ManageCollaborators | ViewOrgChart
            | ViewStatistics | ManageFixedCosts | ManageSettings | ViewTeamTimesheets => {
                matches!(self, Role::Admin | Role::Expert)
            }
            InviteUsers => self == Role::Admin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("role {role} is missing capability {capability:?}")]
pub struct AccessDenied {
    pub role: Role,
    pub capability: Capability,
}

/// The signed-in user, stored in the session at login and handed to every protected handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    /// The collaborator record this account belongs to, if any.
    pub collaborator_id: Option<String>,
    /// Bearer token for the back-office API.
    pub token: String,
}

impl CurrentUser {
    pub fn can(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }

    pub fn require(&self, capability: Capability) -> Result<(), AccessDenied> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(AccessDenied {
                role: self.role,
                capability,
            })
        }
    }

    pub fn is_collaborator(&self, collaborator_id: &str) -> bool {
        self.collaborator_id.as_deref() == Some(collaborator_id)
    }

    pub fn can_view_timesheets_of(&self, collaborator_id: &str) -> bool {
        self.is_collaborator(collaborator_id) || self.can(Capability::ViewTeamTimesheets)
    }

    /// A collaborator only works on their own clients, so their views are scoped to them.
    pub fn client_scope(&self) -> Option<&str> {
        if self.role == Role::Collaborateur {
            Some(self.collaborator_id.as_deref().unwrap_or_default())
        } else {
            None
        }
    }
}
