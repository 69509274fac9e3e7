//! Identifiers and the acting user.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type DiagramId = Uuid;
pub type AnnotationId = Uuid;
pub type PlanId = Uuid;
pub type PointId = Uuid;
pub type UserId = Uuid;

/// Weak reference to a user: store id plus a denormalized display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: UserId,
    #[serde(alias = "displayName", alias = "name")]
    pub display_name: String,
}

impl UserRef {
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self { id, display_name: display_name.into() }
    }
}

/// Role resolved upstream of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Operator,
    #[serde(alias = "admin")]
    Administrator,
}

/// The user on whose behalf a command runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user: UserRef,
    pub role: Role,
}

impl Actor {
    pub fn new(user: UserRef, role: Role) -> Self {
        Self { user, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }
}
