use serde::Serialize;

use crate::models::domain::{User, UserRole};

/// Boolean capability flags, always computed from a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub is_admin: bool,
    pub is_publisher: bool,
    pub is_sme: bool,
}

impl Capabilities {
    pub fn for_role(role: UserRole) -> Self {
        Self {
            is_admin: role == UserRole::Admin,
            is_publisher: role == UserRole::Publisher,
            is_sme: role == UserRole::Sme,
        }
    }
}

/// The authenticated user behind a request.
///
/// Holds the user record as loaded for this resolution; the flags are not
/// stored separately so they cannot drift from the role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    user: User,
}

impl Principal {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn into_user(self) -> User {
        self.user
    }

    pub fn id(&self) -> &str {
        &self.user.id
    }

    pub fn role(&self) -> UserRole {
        self.user.role
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::for_role(self.user.role)
    }

    pub fn is_admin(&self) -> bool {
        self.capabilities().is_admin
    }

    pub fn is_publisher(&self) -> bool {
        self.capabilities().is_publisher
    }

    pub fn is_sme(&self) -> bool {
        self.capabilities().is_sme
    }
}
