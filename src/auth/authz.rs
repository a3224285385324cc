//! Role-based access decisions.
//!
//! Every protected route carries a [`RequiredRoles`] set. A request passes
//! when its identity holds at least one of those roles. Authentication is
//! always settled first: [`authorize`] never looks at roles when there is
//! no identity.

use std::collections::BTreeSet;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("a protected route must require at least one role")]
    EmptyRoleSet,
}

/// Anything that can answer role membership questions.
pub trait Identity {
    fn has_role(&self, role: &str) -> bool;
}

/// Non-empty set of role names; holding any one of them is enough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredRoles(BTreeSet<String>);

impl RequiredRoles {
    pub fn new<I, S>(roles: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = roles
            .into_iter()
            .map(|r| r.as_ref().trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        if set.is_empty() {
            return Err(ConfigError::EmptyRoleSet);
        }
        Ok(Self(set))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotAuthenticated,
    InsufficientRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Authorized,
    Forbidden(DenyReason),
}

pub fn authorize<I: Identity + ?Sized>(identity: Option<&I>, required: &RequiredRoles) -> Decision {
    let Some(identity) = identity else {
        return Decision::Forbidden(DenyReason::NotAuthenticated);
    };
    if required.iter().any(|role| identity.has_role(role)) {
        Decision::Authorized
    } else {
        Decision::Forbidden(DenyReason::InsufficientRole)
    }
}
