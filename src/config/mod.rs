//! Configuration module for the domain service core
//!
//! Permission statements are declared in TOML and turned into an immutable
//! [`DomainConfiguration`] once at startup. Every request then reads the same
//! statement list without synchronization.

pub mod error;

pub use error::{ConfigError, ConfigResult};

use crate::logging::parse_level;
use crate::permissions::{
    AuthorizationContext, PermissionEffect, PermissionKind, PermissionStatement, SecurableScope,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// One `[[permissions]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionEntry {
    pub effect: PermissionEffect,
    pub permission: PermissionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub securable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child: Option<String>,
}

impl PermissionEntry {
    fn validate(&self, position: usize) -> ConfigResult<()> {
        if self.securable.is_none() && (self.namespace.is_some() || self.child.is_some()) {
            return Err(ConfigError::validation(format!(
                "permissions[{}]: namespace and child require a securable",
                position
            )));
        }
        Ok(())
    }

    fn to_statement(&self) -> PermissionStatement {
        let scope = SecurableScope {
            namespace: self.namespace.clone(),
            securable: self.securable.clone(),
            child: self.child.clone(),
        };
        match self.effect {
            PermissionEffect::Grant => {
                PermissionStatement::grant(self.permission, self.role.as_deref(), scope)
            }
            PermissionEffect::Deny => {
                PermissionStatement::deny(self.permission, self.role.as_deref(), scope)
            }
        }
    }
}

/// Serialized configuration as read from disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(default)]
    pub permissions: Vec<PermissionEntry>,
}

impl DomainConfig {
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        let config: DomainConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(level) = &self.log_level {
            parse_level(level).map_err(ConfigError::validation)?;
        }
        for (position, entry) in self.permissions.iter().enumerate() {
            entry.validate(position)?;
        }
        Ok(())
    }

    /// Freezes the configuration for use by the running process.
    pub fn build(&self) -> ConfigResult<DomainConfiguration> {
        self.validate()?;
        Ok(DomainConfiguration::from_statements(
            self.permissions.iter().map(PermissionEntry::to_statement).collect(),
        ))
    }
}

/// Process-wide, read-only configuration shared by all requests.
#[derive(Debug, Clone)]
pub struct DomainConfiguration {
    permissions: Arc<[PermissionStatement]>,
}

impl DomainConfiguration {
    pub fn from_statements(statements: Vec<PermissionStatement>) -> Self {
        Self {
            permissions: statements.into(),
        }
    }

    pub fn permissions(&self) -> &Arc<[PermissionStatement]> {
        &self.permissions
    }

    /// Starts the authorization state of one request.
    pub fn authorization_context(&self) -> AuthorizationContext {
        AuthorizationContext::new(Arc::clone(&self.permissions))
    }
}
