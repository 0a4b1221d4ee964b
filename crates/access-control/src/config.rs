//! # Service Configuration
//!
//! Contract behaviour switches, loaded from defaults or environment variables.
//!
//! | Variable | Default | Field |
//! |----------|---------|-------|
//! | `AC_POLICY_KEY_PREFIX` | `policy_` | `policy_key_prefix` |
//! | `AC_POLICY_LISTING` | `full-scan` | `listing` |
//! | `AC_REINDEX_ON_UPDATE` | `false` | `reindex_on_update` |
//! | `AC_ENFORCE_OBJECT_LOCATION` | `false` | `enforce_object_location` |
//! | `AC_MAX_OBJECTS_PER_POLICY` | `1024` | `max_objects_per_policy` |

use crate::adapters::catalog::{FullScanCatalog, PrefixScanCatalog};
use crate::domain::matching::MatchRules;
use crate::domain::value_objects::DEFAULT_POLICY_PREFIX;
use crate::ports::outbound::PolicyCatalog;
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable holds a value of the wrong type.
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidVar {
        /// Variable name.
        var: &'static str,
        /// Raw value found.
        value: String,
        /// Parse failure.
        reason: String,
    },

    /// The policy key prefix must be non-empty.
    #[error("policy key prefix must not be empty")]
    EmptyPrefix,

    /// A policy must be allowed to list at least one device.
    #[error("max_objects_per_policy must be at least 1")]
    ZeroObjectLimit,
}

/// How GetAllPolicies enumerates stored policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyListing {
    /// Scan the whole namespace and keep policy-shaped records.
    #[default]
    FullScan,
    /// Scan only keys under the policy prefix.
    PrefixScan,
}

impl FromStr for PolicyListing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full-scan" | "full" => Ok(Self::FullScan),
            "prefix-scan" | "prefix" => Ok(Self::PrefixScan),
            other => Err(format!("expected full-scan or prefix-scan, got {other:?}")),
        }
    }
}

/// Access-control contract configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Namespace prefix of policy keys.
    pub policy_key_prefix: String,
    /// Listing strategy for GetAllPolicies.
    pub listing: PolicyListing,
    /// Recompute the device index when an update changes `ObjectsList`.
    pub reindex_on_update: bool,
    /// Check `ObjectLocation` against the device's `Location`.
    pub enforce_object_location: bool,
    /// Upper bound on `ObjectsList` length.
    pub max_objects_per_policy: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            policy_key_prefix: DEFAULT_POLICY_PREFIX.to_string(),
            listing: PolicyListing::FullScan,
            reindex_on_update: false,
            enforce_object_location: false,
            max_objects_per_policy: 1024,
        }
    }
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Create configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(prefix) = lookup("AC_POLICY_KEY_PREFIX") {
            config.policy_key_prefix = prefix;
        }
        if let Some(listing) = lookup("AC_POLICY_LISTING") {
            config.listing = parse_var("AC_POLICY_LISTING", &listing)?;
        }
        if let Some(flag) = lookup("AC_REINDEX_ON_UPDATE") {
            config.reindex_on_update = parse_bool("AC_REINDEX_ON_UPDATE", &flag)?;
        }
        if let Some(flag) = lookup("AC_ENFORCE_OBJECT_LOCATION") {
            config.enforce_object_location = parse_bool("AC_ENFORCE_OBJECT_LOCATION", &flag)?;
        }
        if let Some(max) = lookup("AC_MAX_OBJECTS_PER_POLICY") {
            config.max_objects_per_policy = parse_var("AC_MAX_OBJECTS_PER_POLICY", &max)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.policy_key_prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if self.max_objects_per_policy == 0 {
            return Err(ConfigError::ZeroObjectLimit);
        }
        Ok(())
    }

    /// Rule switches for the access validator.
    #[must_use]
    pub fn match_rules(&self) -> MatchRules {
        MatchRules {
            enforce_object_location: self.enforce_object_location,
        }
    }

    /// Builds the configured policy catalog.
    #[must_use]
    pub fn catalog(&self) -> Box<dyn PolicyCatalog> {
        match self.listing {
            PolicyListing::FullScan => Box::new(FullScanCatalog),
            PolicyListing::PrefixScan => Box::new(PrefixScanCatalog::new(&self.policy_key_prefix)),
        }
    }
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidVar {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidVar {
            var,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

// =============================================================================
// TESTS
// =============================================================================
