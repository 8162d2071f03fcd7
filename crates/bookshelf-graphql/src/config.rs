//! GraphQL configuration.
//!
//! Configuration lives under the `[graphql]` section of `bookshelf.toml`.
//!
//! # Example Configuration
//!
//! ```toml
//! [graphql]
//! max_depth = 15
//! max_complexity = 500
//! introspection = true
//! playground = true
//! update_policy = "truthy"
//! not_found_as_error = true
//! ```

use serde::{Deserialize, Serialize};

use crate::schema::SchemaBuilderConfig;

/// How `updateBook` decides whether an argument was supplied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdatePolicy {
    /// Falsy values (`0`, `""`, `null`) count as "not provided".
    #[default]
    Truthy,
    /// Any non-null value is applied; only `null` or an omitted argument
    /// leaves a field unchanged.
    Explicit,
}

/// Resolver behaviour switches carried in the per-request context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverOptions {
    pub update_policy: UpdatePolicy,
    pub not_found_as_error: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            update_policy: UpdatePolicy::Truthy,
            not_found_as_error: default_not_found_as_error(),
        }
    }
}

/// GraphQL API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLConfig {
    /// Maximum query depth allowed.
    /// Default: 15
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum query complexity allowed.
    /// Default: 500
    #[serde(default = "default_max_complexity")]
    pub max_complexity: usize,

    /// Enable GraphQL introspection queries.
    /// Default: true
    #[serde(default = "default_introspection")]
    pub introspection: bool,

    /// Serve GraphiQL on `GET /graphql` when no query is given.
    /// Default: true
    #[serde(default = "default_playground")]
    pub playground: bool,

    /// Field-presence rule for `updateBook`.
    /// Default: truthy
    #[serde(default)]
    pub update_policy: UpdatePolicy,

    /// Report a missing book from `book(id)` as an error instead of `null`.
    /// Default: true
    #[serde(default = "default_not_found_as_error")]
    pub not_found_as_error: bool,
}

fn default_max_depth() -> usize {
    15
}

fn default_max_complexity() -> usize {
    500
}

fn default_introspection() -> bool {
    true
}

fn default_playground() -> bool {
    true
}

fn default_not_found_as_error() -> bool {
    true
}

impl Default for GraphQLConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_complexity: default_max_complexity(),
            introspection: default_introspection(),
            playground: default_playground(),
            update_policy: UpdatePolicy::default(),
            not_found_as_error: default_not_found_as_error(),
        }
    }
}

impl GraphQLConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("graphql.max_depth must be > 0".into());
        }
        if self.max_complexity == 0 {
            return Err("graphql.max_complexity must be > 0".into());
        }
        Ok(())
    }

    /// Converts this config to a SchemaBuilderConfig.
    #[must_use]
    pub fn to_schema_builder_config(&self) -> SchemaBuilderConfig {
        SchemaBuilderConfig {
            max_depth: self.max_depth,
            max_complexity: self.max_complexity,
            introspection_enabled: self.introspection,
        }
    }

    /// Extracts the switches resolvers consult at request time.
    #[must_use]
    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            update_policy: self.update_policy,
            not_found_as_error: self.not_found_as_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GraphQLConfig::default();
        assert_eq!(config.max_depth, 15);
        assert_eq!(config.max_complexity, 500);
        assert!(config.introspection);
        assert!(config.playground);
        assert_eq!(config.update_policy, UpdatePolicy::Truthy);
        assert!(config.not_found_as_error);
    }

    #[test]
    fn test_valid_config() {
        assert!(GraphQLConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_max_depth() {
        let config = GraphQLConfig {
            max_depth: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_max_complexity() {
        let config = GraphQLConfig {
            max_complexity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_from_toml() {
        let toml = r#"
            max_depth = 20
            max_complexity = 1000
            introspection = false
            update_policy = "explicit"
            not_found_as_error = false
        "#;

        let config: GraphQLConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.max_depth, 20);
        assert_eq!(config.max_complexity, 1000);
        assert!(!config.introspection);
        assert!(config.playground);
        assert_eq!(config.update_policy, UpdatePolicy::Explicit);
        assert!(!config.not_found_as_error);
    }

    #[test]
    fn test_unknown_update_policy_rejected() {
        let result: Result<GraphQLConfig, _> = toml::from_str(r#"update_policy = "lenient""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolver_options() {
        let config = GraphQLConfig {
            update_policy: UpdatePolicy::Explicit,
            not_found_as_error: false,
            ..Default::default()
        };
        let options = config.resolver_options();
        assert_eq!(options.update_policy, UpdatePolicy::Explicit);
        assert!(!options.not_found_as_error);
    }
}
