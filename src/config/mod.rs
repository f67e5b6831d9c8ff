//! Configuration loading and management

use crate::core::document::OrderEntry;
use crate::core::entity::EntityDescriptor;
use crate::core::error::ConfigError;
use crate::core::plan::{SortDirection, SortKey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use validator::Validate;

/// Plural names taken by fixed routes (`GET /health`)
pub const RESERVED_PLURALS: &[&str] = &["health"];

/// Reject a plural that would be shadowed by a fixed route
pub fn check_plural(plural: &str) -> Result<(), ConfigError> {
    if RESERVED_PLURALS.contains(&plural) {
        return Err(ConfigError::InvalidValue {
            field: "entities.plural".to_string(),
            value: plural.to_string(),
            message: "route name is reserved".to_string(),
        });
    }
    Ok(())
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind")]
    #[validate(length(min = 1))]
    pub bind: String,

    /// Public base URL used for pagination links
    ///
    /// When unset, links are relative to the request path.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            base_url: None,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

/// Page size defaults
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct PaginationConfig {
    /// Rows per page when the request does not say
    #[serde(default = "default_per_page")]
    #[validate(range(min = 1))]
    pub per_page: u64,

    /// Upper bound for a requested `perPage`
    #[serde(default = "default_max_per_page")]
    #[validate(range(min = 1))]
    pub max_per_page: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            per_page: default_per_page(),
            max_per_page: default_max_per_page(),
        }
    }
}

fn default_per_page() -> u64 {
    10
}

fn default_max_per_page() -> u64 {
    100
}

/// Configuration for one searchable entity
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EntityConfig {
    /// Singular name (e.g., "user")
    #[validate(length(min = 1))]
    pub name: String,

    /// Route segment; defaults to the table name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plural: Option<String>,

    /// Backing table; defaults to the singular name with an `s` appended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    #[serde(default = "default_primary_key")]
    #[validate(length(min = 1))]
    pub primary_key: String,

    /// Columns a filter document may reference
    #[serde(default)]
    pub queryable: Vec<String>,

    /// Columns removed from every returned row
    #[serde(default)]
    pub hidden: Vec<String>,

    /// Sort applied when a document has no `orderBy`
    #[serde(default)]
    pub default_sort: Vec<OrderEntry>,
}

fn default_primary_key() -> String {
    "id".to_string()
}

impl EntityConfig {
    pub fn table_name(&self) -> String {
        self.table
            .clone()
            .unwrap_or_else(|| format!("{}s", self.name))
    }

    pub fn plural_name(&self) -> String {
        self.plural.clone().unwrap_or_else(|| self.table_name())
    }

    /// Build the runtime descriptor for this entity
    pub fn to_descriptor(&self) -> EntityDescriptor {
        let sort = self
            .default_sort
            .iter()
            .map(|entry| SortKey {
                field: entry.field.clone(),
                direction: SortDirection::from_order(entry.order.as_deref()),
            })
            .collect();

        EntityDescriptor::new(self.name.clone(), self.table_name())
            .with_plural(self.plural_name())
            .with_primary_key(self.primary_key.clone())
            .with_queryable(self.queryable.iter().cloned())
            .with_hidden(self.hidden.iter().cloned())
            .with_default_sort(sort)
    }
}

/// Complete configuration of a search host
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SearchConfig {
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerConfig,

    #[serde(default)]
    #[validate(nested)]
    pub pagination: PaginationConfig,

    #[serde(default)]
    #[validate(nested)]
    pub entities: Vec<EntityConfig>,
}

impl SearchConfig {
    /// Load and validate configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
                file: Some(path.display().to_string()),
                message: e.to_string(),
            })?;
        config.validate_config()?;

        tracing::info!(
            path = %path.display(),
            entities = config.entities.len(),
            "Loaded search configuration"
        );
        Ok(config)
    }

    /// Load and validate configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate_config()?;
        Ok(config)
    }

    /// Field-level checks plus the rules that span several fields
    pub fn validate_config(&self) -> Result<(), ConfigError> {
        self.validate()?;

        if self.pagination.per_page > self.pagination.max_per_page {
            return Err(ConfigError::InvalidValue {
                field: "pagination.per_page".to_string(),
                value: self.pagination.per_page.to_string(),
                message: format!(
                    "must not exceed max_per_page ({})",
                    self.pagination.max_per_page
                ),
            });
        }

        let mut plurals = HashSet::new();
        for entity in &self.entities {
            let plural = entity.plural_name();
            check_plural(&plural)?;
            if !plurals.insert(plural.clone()) {
                return Err(ConfigError::InvalidValue {
                    field: "entities.plural".to_string(),
                    value: plural,
                    message: "route name is declared twice".to_string(),
                });
            }

            let descriptor = entity.to_descriptor();
            for key in descriptor.default_sort() {
                if !descriptor.allowed_fields().contains(&key.field) {
                    return Err(ConfigError::InvalidValue {
                        field: format!("entities.{}.default_sort", entity.name),
                        value: key.field.clone(),
                        message: "sort field is not queryable".to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Runtime descriptors for every configured entity
    pub fn descriptors(&self) -> Vec<EntityDescriptor> {
        self.entities.iter().map(EntityConfig::to_descriptor).collect()
    }

    /// Users and their uploaded files, for demos and tests
    pub fn default_config() -> Self {
        let timestamps = ["created_at", "updated_at", "deleted_at"];
        let by_newest = vec![OrderEntry {
            field: "created_at".to_string(),
            order: Some("DESC".to_string()),
        }];

        Self {
            server: ServerConfig::default(),
            pagination: PaginationConfig::default(),
            entities: vec![
                EntityConfig {
                    name: "user".to_string(),
                    plural: Some("users".to_string()),
                    table: Some("users".to_string()),
                    primary_key: "id".to_string(),
                    queryable: ["id", "name", "email", "document"]
                        .into_iter()
                        .chain(timestamps)
                        .map(String::from)
                        .collect(),
                    hidden: vec!["password".to_string(), "remember_token".to_string()],
                    default_sort: by_newest.clone(),
                },
                EntityConfig {
                    name: "file".to_string(),
                    plural: Some("files".to_string()),
                    table: Some("files".to_string()),
                    primary_key: "id".to_string(),
                    queryable: ["id", "user_id", "original", "name", "size", "mimeType"]
                        .into_iter()
                        .chain(timestamps)
                        .map(String::from)
                        .collect(),
                    hidden: Vec::new(),
                    default_sort: by_newest,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default_config();
        assert_eq!(config.entities.len(), 2);
        assert!(config.validate_config().is_ok());

        let users = &config.descriptors()[0];
        assert_eq!(users.plural(), "users");
        assert!(users.hidden().contains("password"));
        assert_eq!(users.default_sort(), &[SortKey::desc("created_at")]);
    }

    #[test]
    fn test_yaml_serialization() {
        let config = SearchConfig::default_config();
        let yaml = serde_yaml::to_string(&config).unwrap();

        let parsed = SearchConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed.entities.len(), config.entities.len());
        assert_eq!(parsed.pagination.per_page, 10);
    }

    #[test]
    fn test_defaults_for_omitted_sections() {
        let config = SearchConfig::from_yaml_str("entities:\n  - name: post\n").unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert_eq!(config.pagination.max_per_page, 100);

        let post = config.entities[0].to_descriptor();
        assert_eq!(post.table(), "posts");
        assert_eq!(post.plural(), "posts");
        assert_eq!(post.primary_key(), "id");
    }

    #[test]
    fn test_duplicate_plural_rejected() {
        let yaml = r#"
entities:
  - name: user
    plural: people
  - name: person
    plural: people
"#;
        assert!(matches!(
            SearchConfig::from_yaml_str(yaml),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_reserved_plural_rejected() {
        let yaml = r#"
entities:
  - name: check
    plural: health
"#;
        match SearchConfig::from_yaml_str(yaml) {
            Err(ConfigError::InvalidValue { value, message, .. }) => {
                assert_eq!(value, "health");
                assert!(message.contains("reserved"));
            }
            other => panic!("unexpected result: {other:?}"),
        }

        // plural defaults to the table name
        let yaml = "entities:\n  - name: status\n    table: health\n";
        assert!(SearchConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_default_sort_must_be_queryable() {
        let yaml = r#"
entities:
  - name: user
    queryable: [name]
    default_sort: [{ field: password }]
"#;
        let err = SearchConfig::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn test_field_validation() {
        let yaml = "pagination: { per_page: 0 }\n";
        assert!(matches!(
            SearchConfig::from_yaml_str(yaml),
            Err(ConfigError::Validation(_))
        ));

        let yaml = "pagination: { per_page: 50, max_per_page: 20 }\n";
        assert!(matches!(
            SearchConfig::from_yaml_str(yaml),
            Err(ConfigError::InvalidValue { .. })
        ));

        let yaml = "entities:\n  - name: ''\n";
        assert!(matches!(
            SearchConfig::from_yaml_str(yaml),
            Err(ConfigError::Validation(_))
        ));
    }
}
