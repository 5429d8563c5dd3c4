use serde::{Deserialize, Serialize};

use crate::error::{MergeError, MergeResult};

/// Version field used by lenient configurations that do not name one.
pub const DEFAULT_VERSION_FIELD: &str = "version";

/// How strictly a [`MergeConfig`] is validated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Both the key field and the version field must be named.
    Strict,
    /// The version field falls back to [`DEFAULT_VERSION_FIELD`].
    #[default]
    Lenient,
}

/// Configuration for one merge pass.
///
/// Every field has a default so a TOML or JSON file only needs to name what
/// it changes; [`MergeConfig::resolve`] decides whether the result is usable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Field holding each record's stable identity.
    pub key_field: String,
    /// Field holding each record's version.
    pub version_field: Option<String>,
    /// Whether input and output units are batches of records.
    pub batches: bool,
    /// Whether a missing version field is an error.
    pub validation: ValidationMode,
}

impl MergeConfig {
    /// A lenient, record-at-a-time configuration keyed by `key_field`.
    pub fn new(key_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            ..Default::default()
        }
    }

    pub fn with_version_field(mut self, version_field: impl Into<String>) -> Self {
        self.version_field = Some(version_field.into());
        self
    }

    pub fn with_batches(mut self, batches: bool) -> Self {
        self.batches = batches;
        self
    }

    /// Require an explicit version field.
    pub fn strict(mut self) -> Self {
        self.validation = ValidationMode::Strict;
        self
    }

    /// Validate the configuration and fill in defaults.
    pub fn resolve(&self) -> MergeResult<ResolvedConfig> {
        if self.key_field.trim().is_empty() {
            return Err(MergeError::config("must provide key_field"));
        }

        let version_field = match (&self.version_field, self.validation) {
            (Some(field), _) if field.trim().is_empty() => {
                return Err(MergeError::config("version_field must not be empty"));
            }
            (Some(field), _) => field.clone(),
            (None, ValidationMode::Strict) => {
                return Err(MergeError::config("must provide version_field"));
            }
            (None, ValidationMode::Lenient) => DEFAULT_VERSION_FIELD.to_owned(),
        };

        Ok(ResolvedConfig {
            key_field: self.key_field.clone(),
            version_field,
            batches: self.batches,
        })
    }
}

/// A validated configuration. Immutable for the lifetime of a pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    key_field: String,
    version_field: String,
    batches: bool,
}

impl ResolvedConfig {
    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    pub fn version_field(&self) -> &str {
        &self.version_field
    }

    pub fn batches(&self) -> bool {
        self.batches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_lenient_record_mode() {
        let c = MergeConfig::default();
        assert!(c.key_field.is_empty());
        assert!(c.version_field.is_none());
        assert!(!c.batches);
        assert_eq!(c.validation, ValidationMode::Lenient);
    }

    #[test]
    fn missing_key_field_is_rejected() {
        let err = MergeConfig::default().resolve().unwrap_err();
        assert_eq!(err, MergeError::config("must provide key_field"));
        assert!(MergeConfig::new("   ").resolve().is_err());
    }

    #[test]
    fn lenient_defaults_version_field() {
        let resolved = MergeConfig::new("id").resolve().unwrap();
        assert_eq!(resolved.key_field(), "id");
        assert_eq!(resolved.version_field(), DEFAULT_VERSION_FIELD);
        assert!(!resolved.batches());
    }

    #[test]
    fn strict_requires_version_field() {
        let err = MergeConfig::new("id").strict().resolve().unwrap_err();
        assert_eq!(err, MergeError::config("must provide version_field"));

        let resolved = MergeConfig::new("id")
            .strict()
            .with_version_field("_v")
            .resolve()
            .unwrap();
        assert_eq!(resolved.version_field(), "_v");
    }

    #[test]
    fn explicit_empty_version_field_fails_in_both_modes() {
        assert!(MergeConfig::new("id").with_version_field("").resolve().is_err());
        assert!(MergeConfig::new("id")
            .strict()
            .with_version_field(" ")
            .resolve()
            .is_err());
    }

    #[test]
    fn toml_round_trip_with_omitted_fields() {
        let c: MergeConfig = toml::from_str(
            r#"
            key_field = "test"
            batches = true
            "#,
        )
        .unwrap();
        assert_eq!(c.key_field, "test");
        assert!(c.batches);
        assert_eq!(c.validation, ValidationMode::Lenient);

        let strict: MergeConfig = toml::from_str(
            r#"
            key_field = "test"
            version_field = "_v"
            validation = "strict"
            "#,
        )
        .unwrap();
        assert_eq!(strict.resolve().unwrap().version_field(), "_v");
    }
}
