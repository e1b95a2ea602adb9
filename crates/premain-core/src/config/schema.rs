use crate::cfg::CfgSet;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// ConfigSchemaError
///

#[derive(Debug, ThisError)]
pub enum ConfigSchemaError {
    #[error("validation error: {0}")]
    ValidationError(String),
}

///
/// Validate
///

pub trait Validate {
    fn validate(&self) -> Result<(), ConfigSchemaError>;
}

///
/// Defaults
///

mod defaults {
    pub fn markers() -> Vec<String> {
        vec![crate::MARKER.to_string()]
    }

    pub fn exclude() -> Vec<String> {
        vec!["target".to_string()]
    }
}

///
/// ConfigModel
///

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigModel {
    // attribute path tails that mark a global constructor
    #[serde(default = "defaults::markers")]
    pub markers: Vec<String>,

    // path fragments skipped while walking directories
    #[serde(default = "defaults::exclude")]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub cfg: CfgSet,
}

impl Default for ConfigModel {
    fn default() -> Self {
        Self {
            markers: defaults::markers(),
            exclude: defaults::exclude(),
            cfg: CfgSet::default(),
        }
    }
}

impl Validate for ConfigModel {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        if self.markers.is_empty() {
            return Err(ConfigSchemaError::ValidationError(
                "markers must name at least one attribute".to_string(),
            ));
        }

        for marker in &self.markers {
            if syn::parse_str::<syn::Ident>(marker).is_err() {
                return Err(ConfigSchemaError::ValidationError(format!(
                    "marker '{marker}' is not a valid identifier"
                )));
            }
        }

        for fragment in &self.exclude {
            if fragment.trim().is_empty() {
                return Err(ConfigSchemaError::ValidationError(
                    "exclude entries must not be empty".to_string(),
                ));
            }
        }

        self.cfg.validate()
    }
}

impl Validate for CfgSet {
    fn validate(&self) -> Result<(), ConfigSchemaError> {
        for flag in &self.flags {
            if syn::parse_str::<syn::Ident>(flag).is_err() {
                return Err(ConfigSchemaError::ValidationError(format!(
                    "cfg flag '{flag}' is not a valid identifier"
                )));
            }
        }

        for key in self.values.keys() {
            if syn::parse_str::<syn::Ident>(key).is_err() {
                return Err(ConfigSchemaError::ValidationError(format!(
                    "cfg key '{key}' is not a valid identifier"
                )));
            }
        }

        Ok(())
    }
}

///
/// TESTS
///
