//! Declarative phase system configuration.
//!
//! A configuration names the phases in registration order, the blending
//! methods available to sub-model tables, and one table of entries per
//! interfacial sub-model family:
//!
//! ```json
//! {
//!   "phases": ["air", "water"],
//!   "blending": {
//!     "default": {
//!       "type": "linear",
//!       "minFullyContinuousAlpha": { "air": 0.7, "water": 0.7 },
//!       "minPartlyContinuousAlpha": { "air": 0.3, "water": 0.3 }
//!     }
//!   },
//!   "models": {
//!     "surfaceTension": [
//!       { "pair": "air-water", "type": "constant", "value": 0.072 }
//!     ],
//!     "aspectRatio": [
//!       { "pair": "air_to_water", "type": "constant", "value": 1.5, "blending": "default" },
//!       { "pair": "water_to_air", "type": "constant", "value": 1.0, "blending": "default" }
//!     ]
//!   }
//! }
//! ```
//!
//! Every key of an entry other than `pair`, `type`, and `blending` is passed
//! to the model factory as a [`Parameters`] object.

use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;

use super::blending::BlendingConfig;

/// Errors from loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration from {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration")]
    Parse(#[from] serde_json::Error),
}

/// Errors from reading model parameters.
#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("missing parameter `{name}`")]
    Missing { name: String },

    #[error("invalid parameter `{name}`")]
    Invalid {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Complete configuration of a phase system.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PhaseSystemConfig {
    /// Phase identifiers in registration order.
    pub phases: Vec<String>,

    /// Blending methods by name.
    #[serde(default)]
    pub blending: BTreeMap<String, BlendingConfig>,

    /// Sub-model tables by family name.
    #[serde(default)]
    pub models: BTreeMap<String, Vec<ModelEntryConfig>>,
}

impl PhaseSystemConfig {
    /// Creates a configuration with no blending methods and no sub-models.
    pub fn new<S: Into<String>>(phases: impl IntoIterator<Item = S>) -> Self {
        Self {
            phases: phases.into_iter().map(Into::into).collect(),
            blending: BTreeMap::new(),
            models: BTreeMap::new(),
        }
    }

    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the JSON is malformed or does not
    /// match the configuration schema.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if its content is not a valid configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    #[must_use]
    pub fn with_blending(mut self, name: impl Into<String>, method: BlendingConfig) -> Self {
        self.blending.insert(name.into(), method);
        self
    }

    /// Appends an entry to the table of `family`.
    #[must_use]
    pub fn with_model(mut self, family: impl Into<String>, entry: ModelEntryConfig) -> Self {
        self.models.entry(family.into()).or_default().push(entry);
        self
    }

    /// Entries declared for `family`, empty if the family has no table.
    #[must_use]
    pub fn entries(&self, family: &str) -> &[ModelEntryConfig] {
        self.models.get(family).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// One declared sub-model: which pair, which model type, and its parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelEntryConfig {
    /// Pair specifier, `a-b` or `a_to_b`.
    pub pair: String,

    /// Model type name, looked up in the family's factory.
    #[serde(rename = "type")]
    pub model: String,

    /// Blending method name, required when several entries share a pair.
    #[serde(default)]
    pub blending: Option<String>,

    #[serde(flatten)]
    pub parameters: Parameters,
}

impl ModelEntryConfig {
    pub fn new(pair: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            pair: pair.into(),
            model: model.into(),
            blending: None,
            parameters: Parameters::default(),
        }
    }

    #[must_use]
    pub fn with_blending(mut self, blending: impl Into<String>) -> Self {
        self.blending = Some(blending.into());
        self
    }

    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.0.insert(name.into(), value.into());
        self
    }
}

/// Free-form model parameters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Parameters(Map<String, Value>);

impl Parameters {
    /// Deserializes the parameter `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::Missing`] if absent, or
    /// [`ParameterError::Invalid`] if it does not deserialize as `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, ParameterError> {
        let value = self.0.get(name).ok_or_else(|| ParameterError::Missing {
            name: name.to_owned(),
        })?;
        serde_json::from_value(value.clone()).map_err(|source| ParameterError::Invalid {
            name: name.to_owned(),
            source,
        })
    }

    /// Reads the numeric parameter `name`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParameterError`] if the parameter is absent or not a number.
    pub fn get_f64(&self, name: &str) -> Result<f64, ParameterError> {
        self.get(name)
    }

    /// Deserializes the whole parameter object as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::Invalid`] if the parameters do not match `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ParameterError> {
        serde_json::from_value(Value::Object(self.0.clone())).map_err(|source| {
            ParameterError::Invalid {
                name: "<parameters>".to_owned(),
                source,
            }
        })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
