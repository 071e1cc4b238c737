//! Hierarchical model configuration.
//!
//! The configuration is a key-value document with named sub-groups
//! ("Tendencies", "Advection", "WindStress", "VertCoord", "Eos", ...).
//! Components read their group once at construction; a missing required key
//! or an unknown enum string is a hard [`ConfigError`] the driver aborts on,
//! because numerically-sensitive coefficients must never be silently
//! defaulted.
//!
//! The document is backed by `serde_json::Value`, so it can be built from a
//! JSON file, an embedded literal, or programmatically in tests:
//!
//! ```
//! use fvom_rs::config::Config;
//!
//! let config = Config::from_json_str(
//!     r#"{ "Tendencies": { "ThicknessFluxTendencyEnable": true } }"#,
//! )
//! .unwrap();
//! let group = config.group("Tendencies").unwrap();
//! assert!(group.get_bool("ThicknessFluxTendencyEnable").unwrap());
//! ```

use serde_json::Value;

use crate::error::ConfigError;

/// A hierarchical configuration document.
#[derive(Clone, Debug)]
pub struct Config {
    root: Value,
}

impl Config {
    /// Parse a configuration document from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            root: serde_json::from_str(text)?,
        })
    }

    /// Wrap an already-parsed document.
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// An empty document (every group lookup fails). Useful in tests that
    /// exercise the missing-key abort path.
    pub fn empty() -> Self {
        Self {
            root: Value::Object(Default::default()),
        }
    }

    /// Look up a named top-level group.
    pub fn group(&self, name: &str) -> Result<ConfigGroup<'_>, ConfigError> {
        match self.root.get(name) {
            Some(value) if value.is_object() => Ok(ConfigGroup {
                name: name.to_string(),
                value,
            }),
            _ => Err(ConfigError::MissingGroup(name.to_string())),
        }
    }
}

/// A view of one named group, with typed accessors.
#[derive(Clone, Debug)]
pub struct ConfigGroup<'a> {
    name: String,
    value: &'a Value,
}

impl<'a> ConfigGroup<'a> {
    /// Group name as it appears in the document.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a nested sub-group.
    pub fn subgroup(&self, name: &str) -> Result<ConfigGroup<'a>, ConfigError> {
        match self.value.get(name) {
            Some(value) if value.is_object() => Ok(ConfigGroup {
                name: format!("{}.{}", self.name, name),
                value,
            }),
            _ => Err(ConfigError::MissingGroup(format!("{}.{}", self.name, name))),
        }
    }

    fn required(&self, key: &str) -> Result<&'a Value, ConfigError> {
        self.value.get(key).ok_or_else(|| ConfigError::MissingKey {
            group: self.name.clone(),
            key: key.to_string(),
        })
    }

    fn wrong_type(&self, key: &str, expected: &'static str) -> ConfigError {
        ConfigError::WrongType {
            group: self.name.clone(),
            key: key.to_string(),
            expected,
        }
    }

    /// Required floating-point value.
    pub fn get_real(&self, key: &str) -> Result<f64, ConfigError> {
        self.required(key)?
            .as_f64()
            .ok_or_else(|| self.wrong_type(key, "number"))
    }

    /// Required integer value.
    pub fn get_int(&self, key: &str) -> Result<i64, ConfigError> {
        self.required(key)?
            .as_i64()
            .ok_or_else(|| self.wrong_type(key, "integer"))
    }

    /// Required boolean value.
    pub fn get_bool(&self, key: &str) -> Result<bool, ConfigError> {
        self.required(key)?
            .as_bool()
            .ok_or_else(|| self.wrong_type(key, "boolean"))
    }

    /// Required string value.
    pub fn get_str(&self, key: &str) -> Result<&'a str, ConfigError> {
        self.required(key)?
            .as_str()
            .ok_or_else(|| self.wrong_type(key, "string"))
    }

    /// Required list of floating-point values.
    pub fn get_real_list(&self, key: &str) -> Result<Vec<f64>, ConfigError> {
        let list = self
            .required(key)?
            .as_array()
            .ok_or_else(|| self.wrong_type(key, "array of numbers"))?;
        list.iter()
            .map(|v| v.as_f64().ok_or_else(|| self.wrong_type(key, "array of numbers")))
            .collect()
    }

    /// Required string restricted to a closed set of choices (case-insensitive).
    ///
    /// Returns the index into `choices`, so callers can map directly onto an
    /// enum without a second string comparison.
    pub fn get_choice(
        &self,
        key: &str,
        choices: &'static [&'static str],
    ) -> Result<usize, ConfigError> {
        let value = self.get_str(key)?;
        choices
            .iter()
            .position(|c| c.eq_ignore_ascii_case(value))
            .ok_or_else(|| ConfigError::UnknownChoice {
                group: self.name.clone(),
                key: key.to_string(),
                value: value.to_string(),
                expected: choices,
            })
    }

    /// Optional value: `None` when the key is absent, error when present with
    /// the wrong type.
    pub fn opt_real(&self, key: &str) -> Result<Option<f64>, ConfigError> {
        match self.value.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_f64()
                .map(Some)
                .ok_or_else(|| self.wrong_type(key, "number")),
        }
    }
}
