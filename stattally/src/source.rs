// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{Error, ParseError};

/// Configuration values, organized in named sections.
///
/// Keys are stored normalized: lowercased, with underscores removed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Source {
    sections: Map<String, Value>,
}

impl Source {
    /// Read a TOML document. Each top-level table is a section.
    pub fn from_toml_str(text: &str) -> Result<Self, Error> {
        let value: Value = toml::from_str(text).map_err(ParseError::Toml)?;
        Self::from_json(value)
    }

    /// Read a JSON document. Each key of the root object is a section.
    pub fn from_json_str(text: &str) -> Result<Self, Error> {
        let value: Value = serde_json::from_str(text).map_err(ParseError::Json)?;
        Self::from_json(value)
    }

    /// Use an already parsed JSON value, which must be an object.
    pub fn from_json(value: Value) -> Result<Self, Error> {
        match normalize(value) {
            Value::Object(sections) => Ok(Self { sections }),
            _ => Err(ParseError::NotATable.into()),
        }
    }

    /// The raw value of a section, if present
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(&normalize_key(name))
    }

    /// Lay the section `name` over `defaults`.
    ///
    /// Tables are merged key by key, anything else in the section replaces the default.
    pub fn resolve<T>(&self, name: &str, defaults: T) -> Result<T, Error>
    where
        T: Serialize + DeserializeOwned,
    {
        let config_error = |source| Error::Config {
            section: name.to_string(),
            source,
        };
        let mut value = serde_json::to_value(defaults).map_err(config_error)?;
        if let Some(overrides) = self.section(name) {
            merge(&mut value, overrides);
        }
        serde_json::from_value(value).map_err(config_error)
    }
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|&c| c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (normalize_key(&key), normalize(value)))
                .collect(),
        ),
        Value::Array(values) => Value::Array(values.into_iter().map(normalize).collect()),
        other => other,
    }
}

fn merge(base: &mut Value, overrides: &Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overrides) => *base = overrides.clone(),
    }
}
