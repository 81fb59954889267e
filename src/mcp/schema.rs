//! Restricted JSON Schema for tool arguments
//!
//! Supports the subset the tool catalog needs: a top-level object with typed
//! properties, a `required` list, integer bounds and `additionalProperties`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;

/// JSON value type names usable in a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Object,
    String,
    Integer,
    Number,
    Boolean,
    Array,
}

impl SchemaType {
    fn name(self) -> &'static str {
        match self {
            SchemaType::Object => "object",
            SchemaType::String => "string",
            SchemaType::Integer => "integer",
            SchemaType::Number => "number",
            SchemaType::Boolean => "boolean",
            SchemaType::Array => "array",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            SchemaType::Object => value.is_object(),
            SchemaType::String => value.is_string(),
            SchemaType::Integer => value.is_i64() || value.is_u64(),
            SchemaType::Number => value.is_number(),
            SchemaType::Boolean => value.is_boolean(),
            SchemaType::Array => value.is_array(),
        }
    }
}

/// Schema of a single property
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub kind: SchemaType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<i64>,
}

impl PropertySchema {
    pub fn new(kind: SchemaType) -> Self {
        Self {
            kind,
            description: None,
            minimum: None,
            maximum: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn range(mut self, minimum: i64, maximum: i64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    fn validate(&self, name: &str, value: &Value) -> Result<(), ValidationError> {
        if !self.kind.matches(value) {
            return Err(ValidationError::InvalidType {
                field: name.to_string(),
                expected: self.kind.name().to_string(),
            });
        }

        // Bounds only apply to numeric values.
        let Some(number) = value.as_f64() else {
            return Ok(());
        };
        let field = name.to_string();
        match (self.minimum, self.maximum) {
            (Some(min), Some(max)) if number < min as f64 || number > max as f64 => {
                Err(ValidationError::OutOfRange { field, min, max })
            }
            (Some(min), None) if number < min as f64 => {
                Err(ValidationError::BelowMinimum { field, min })
            }
            (None, Some(max)) if number > max as f64 => {
                Err(ValidationError::AboveMaximum { field, max })
            }
            _ => Ok(()),
        }
    }
}

/// Top-level argument schema of a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSchema {
    #[serde(rename = "type")]
    pub kind: SchemaType,

    #[serde(default)]
    pub properties: BTreeMap<String, PropertySchema>,

    #[serde(default)]
    pub required: Vec<String>,

    #[serde(default = "default_additional_properties")]
    pub additional_properties: bool,
}

fn default_additional_properties() -> bool {
    true
}

impl InputSchema {
    /// Empty object schema that rejects unknown properties
    pub fn object() -> Self {
        Self {
            kind: SchemaType::Object,
            properties: BTreeMap::new(),
            required: Vec::new(),
            additional_properties: false,
        }
    }

    pub fn property(mut self, name: &str, schema: PropertySchema) -> Self {
        self.properties.insert(name.to_string(), schema);
        self
    }

    pub fn require(mut self, name: &str) -> Self {
        self.required.push(name.to_string());
        self
    }

    /// Check arguments against this schema.
    ///
    /// `null` counts as absent, both for `required` and for typed properties.
    pub fn validate(&self, args: &Value) -> Result<(), ValidationError> {
        let Some(args) = args.as_object() else {
            return Err(ValidationError::NotAnObject);
        };

        for name in &self.required {
            if args.get(name).map_or(true, Value::is_null) {
                return Err(ValidationError::MissingField {
                    field: name.clone(),
                });
            }
        }

        for (name, value) in args {
            match self.properties.get(name) {
                Some(_) if value.is_null() => {}
                Some(property) => property.validate(name, value)?,
                None if !self.additional_properties => {
                    return Err(ValidationError::UnexpectedField {
                        field: name.clone(),
                    });
                }
                None => {}
            }
        }

        Ok(())
    }
}
