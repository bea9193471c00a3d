//! Input schemas for the registered tools.
//!
//! A [`Schema`] is a static list of string fields, each optionally
//! restricted to an enumerated set and optionally carrying a default.
//! [`Schema::validate`] normalizes a raw argument map before a handler
//! ever sees it; [`Schema::to_json_schema`] renders the same table as the
//! JSON Schema advertised to clients.

use crate::error::SchemaError;
use serde_json::{Map, Value, json};

/// Raw or normalized call arguments.
pub type Arguments = Map<String, Value>;

/// A single string-valued input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
    /// Allowed values, `None` for free-form strings.
    pub choices: Option<&'static [&'static str]>,
    pub default: Option<&'static str>,
}

impl Field {
    /// An optional free-form string field.
    pub const fn string(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            required: false,
            choices: None,
            default: None,
        }
    }

    /// An optional field restricted to `choices`.
    pub const fn choice(
        name: &'static str,
        description: &'static str,
        choices: &'static [&'static str],
    ) -> Self {
        Self {
            choices: Some(choices),
            ..Self::string(name, description)
        }
    }

    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    pub const fn with_default(self, default: &'static str) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }

    fn check(&self, value: &Value) -> Result<Value, SchemaError> {
        let Value::String(s) = value else {
            return Err(SchemaError::InvalidType {
                field: self.name,
                expected: "string",
            });
        };
        match self.choices {
            Some(allowed) if !allowed.contains(&s.as_str()) => Err(SchemaError::InvalidEnum {
                field: self.name,
                value: s.clone(),
                allowed,
            }),
            _ => Ok(value.clone()),
        }
    }
}

/// The input schema of one tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub fields: &'static [Field],
}

impl Schema {
    pub const fn new(fields: &'static [Field]) -> Self {
        Self { fields }
    }

    /// Validate `arguments` and fill in declared defaults.
    ///
    /// Fields are checked in declaration order and the first error wins.
    /// Unknown fields are dropped, `null` counts as absent.
    pub fn validate(&self, arguments: &Arguments) -> Result<Arguments, SchemaError> {
        let mut normalized = Arguments::new();
        for field in self.fields {
            match arguments.get(field.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    normalized.insert(field.name.into(), field.check(value)?);
                }
                None => {
                    if let Some(default) = field.default {
                        normalized.insert(field.name.into(), Value::from(default));
                    } else if field.required {
                        return Err(SchemaError::Missing { field: field.name });
                    }
                }
            }
        }
        Ok(normalized)
    }

    /// Render as a JSON Schema object.
    pub fn to_json_schema(&self) -> Arguments {
        let mut properties = Map::new();
        for field in self.fields {
            let mut property = json!({
                "type": "string",
                "description": field.description,
            });
            if let Some(choices) = field.choices {
                property["enum"] = json!(choices);
            }
            if let Some(default) = field.default {
                property["default"] = json!(default);
            }
            properties.insert(field.name.into(), property);
        }

        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name)
            .collect();

        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        schema.insert("required".into(), json!(required));
        schema
    }
}

#[cfg(test)]
mod tests {
    use crate::error::SchemaError;
    use crate::schema::{Arguments, Field, Schema};
    use serde_json::json;

    static SCHEMA: Schema = Schema::new(&[
        Field::string("path", "A path").required(),
        Field::choice("mode", "A mode", &["fast", "slow"]).with_default("fast"),
        Field::string("note", "Optional note"),
    ]);

    fn args(value: serde_json::Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn fills_defaults_and_drops_unknown_fields() {
        let normalized = SCHEMA
            .validate(&args(json!({ "path": "a", "extra": 1 })))
            .unwrap();
        assert_eq!(json!(normalized), json!({ "path": "a", "mode": "fast" }));
    }

    #[test]
    fn missing_required_field_is_named() {
        let err = SCHEMA.validate(&args(json!({ "mode": "slow" }))).unwrap_err();
        assert_eq!(err, SchemaError::Missing { field: "path" });
    }

    #[test]
    fn null_counts_as_absent() {
        let err = SCHEMA.validate(&args(json!({ "path": null }))).unwrap_err();
        assert_eq!(err.field(), "path");
        let normalized = SCHEMA
            .validate(&args(json!({ "path": "a", "mode": null })))
            .unwrap();
        assert_eq!(normalized["mode"], "fast");
    }

    #[test]
    fn rejects_value_outside_enum() {
        let err = SCHEMA
            .validate(&args(json!({ "path": "a", "mode": "medium" })))
            .unwrap_err();
        assert!(matches!(
            err,
            SchemaError::InvalidEnum { field: "mode", ref value, .. } if value == "medium"
        ));
    }

    #[test]
    fn rejects_non_string_value() {
        let err = SCHEMA.validate(&args(json!({ "path": 7 }))).unwrap_err();
        assert_eq!(
            err,
            SchemaError::InvalidType {
                field: "path",
                expected: "string"
            }
        );
    }

    #[test]
    fn renders_json_schema() {
        let schema = SCHEMA.to_json_schema();
        assert_eq!(
            json!(schema),
            json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "A path" },
                    "mode": {
                        "type": "string",
                        "description": "A mode",
                        "enum": ["fast", "slow"],
                        "default": "fast"
                    },
                    "note": { "type": "string", "description": "Optional note" }
                },
                "required": ["path"]
            })
        );
    }
}
