//! Declarative schema models.
//!
//! A [`Model`] is a closed tree of type tags. Models are either built in code
//! with the builder helpers or parsed from their textual notation:
//!
//! ```text
//! "string" | "integer" | "float" | "boolean" | "function" | "binary"
//! "*"                                 wildcard
//! ["string"]                          homogeneous array
//! { "login": "string",                object with named fields
//!   "$required": ["login"],
//!   "$strict": true }
//! ```

use std::collections::BTreeSet;
use std::fmt;

use crate::error::ModelError;

/// Reserved object key listing required field names.
pub const REQUIRED_KEY: &str = "$required";

/// Reserved object key enabling strict mode.
pub const STRICT_KEY: &str = "$strict";

/// Primitive type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTag {
    /// UTF-8 string.
    String,
    /// Integral number.
    Integer,
    /// Non-integral number.
    Float,
    /// Boolean.
    Boolean,
    /// Host-provided callable.
    Function,
    /// Binary data.
    Binary,
}

impl PrimitiveTag {
    /// Tag name, equal to the matching [`Value::type_name`](crate::Value::type_name).
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveTag::String => "string",
            PrimitiveTag::Integer => "integer",
            PrimitiveTag::Float => "float",
            PrimitiveTag::Boolean => "boolean",
            PrimitiveTag::Function => "function",
            PrimitiveTag::Binary => "binary",
        }
    }

    /// Parse a tag name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(PrimitiveTag::String),
            "integer" => Some(PrimitiveTag::Integer),
            "float" => Some(PrimitiveTag::Float),
            "boolean" => Some(PrimitiveTag::Boolean),
            "function" => Some(PrimitiveTag::Function),
            "binary" => Some(PrimitiveTag::Binary),
            _ => None,
        }
    }
}

/// A schema model node.
#[derive(Debug, Clone, PartialEq)]
pub enum Model {
    /// A primitive type tag.
    Primitive(PrimitiveTag),
    /// Accepts any present value.
    Wildcard,
    /// Homogeneous array; every element matches the inner model.
    ArrayOf(Box<Model>),
    /// Object with named fields.
    ObjectOf(ObjectModel),
}

/// Object model: declared fields, required set, and strict flag.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectModel {
    /// Declared fields in declaration order.
    pub fields: Vec<(String, Model)>,
    /// Names of fields that must be present.
    pub required: BTreeSet<String>,
    /// Reject data keys that are not declared.
    pub strict: bool,
}

impl Model {
    /// `string` tag.
    pub fn string() -> Self {
        Model::Primitive(PrimitiveTag::String)
    }

    /// `integer` tag.
    pub fn integer() -> Self {
        Model::Primitive(PrimitiveTag::Integer)
    }

    /// `float` tag.
    pub fn float() -> Self {
        Model::Primitive(PrimitiveTag::Float)
    }

    /// `boolean` tag.
    pub fn boolean() -> Self {
        Model::Primitive(PrimitiveTag::Boolean)
    }

    /// `function` tag.
    pub fn function() -> Self {
        Model::Primitive(PrimitiveTag::Function)
    }

    /// `binary` tag.
    pub fn binary() -> Self {
        Model::Primitive(PrimitiveTag::Binary)
    }

    /// Wildcard.
    pub fn any() -> Self {
        Model::Wildcard
    }

    /// Array whose elements all match `element`.
    pub fn array_of(element: Model) -> Self {
        Model::ArrayOf(Box::new(element))
    }

    /// Start an object model.
    pub fn object() -> ObjectModel {
        ObjectModel::default()
    }

    /// Parse the textual notation into a canonical model.
    pub fn parse(json: &serde_json::Value) -> Result<Self, ModelError> {
        match json {
            serde_json::Value::String(tag) if tag == "*" => Ok(Model::Wildcard),
            serde_json::Value::String(tag) => PrimitiveTag::from_name(tag)
                .map(Model::Primitive)
                .ok_or_else(|| ModelError::UnknownTag(tag.clone())),
            serde_json::Value::Array(items) => match items.as_slice() {
                [element] => Ok(Model::array_of(Model::parse(element)?)),
                _ => Err(ModelError::ArrayArity(items.len())),
            },
            serde_json::Value::Object(map) => {
                let mut object = ObjectModel::default();
                for (key, value) in map {
                    match key.as_str() {
                        REQUIRED_KEY => {
                            let names = value
                                .as_array()
                                .ok_or(ModelError::InvalidRequired)?
                                .iter()
                                .map(|n| n.as_str().map(str::to_string))
                                .collect::<Option<BTreeSet<_>>>()
                                .ok_or(ModelError::InvalidRequired)?;
                            object.required = names;
                        }
                        STRICT_KEY => {
                            object.strict = value.as_bool().ok_or(ModelError::InvalidStrict)?;
                        }
                        _ => {
                            let field = Model::parse(value).map_err(|e| ModelError::InField {
                                field: key.clone(),
                                source: Box::new(e),
                            })?;
                            object.fields.push((key.clone(), field));
                        }
                    }
                }
                if let Some(missing) = object
                    .required
                    .iter()
                    .find(|name| object.get_field(name).is_none())
                {
                    return Err(ModelError::UndeclaredRequired(missing.clone()));
                }
                Ok(Model::ObjectOf(object))
            }
            other => Err(ModelError::Unsupported(other.to_string())),
        }
    }
}

impl ObjectModel {
    /// Declare an optional field.
    pub fn field(mut self, name: impl Into<String>, model: Model) -> Self {
        self.fields.push((name.into(), model));
        self
    }

    /// Declare a required field.
    pub fn required_field(mut self, name: impl Into<String>, model: Model) -> Self {
        let name = name.into();
        self.required.insert(name.clone());
        self.fields.push((name, model));
        self
    }

    /// Enable strict mode.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Get a declared field model.
    pub fn get_field(&self, name: &str) -> Option<&Model> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, model)| model)
    }

    /// Check if a field is required.
    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }
}

impl From<ObjectModel> for Model {
    fn from(object: ObjectModel) -> Self {
        Model::ObjectOf(object)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::validator::format_model(self))
    }
}
