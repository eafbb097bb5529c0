//! Recursive structural validation of values against models.
//!
//! Validation is depth-first and stops at the first failure. Paths are
//! composed on the way back out: `[index]` for array elements and `key.` for
//! object fields, so a failure deep in the tree reads like `users[3].email`.

use crate::error::ValidationError;
use crate::model::{Model, ObjectModel, PrimitiveTag};
use crate::value::{Map, Value};

/// Validate `data` against `model`.
///
/// `None` stands for an absent value and always fails.
pub fn validate(model: &Model, data: Option<&Value>) -> Result<(), ValidationError> {
    let Some(data) = data else {
        return Err(ValidationError::mismatch(model, None));
    };

    match data {
        Value::String(_) => expect_tag(model, data, PrimitiveTag::String),
        Value::Function(_) => expect_tag(model, data, PrimitiveTag::Function),
        Value::Array(items) => validate_array(model, data, items),
        Value::Object(map) => validate_object(model, data, map),
        _ => validate_primitive(model, data),
    }
}

/// Render a model for error messages.
pub fn format_model(model: &Model) -> String {
    match model {
        Model::Primitive(tag) => tag.as_str().to_string(),
        Model::Wildcard => "*".to_string(),
        Model::ArrayOf(element) => format!("[{}]", format_model(element)),
        Model::ObjectOf(object) => format_object(object),
    }
}

fn format_object(object: &ObjectModel) -> String {
    let fields: Vec<String> = object
        .fields
        .iter()
        .map(|(name, model)| {
            if object.is_required(name) {
                format!("{name} (required): {}", format_model(model))
            } else {
                format!("{name}: {}", format_model(model))
            }
        })
        .collect();

    let body = if fields.is_empty() {
        "{}".to_string()
    } else {
        format!("{{ {} }}", fields.join(", "))
    };

    if object.strict {
        format!("{body} strict")
    } else {
        body
    }
}

fn expect_tag(model: &Model, data: &Value, tag: PrimitiveTag) -> Result<(), ValidationError> {
    match model {
        Model::Wildcard => Ok(()),
        Model::Primitive(expected) if *expected == tag => Ok(()),
        _ => Err(ValidationError::mismatch(model, Some(data))),
    }
}

fn validate_primitive(model: &Model, data: &Value) -> Result<(), ValidationError> {
    match model {
        Model::Wildcard => Ok(()),
        Model::Primitive(tag) if tag.as_str() == data.type_name() => Ok(()),
        _ => Err(ValidationError::mismatch(model, Some(data))),
    }
}

fn validate_array(model: &Model, data: &Value, items: &[Value]) -> Result<(), ValidationError> {
    let element = match model {
        Model::Wildcard => return Ok(()),
        Model::ArrayOf(element) => element,
        _ => return Err(ValidationError::mismatch(model, Some(data))),
    };

    for (index, item) in items.iter().enumerate() {
        validate(element, Some(item)).map_err(|e| e.under_index(index))?;
    }
    Ok(())
}

fn validate_object(model: &Model, data: &Value, map: &Map) -> Result<(), ValidationError> {
    let object = match model {
        Model::Wildcard => return Ok(()),
        Model::ObjectOf(object) => object,
        _ => return Err(ValidationError::mismatch(model, Some(data))),
    };

    if object.strict {
        if let Some((key, value)) = map.iter().find(|(key, _)| object.get_field(key).is_none()) {
            return Err(ValidationError::unexpected(value).under_key(key));
        }
    }

    for (name, field) in &object.fields {
        match map.get(name) {
            Some(value) => {
                validate(field, Some(value)).map_err(|e| e.under_key(name))?;
            }
            None if object.is_required(name) => {
                return Err(ValidationError::missing(field).under_key(name));
            }
            None => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Expected;
    use crate::value::Callable;
    use serde_json::json;

    fn options_model() -> Model {
        Model::object()
            .required_field("login", Model::string())
            .required_field("password", Model::string())
            .field("salt", Model::any())
            .required_field("userTable", Model::string())
            .strict()
            .into()
    }

    fn check(model: &Model, data: serde_json::Value) -> Result<(), ValidationError> {
        validate(model, Some(&Value::from(data)))
    }

    #[test]
    fn test_undefined_always_fails() {
        assert!(validate(&Model::any(), None).is_err());
        assert!(validate(&Model::string(), None).is_err());
    }

    #[test]
    fn test_primitives() {
        assert!(check(&Model::string(), json!("x")).is_ok());
        assert!(check(&Model::integer(), json!(3)).is_ok());
        assert!(check(&Model::integer(), json!(3.0)).is_ok());
        assert!(check(&Model::float(), json!(3.5)).is_ok());
        assert!(check(&Model::boolean(), json!(false)).is_ok());
        assert!(check(&Model::any(), json!(null)).is_ok());

        assert!(check(&Model::string(), json!(3)).is_err());
        assert!(check(&Model::float(), json!(3)).is_err());
        assert!(check(&Model::integer(), json!(3.5)).is_err());
        assert!(check(&Model::boolean(), json!(null)).is_err());
        assert!(check(&Model::integer(), json!("3")).is_err());

        assert!(validate(&Model::binary(), Some(&Value::Bytes(vec![1; 64]))).is_ok());
        assert!(validate(&Model::string(), Some(&Value::Bytes(vec![1]))).is_err());
    }

    #[test]
    fn test_functions() {
        let f = Value::Function(Callable::new("hook", |_| Value::Null));
        assert!(validate(&Model::function(), Some(&f)).is_ok());
        assert!(validate(&Model::any(), Some(&f)).is_ok());
        assert!(validate(&Model::string(), Some(&f)).is_err());
        assert!(check(&Model::function(), json!("hook")).is_err());
    }

    #[test]
    fn test_array_model_rejects_non_array() {
        let model = Model::array_of(Model::string());
        for data in [json!("a"), json!(1), json!({"a": "b"}), json!(true)] {
            let err = check(&model, data).unwrap_err();
            assert_eq!(err.path, "");
        }
        assert!(check(&Model::string(), json!(["a"])).is_err());
    }

    #[test]
    fn test_array_reports_index() {
        let model = Model::array_of(Model::string());
        assert!(check(&model, json!([])).is_ok());
        assert!(check(&model, json!(["a", "b"])).is_ok());

        let err = check(&model, json!(["a", "b", 3])).unwrap_err();
        assert_eq!(err.path, "[2]");
        assert_eq!(err.received, Some(Value::Int(3)));
    }

    #[test]
    fn test_nested_array_paths() {
        let model = Model::array_of(Model::array_of(Model::integer()));
        let err = check(&model, json!([[1], [2, "x"]])).unwrap_err();
        assert_eq!(err.path, "[1][1]");

        let model: Model = Model::object()
            .field(
                "users",
                Model::array_of(Model::object().required_field("email", Model::string()).into()),
            )
            .into();
        let err = check(&model, json!({"users": [{"email": "a"}, {"email": 4}]})).unwrap_err();
        assert_eq!(err.path, "users[1].email");
    }

    #[test]
    fn test_required_and_optional_fields() {
        let model = options_model();

        assert!(check(
            &model,
            json!({"login": "email", "password": "password", "userTable": "User"})
        )
        .is_ok());

        let err = check(&model, json!({"login": "email", "password": "password"})).unwrap_err();
        assert!(err.required);
        assert_eq!(err.path, "userTable");
        assert_eq!(err.received, None);
    }

    #[test]
    fn test_strict_rejects_unknown_keys() {
        let model = options_model();
        let err = check(
            &model,
            json!({"login": "email", "password": "p", "userTable": "User", "extra": 1}),
        )
        .unwrap_err();
        assert_eq!(err.expected, Expected::Nothing);
        assert_eq!(err.path, "extra");

        let lenient: Model = Model::object().field("a", Model::string()).into();
        assert!(check(&lenient, json!({"a": "x", "b": 2})).is_ok());
    }

    #[test]
    fn test_field_type_mismatch_wraps_path() {
        let model: Model = Model::object()
            .field(
                "profile",
                Model::object().field("age", Model::integer()).into(),
            )
            .into();
        let err = check(&model, json!({"profile": {"age": "ten"}})).unwrap_err();
        assert_eq!(err.path, "profile.age");
        assert!(!err.required);
    }

    #[test]
    fn test_object_model_rejects_non_object() {
        let model = options_model();
        assert!(check(&model, json!(["login"])).is_err());
        assert!(check(&model, json!("login")).is_err());
        assert!(check(&Model::string(), json!({"a": 1})).is_err());
    }

    #[test]
    fn test_first_error_wins() {
        let model: Model = Model::object()
            .required_field("a", Model::string())
            .required_field("b", Model::string())
            .into();
        let err = check(&model, json!({"a": 1, "b": 2})).unwrap_err();
        assert_eq!(err.path, "a");
    }

    #[test]
    fn test_format_model() {
        assert_eq!(format_model(&Model::array_of(Model::any())), "[*]");
        assert_eq!(
            format_model(&options_model()),
            concat!(
                "{ login (required): string, password (required): string, ",
                "salt: *, userTable (required): string } strict"
            )
        );
        let nested: Model = Model::object()
            .field(
                "tags",
                Model::array_of(Model::object().field("n", Model::integer()).into()),
            )
            .into();
        assert_eq!(format_model(&nested), "{ tags: [{ n: integer }] }");
        assert_eq!(format_model(&Model::object().into()), "{}");
    }
}
