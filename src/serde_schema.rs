use crate::schema::ExtraPolicy;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A JSON representation of a [`Schema`][`crate::Schema`], compatible with
/// `serde_json`.
///
/// To convert this into a [`Schema`][`crate::Schema`], see
/// [`Schema::from_serde_schema`][`crate::Schema::from_serde_schema`].
///
/// ```
/// use fieldmodel::{SerdeField, SerdeSchema};
/// use serde_json::json;
///
/// assert_eq!(
///     SerdeSchema {
///         fields: vec![SerdeField {
///             name: "age".to_owned(),
///             type_: "optional<integer>".to_owned(),
///             ..Default::default()
///         }],
///         ..Default::default()
///     },
///     serde_json::from_value::<SerdeSchema>(json!({
///         "fields": [{ "name": "age", "type": "optional<integer>" }]
///     }))
///     .unwrap()
/// )
/// ```
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
pub struct SerdeSchema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<ExtraPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub populate_by_name: Option<bool>,

    #[serde(default)]
    pub fields: Vec<SerdeField>,
}

/// One field of a [`SerdeSchema`].
///
/// `type` uses the [`FieldType`][`crate::FieldType`] text grammar. A
/// `"default": null` entry declares a null default, which is different from
/// leaving `default` out.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
pub struct SerdeField {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    pub type_: String,

    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_default_is_not_absent_default() {
        let field: SerdeField = serde_json::from_value(json!({
            "name": "dob", "type": "optional<date>", "default": null
        }))
        .unwrap();
        assert_eq!(Some(Value::Null), field.default);

        let field: SerdeField =
            serde_json::from_value(json!({ "name": "dob", "type": "date" })).unwrap();
        assert_eq!(None, field.default);
    }

    #[test]
    fn serializes_back_to_the_same_json() {
        let input = json!({
            "title": "Person",
            "extra": "allow",
            "fields": [
                { "name": "first_name", "alias": "firstName", "type": "string" },
                { "name": "dob", "type": "optional<date>", "default": null },
            ],
        });

        let schema: SerdeSchema = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(Some(ExtraPolicy::Allow), schema.extra);
        assert_eq!(input, serde_json::to_value(&schema).unwrap());
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(serde_json::from_value::<SerdeSchema>(json!({ "definitions": {} })).is_err());
        assert!(serde_json::from_value::<SerdeField>(
            json!({ "name": "a", "type": "string", "required": true })
        )
        .is_err());
    }
}
