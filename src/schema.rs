use crate::coerce::coerce;
use crate::field::{FieldSpec, FieldType, ParseFieldTypeError};
use crate::serde_schema::SerdeSchema;
use crate::value::FieldValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// What to do with input keys that map to no declared field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[serde(rename_all = "snake_case")]
pub enum ExtraPolicy {
    /// Drop them silently.
    Ignore,
    /// Report each one as a validation error.
    Forbid,
    /// Keep them in the instance's side-mapping of extras.
    Allow,
}

impl Default for ExtraPolicy {
    fn default() -> Self {
        ExtraPolicy::Ignore
    }
}

/// Model-wide settings that validation falls back to when a
/// [`ValidateOptions`][`crate::ValidateOptions`] leaves them unset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelConfig {
    pub extra: ExtraPolicy,

    /// Accept canonical field names in input as well as aliases.
    pub populate_by_name: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SchemaDefinitionError {
    #[error("field name must not be empty")]
    EmptyName,

    #[error("duplicate field name: {0}")]
    DuplicateName(String),

    #[error("duplicate alias: {0}")]
    DuplicateAlias(String),

    #[error("alias {alias} of field {field} collides with another field's name")]
    AliasConflictsWithName { field: String, alias: String },

    #[error("default for field {field} is not a valid {type_}: {message}")]
    DefaultTypeMismatch {
        field: String,
        type_: FieldType,
        message: String,
    },

    #[error("field {field}: {source}")]
    InvalidType {
        field: String,
        source: ParseFieldTypeError,
    },
}

/// An ordered, immutable set of field declarations.
///
/// Build one with [`Schema::builder`] or [`Schema::from_serde_schema`]; both
/// reject duplicate names and aliases, and defaults that do not fit their
/// field's type.
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    title: String,
    fields: Vec<FieldSpec>,
    config: ModelConfig,
}

impl Schema {
    pub fn builder<T: Into<String>>(title: T) -> SchemaBuilder {
        SchemaBuilder {
            title: title.into(),
            fields: vec![],
            config: ModelConfig::default(),
        }
    }

    /// Constructs a [`Schema`] from its JSON description.
    ///
    /// ```
    /// use fieldmodel::{ExtraPolicy, Schema, SerdeSchema};
    /// use serde_json::json;
    ///
    /// let schema = Schema::from_serde_schema(
    ///     serde_json::from_value::<SerdeSchema>(json!({
    ///         "title": "Person",
    ///         "extra": "forbid",
    ///         "fields": [
    ///             { "name": "first_name", "alias": "firstName", "type": "string" },
    ///             { "name": "age", "type": "optional<integer>" },
    ///         ],
    ///     }))
    ///     .unwrap(),
    /// )
    /// .unwrap();
    ///
    /// assert_eq!("Person", schema.title());
    /// assert_eq!(ExtraPolicy::Forbid, schema.config().extra);
    /// assert!(!schema.field("age").unwrap().is_required());
    /// ```
    pub fn from_serde_schema(serde_schema: SerdeSchema) -> Result<Self, SchemaDefinitionError> {
        let mut builder = Schema::builder(serde_schema.title.unwrap_or_default())
            .with_extra(serde_schema.extra.unwrap_or_default())
            .with_populate_by_name(serde_schema.populate_by_name.unwrap_or(false));

        for field in serde_schema.fields {
            let type_ = field.type_.parse::<FieldType>().map_err(|source| {
                SchemaDefinitionError::InvalidType {
                    field: field.name.clone(),
                    source,
                }
            })?;

            builder = builder.field(FieldSpec {
                name: field.name,
                alias: field.alias,
                type_,
                default: field.default.map(FieldValue::from),
            });
        }

        builder.build()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }
}

pub struct SchemaBuilder {
    title: String,
    fields: Vec<FieldSpec>,
    config: ModelConfig,
}

impl SchemaBuilder {
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_extra(mut self, extra: ExtraPolicy) -> Self {
        self.config.extra = extra;
        self
    }

    pub fn with_populate_by_name(mut self, populate_by_name: bool) -> Self {
        self.config.populate_by_name = populate_by_name;
        self
    }

    pub fn build(mut self) -> Result<Schema, SchemaDefinitionError> {
        if let Err(err) = self.check() {
            tracing::debug!(schema = %self.title, error = %err, "rejected schema definition");
            return Err(err);
        }

        tracing::debug!(
            schema = %self.title,
            fields = self.fields.len(),
            extra = ?self.config.extra,
            populate_by_name = self.config.populate_by_name,
            "built schema"
        );

        Ok(Schema {
            title: self.title,
            fields: self.fields,
            config: self.config,
        })
    }

    fn check(&mut self) -> Result<(), SchemaDefinitionError> {
        let mut names = BTreeSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(SchemaDefinitionError::EmptyName);
            }

            if !names.insert(field.name.as_str()) {
                return Err(SchemaDefinitionError::DuplicateName(field.name.clone()));
            }
        }

        let mut aliases = BTreeSet::new();
        for field in &self.fields {
            if let Some(alias) = &field.alias {
                if !aliases.insert(alias.as_str()) {
                    return Err(SchemaDefinitionError::DuplicateAlias(alias.clone()));
                }

                if *alias != field.name && names.contains(alias.as_str()) {
                    return Err(SchemaDefinitionError::AliasConflictsWithName {
                        field: field.name.clone(),
                        alias: alias.clone(),
                    });
                }
            }
        }

        for field in &mut self.fields {
            if let Some(default) = &field.default {
                let coerced = coerce(default, &field.type_).map_err(|err| {
                    SchemaDefinitionError::DefaultTypeMismatch {
                        field: field.name.clone(),
                        type_: field.type_.clone(),
                        message: err.message,
                    }
                })?;

                field.default = Some(coerced);
            }
        }

        Ok(())
    }
}
