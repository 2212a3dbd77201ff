use crate::coerce::coerce;
use crate::field::FieldSpec;
use crate::instance::Instance;
use crate::schema::{ExtraPolicy, Schema};
use crate::value::{FieldValue, Mapping};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Which input keys are accepted for a field that declares an alias.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[serde(rename_all = "snake_case")]
pub enum AliasMode {
    /// Only the external name: the alias if declared, otherwise the
    /// canonical name.
    AliasOnly,
    CanonicalOnly,
    /// Either name. When both are present the alias wins.
    Both,
}

/// Raw input to [`validate`], tagged with its source format.
#[derive(Clone, Copy, Debug)]
pub enum RawInput<'a> {
    Mapping(&'a Mapping),
    /// JSON text, decoded to a mapping before validation.
    Text(&'a str),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    alias_mode: Option<AliasMode>,
    extra_policy: Option<ExtraPolicy>,
}

impl ValidateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alias_mode(mut self, alias_mode: AliasMode) -> Self {
        self.alias_mode = Some(alias_mode);
        self
    }

    pub fn with_extra_policy(mut self, extra_policy: ExtraPolicy) -> Self {
        self.extra_policy = Some(extra_policy);
        self
    }

    fn alias_mode_for(&self, schema: &Schema) -> AliasMode {
        self.alias_mode.unwrap_or(if schema.config().populate_by_name {
            AliasMode::Both
        } else {
            AliasMode::AliasOnly
        })
    }

    fn extra_policy_for(&self, schema: &Schema) -> ExtraPolicy {
        self.extra_policy.unwrap_or(schema.config().extra)
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("expected a JSON object, found {found}")]
    NotAMapping { found: &'static str },
}

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Missing,
    TypeMismatch,
    ExtraForbidden,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Missing => "missing",
            ErrorKind::TypeMismatch => "type_mismatch",
            ErrorKind::ExtraForbidden => "extra_forbidden",
        })
    }
}

/// A single field-level problem.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    /// Path of the offending input key.
    pub loc: Vec<String>,
    pub kind: ErrorKind,
    pub message: String,

    /// The offending value, rendered as JSON.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
}

/// Every field-level problem found in one input, in schema order followed by
/// forbidden extras.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationError {
    pub title: String,
    pub errors: Vec<FieldError>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} validation error{} for {}",
            self.errors.len(),
            if self.errors.len() == 1 { "" } else { "s" },
            self.title
        )?;

        for err in &self.errors {
            write!(
                f,
                "\n{}\n  {} (type={})",
                err.loc.join(" -> "),
                err.message,
                err.kind
            )?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Validates `raw` against `schema`, collecting every field error.
///
/// Text input that cannot be decoded into a mapping fails with a single
/// [`ValidateError::Decode`] before any field is looked at.
pub fn validate<'s>(
    schema: &'s Schema,
    raw: RawInput<'_>,
    options: &ValidateOptions,
) -> Result<Instance<'s>, ValidateError> {
    let decoded;
    let input = match raw {
        RawInput::Mapping(mapping) => mapping,
        RawInput::Text(text) => {
            decoded = decode(text).map_err(|err| {
                tracing::debug!(schema = %schema.title(), error = %err, "could not decode input");
                err
            })?;
            &decoded
        }
    };

    let mut vm = Vm {
        alias_mode: options.alias_mode_for(schema),
        extra_policy: options.extra_policy_for(schema),
        consumed: BTreeSet::new(),
        errors: vec![],
    };

    let mut values = Vec::with_capacity(schema.fields().len());
    let mut fields_set = BTreeSet::new();
    for field in schema.fields() {
        match vm.validate_field(field, input) {
            Some((value, present)) => {
                if present {
                    fields_set.insert(field.name.clone());
                }
                values.push(value);
            }
            None => values.push(FieldValue::Null),
        }
    }

    let extras = vm.collect_extras(input);

    if !vm.errors.is_empty() {
        tracing::debug!(
            schema = %schema.title(),
            errors = vm.errors.len(),
            "validation failed"
        );

        return Err(ValidationError {
            title: schema.title().to_owned(),
            errors: vm.errors,
        }
        .into());
    }

    tracing::debug!(
        schema = %schema.title(),
        fields_set = fields_set.len(),
        extras = extras.len(),
        "validated input"
    );

    Ok(Instance::new(schema, values, fields_set, extras))
}

fn decode(text: &str) -> Result<Mapping, DecodeError> {
    match serde_json::from_str::<serde_json::Value>(text)? {
        serde_json::Value::Object(entries) => {
            Ok(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
        }
        other => Err(DecodeError::NotAMapping {
            found: FieldValue::from(other).kind(),
        }),
    }
}

struct Vm {
    alias_mode: AliasMode,
    extra_policy: ExtraPolicy,
    consumed: BTreeSet<String>,
    errors: Vec<FieldError>,
}

impl Vm {
    /// Returns the field's value and whether it came from input, or `None`
    /// if an error was recorded instead.
    fn validate_field(&mut self, field: &FieldSpec, input: &Mapping) -> Option<(FieldValue, bool)> {
        let candidates = self.candidate_keys(field);
        for key in &candidates {
            if input.contains_key(*key) {
                self.consumed.insert((*key).to_owned());
            }
        }

        let found = candidates
            .iter()
            .find_map(|key| input.get(*key).map(|value| (*key, value)));

        match found {
            Some((key, value)) => match coerce(value, &field.type_) {
                Ok(coerced) => Some((coerced, true)),
                Err(err) => {
                    self.push_error(key, ErrorKind::TypeMismatch, err.message, Some(value));
                    None
                }
            },
            None => match field.effective_default() {
                Some(default) => Some((default, false)),
                None => {
                    let key = candidates[0];
                    self.push_error(key, ErrorKind::Missing, "field required".to_owned(), None);
                    None
                }
            },
        }
    }

    /// Accepted input keys for `field`, most preferred first. Never empty.
    fn candidate_keys<'f>(&self, field: &'f FieldSpec) -> Vec<&'f str> {
        match (self.alias_mode, field.alias.as_deref()) {
            (AliasMode::CanonicalOnly, _) | (_, None) => vec![field.name.as_str()],
            (AliasMode::AliasOnly, Some(alias)) => vec![alias],
            (AliasMode::Both, Some(alias)) => vec![alias, field.name.as_str()],
        }
    }

    fn collect_extras(&mut self, input: &Mapping) -> Mapping {
        let mut extras = Mapping::new();
        for (key, value) in input {
            if self.consumed.contains(key) {
                continue;
            }

            match self.extra_policy {
                ExtraPolicy::Ignore => {}
                ExtraPolicy::Allow => {
                    extras.insert(key.clone(), value.clone());
                }
                ExtraPolicy::Forbid => self.push_error(
                    key,
                    ErrorKind::ExtraForbidden,
                    "extra fields not permitted".to_owned(),
                    Some(value),
                ),
            }
        }

        extras
    }

    fn push_error(
        &mut self,
        key: &str,
        kind: ErrorKind,
        message: String,
        input: Option<&FieldValue>,
    ) {
        self.errors.push(FieldError {
            loc: vec![key.to_owned()],
            kind,
            message,
            input: input.map(ToString::to_string),
        });
    }
}
