use crate::instance::Instance;
use crate::value::{FieldValue, Mapping};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("include and exclude are mutually exclusive")]
    IncludeAndExclude,
}

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("could not encode instance: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("encoded text is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Controls which fields [`to_mapping`] and [`to_text`] emit, and under
/// which names.
///
/// `include` and `exclude` take canonical field names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    include: Option<BTreeSet<String>>,
    exclude: Option<BTreeSet<String>>,
    by_alias: bool,
    exclude_none: bool,
    exclude_unset: bool,
    extras: bool,
    indent: Option<usize>,
}

impl SerializeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_include<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Key output by alias rather than canonical name.
    pub fn with_by_alias(mut self, by_alias: bool) -> Self {
        self.by_alias = by_alias;
        self
    }

    /// Leave out fields whose value is null.
    pub fn with_exclude_none(mut self, exclude_none: bool) -> Self {
        self.exclude_none = exclude_none;
        self
    }

    /// Leave out fields that were filled in from a default.
    pub fn with_exclude_unset(mut self, exclude_unset: bool) -> Self {
        self.exclude_unset = exclude_unset;
        self
    }

    /// Emit the instance's extras after its fields.
    pub fn with_extras(mut self, extras: bool) -> Self {
        self.extras = extras;
        self
    }

    /// Pretty-print text output with `indent` spaces per level.
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = Some(indent);
        self
    }

    fn selects(&self, name: &str) -> bool {
        match (&self.include, &self.exclude) {
            (Some(include), _) => include.contains(name),
            (None, Some(exclude)) => !exclude.contains(name),
            (None, None) => true,
        }
    }
}

/// The entries of `instance` selected by `options`, in output order.
fn entries<'a>(
    instance: &'a Instance<'_>,
    options: &SerializeOptions,
) -> Result<Vec<(&'a str, &'a FieldValue)>, ConfigurationError> {
    if options.include.is_some() && options.exclude.is_some() {
        return Err(ConfigurationError::IncludeAndExclude);
    }

    let mut out = vec![];
    let mut emitted = BTreeSet::new();
    for (field, (name, value)) in instance.schema().fields().iter().zip(instance.iter()) {
        if !options.selects(name)
            || (options.exclude_none && value.is_null())
            || (options.exclude_unset && !instance.fields_set().contains(name))
        {
            continue;
        }

        let key = if options.by_alias {
            field.external_name()
        } else {
            name
        };
        emitted.insert(key);
        out.push((key, value));
    }

    if options.extras {
        for (key, value) in instance.extras() {
            // Fields own their key; an extra under the same key is dropped.
            if emitted.contains(key.as_str()) {
                continue;
            }

            if options.selects(key) && !(options.exclude_none && value.is_null()) {
                out.push((key.as_str(), value));
            }
        }
    }

    Ok(out)
}

/// Converts `instance` to a mapping. Dates stay native.
pub fn to_mapping(
    instance: &Instance<'_>,
    options: &SerializeOptions,
) -> Result<Mapping, ConfigurationError> {
    Ok(entries(instance, options)?
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value.clone()))
        .collect())
}

/// Renders `instance` as JSON text, keys in schema order.
pub fn to_text(instance: &Instance<'_>, options: &SerializeOptions) -> Result<String, SerializeError> {
    let ordered = Ordered(entries(instance, options)?);

    let text = match options.indent {
        None => serde_json::to_string(&ordered)?,
        Some(width) => {
            let indent = vec![b' '; width];
            let mut out = vec![];
            let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
            let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
            ordered.serialize(&mut serializer)?;
            String::from_utf8(out)?
        }
    };

    tracing::debug!(
        schema = %instance.schema().title(),
        keys = ordered.0.len(),
        by_alias = options.by_alias,
        "serialized instance"
    );

    Ok(text)
}

struct Ordered<'a>(Vec<(&'a str, &'a FieldValue)>);

impl Serialize for Ordered<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
