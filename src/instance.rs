use crate::schema::Schema;
use crate::value::{FieldValue, Mapping};
use std::collections::BTreeSet;
use std::fmt;

/// A record that satisfied every field of its [`Schema`].
///
/// Instances are only produced by [`validate`][`crate::validate`] and cannot
/// be modified afterwards. Input keys kept under
/// [`ExtraPolicy::Allow`][`crate::ExtraPolicy::Allow`] live in a separate
/// side-mapping and take no part in equality.
#[derive(Clone)]
pub struct Instance<'s> {
    schema: &'s Schema,
    values: Vec<FieldValue>,
    fields_set: BTreeSet<String>,
    extras: Mapping,
}

impl<'s> Instance<'s> {
    pub(crate) fn new(
        schema: &'s Schema,
        values: Vec<FieldValue>,
        fields_set: BTreeSet<String>,
        extras: Mapping,
    ) -> Self {
        debug_assert_eq!(schema.fields().len(), values.len());

        Self {
            schema,
            values,
            fields_set,
            extras,
        }
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Value of the field with canonical name `name`.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.schema.position(name).map(|i| &self.values[i])
    }

    /// Canonical names and values, in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> + '_ {
        self.schema
            .fields()
            .iter()
            .map(|field| field.name.as_str())
            .zip(self.values.iter())
    }

    /// Canonical names of fields that were present in the input, as opposed
    /// to filled in from a default.
    pub fn fields_set(&self) -> &BTreeSet<String> {
        &self.fields_set
    }

    pub fn extras(&self) -> &Mapping {
        &self.extras
    }

    /// An extra input value, looked up by the key it was given under.
    pub fn extra(&self, key: &str) -> Option<&FieldValue> {
        self.extras.get(key)
    }
}

impl PartialEq for Instance<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl fmt::Debug for Instance<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(self.schema.title());
        for (name, value) in self.iter() {
            out.field(name, value);
        }
        out.finish()
    }
}
