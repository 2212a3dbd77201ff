use crate::value::FieldValue;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The declared type of a schema field.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    Optional(Box<FieldType>),

    /// Members are tried in order; the first that accepts a value wins.
    Union(Vec<FieldType>),
}

impl FieldType {
    pub fn optional(inner: FieldType) -> Self {
        FieldType::Optional(Box::new(inner))
    }

    pub fn union<I: IntoIterator<Item = FieldType>>(members: I) -> Self {
        FieldType::Union(members.into_iter().collect())
    }

    /// Whether null is an acceptable value for this type.
    pub fn is_nullable(&self) -> bool {
        match self {
            FieldType::Optional(_) => true,
            FieldType::Union(members) => members.iter().any(FieldType::is_nullable),
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => f.write_str("string"),
            FieldType::Integer => f.write_str("integer"),
            FieldType::Float => f.write_str("float"),
            FieldType::Boolean => f.write_str("boolean"),
            FieldType::Date => f.write_str("date"),
            FieldType::Optional(inner) => write!(f, "optional<{}>", inner),
            FieldType::Union(members) => {
                f.write_str("union<")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", member)?;
                }
                f.write_str(">")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid field type {input:?}: {reason}")]
pub struct ParseFieldTypeError {
    pub input: String,
    pub reason: String,
}

impl FromStr for FieldType {
    type Err = ParseFieldTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason: &str| ParseFieldTypeError {
            input: s.to_owned(),
            reason: reason.to_owned(),
        };

        let mut parser = TypeParser { rest: s };
        let type_ = parser.parse_type().map_err(|reason| fail(reason))?;
        parser.skip_ws();
        if !parser.rest.is_empty() {
            return Err(fail("trailing input"));
        }

        Ok(type_)
    }
}

struct TypeParser<'a> {
    rest: &'a str,
}

impl<'a> TypeParser<'a> {
    fn parse_type(&mut self) -> Result<FieldType, &'static str> {
        self.skip_ws();
        let end = self
            .rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or_else(|| self.rest.len());
        let (word, rest) = self.rest.split_at(end);
        self.rest = rest;

        match word {
            "string" => Ok(FieldType::String),
            "integer" => Ok(FieldType::Integer),
            "float" => Ok(FieldType::Float),
            "boolean" => Ok(FieldType::Boolean),
            "date" => Ok(FieldType::Date),
            "optional" => {
                self.expect('<')?;
                let inner = self.parse_type()?;
                self.expect('>')?;
                Ok(FieldType::optional(inner))
            }
            "union" => {
                self.expect('<')?;
                let mut members = vec![self.parse_type()?];
                loop {
                    self.skip_ws();
                    if self.rest.starts_with(',') {
                        self.rest = &self.rest[1..];
                        members.push(self.parse_type()?);
                    } else {
                        break;
                    }
                }
                self.expect('>')?;
                if members.len() < 2 {
                    return Err("union needs at least two members");
                }
                Ok(FieldType::Union(members))
            }
            "" => Err("expected a type name"),
            _ => Err("unknown type name"),
        }
    }

    fn expect(&mut self, c: char) -> Result<(), &'static str> {
        self.skip_ws();
        if self.rest.starts_with(c) {
            self.rest = &self.rest[c.len_utf8()..];
            Ok(())
        } else if c == '<' {
            Err("expected '<'")
        } else {
            Err("expected '>'")
        }
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }
}

/// Declaration of a single field within a [`Schema`][`crate::Schema`].
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub alias: Option<String>,
    pub type_: FieldType,
    pub default: Option<FieldValue>,
}

impl FieldSpec {
    pub fn new<N: Into<String>>(name: N, type_: FieldType) -> Self {
        Self {
            name: name.into(),
            alias: None,
            type_,
            default: None,
        }
    }

    pub fn with_alias<A: Into<String>>(mut self, alias: A) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_default<V: Into<FieldValue>>(mut self, default: V) -> Self {
        self.default = Some(default.into());
        self
    }

    /// The name used for this field outside the program: the alias if one is
    /// declared, otherwise the canonical name.
    pub fn external_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// A field is required when it has no default. Nullable fields
    /// implicitly default to null.
    pub fn is_required(&self) -> bool {
        self.default.is_none() && !self.type_.is_nullable()
    }

    /// The value used when the field is absent from input.
    pub fn effective_default(&self) -> Option<FieldValue> {
        match &self.default {
            Some(default) => Some(default.clone()),
            None if self.type_.is_nullable() => Some(FieldValue::Null),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_type_from_str() {
        assert!("String".parse::<FieldType>().is_err());
        assert_eq!(Ok(FieldType::String), "string".parse());
        assert_eq!(Ok(FieldType::Integer), "integer".parse());
        assert_eq!(Ok(FieldType::Float), "float".parse());
        assert_eq!(Ok(FieldType::Boolean), "boolean".parse());
        assert_eq!(Ok(FieldType::Date), "date".parse());
        assert_eq!(
            Ok(FieldType::optional(FieldType::Date)),
            " optional < date > ".parse()
        );
        assert_eq!(
            Ok(FieldType::optional(FieldType::union(vec![
                FieldType::Integer,
                FieldType::String
            ]))),
            "optional<union<integer,string>>".parse()
        );
    }

    #[test]
    fn field_type_from_str_errors() {
        let err = "union<string>".parse::<FieldType>().unwrap_err();
        assert_eq!("union needs at least two members", err.reason);

        assert!("optional<date".parse::<FieldType>().is_err());
        assert!("optional date".parse::<FieldType>().is_err());
        assert!("date>".parse::<FieldType>().is_err());
        assert!("".parse::<FieldType>().is_err());
    }

    #[test]
    fn field_type_display_parses_back() {
        let type_ = FieldType::union(vec![
            FieldType::optional(FieldType::Integer),
            FieldType::Date,
        ]);

        assert_eq!("union<optional<integer>, date>", type_.to_string());
        assert_eq!(Ok(type_.clone()), type_.to_string().parse());
        assert!(type_.is_nullable());
    }

    #[test]
    fn requiredness() {
        let name = FieldSpec::new("first_name", FieldType::String).with_alias("firstName");
        assert!(name.is_required());
        assert_eq!("firstName", name.external_name());
        assert_eq!(None, name.effective_default());

        let age = FieldSpec::new("age", FieldType::optional(FieldType::Integer));
        assert!(!age.is_required());
        assert_eq!("age", age.external_name());
        assert_eq!(Some(FieldValue::Null), age.effective_default());

        let count = FieldSpec::new("count", FieldType::Integer).with_default(3);
        assert!(!count.is_required());
        assert_eq!(Some(FieldValue::Integer(3)), count.effective_default());

        let either = FieldSpec::new(
            "either",
            FieldType::union(vec![
                FieldType::optional(FieldType::Integer),
                FieldType::Date,
            ]),
        );
        assert!(!either.is_required());
        assert_eq!(Some(FieldValue::Null), either.effective_default());
    }
}
