use crate::field::FieldType;
use crate::value::{FieldValue, DATE_FORMAT};
use chrono::NaiveDate;

/// Why a value could not be coerced. The message is suitable for direct
/// display next to the field location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoerceError {
    pub message: String,
}

impl CoerceError {
    fn new<M: Into<String>>(message: M) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Best-effort conversion of `value` into `type_`.
pub fn coerce(value: &FieldValue, type_: &FieldType) -> Result<FieldValue, CoerceError> {
    if value.is_null() && !type_.is_nullable() {
        return Err(CoerceError::new("none is not an allowed value"));
    }

    match type_ {
        FieldType::String => coerce_string(value),
        FieldType::Integer => coerce_integer(value),
        FieldType::Float => coerce_float(value),
        FieldType::Boolean => coerce_boolean(value),
        FieldType::Date => coerce_date(value),
        FieldType::Optional(inner) => {
            if value.is_null() {
                Ok(FieldValue::Null)
            } else {
                coerce(value, inner)
            }
        }
        FieldType::Union(members) => {
            for member in members {
                if let Ok(coerced) = coerce(value, member) {
                    return Ok(coerced);
                }
            }

            Err(CoerceError::new(format!(
                "value does not match any of {}",
                type_
            )))
        }
    }
}

fn coerce_string(value: &FieldValue) -> Result<FieldValue, CoerceError> {
    match value {
        FieldValue::String(s) => Ok(FieldValue::String(s.clone())),
        FieldValue::Integer(n) => Ok(FieldValue::String(n.to_string())),
        FieldValue::Float(f) => Ok(FieldValue::String(f.to_string())),
        _ => Err(CoerceError::new("str type expected")),
    }
}

fn coerce_integer(value: &FieldValue) -> Result<FieldValue, CoerceError> {
    let invalid = || CoerceError::new("value is not a valid integer");

    match value {
        FieldValue::Integer(n) => Ok(FieldValue::Integer(*n)),
        FieldValue::Float(f) => {
            if f.is_finite() && f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64
            {
                Ok(FieldValue::Integer(*f as i64))
            } else {
                Err(invalid())
            }
        }
        FieldValue::String(s) => s
            .trim()
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn coerce_float(value: &FieldValue) -> Result<FieldValue, CoerceError> {
    let invalid = || CoerceError::new("value is not a valid float");

    let f = match value {
        FieldValue::Float(f) => *f,
        FieldValue::Integer(n) => *n as f64,
        FieldValue::String(s) => s.trim().parse::<f64>().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };

    // Text output has no encoding for inf or NaN.
    if f.is_finite() {
        Ok(FieldValue::Float(f))
    } else {
        Err(invalid())
    }
}

fn coerce_boolean(value: &FieldValue) -> Result<FieldValue, CoerceError> {
    let invalid = || CoerceError::new("value could not be parsed to a boolean");

    match value {
        FieldValue::Bool(b) => Ok(FieldValue::Bool(*b)),
        FieldValue::Integer(0) => Ok(FieldValue::Bool(false)),
        FieldValue::Integer(1) => Ok(FieldValue::Bool(true)),
        FieldValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(FieldValue::Bool(true)),
            "false" | "no" | "off" | "0" => Ok(FieldValue::Bool(false)),
            _ => Err(invalid()),
        },
        _ => Err(invalid()),
    }
}

fn coerce_date(value: &FieldValue) -> Result<FieldValue, CoerceError> {
    match value {
        FieldValue::Date(d) => Ok(FieldValue::Date(*d)),
        FieldValue::String(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map(FieldValue::Date)
            .map_err(|_| CoerceError::new("invalid date format")),
        _ => Err(CoerceError::new("invalid date format")),
    }
}
