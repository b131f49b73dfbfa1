//! Small numeric aggregations: [`sum`] and [`weighted_mean`].
//!
//! Unlike a lenient sum, bad operands are errors: nested rows and buckets
//! never add up, and objects only do when they carry a numeric coercion.
//! Nulls are skipped.

use std::fmt;

use crate::error::ArrayError;
use crate::model::{Collection, Value};

// ---------------------------------------------------------------------------
// Number
// ---------------------------------------------------------------------------

/// Result of a numeric aggregation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// The value as a float.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(n) => n as f64,
            Self::Float(x) => x,
        }
    }

    fn plus(self, other: Self) -> Self {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a
                .checked_add(b)
                .map_or_else(|| Self::Float(self.as_f64() + other.as_f64()), Self::Int),
            _ => Self::Float(self.as_f64() + other.as_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        match n {
            Number::Int(n) => Self::Int(n),
            Number::Float(x) => Self::Float(x),
        }
    }
}

/// Coerce one operand. `Ok(None)` means "skip".
fn coerce(value: &Value, partial: Number) -> Result<Option<Number>, ArrayError> {
    let fail = |reason: String| ArrayError::NumericCoercion {
        reason,
        partial: partial.to_string(),
        value: value.clone(),
    };
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(Number::Int(i64::from(*b)))),
        Value::Int(n) => Ok(Some(Number::Int(*n))),
        Value::Float(x) => Ok(Some(Number::Float(*x))),
        Value::Str(s) => {
            let trimmed = s.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                Ok(Some(Number::Int(n)))
            } else if let Ok(x) = trimmed.parse::<f64>() {
                Ok(Some(Number::Float(x)))
            } else {
                Err(fail("a non-numeric string".to_owned()))
            }
        }
        Value::Row(_) => Err(fail("a nested row".to_owned())),
        Value::Bucket(_) => Err(fail("a bucket".to_owned())),
        Value::Object(o) => o.to_number().map(|x| Some(Number::Float(x))).ok_or_else(|| {
            fail(format!(
                "a {} object which has no numeric coercion",
                o.type_name
            ))
        }),
    }
}

// ---------------------------------------------------------------------------
// sum
// ---------------------------------------------------------------------------

/// Total of the values of `collection`.
///
/// Integer arithmetic is kept while every operand is an integer; a float
/// operand (or an integer overflow) switches the total to floating point.
///
/// # Errors
/// Returns [`ArrayError::NumericCoercion`] for rows, buckets, non-numeric
/// strings and objects without numeric coercion.
pub fn sum<C: Collection + ?Sized>(collection: &C) -> Result<Number, ArrayError> {
    let mut total = Number::Int(0);
    for (_, value) in collection.entries() {
        if let Some(n) = coerce(value, total)? {
            total = total.plus(n);
        }
    }
    Ok(total)
}

// ---------------------------------------------------------------------------
// weighted_mean
// ---------------------------------------------------------------------------

/// Weighted arithmetic mean `Σ vᵢwᵢ / Σ wᵢ`, pairing values and weights by
/// position.
///
/// Returns `None` for empty input and `Some(0.0)` when the weights sum to
/// zero.
///
/// # Errors
/// Returns [`ArrayError::WeightCountMismatch`] when the lengths differ and
/// [`ArrayError::NumericCoercion`] for non-numeric operands (nulls count as
/// zero here).
pub fn weighted_mean<V, W>(values: &V, weights: &W) -> Result<Option<f64>, ArrayError>
where
    V: Collection + ?Sized,
    W: Collection + ?Sized,
{
    if values.len() != weights.len() {
        return Err(ArrayError::WeightCountMismatch {
            values: values.len(),
            weights: weights.len(),
        });
    }
    if values.is_empty() {
        return Ok(None);
    }

    let as_f64 = |value: &Value| -> Result<f64, ArrayError> {
        Ok(coerce(value, Number::Int(0))?.map_or(0.0, Number::as_f64))
    };

    let mut weights_sum = 0.0;
    let mut weighted_sum = 0.0;
    for ((_, value), (_, weight)) in values.entries().zip(weights.entries()) {
        let weight = as_f64(weight)?;
        weights_sum += weight;
        weighted_sum += as_f64(value)? * weight;
    }

    if weights_sum.abs() < f64::EPSILON {
        return Ok(Some(0.0));
    }
    Ok(Some(weighted_sum / weights_sum))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Object, Row};

    #[test]
    fn sums_integers() {
        assert_eq!(sum(&Row::list([4, 5, 6])).unwrap(), Number::Int(15));
    }

    #[test]
    fn nulls_are_skipped() {
        let row = Row::list([Value::Int(4), Value::Null, Value::Int(5)]);
        assert_eq!(sum(&row).unwrap(), Number::Int(9));
    }

    #[test]
    fn floats_switch_to_float_total() {
        let row = Row::list([Value::Int(1), Value::Float(0.5)]);
        assert_eq!(sum(&row).unwrap(), Number::Float(1.5));
    }

    #[test]
    fn numeric_strings_are_parsed() {
        let row = Row::list([Value::from("2"), Value::from(" 1.5 "), Value::Bool(true)]);
        assert_eq!(sum(&row).unwrap(), Number::Float(4.5));
    }

    #[test]
    fn nested_rows_fail_with_partial_sum() {
        let row = Row::list([Value::Int(4), Value::Int(5), Value::Row(Row::list([12]))]);
        let err = sum(&row).unwrap_err();
        assert_eq!(err.to_string(), "cannot sum a nested row (partial sum 9): [12]");
    }

    #[test]
    fn objects_need_numeric_coercion() {
        let plain = Object::new("stdClass", Row::list([12]));
        let err = sum(&Row::list([Value::Int(4), Value::Object(plain)])).unwrap_err();
        assert!(err.to_string().contains("stdClass object which has no numeric coercion"));

        let numberable = Object::new("NumberableObject", Row::new()).with_number(6.0);
        let total = sum(&Row::list([Value::Int(4), Value::Int(5), Value::Object(numberable)]));
        assert_eq!(total.unwrap().as_f64(), 15.0);
    }

    #[test]
    fn overflow_falls_back_to_float() {
        let row = Row::list([Value::Int(i64::MAX), Value::Int(1)]);
        assert!(matches!(sum(&row).unwrap(), Number::Float(_)));
    }

    #[test]
    fn weighted_mean_basic() {
        let mean = weighted_mean(&Row::list([1, 3]), &Row::list([1, 3])).unwrap();
        assert_eq!(mean, Some(2.5));
    }

    #[test]
    fn weighted_mean_edge_cases() {
        assert_eq!(weighted_mean(&Row::new(), &Row::new()).unwrap(), None);
        assert_eq!(
            weighted_mean(&Row::list([5]), &Row::list([0])).unwrap(),
            Some(0.0)
        );
        assert_eq!(
            weighted_mean(&Row::list([5, 7]), &Row::list([1, -1])).unwrap(),
            Some(0.0)
        );
        let err = weighted_mean(&Row::list([1, 2]), &Row::list([1])).unwrap_err();
        assert_eq!(
            err,
            ArrayError::WeightCountMismatch {
                values: 2,
                weights: 1
            }
        );
    }
}
