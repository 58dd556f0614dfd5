//! Criteria - Field predicates combined by logical AND.

use std::fmt;

use crate::value::Value;

/// A comparison applied to one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals(Value),
    NotEquals(Value),
    GreaterThan(Value),
    GreaterThanOrEqual(Value),
    LessThan(Value),
    LessThanOrEqual(Value),
    /// Inclusive on both ends.
    Between(Value, Value),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    IsNull,
    IsNotNull,
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    IsTrue,
    IsFalse,
}

impl Condition {
    /// Evaluate against a field value.
    ///
    /// A null field only satisfies `IsNull` and `Equals(Null)`.
    pub fn test(&self, value: &Value) -> bool {
        match self {
            Condition::Equals(expected) => value.matches(expected),
            Condition::NotEquals(Value::Null) => !value.is_null(),
            Condition::NotEquals(expected) => !value.is_null() && !value.matches(expected),
            Condition::GreaterThan(bound) => value.compare(bound).is_some_and(|o| o.is_gt()),
            Condition::GreaterThanOrEqual(bound) => {
                value.compare(bound).is_some_and(|o| o.is_ge())
            }
            Condition::LessThan(bound) => value.compare(bound).is_some_and(|o| o.is_lt()),
            Condition::LessThanOrEqual(bound) => value.compare(bound).is_some_and(|o| o.is_le()),
            Condition::Between(low, high) => {
                value.compare(low).is_some_and(|o| o.is_ge())
                    && value.compare(high).is_some_and(|o| o.is_le())
            }
            Condition::In(values) => values.iter().any(|v| value.matches(v)),
            Condition::NotIn(values) => {
                !value.is_null() && !values.iter().any(|v| value.matches(v))
            }
            Condition::IsNull => value.is_null(),
            Condition::IsNotNull => !value.is_null(),
            Condition::StartsWith(prefix) => value.as_str().is_some_and(|s| s.starts_with(prefix.as_str())),
            Condition::EndsWith(suffix) => value.as_str().is_some_and(|s| s.ends_with(suffix.as_str())),
            Condition::Contains(part) => value.as_str().is_some_and(|s| s.contains(part.as_str())),
            Condition::IsTrue => value.as_bool() == Some(true),
            Condition::IsFalse => value.as_bool() == Some(false),
        }
    }

    /// The operand values, used for validation.
    pub(crate) fn operands(&self) -> Vec<&Value> {
        match self {
            Condition::Equals(v)
            | Condition::NotEquals(v)
            | Condition::GreaterThan(v)
            | Condition::GreaterThanOrEqual(v)
            | Condition::LessThan(v)
            | Condition::LessThanOrEqual(v) => vec![v],
            Condition::Between(low, high) => vec![low, high],
            Condition::In(values) | Condition::NotIn(values) => values.iter().collect(),
            _ => Vec::new(),
        }
    }
}

/// One `field <condition>` predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub field: String,
    pub condition: Condition,
}

impl Criterion {
    pub fn new(field: impl Into<String>, condition: Condition) -> Self {
        Self {
            field: field.into(),
            condition,
        }
    }
}

/// A conjunction of criteria. An empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    criteria: Vec<Criterion>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The filter that matches everything.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    /// Add a criterion.
    pub fn and(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    fn with(self, field: &str, condition: Condition) -> Self {
        self.and(Criterion::new(field, condition))
    }

    pub fn equal(self, field: &str, value: impl Into<Value>) -> Self {
        self.with(field, Condition::Equals(value.into()))
    }

    pub fn not_equal(self, field: &str, value: impl Into<Value>) -> Self {
        self.with(field, Condition::NotEquals(value.into()))
    }

    pub fn gt(self, field: &str, value: impl Into<Value>) -> Self {
        self.with(field, Condition::GreaterThan(value.into()))
    }

    pub fn ge(self, field: &str, value: impl Into<Value>) -> Self {
        self.with(field, Condition::GreaterThanOrEqual(value.into()))
    }

    pub fn lt(self, field: &str, value: impl Into<Value>) -> Self {
        self.with(field, Condition::LessThan(value.into()))
    }

    pub fn le(self, field: &str, value: impl Into<Value>) -> Self {
        self.with(field, Condition::LessThanOrEqual(value.into()))
    }

    pub fn between(self, field: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.with(field, Condition::Between(low.into(), high.into()))
    }

    pub fn is_in<V: Into<Value>>(self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.with(field, Condition::In(values))
    }

    pub fn not_in<V: Into<Value>>(self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.with(field, Condition::NotIn(values))
    }

    pub fn is_null(self, field: &str) -> Self {
        self.with(field, Condition::IsNull)
    }

    pub fn is_not_null(self, field: &str) -> Self {
        self.with(field, Condition::IsNotNull)
    }

    pub fn starts_with(self, field: &str, prefix: &str) -> Self {
        self.with(field, Condition::StartsWith(prefix.to_string()))
    }

    pub fn ends_with(self, field: &str, suffix: &str) -> Self {
        self.with(field, Condition::EndsWith(suffix.to_string()))
    }

    pub fn contains(self, field: &str, part: &str) -> Self {
        self.with(field, Condition::Contains(part.to_string()))
    }

    pub fn is_true(self, field: &str) -> Self {
        self.with(field, Condition::IsTrue)
    }

    pub fn is_false(self, field: &str) -> Self {
        self.with(field, Condition::IsFalse)
    }
}

impl From<Criterion> for Filter {
    fn from(criterion: Criterion) -> Self {
        Filter::new().and(criterion)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, values: &[Value]) -> fmt::Result {
    f.write_str("(")?;
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", v)?;
    }
    f.write_str(")")
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = &self.field;
        match &self.condition {
            Condition::Equals(v) => write!(f, "{} = {}", field, v),
            Condition::NotEquals(v) => write!(f, "{} <> {}", field, v),
            Condition::GreaterThan(v) => write!(f, "{} > {}", field, v),
            Condition::GreaterThanOrEqual(v) => write!(f, "{} >= {}", field, v),
            Condition::LessThan(v) => write!(f, "{} < {}", field, v),
            Condition::LessThanOrEqual(v) => write!(f, "{} <= {}", field, v),
            Condition::Between(low, high) => write!(f, "{} between {} and {}", field, low, high),
            Condition::In(values) => {
                write!(f, "{} in ", field)?;
                write_list(f, values)
            }
            Condition::NotIn(values) => {
                write!(f, "{} not in ", field)?;
                write_list(f, values)
            }
            Condition::IsNull => write!(f, "{} is null", field),
            Condition::IsNotNull => write!(f, "{} is not null", field),
            Condition::StartsWith(s) => write!(f, "{} like '{}%'", field, s),
            Condition::EndsWith(s) => write!(f, "{} like '%{}'", field, s),
            Condition::Contains(s) => write!(f, "{} like '%{}%'", field, s),
            Condition::IsTrue => write!(f, "{} = true", field),
            Condition::IsFalse => write!(f, "{} = false", field),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.criteria.is_empty() {
            return f.write_str("true");
        }
        for (i, criterion) in self.criteria.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "{}", criterion)?;
        }
        Ok(())
    }
}
