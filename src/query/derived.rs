//! Derived queries - Queries described by a method name.
//!
//! `findTop3ByUsernameAndAgeGreaterThanOrderByAgeDesc` parses into a subject
//! (`find`, limit 3), two criteria (`username = ?`, `age > ?`) and an ordering
//! (`age desc`). Binding positional parameters yields an ordinary [`Query`].

use std::fmt;

use super::{Condition, Criterion, Direction, Filter, Query, Sort};
use crate::repository::RepoError;
use crate::value::Value;

/// What a derived query does with the matching records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Find,
    Count,
    Exists,
    Delete,
}

/// A positional parameter bound to a derived query.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Value(Value),
    List(Vec<Value>),
}

impl Param {
    pub fn list<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Param::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for Param {
    fn from(value: Value) -> Self {
        Param::Value(value)
    }
}

macro_rules! param_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Param {
                fn from(v: $ty) -> Self {
                    Param::Value(Value::from(v))
                }
            }
        )*
    };
}

param_from!(bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String, &str);

impl<T: Into<Value>> From<Option<T>> for Param {
    fn from(v: Option<T>) -> Self {
        Param::Value(Value::from(v))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Param {
    fn from(values: Vec<T>) -> Self {
        Param::list(values)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    Between,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    StartingWith,
    EndingWith,
    Containing,
    True,
    False,
}

// Longest keyword first so that `NotNull` wins over `Null`.
const KEYWORDS: &[(&[&str], Operator)] = &[
    (&["Greater", "Than", "Equal"], Operator::GreaterThanEqual),
    (&["Less", "Than", "Equal"], Operator::LessThanEqual),
    (&["Greater", "Than"], Operator::GreaterThan),
    (&["Less", "Than"], Operator::LessThan),
    (&["Not", "Null"], Operator::IsNotNull),
    (&["Not", "In"], Operator::NotIn),
    (&["Starting", "With"], Operator::StartingWith),
    (&["Ending", "With"], Operator::EndingWith),
    (&["Null"], Operator::IsNull),
    (&["In"], Operator::In),
    (&["Between"], Operator::Between),
    (&["Containing"], Operator::Containing),
    (&["True"], Operator::True),
    (&["False"], Operator::False),
    (&["Not"], Operator::NotEquals),
    (&["Equals"], Operator::Equals),
    (&["Is"], Operator::Equals),
];

impl Operator {
    fn arity(self) -> usize {
        match self {
            Operator::Between => 2,
            Operator::IsNull | Operator::IsNotNull | Operator::True | Operator::False => 0,
            _ => 1,
        }
    }

    /// Split a criterion into its property words and operator. A bare
    /// property is an equality check.
    fn split(words: &[String]) -> (&[String], Operator) {
        for (keyword, op) in KEYWORDS {
            if words.len() > keyword.len() && ends_with_words(words, keyword) {
                let mut property = &words[..words.len() - keyword.len()];
                if keyword[0] != "Is" {
                    if let Some((last, rest)) = property.split_last() {
                        if last == "Is" && !rest.is_empty() {
                            property = rest;
                        }
                    }
                }
                return (property, *op);
            }
        }
        (words, Operator::Equals)
    }
}

fn ends_with_words(words: &[String], suffix: &[&str]) -> bool {
    words.len() >= suffix.len()
        && words[words.len() - suffix.len()..]
            .iter()
            .zip(suffix)
            .all(|(word, keyword)| word == keyword)
}

#[derive(Debug, Clone, PartialEq)]
struct Part {
    field: String,
    operator: Operator,
}

/// A parsed query method name, not yet bound to parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedQuery {
    name: String,
    subject: Subject,
    limit: Option<usize>,
    parts: Vec<Part>,
    sort: Sort,
}

const VERBS: &[(&str, Subject)] = &[
    ("find", Subject::Find),
    ("read", Subject::Find),
    ("get", Subject::Find),
    ("query", Subject::Find),
    ("count", Subject::Count),
    ("exists", Subject::Exists),
    ("delete", Subject::Delete),
    ("remove", Subject::Delete),
];

fn invalid(name: &str, reason: impl fmt::Display) -> RepoError {
    RepoError::Validation(format!("cannot derive query from {}: {}", name, reason))
}

/// Split a PascalCase string into words. Digits stay with the preceding word
/// and acronyms stay together (`HTTPStatus` -> `HTTP`, `Status`).
fn words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if !prev.is_uppercase() || next_is_lower {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn snake_case(words: &[String]) -> String {
    words
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

fn parse_subject(name: &str, words: &[String]) -> Result<Option<usize>, RepoError> {
    let mut limit = None;
    for word in words {
        let count = word
            .strip_prefix("Top")
            .or_else(|| word.strip_prefix("First"));
        match count {
            Some(digits) if digits.chars().all(|c| c.is_ascii_digit()) => {
                let n = if digits.is_empty() {
                    1
                } else {
                    digits
                        .parse::<usize>()
                        .map_err(|e| invalid(name, format!("bad limit {}: {}", word, e)))?
                };
                if n == 0 {
                    return Err(invalid(name, "limit must be at least 1"));
                }
                limit = Some(n);
            }
            _ if word == "Distinct" => return Err(invalid(name, "distinct is not supported")),
            _ => {}
        }
    }
    Ok(limit)
}

fn parse_criteria(name: &str, words: &[String]) -> Result<Vec<Part>, RepoError> {
    if words.is_empty() {
        return Ok(Vec::new());
    }
    if words.iter().any(|w| w == "Or") {
        return Err(invalid(name, "only And-joined criteria are supported"));
    }

    let mut parts = Vec::new();
    for group in words.split(|w| w == "And") {
        let (property, operator) = Operator::split(group);
        if property.is_empty() {
            return Err(invalid(name, "criterion without a property"));
        }
        parts.push(Part {
            field: snake_case(property),
            operator,
        });
    }
    Ok(parts)
}

fn parse_order(name: &str, words: &[String]) -> Result<Sort, RepoError> {
    let mut sort = Sort::unsorted();
    let mut property: Vec<String> = Vec::new();
    for word in words {
        let direction = match word.as_str() {
            "Asc" => Some(Direction::Asc),
            "Desc" => Some(Direction::Desc),
            _ => None,
        };
        match direction {
            Some(_) if property.is_empty() => {
                return Err(invalid(name, "sort direction without a property"))
            }
            Some(direction) => {
                sort = sort.then(&snake_case(&property), direction);
                property.clear();
            }
            None => property.push(word.clone()),
        }
    }
    if !property.is_empty() {
        sort = sort.then(&snake_case(&property), Direction::Asc);
    }
    if sort.is_unsorted() {
        return Err(invalid(name, "OrderBy without a property"));
    }
    Ok(sort)
}

impl DerivedQuery {
    pub fn parse(name: &str) -> Result<Self, RepoError> {
        let (verb_len, subject) = VERBS
            .iter()
            .find(|(verb, _)| {
                name.strip_prefix(*verb)
                    .is_some_and(|rest| rest.chars().next().is_some_and(char::is_uppercase))
            })
            .map(|(verb, subject)| (verb.len(), *subject))
            .ok_or_else(|| invalid(name, "unknown verb"))?;

        let words = words(&name[verb_len..]);
        let by = words
            .iter()
            .position(|w| w == "By")
            .ok_or_else(|| invalid(name, "missing By"))?;

        let limit = parse_subject(name, &words[..by])?;
        if limit.is_some() && subject != Subject::Find {
            return Err(invalid(name, "a limit only applies to find queries"));
        }

        let rest = &words[by + 1..];
        let order_at = rest
            .windows(2)
            .position(|pair| pair[0] == "Order" && pair[1] == "By");
        let (criteria, order) = match order_at {
            Some(at) => (&rest[..at], Some(&rest[at + 2..])),
            None => (rest, None),
        };

        let parts = parse_criteria(name, criteria)?;
        let sort = match order {
            Some(order) => parse_order(name, order)?,
            None => Sort::unsorted(),
        };

        Ok(Self {
            name: name.to_string(),
            subject,
            limit,
            parts,
            sort,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subject(&self) -> Subject {
        self.subject
    }

    /// The `First<N>`/`Top<N>` limit, if any.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    /// Number of positional parameters `bind` expects.
    pub fn arity(&self) -> usize {
        self.parts.iter().map(|p| p.operator.arity()).sum()
    }

    /// Bind positional parameters, producing a query.
    pub fn bind(&self, params: &[Param]) -> Result<Query, RepoError> {
        if params.len() != self.arity() {
            return Err(RepoError::Validation(format!(
                "{} expects {} parameters, got {}",
                self.name,
                self.arity(),
                params.len()
            )));
        }

        let mut params = params.iter();
        let mut filter = Filter::new();
        for part in &self.parts {
            let condition = match part.operator {
                Operator::Equals => Condition::Equals(self.scalar(part, params.next())?),
                Operator::NotEquals => Condition::NotEquals(self.scalar(part, params.next())?),
                Operator::GreaterThan => Condition::GreaterThan(self.scalar(part, params.next())?),
                Operator::GreaterThanEqual => {
                    Condition::GreaterThanOrEqual(self.scalar(part, params.next())?)
                }
                Operator::LessThan => Condition::LessThan(self.scalar(part, params.next())?),
                Operator::LessThanEqual => {
                    Condition::LessThanOrEqual(self.scalar(part, params.next())?)
                }
                Operator::Between => Condition::Between(
                    self.scalar(part, params.next())?,
                    self.scalar(part, params.next())?,
                ),
                Operator::In => Condition::In(self.list(params.next())),
                Operator::NotIn => Condition::NotIn(self.list(params.next())),
                Operator::IsNull => Condition::IsNull,
                Operator::IsNotNull => Condition::IsNotNull,
                Operator::StartingWith => Condition::StartsWith(self.text(part, params.next())?),
                Operator::EndingWith => Condition::EndsWith(self.text(part, params.next())?),
                Operator::Containing => Condition::Contains(self.text(part, params.next())?),
                Operator::True => Condition::IsTrue,
                Operator::False => Condition::IsFalse,
            };
            filter = filter.and(Criterion::new(part.field.clone(), condition));
        }

        let mut query = Query::matching(filter).with_sort(self.sort.clone());
        if let Some(limit) = self.limit {
            query = query.with_limit(limit);
        }
        Ok(query)
    }

    fn scalar(&self, part: &Part, param: Option<&Param>) -> Result<Value, RepoError> {
        match param {
            Some(Param::Value(value)) => Ok(value.clone()),
            _ => Err(RepoError::Validation(format!(
                "{} expects a single value for {}",
                self.name, part.field
            ))),
        }
    }

    fn list(&self, param: Option<&Param>) -> Vec<Value> {
        match param {
            Some(Param::List(values)) => values.clone(),
            Some(Param::Value(value)) => vec![value.clone()],
            None => Vec::new(),
        }
    }

    fn text(&self, part: &Part, param: Option<&Param>) -> Result<String, RepoError> {
        match self.scalar(part, param)? {
            Value::Text(s) => Ok(s),
            other => Err(RepoError::Validation(format!(
                "{} expects text for {}, got {}",
                self.name, part.field, other
            ))),
        }
    }
}
