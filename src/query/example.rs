//! Query by example - Build a filter from a partially populated probe record.

use std::collections::HashSet;

use super::{Condition, Criterion, Filter};
use crate::record::Record;
use crate::repository::RepoError;
use crate::value::Value;

/// How text fields of the probe are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringMatcher {
    #[default]
    Exact,
    StartsWith,
    EndsWith,
    Contains,
}

/// Controls which probe fields become criteria and how they match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExampleMatcher {
    ignored_paths: Vec<String>,
    string_matcher: StringMatcher,
    include_nulls: bool,
}

impl ExampleMatcher {
    /// Match every populated field exactly.
    pub fn matching() -> Self {
        Self::default()
    }

    pub fn with_ignore_paths<'a>(mut self, paths: impl IntoIterator<Item = &'a str>) -> Self {
        self.ignored_paths
            .extend(paths.into_iter().map(str::to_string));
        self
    }

    pub fn with_string_matcher(mut self, matcher: StringMatcher) -> Self {
        self.string_matcher = matcher;
        self
    }

    /// Also match null and default-valued fields instead of skipping them.
    pub fn with_include_nulls(mut self) -> Self {
        self.include_nulls = true;
        self
    }

    pub fn ignored_paths(&self) -> &[String] {
        &self.ignored_paths
    }

    pub fn string_matcher(&self) -> StringMatcher {
        self.string_matcher
    }

    pub fn includes_nulls(&self) -> bool {
        self.include_nulls
    }
}

/// A probe record paired with a matcher.
#[derive(Debug, Clone)]
pub struct Example<R> {
    probe: R,
    matcher: ExampleMatcher,
}

impl<R: Record> Example<R> {
    pub fn of(probe: R) -> Self {
        Self {
            probe,
            matcher: ExampleMatcher::default(),
        }
    }

    pub fn with_matcher(mut self, matcher: ExampleMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn probe(&self) -> &R {
        &self.probe
    }

    pub fn matcher(&self) -> &ExampleMatcher {
        &self.matcher
    }

    /// The filter this example stands for.
    ///
    /// The identifier is never part of it. Fields holding a default value
    /// (null, zero, empty, false) are skipped unless nulls are included.
    pub fn to_filter(&self) -> Result<Filter, RepoError> {
        let mut ignored = HashSet::new();
        for path in &self.matcher.ignored_paths {
            let def = R::field_def(path).ok_or_else(|| {
                RepoError::Validation(format!(
                    "ignored path {} is not a field of {}",
                    path,
                    R::COLLECTION
                ))
            })?;
            ignored.insert(def.name);
        }

        let mut filter = Filter::new();
        for def in R::FIELDS {
            if def.identifier || ignored.contains(def.name) {
                continue;
            }
            let value = self.probe.get_field(def.name).unwrap_or(Value::Null);
            if value.is_default() && !self.matcher.include_nulls {
                continue;
            }
            let condition = match value {
                Value::Null => Condition::IsNull,
                Value::Text(text) => match self.matcher.string_matcher {
                    StringMatcher::Exact => Condition::Equals(Value::Text(text)),
                    StringMatcher::StartsWith => Condition::StartsWith(text),
                    StringMatcher::EndsWith => Condition::EndsWith(text),
                    StringMatcher::Contains => Condition::Contains(text),
                },
                other => Condition::Equals(other),
            };
            filter = filter.and(Criterion::new(def.name, condition));
        }
        Ok(filter)
    }
}
