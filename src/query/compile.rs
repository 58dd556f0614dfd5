//! Compilation of filters and sorts against a record's field table.
//!
//! Everything is checked here, before the store is touched: unknown fields,
//! operators that do not apply to the field's kind, and operands of the
//! wrong kind.

use std::cmp::Ordering;

use super::{Condition, Direction, Filter, Sort};
use crate::record::{FieldDef, Record};
use crate::repository::RepoError;
use crate::value::{Value, ValueKind};

pub(crate) fn field_def<R: Record>(name: &str) -> Result<&'static FieldDef, RepoError> {
    R::field_def(name).ok_or_else(|| {
        RepoError::Validation(format!("unknown field {} on {}", name, R::COLLECTION))
    })
}

fn check_operand(def: &FieldDef, value: &Value, allow_null: bool) -> Result<(), RepoError> {
    match value.kind() {
        None if allow_null => Ok(()),
        None => Err(RepoError::Validation(format!(
            "null is not a valid operand for field {}",
            def.name
        ))),
        Some(kind) if kind.is_compatible(def.kind) => Ok(()),
        Some(kind) => Err(RepoError::Validation(format!(
            "cannot compare {} field {} with {} value {}",
            def.kind, def.name, kind, value
        ))),
    }
}

fn check_condition(def: &FieldDef, condition: &Condition) -> Result<(), RepoError> {
    match condition {
        Condition::Equals(_) | Condition::NotEquals(_) => {
            for operand in condition.operands() {
                check_operand(def, operand, true)?;
            }
            Ok(())
        }
        // A null in an `In` list matches null fields.
        Condition::In(_) => {
            for operand in condition.operands() {
                check_operand(def, operand, true)?;
            }
            Ok(())
        }
        Condition::NotIn(_) => {
            for operand in condition.operands() {
                check_operand(def, operand, false)?;
            }
            Ok(())
        }
        Condition::GreaterThan(_)
        | Condition::GreaterThanOrEqual(_)
        | Condition::LessThan(_)
        | Condition::LessThanOrEqual(_)
        | Condition::Between(_, _) => {
            if !def.kind.is_ordered() {
                return Err(RepoError::Validation(format!(
                    "range comparison on {} field {}",
                    def.kind, def.name
                )));
            }
            for operand in condition.operands() {
                check_operand(def, operand, false)?;
            }
            Ok(())
        }
        Condition::IsNull | Condition::IsNotNull => Ok(()),
        Condition::StartsWith(_) | Condition::EndsWith(_) | Condition::Contains(_)
            if def.kind != ValueKind::Text =>
        {
            Err(RepoError::Validation(format!(
                "text matching on {} field {}",
                def.kind, def.name
            )))
        }
        Condition::IsTrue | Condition::IsFalse if def.kind != ValueKind::Bool => {
            Err(RepoError::Validation(format!(
                "boolean check on {} field {}",
                def.kind, def.name
            )))
        }
        Condition::StartsWith(_)
        | Condition::EndsWith(_)
        | Condition::Contains(_)
        | Condition::IsTrue
        | Condition::IsFalse => Ok(()),
    }
}

/// A filter whose fields and operands have been validated for one record kind.
#[derive(Debug, Clone)]
pub(crate) struct CompiledFilter {
    checks: Vec<(&'static str, Condition)>,
}

impl CompiledFilter {
    pub(crate) fn compile<R: Record>(filter: &Filter) -> Result<Self, RepoError> {
        let mut checks = Vec::with_capacity(filter.len());
        for criterion in filter.criteria() {
            let def = field_def::<R>(&criterion.field)?;
            check_condition(def, &criterion.condition)?;
            checks.push((def.name, criterion.condition.clone()));
        }
        Ok(Self { checks })
    }

    pub(crate) fn matches<R: Record>(&self, record: &R) -> bool {
        self.checks.iter().all(|(field, condition)| {
            let value = record.get_field(field).unwrap_or(Value::Null);
            condition.test(&value)
        })
    }
}

/// Sort keys validated for one record kind.
#[derive(Debug, Clone)]
pub(crate) struct CompiledSort {
    keys: Vec<(&'static str, Direction)>,
}

impl CompiledSort {
    pub(crate) fn compile<R: Record>(sort: &Sort) -> Result<Self, RepoError> {
        let mut keys = Vec::with_capacity(sort.orders().len());
        for order in sort.orders() {
            let def = field_def::<R>(&order.field)?;
            keys.push((def.name, order.direction));
        }
        Ok(Self { keys })
    }

    /// Stable sort; records with equal keys keep their relative order.
    pub(crate) fn apply<R: Record>(&self, records: Vec<R>) -> Vec<R> {
        if self.keys.is_empty() {
            return records;
        }

        let mut keyed: Vec<(Vec<Value>, R)> = records
            .into_iter()
            .map(|record| {
                let key = self
                    .keys
                    .iter()
                    .map(|(field, _)| record.get_field(field).unwrap_or(Value::Null))
                    .collect();
                (key, record)
            })
            .collect();

        keyed.sort_by(|(a, _), (b, _)| {
            for (i, (_, direction)) in self.keys.iter().enumerate() {
                let ord = a[i].sort_cmp(&b[i]);
                let ord = match direction {
                    Direction::Asc => ord,
                    Direction::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        keyed.into_iter().map(|(_, record)| record).collect()
    }
}
