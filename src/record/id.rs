use std::fmt;
use std::hash::Hash;

use crate::value::{FieldValue, Value};

/// Identifier types a store can allocate.
///
/// New identifiers come from a per-collection sequence starting at 1.
pub trait Identifier:
    FieldValue + Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// The identifier for a sequence number, or `None` once the type runs out.
    fn from_sequence(seq: u64) -> Option<Self>;

    /// The sequence number this identifier corresponds to, if any.
    /// Caller-assigned identifiers ahead of the sequence advance it.
    fn sequence(&self) -> Option<u64>;

    fn from_field(value: Value) -> Option<Self> {
        <Self as FieldValue>::from_value(value)
    }
}

impl Identifier for u64 {
    fn from_sequence(seq: u64) -> Option<Self> {
        Some(seq)
    }

    fn sequence(&self) -> Option<u64> {
        Some(*self)
    }
}

impl Identifier for u32 {
    fn from_sequence(seq: u64) -> Option<Self> {
        u32::try_from(seq).ok()
    }

    fn sequence(&self) -> Option<u64> {
        Some(u64::from(*self))
    }
}

impl Identifier for i64 {
    fn from_sequence(seq: u64) -> Option<Self> {
        i64::try_from(seq).ok()
    }

    fn sequence(&self) -> Option<u64> {
        u64::try_from(*self).ok()
    }
}

impl Identifier for String {
    fn from_sequence(seq: u64) -> Option<Self> {
        Some(seq.to_string())
    }

    fn sequence(&self) -> Option<u64> {
        self.parse().ok()
    }
}
