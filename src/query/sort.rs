use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub field: String,
    pub direction: Direction,
}

/// Ordering of query results. Keys are applied left to right; remaining ties
/// keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(field: &str, direction: Direction) -> Self {
        Self::unsorted().then(field, direction)
    }

    pub fn asc(field: &str) -> Self {
        Self::by(field, Direction::Asc)
    }

    pub fn desc(field: &str) -> Self {
        Self::by(field, Direction::Desc)
    }

    pub fn then(mut self, field: &str, direction: Direction) -> Self {
        self.orders.push(Order {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, order) in self.orders.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let dir = match order.direction {
                Direction::Asc => "asc",
                Direction::Desc => "desc",
            };
            write!(f, "{} {}", order.field, dir)?;
        }
        Ok(())
    }
}
