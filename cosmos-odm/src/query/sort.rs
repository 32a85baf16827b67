use std::fmt::{Display, Formatter};

/// Direction of one sort order.
///
/// # Variants
/// - `Asc`: smallest value first
/// - `Desc`: largest value first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Asc => write!(f, "ASC"),
            Direction::Desc => write!(f, "DESC"),
        }
    }
}

/// Sort order on one property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Order {
    property: String,
    direction: Direction,
}

impl Order {
    pub fn new(property: &str, direction: Direction) -> Self {
        Order {
            property: property.to_string(),
            direction,
        }
    }

    pub fn asc(property: &str) -> Self {
        Order::new(property, Direction::Asc)
    }

    pub fn desc(property: &str) -> Self {
        Order::new(property, Direction::Desc)
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

/// Ordered list of sort orders. The first order is the primary key.
///
/// # Examples
///
/// ```rust
/// use cosmos_odm::query::{Direction, Sort};
///
/// let sort = Sort::by("last_name").then_desc("age");
/// assert_eq!(sort.orders()[1].direction(), Direction::Desc);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Sort::default()
    }

    pub fn by(property: &str) -> Self {
        Sort {
            orders: vec![Order::asc(property)],
        }
    }

    pub fn by_desc(property: &str) -> Self {
        Sort {
            orders: vec![Order::desc(property)],
        }
    }

    pub fn from_orders(orders: Vec<Order>) -> Self {
        Sort { orders }
    }

    pub fn then(mut self, property: &str) -> Self {
        self.orders.push(Order::asc(property));
        self
    }

    pub fn then_desc(mut self, property: &str) -> Self {
        self.orders.push(Order::desc(property));
        self
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn is_sorted(&self) -> bool {
        !self.orders.is_empty()
    }
}
