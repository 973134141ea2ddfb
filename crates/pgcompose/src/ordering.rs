//! ORDER BY and LIMIT/OFFSET tails shared by [`Filter`](crate::Filter) and
//! [`QueryBuilder`](crate::QueryBuilder).
//!
//! Neither clause carries bound values: both render as literals.

/// One `field direction` pair of an ORDER BY clause.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: String,
}

impl OrderBy {
    pub fn new(field: impl Into<String>, direction: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: direction.into(),
        }
    }
}

/// LIMIT/OFFSET pagination.
///
/// `limit == 0` means "no LIMIT clause", not "zero rows". Once a LIMIT is
/// rendered the OFFSET is always rendered too, even when it is zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }
}

/// Render `ORDER BY f1 d1, f2 d2 LIMIT n OFFSET m`, omitting empty parts.
pub(crate) fn order_and_pagination(orders: &[OrderBy], pagination: &Pagination) -> String {
    let mut sql = String::new();
    if !orders.is_empty() {
        sql.push_str("ORDER BY ");
        for (i, order) in orders.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&order.field);
            if !order.direction.is_empty() {
                sql.push(' ');
                sql.push_str(&order.direction);
            }
        }
    }
    if pagination.limit > 0 {
        if !sql.is_empty() {
            sql.push(' ');
        }
        sql.push_str(&format!(
            "LIMIT {} OFFSET {}",
            pagination.limit, pagination.offset
        ));
    }
    sql
}
