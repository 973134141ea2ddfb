//! Simple list-query filters.
//!
//! A [`Filter`] bundles a [`Condition`] with ordering and pagination for the
//! common "list rows matching X, sorted, paged" case where a full
//! [`QueryBuilder`](crate::QueryBuilder) is more than needed.
//!
//! # Example
//! ```ignore
//! let mut filter = Filter::new();
//! filter
//!     .add_field_filter("status", "=", "active")
//!     .add_order("created_at", "DESC")
//!     .set_pagination(20, 40);
//!
//! let sql = format!("SELECT id, name FROM users {}", filter.with_where());
//! // SELECT id, name FROM users WHERE status = ? ORDER BY created_at DESC LIMIT 20 OFFSET 40
//! ```

use crate::condition::Condition;
use crate::ordering::{OrderBy, Pagination, order_and_pagination};
use crate::param::{Param, ParamList};
use tokio_postgres::types::ToSql;

/// Default page size for a fresh [`Filter`].
pub const DEFAULT_LIMIT: i64 = 100;

/// Condition + ordering + pagination.
#[derive(Clone, Debug)]
pub struct Filter {
    condition: Condition,
    orders: Vec<OrderBy>,
    pagination: Pagination,
}

impl Default for Filter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter {
    /// Create an AND filter with `LIMIT 100 OFFSET 0`.
    pub fn new() -> Self {
        Self {
            condition: Condition::and(),
            orders: Vec::new(),
            pagination: Pagination::new(DEFAULT_LIMIT, 0),
        }
    }

    /// Create a filter around an existing condition.
    pub fn with_condition(condition: Condition) -> Self {
        Self {
            condition,
            ..Self::new()
        }
    }

    // ==================== Predicates ====================

    /// Append `field operator ?`.
    pub fn add_field_filter<T: ToSql + Send + Sync + 'static>(
        &mut self,
        field: &str,
        operator: &str,
        value: T,
    ) -> &mut Self {
        self.condition.add_field_filter(field, operator, value);
        self
    }

    /// Append `field IN (?,...,?)`.
    pub fn add_in_filter<T: ToSql + Send + Sync + 'static>(
        &mut self,
        field: &str,
        values: Vec<T>,
    ) -> &mut Self {
        self.condition.add_in_filter(field, values);
        self
    }

    /// Append `field NOT IN (?,...,?)`.
    pub fn add_not_in_filter<T: ToSql + Send + Sync + 'static>(
        &mut self,
        field: &str,
        values: Vec<T>,
    ) -> &mut Self {
        self.condition.add_not_in_filter(field, values);
        self
    }

    /// Append a raw fragment with its bound values.
    pub fn add_expression(&mut self, text: impl Into<String>, values: Vec<Param>) -> &mut Self {
        self.condition.add_expression(text, values);
        self
    }

    /// Nest a condition as one parenthesized expression.
    pub fn add_condition(&mut self, condition: &Condition) -> &mut Self {
        self.condition.add_condition(condition);
        self
    }

    // ==================== Ordering & pagination ====================

    /// Append an ORDER BY pair.
    pub fn add_order(&mut self, field: impl Into<String>, direction: impl Into<String>) -> &mut Self {
        self.orders.push(OrderBy::new(field, direction));
        self
    }

    /// Set LIMIT/OFFSET. A zero limit disables the clause.
    pub fn set_pagination(&mut self, limit: i64, offset: i64) -> &mut Self {
        self.pagination = Pagination::new(limit, offset);
        self
    }

    // ==================== Accessors ====================

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn condition_mut(&mut self) -> &mut Condition {
        &mut self.condition
    }

    pub fn orders(&self) -> &[OrderBy] {
        &self.orders
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    // ==================== Rendering ====================

    /// Render `<conditions> <ORDER BY ...> <LIMIT ...>` without `WHERE`.
    pub fn to_sql(&self) -> String {
        self.render(false)
    }

    /// Render like [`to_sql`](Self::to_sql), prefixing `WHERE ` only when the
    /// condition is non-empty.
    pub fn with_where(&self) -> String {
        self.render(true)
    }

    /// The condition's bound values, in marker order.
    pub fn arguments(&self) -> ParamList {
        self.condition.arguments()
    }

    fn render(&self, with_where: bool) -> String {
        let mut sql = String::new();
        if !self.condition.is_empty() {
            if with_where {
                sql.push_str("WHERE ");
            }
            sql.push_str(&self.condition.to_sql());
        }
        let tail = order_and_pagination(&self.orders, &self.pagination);
        if !tail.is_empty() {
            if !sql.is_empty() {
                sql.push(' ');
            }
            sql.push_str(&tail);
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;

    fn args(params: &ParamList) -> Vec<String> {
        params.iter().map(|p| format!("{p:?}")).collect()
    }

    #[test]
    fn default_pagination_is_one_hundred() {
        let filter = Filter::new();
        assert_eq!(filter.pagination(), Pagination::new(100, 0));
        assert_eq!(filter.to_sql(), "LIMIT 100 OFFSET 0");
        assert_eq!(filter.with_where(), "LIMIT 100 OFFSET 0");
    }

    #[test]
    fn empty_filter_with_order_has_no_where() {
        let mut filter = Filter::new();
        filter.add_order("type", "ASC").set_pagination(10, 0);
        assert_eq!(filter.with_where(), "ORDER BY type ASC LIMIT 10 OFFSET 0");
    }

    #[test]
    fn zero_limit_disables_pagination() {
        let mut filter = Filter::new();
        filter.set_pagination(0, 0);
        assert_eq!(filter.to_sql(), "");
        assert_eq!(filter.with_where(), "");
    }

    #[test]
    fn conditions_order_and_pagination() {
        let mut filter = Filter::new();
        filter
            .add_field_filter("status", "=", "active")
            .add_in_filter("team_id", vec![7_i64, 8])
            .add_order("created_at", "DESC")
            .add_order("id", "ASC")
            .set_pagination(20, 40);

        assert_eq!(
            filter.to_sql(),
            "status = ? AND team_id IN (?,?) ORDER BY created_at DESC, id ASC LIMIT 20 OFFSET 40"
        );
        assert_eq!(
            filter.with_where(),
            "WHERE status = ? AND team_id IN (?,?) ORDER BY created_at DESC, id ASC LIMIT 20 OFFSET 40"
        );
        assert_eq!(args(&filter.arguments()), ["\"active\"", "7", "8"]);
    }

    #[test]
    fn expression_and_not_in() {
        let mut filter = Filter::new();
        filter
            .add_expression("deleted_at IS NULL", params![])
            .add_not_in_filter("code", vec!["a"])
            .set_pagination(0, 0);
        assert_eq!(filter.with_where(), "WHERE deleted_at IS NULL AND code NOT IN (?)");
        assert_eq!(filter.arguments().len(), 1);
    }

    #[test]
    fn or_condition_filter() {
        let mut filter = Filter::with_condition(Condition::or());
        filter
            .add_field_filter("a", "=", 1_i32)
            .add_field_filter("b", "=", 2_i32)
            .set_pagination(1, 0);
        assert_eq!(filter.with_where(), "WHERE a = ? OR b = ? LIMIT 1 OFFSET 0");
    }
}
