//! SELECT query builder with CTEs and set operations.
//!
//! A [`QueryBuilder`] is a tree: CTEs and set-operation operands are other
//! builders owned by their parent. Rendering walks the tree depth-first in
//! the exact order clauses appear in the output and appends text and bound
//! values in the same step, so the argument list always lines up with the
//! `?` markers in the text, however deep the nesting goes.
//!
//! # Example
//! ```ignore
//! use pgcompose::{QueryBuilder, params};
//!
//! let mut rights = QueryBuilder::new();
//! rights
//!     .from("mv_right")
//!     .columns(["id", "contract_id", "object_id"])
//!     .set_pagination(10, 0);
//! rights.where_clause().add_expression("object_id = ANY(?)", params![object_ids]);
//!
//! let mut qb = QueryBuilder::new();
//! qb.with("mv_right_items", rights)
//!     .from("mv_object mo")
//!     .columns(["mo.id", "mo.title", "mr.contract_id"])
//!     .relate("JOIN mv_right_items AS mr ON mr.object_id = mo.id");
//! qb.where_clause().add_expression("mr.object_id IS NOT NULL", params![]);
//!
//! let rows = qb.fetch_all::<ObjectRow>(&client).await?;
//! ```

use crate::condition::Condition;
use crate::expr::Expression;
use crate::filter::Filter;
use crate::ordering::{OrderBy, Pagination, order_and_pagination};
use crate::param::ParamList;
use std::fmt;


/// Set operation combining two SELECT results.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    UnionAll,
    Intersect,
    Except,
}

impl SetOperator {
    /// The SQL keyword(s) for this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            SetOperator::Union => "UNION",
            SetOperator::UnionAll => "UNION ALL",
            SetOperator::Intersect => "INTERSECT",
            SetOperator::Except => "EXCEPT",
        }
    }
}

impl fmt::Display for SetOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured SELECT query builder.
#[derive(Clone, Debug, Default)]
pub struct QueryBuilder {
    /// SELECT columns (rendered as `*` when empty)
    columns: Vec<String>,
    /// FROM expression, may embed an alias
    from: String,
    /// Raw JOIN clauses, in append order
    relations: Vec<String>,
    /// WHERE condition, created on first access
    condition: Option<Condition>,
    /// Named CTEs, in registration order
    ctes: Vec<(String, QueryBuilder)>,
    /// ORDER BY pairs
    orders: Vec<OrderBy>,
    /// LIMIT/OFFSET (limit 0 = no clause)
    pagination: Pagination,
    /// UNION/INTERSECT/EXCEPT steps, in call order
    set_ops: Vec<(SetOperator, QueryBuilder)>,
    /// Wrap the whole output in parentheses
    sub_query: bool,
}

impl QueryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Structure ====================

    /// Set the FROM source (table, `table alias`, or any FROM expression).
    pub fn from(&mut self, source: impl Into<String>) -> &mut Self {
        self.from = source.into();
        self
    }

    /// Replace the projected column list.
    pub fn columns<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Append a raw join clause, e.g. `LEFT JOIN orders o ON o.user_id = u.id`.
    pub fn relate(&mut self, join: impl Into<String>) -> &mut Self {
        self.relations.push(join.into());
        self
    }

    /// The WHERE condition, created as an empty AND condition on first call.
    ///
    /// Every call returns the same condition, so repeated population
    /// accumulates onto a single WHERE clause.
    pub fn where_clause(&mut self) -> &mut Condition {
        self.condition.get_or_insert_with(Condition::and)
    }

    /// Replace the WHERE condition.
    pub fn set_where(&mut self, condition: Condition) -> &mut Self {
        self.condition = Some(condition);
        self
    }

    /// Register a named CTE.
    ///
    /// CTEs render in registration order. Registering an alias again replaces
    /// the earlier builder in place.
    pub fn with(&mut self, alias: impl Into<String>, query: QueryBuilder) -> &mut Self {
        let alias = alias.into();
        match self.ctes.iter_mut().find(|(name, _)| *name == alias) {
            Some((_, existing)) => *existing = query,
            None => self.ctes.push((alias, query)),
        }
        self
    }

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

    /// Append `UNION (<other>)`.
    pub fn union(&mut self, other: QueryBuilder) -> &mut Self {
        self.set_operation(SetOperator::Union, other)
    }

    /// Append `UNION ALL (<other>)`.
    pub fn union_all(&mut self, other: QueryBuilder) -> &mut Self {
        self.set_operation(SetOperator::UnionAll, other)
    }

    /// Append `INTERSECT (<other>)`.
    pub fn intersect(&mut self, other: QueryBuilder) -> &mut Self {
        self.set_operation(SetOperator::Intersect, other)
    }

    /// Append `EXCEPT (<other>)`.
    pub fn except(&mut self, other: QueryBuilder) -> &mut Self {
        self.set_operation(SetOperator::Except, other)
    }

    /// Append a set-operation step.
    pub fn set_operation(&mut self, operator: SetOperator, other: QueryBuilder) -> &mut Self {
        self.set_ops.push((operator, other));
        self
    }

    /// Wrap this builder's whole output in parentheses.
    ///
    /// Needed wherever the builder is embedded in another builder's WHERE
    /// clause, column list or FROM clause.
    pub fn sub_query(&mut self, sub_query: bool) -> &mut Self {
        self.sub_query = sub_query;
        self
    }

    /// Merge a [`Filter`]'s condition, ordering and pagination into this
    /// builder.
    ///
    /// The filter's condition is nested into the WHERE clause, its orders are
    /// appended and its pagination replaces the current one.
    pub fn apply_filter(&mut self, filter: &Filter) -> &mut Self {
        self.where_clause().add_condition(filter.condition());
        self.orders.extend(filter.orders().iter().cloned());
        self.pagination = filter.pagination();
        self
    }

    // ==================== Accessors ====================

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn is_sub_query(&self) -> bool {
        self.sub_query
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// The CTE registered under `alias`, if any.
    pub fn cte(&self, alias: &str) -> Option<&QueryBuilder> {
        self.ctes
            .iter()
            .find(|(name, _)| name == alias)
            .map(|(_, query)| query)
    }

    /// Mutable access to the CTE registered under `alias`.
    pub fn cte_mut(&mut self, alias: &str) -> Option<&mut QueryBuilder> {
        self.ctes
            .iter_mut()
            .find(|(name, _)| name == alias)
            .map(|(_, query)| query)
    }

    /// CTE aliases in render order.
    pub fn cte_aliases(&self) -> impl Iterator<Item = &str> {
        self.ctes.iter().map(|(name, _)| name.as_str())
    }

    // ==================== Rendering ====================

    /// Render the SQL text and collect the bound values in one pass.
    pub fn build(&self) -> (String, ParamList) {
        let mut sql = String::new();
        let mut params = ParamList::new();
        self.render(&mut sql, &mut params, true);
        (sql, params)
    }

    /// The rendered SQL text, with `?` markers.
    pub fn to_sql(&self) -> String {
        self.build().0
    }

    /// The bound values, in the left-to-right order of the markers in
    /// [`to_sql`](Self::to_sql).
    pub fn arguments(&self) -> ParamList {
        self.build().1
    }

    /// The rendered builder as an [`Expression`], for embedding into a
    /// condition (`id IN <sub-query>`, `EXISTS <sub-query>`).
    ///
    /// The text is parenthesized when [`sub_query`](Self::sub_query) is set.
    pub fn to_expression(&self) -> Expression {
        let (sql, params) = self.build();
        Expression::new(sql, params.into_vec())
    }

    /// `with_ctes` is false for set-operation operands: an operand renders
    /// as a bare SELECT body, and its CTEs (and their values) are skipped.
    fn render(&self, sql: &mut String, params: &mut ParamList, with_ctes: bool) {
        if self.sub_query {
            sql.push('(');
        }

        // WITH
        if with_ctes && !self.ctes.is_empty() {
            sql.push_str("WITH ");
            for (i, (alias, query)) in self.ctes.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(alias);
                sql.push_str(" AS (");
                query.render(sql, params, true);
                sql.push(')');
            }
            sql.push(' ');
        }

        // SELECT ... FROM ...
        sql.push_str("SELECT ");
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }
        if !self.from.is_empty() {
            sql.push_str(" FROM ");
            sql.push_str(&self.from);
        }

        // JOINs
        for relation in &self.relations {
            sql.push(' ');
            sql.push_str(relation);
        }

        // WHERE
        if let Some(condition) = self.condition.as_ref().filter(|c| !c.is_empty()) {
            sql.push_str(" WHERE ");
            condition.append_to(sql, params);
        }

        // ORDER BY, LIMIT, OFFSET
        let tail = order_and_pagination(&self.orders, &self.pagination);
        if !tail.is_empty() {
            sql.push(' ');
            sql.push_str(&tail);
        }

        // UNION / INTERSECT / EXCEPT
        for (operator, operand) in &self.set_ops {
            sql.push(' ');
            sql.push_str(operator.as_str());
            sql.push_str(" (");
            operand.render(sql, params, false);
            sql.push(')');
        }

        if self.sub_query {
            sql.push(')');
        }
    }
}

impl fmt::Display for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
