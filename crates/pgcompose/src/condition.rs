//! Boolean predicate groups for WHERE clauses.
//!
//! A [`Condition`] is an ordered list of [`Expression`]s joined by a single
//! [`ConditionOperator`]. Conditions nest: adding one condition to another
//! embeds it as a parenthesized expression that carries its values along, so
//! the argument order of the outer condition always follows marker order.
//!
//! # Example
//! ```ignore
//! use pgcompose::{Condition, ConditionOperator};
//!
//! let mut status = Condition::new(ConditionOperator::Or);
//! status.add_field_filter("status", "=", "active");
//! status.add_field_filter("status", "=", "trial");
//!
//! let mut cond = Condition::and();
//! cond.add_in_filter("team_id", vec![1_i64, 2]).add_condition(&status);
//!
//! assert_eq!(cond.to_sql(), "team_id IN (?,?) AND (status = ? OR status = ?)");
//! ```

use crate::expr::Expression;
use crate::param::{Param, ParamList};
use std::fmt;
use tokio_postgres::types::ToSql;

/// Boolean operator joining the expressions of a [`Condition`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConditionOperator {
    #[default]
    And,
    Or,
}

impl ConditionOperator {
    /// The SQL keyword for this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionOperator::And => "AND",
            ConditionOperator::Or => "OR",
        }
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered group of expressions joined by one boolean operator.
///
/// A condition never renders a leading or trailing operator and never renders
/// `WHERE` itself; callers decide whether to prefix it.
#[derive(Clone, Debug, Default)]
pub struct Condition {
    operator: ConditionOperator,
    expressions: Vec<Expression>,
}

impl Condition {
    /// Create an empty condition joined by `operator`.
    pub fn new(operator: ConditionOperator) -> Self {
        Self {
            operator,
            expressions: Vec::new(),
        }
    }

    /// Create an empty AND condition.
    pub fn and() -> Self {
        Self::new(ConditionOperator::And)
    }

    /// Create an empty OR condition.
    pub fn or() -> Self {
        Self::new(ConditionOperator::Or)
    }

    /// The operator joining this condition's expressions.
    pub fn operator(&self) -> ConditionOperator {
        self.operator
    }

    /// The expressions in append order.
    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    /// Append a raw fragment with its bound values.
    ///
    /// `values` may be empty for a pure boolean fragment such as
    /// `deleted_at IS NULL`.
    pub fn add_expression(&mut self, text: impl Into<String>, values: Vec<Param>) -> &mut Self {
        self.expressions.push(Expression::new(text, values));
        self
    }

    /// Append `field operator ?` bound to `value`.
    pub fn add_field_filter<T: ToSql + Send + Sync + 'static>(
        &mut self,
        field: &str,
        operator: &str,
        value: T,
    ) -> &mut Self {
        self.expressions.push(Expression::field(field, operator, value));
        self
    }

    /// Append `field IN (?,...,?)` with one marker per value.
    pub fn add_in_filter<T: ToSql + Send + Sync + 'static>(
        &mut self,
        field: &str,
        values: Vec<T>,
    ) -> &mut Self {
        self.expressions.push(Expression::in_list(field, values));
        self
    }

    /// Append `field NOT IN (?,...,?)` with one marker per value.
    pub fn add_not_in_filter<T: ToSql + Send + Sync + 'static>(
        &mut self,
        field: &str,
        values: Vec<T>,
    ) -> &mut Self {
        self.expressions.push(Expression::not_in(field, values));
        self
    }

    /// Append a prebuilt expression.
    pub fn push(&mut self, expression: Expression) -> &mut Self {
        self.expressions.push(expression);
        self
    }

    /// Nest another condition as a single parenthesized expression.
    ///
    /// Empty conditions are skipped.
    pub fn add_condition(&mut self, other: &Condition) -> &mut Self {
        if let Some(expression) = other.to_group_expression() {
            self.expressions.push(expression);
        }
        self
    }

    /// Nest several conditions joined by `operator` as one expression.
    ///
    /// Each non-empty condition is parenthesized, and the whole group is
    /// parenthesized again when it holds more than one condition:
    /// `((a = ? AND b = ?) OR (c = ?))`. Nothing is appended when every
    /// condition is empty.
    pub fn merge(&mut self, operator: ConditionOperator, conditions: &[Condition]) -> &mut Self {
        let groups: Vec<Expression> = conditions
            .iter()
            .filter_map(Condition::to_group_expression)
            .collect();
        match groups.len() {
            0 => {}
            1 => self.expressions.extend(groups),
            _ => {
                let mut merged = Condition::new(operator);
                merged.expressions = groups;
                self.add_condition(&merged);
            }
        }
        self
    }

    fn to_group_expression(&self) -> Option<Expression> {
        if self.is_empty() {
            return None;
        }
        let (sql, params) = self.build();
        Some(Expression::new(format!("({sql})"), params.into_vec()))
    }

    /// True iff no expression has been added.
    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    /// Render the text and collect the arguments in one pass.
    pub fn build(&self) -> (String, ParamList) {
        let mut sql = String::new();
        let mut params = ParamList::new();
        self.append_to(&mut sql, &mut params);
        (sql, params)
    }

    /// Render the condition text (`expr1 OP expr2 ...`).
    pub fn to_sql(&self) -> String {
        self.build().0
    }

    /// The bound values of every expression, in append order.
    pub fn arguments(&self) -> ParamList {
        self.build().1
    }

    pub(crate) fn append_to(&self, sql: &mut String, params: &mut ParamList) {
        for (i, expression) in self.expressions.iter().enumerate() {
            if i > 0 {
                sql.push(' ');
                sql.push_str(self.operator.as_str());
                sql.push(' ');
            }
            expression.append_to(sql, params);
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// Emptiness check for a condition that may not exist yet.
///
/// An absent condition is treated the same as one with no expressions.
pub trait OptionalCondition {
    /// True when the condition is absent or has no expressions.
    fn is_empty(&self) -> bool;
}

impl OptionalCondition for Option<&Condition> {
    fn is_empty(&self) -> bool {
        self.is_none_or(|c| c.is_empty())
    }
}

impl OptionalCondition for Option<Condition> {
    fn is_empty(&self) -> bool {
        self.as_ref().is_none_or(|c| c.is_empty())
    }
}
