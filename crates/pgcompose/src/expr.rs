//! Atomic SQL fragments with their bound values.
//!
//! An [`Expression`] is the leaf of every predicate tree: a piece of SQL text
//! using `?` markers plus the values bound to those markers, in order.

use crate::param::{Param, ParamList};
use crate::rebind::count_markers;
use tokio_postgres::types::ToSql;

/// A SQL text fragment and the values bound to its `?` markers.
///
/// The number of markers in `text` is expected to equal `values.len()`, but
/// this is not enforced here: mismatches are reported by
/// [`Executable::validate`](crate::Executable::validate) before execution.
#[derive(Clone, Debug, Default)]
pub struct Expression {
    text: String,
    values: Vec<Param>,
}

impl Expression {
    /// Create an expression from raw text and its bound values.
    pub fn new(text: impl Into<String>, values: Vec<Param>) -> Self {
        Self {
            text: text.into(),
            values,
        }
    }

    /// Create an expression without bound values.
    pub fn raw(text: impl Into<String>) -> Self {
        Self::new(text, Vec::new())
    }

    /// `field operator ?` with one bound value.
    pub fn field<T: ToSql + Send + Sync + 'static>(
        field: &str,
        operator: &str,
        value: T,
    ) -> Self {
        Self::new(format!("{field} {operator} ?"), vec![Param::new(value)])
    }

    /// `field IN (?,...,?)` with one marker per value.
    ///
    /// An empty `values` renders `field IN ()`, which the database rejects.
    pub fn in_list<T: ToSql + Send + Sync + 'static>(field: &str, values: Vec<T>) -> Self {
        Self::list(field, "IN", values)
    }

    /// `field NOT IN (?,...,?)` with one marker per value.
    pub fn not_in<T: ToSql + Send + Sync + 'static>(field: &str, values: Vec<T>) -> Self {
        Self::list(field, "NOT IN", values)
    }

    fn list<T: ToSql + Send + Sync + 'static>(field: &str, operator: &str, values: Vec<T>) -> Self {
        let markers = vec!["?"; values.len()].join(",");
        Self::new(
            format!("{field} {operator} ({markers})"),
            values.into_iter().map(Param::new).collect(),
        )
    }

    /// Prepend `prefix` and a space to the text, keeping the values.
    ///
    /// ```ignore
    /// let expr = sub_query.to_expression().with_prefix("id IN");
    /// ```
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.text = format!("{prefix} {}", self.text);
        self
    }

    /// The SQL text of this fragment.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The bound values, in marker order.
    pub fn values(&self) -> &[Param] {
        &self.values
    }

    /// Whether the marker count in the text matches the number of values.
    pub fn is_balanced(&self) -> bool {
        count_markers(&self.text) == self.values.len()
    }

    pub(crate) fn append_to(&self, sql: &mut String, params: &mut ParamList) {
        sql.push_str(&self.text);
        params.extend_params(self.values.iter().cloned());
    }
}
