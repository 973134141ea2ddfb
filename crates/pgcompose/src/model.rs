//! Table-backed models and the INSERT/UPDATE/DELETE statements built from
//! them.
//!
//! A model declares its table and a static column table mapping Rust field
//! names to database columns. Statement helpers resolve field names through
//! that table, so a typo is an error instead of broken SQL.
//!
//! # Example
//! ```ignore
//! use pgcompose::{Condition, Model, ModelColumn, Param, params, update_query};
//!
//! struct User { id: i64, name: String, email: String }
//!
//! impl Model for User {
//!     const TABLE: &'static str = "users";
//!     const COLUMNS: &'static [ModelColumn] = &[
//!         ModelColumn::new("id", "id").mark_sequence(),
//!         ModelColumn::new("name", "name"),
//!         ModelColumn::new("email", "email"),
//!     ];
//!
//!     fn values(&self) -> Vec<Param> {
//!         params![self.id, self.name.clone(), self.email.clone()]
//!     }
//! }
//!
//! let mut cond = Condition::and();
//! cond.add_field_filter("id", "=", user.id);
//! update_query(&user, Some(&cond), &["name"])?.execute(&client).await?;
//! ```

use crate::condition::{Condition, OptionalCondition};
use crate::error::{QbError, QbResult};
use crate::exec::BuiltQuery;
use crate::param::{Param, ParamList};

/// One entry of a model's column table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelColumn {
    /// Rust field name
    pub field: &'static str,
    /// Database column name
    pub column: &'static str,
    /// Never written by generated statements
    pub ignored: bool,
    /// Filled by the database (serial/identity), skipped by default inserts
    pub sequence: bool,
}

impl ModelColumn {
    pub const fn new(field: &'static str, column: &'static str) -> Self {
        Self {
            field,
            column,
            ignored: false,
            sequence: false,
        }
    }

    pub const fn mark_ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    pub const fn mark_sequence(mut self) -> Self {
        self.sequence = true;
        self
    }
}

/// A Rust type stored in one table.
pub trait Model {
    /// Fully qualified table name.
    const TABLE: &'static str;

    /// Column table, in declaration order.
    const COLUMNS: &'static [ModelColumn];

    /// Current field values, positionally aligned with [`COLUMNS`](Model::COLUMNS).
    fn values(&self) -> Vec<Param>;

    /// All column names, in declaration order.
    fn column_names() -> Vec<&'static str> {
        Self::COLUMNS.iter().map(|c| c.column).collect()
    }
}

/// The column mapped to `field`.
pub fn model_column<M: Model>(field: &str) -> QbResult<&'static str> {
    position::<M>(field).map(|i| M::COLUMNS[i].column)
}

/// The columns mapped to `fields`, in the order given.
pub fn model_columns<M: Model>(fields: &[&str]) -> QbResult<Vec<&'static str>> {
    fields.iter().map(|f| model_column::<M>(f)).collect()
}

/// The model's values for `columns`, in declaration order.
///
/// Columns the model does not declare are skipped.
pub fn model_values<M: Model>(model: &M, columns: &[&str]) -> Vec<Param> {
    M::COLUMNS
        .iter()
        .zip(model.values())
        .filter(|(c, _)| columns.contains(&c.column))
        .map(|(_, v)| v)
        .collect()
}

/// `INSERT INTO <table> (c1,c2) VALUES (?,?)`.
///
/// With no `fields`, every column that is neither ignored nor a sequence is
/// inserted.
pub fn insert_query<M: Model>(model: &M, fields: &[&str]) -> QbResult<BuiltQuery> {
    let indices = if fields.is_empty() {
        M::COLUMNS
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.ignored && !c.sequence)
            .map(|(i, _)| i)
            .collect()
    } else {
        resolve::<M>(fields)?
    };
    if indices.is_empty() {
        return Err(QbError::validation(format!(
            "no columns found in model {}",
            M::TABLE
        )));
    }

    let values = aligned_values(model)?;
    let columns: Vec<&str> = indices.iter().map(|&i| M::COLUMNS[i].column).collect();
    let markers = vec!["?"; indices.len()].join(",");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({markers})",
        M::TABLE,
        columns.join(",")
    );

    let mut params = ParamList::new();
    params.extend_params(indices.iter().map(|&i| values[i].clone()));
    Ok(BuiltQuery::new(sql, params))
}

/// `UPDATE <table> SET c1 = ?,c2 = ?` followed by ` WHERE <condition>` when
/// the condition is non-empty.
///
/// Arguments are the SET values followed by the condition's arguments.
pub fn update_query<M: Model>(
    model: &M,
    condition: Option<&Condition>,
    fields: &[&str],
) -> QbResult<BuiltQuery> {
    if fields.is_empty() {
        return Err(QbError::validation("fields is empty, nothing to update"));
    }
    let indices = resolve::<M>(fields)?;
    if indices.is_empty() {
        return Err(QbError::validation(format!(
            "no columns found in model {}",
            M::TABLE
        )));
    }

    let values = aligned_values(model)?;
    let assignments: Vec<String> = indices
        .iter()
        .map(|&i| format!("{} = ?", M::COLUMNS[i].column))
        .collect();

    let mut sql = format!("UPDATE {} SET {}", M::TABLE, assignments.join(","));
    let mut params = ParamList::new();
    params.extend_params(indices.iter().map(|&i| values[i].clone()));
    append_where(&mut sql, &mut params, condition);
    Ok(BuiltQuery::new(sql, params))
}

/// `DELETE FROM <table>` followed by ` WHERE <condition>` when the condition
/// is non-empty.
pub fn delete_query<M: Model>(condition: Option<&Condition>) -> BuiltQuery {
    let mut sql = format!("DELETE FROM {}", M::TABLE);
    let mut params = ParamList::new();
    append_where(&mut sql, &mut params, condition);
    BuiltQuery::new(sql, params)
}

fn append_where(sql: &mut String, params: &mut ParamList, condition: Option<&Condition>) {
    if condition.is_empty() {
        return;
    }
    if let Some(condition) = condition {
        sql.push_str(" WHERE ");
        condition.append_to(sql, params);
    }
}

fn position<M: Model>(field: &str) -> QbResult<usize> {
    M::COLUMNS
        .iter()
        .position(|c| c.field == field)
        .ok_or_else(|| QbError::UnknownField {
            model: M::TABLE,
            field: field.to_string(),
        })
}

/// Column indices for `fields`, in declaration order, ignored columns removed.
fn resolve<M: Model>(fields: &[&str]) -> QbResult<Vec<usize>> {
    let mut wanted = fields
        .iter()
        .map(|f| position::<M>(f))
        .collect::<QbResult<Vec<_>>>()?;
    wanted.sort_unstable();
    wanted.dedup();
    wanted.retain(|&i| !M::COLUMNS[i].ignored);
    Ok(wanted)
}

fn aligned_values<M: Model>(model: &M) -> QbResult<Vec<Param>> {
    let values = model.values();
    if values.len() != M::COLUMNS.len() {
        return Err(QbError::validation(format!(
            "model {} has {} columns but returned {} values",
            M::TABLE,
            M::COLUMNS.len(),
            values.len()
        )));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;
    use crate::rebind::count_markers;

    struct Account {
        id: i64,
        email: String,
        name: Option<String>,
        score: i32,
    }

    impl Model for Account {
        const TABLE: &'static str = "public.account";
        const COLUMNS: &'static [ModelColumn] = &[
            ModelColumn::new("id", "id").mark_sequence(),
            ModelColumn::new("email", "email"),
            ModelColumn::new("name", "display_name"),
            ModelColumn::new("score", "score").mark_ignored(),
        ];

        fn values(&self) -> Vec<Param> {
            params![self.id, self.email.clone(), self.name.clone(), self.score]
        }
    }

    fn account() -> Account {
        Account {
            id: 7,
            email: "a@example.com".to_string(),
            name: Some("Ann".to_string()),
            score: 3,
        }
    }

    fn args(params: &ParamList) -> Vec<String> {
        params.iter().map(|p| format!("{p:?}")).collect()
    }

    #[test]
    fn columns_resolve_through_field_names() {
        assert_eq!(model_column::<Account>("name").unwrap(), "display_name");
        assert_eq!(
            model_columns::<Account>(&["email", "id"]).unwrap(),
            ["email", "id"]
        );
        assert_eq!(
            Account::column_names(),
            ["id", "email", "display_name", "score"]
        );
    }

    #[test]
    fn unknown_field_is_an_error() {
        let err = model_column::<Account>("nope").unwrap_err();
        assert!(matches!(
            err,
            QbError::UnknownField { model: "public.account", ref field } if field == "nope"
        ));
    }

    #[test]
    fn values_follow_declaration_order() {
        let values = model_values(&account(), &["display_name", "id", "missing"]);
        assert_eq!(values.len(), 2);
        assert_eq!(format!("{:?}", values[0]), "7");
        assert_eq!(format!("{:?}", values[1]), "Some(\"Ann\")");
    }

    #[test]
    fn default_insert_skips_sequence_and_ignored() {
        let q = insert_query(&account(), &[]).unwrap();
        assert_eq!(
            q.sql(),
            "INSERT INTO public.account (email,display_name) VALUES (?,?)"
        );
        assert_eq!(args(q.params()), ["\"a@example.com\"", "Some(\"Ann\")"]);
    }

    #[test]
    fn insert_named_fields_in_declaration_order() {
        let q = insert_query(&account(), &["name", "id"]).unwrap();
        assert_eq!(q.sql(), "INSERT INTO public.account (id,display_name) VALUES (?,?)");
        assert_eq!(args(q.params()), ["7", "Some(\"Ann\")"]);
    }

    #[test]
    fn update_puts_set_values_before_condition() {
        let mut cond = Condition::and();
        cond.add_field_filter("id", "=", 7_i64)
            .add_expression("deleted_at IS NULL", params![]);

        let q = update_query(&account(), Some(&cond), &["email", "name"]).unwrap();
        assert_eq!(
            q.sql(),
            "UPDATE public.account SET email = ?,display_name = ? WHERE id = ? AND deleted_at IS NULL"
        );
        assert_eq!(
            args(q.params()),
            ["\"a@example.com\"", "Some(\"Ann\")", "7"]
        );
        assert_eq!(count_markers(q.sql()), q.params().len());
    }

    #[test]
    fn update_without_condition_has_no_where() {
        let q = update_query(&account(), None, &["email"]).unwrap();
        assert_eq!(q.sql(), "UPDATE public.account SET email = ?");

        let empty = Condition::and();
        let q = update_query(&account(), Some(&empty), &["email"]).unwrap();
        assert_eq!(q.sql(), "UPDATE public.account SET email = ?");
    }

    #[test]
    fn update_requires_fields() {
        assert!(update_query(&account(), None, &[]).unwrap_err().is_validation());
        assert!(update_query(&account(), None, &["score"]).unwrap_err().is_validation());
        assert!(matches!(
            update_query(&account(), None, &["bogus"]).unwrap_err(),
            QbError::UnknownField { .. }
        ));
    }

    #[test]
    fn delete_with_and_without_condition() {
        assert_eq!(delete_query::<Account>(None).sql(), "DELETE FROM public.account");

        let mut cond = Condition::and();
        cond.add_in_filter("id", vec![1_i64, 2]);
        let q = delete_query::<Account>(Some(&cond));
        assert_eq!(q.sql(), "DELETE FROM public.account WHERE id IN (?,?)");
        assert_eq!(args(q.params()), ["1", "2"]);
    }
}
