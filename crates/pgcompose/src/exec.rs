//! Executing built statements.
//!
//! Composition produces `?`-marker SQL. Before a statement reaches the
//! driver it is checked (marker count must equal the number of bound values)
//! and rebound to PostgreSQL's `$n` placeholders.

use crate::builder::QueryBuilder;
use crate::client::GenericClient;
use crate::error::{QbError, QbResult};
use crate::param::ParamList;
use crate::rebind::{count_markers, rebind};
use crate::row::FromRow;
use std::future::Future;
use tokio_postgres::Row;

/// Maximum number of SQL bytes written to a log line.
#[cfg(feature = "tracing")]
const MAX_LOGGED_SQL: usize = 200;

/// A statement that can be rendered and run against a [`GenericClient`].
///
/// Implementors only provide [`build_statement`](Executable::build_statement);
/// validation, rebinding, logging and execution come with the trait.
pub trait Executable: Sync {
    /// Render the `?`-marker SQL and its arguments.
    fn build_statement(&self) -> (String, ParamList);

    /// Check that the marker count matches the number of bound values.
    fn validate(&self) -> QbResult<()> {
        let (sql, params) = self.build_statement();
        check_markers(&sql, &params)
    }

    /// Render, validate and rebind to `$n` placeholders.
    fn prepare(&self) -> QbResult<(String, ParamList)> {
        let (sql, params) = self.build_statement();
        check_markers(&sql, &params)?;
        let sql = rebind(&sql);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "pgcompose.sql",
            param_count = params.len(),
            sql = %truncate_sql_bytes(&sql, MAX_LOGGED_SQL),
            "executing statement"
        );
        Ok((sql, params))
    }

    /// Execute and return all rows.
    fn query(&self, conn: &impl GenericClient) -> impl Future<Output = QbResult<Vec<Row>>> + Send {
        async move {
            let (sql, params) = self.prepare()?;
            conn.query(&sql, &params.as_refs()).await
        }
    }

    /// Execute and return the first row; zero rows is [`QbError::NotFound`].
    fn query_one(&self, conn: &impl GenericClient) -> impl Future<Output = QbResult<Row>> + Send {
        async move {
            let (sql, params) = self.prepare()?;
            conn.query_one(&sql, &params.as_refs()).await
        }
    }

    /// Execute and return the first row, if any.
    fn query_opt(
        &self,
        conn: &impl GenericClient,
    ) -> impl Future<Output = QbResult<Option<Row>>> + Send {
        async move {
            let (sql, params) = self.prepare()?;
            conn.query_opt(&sql, &params.as_refs()).await
        }
    }

    /// Execute and return the number of affected rows.
    fn execute(&self, conn: &impl GenericClient) -> impl Future<Output = QbResult<u64>> + Send {
        async move {
            let (sql, params) = self.prepare()?;
            conn.execute(&sql, &params.as_refs()).await
        }
    }

    /// Execute and map every row to `T`.
    fn fetch_all<T: FromRow + Send>(
        &self,
        conn: &impl GenericClient,
    ) -> impl Future<Output = QbResult<Vec<T>>> + Send {
        async move {
            let rows = self.query(conn).await?;
            rows.iter().map(T::from_row).collect()
        }
    }

    /// Execute and map the first row to `T`.
    fn fetch_one<T: FromRow + Send>(
        &self,
        conn: &impl GenericClient,
    ) -> impl Future<Output = QbResult<T>> + Send {
        async move {
            let row = self.query_one(conn).await?;
            T::from_row(&row)
        }
    }

    /// Execute and map the first row, if any, to `T`.
    fn fetch_opt<T: FromRow + Send>(
        &self,
        conn: &impl GenericClient,
    ) -> impl Future<Output = QbResult<Option<T>>> + Send {
        async move {
            match self.query_opt(conn).await? {
                Some(row) => T::from_row(&row).map(Some),
                None => Ok(None),
            }
        }
    }
}

impl Executable for QueryBuilder {
    fn build_statement(&self) -> (String, ParamList) {
        self.build()
    }
}

/// A rendered statement: `?`-marker SQL plus its arguments.
///
/// Produced by the model helpers, or wrapped around any hand-written SQL.
#[derive(Clone, Debug)]
pub struct BuiltQuery {
    sql: String,
    params: ParamList,
}

impl BuiltQuery {
    pub fn new(sql: impl Into<String>, params: impl Into<ParamList>) -> Self {
        Self {
            sql: sql.into(),
            params: params.into(),
        }
    }

    /// The SQL text, with `?` markers.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &ParamList {
        &self.params
    }

    pub fn into_parts(self) -> (String, ParamList) {
        (self.sql, self.params)
    }
}

impl Executable for BuiltQuery {
    fn build_statement(&self) -> (String, ParamList) {
        (self.sql.clone(), self.params.clone())
    }
}

fn check_markers(sql: &str, params: &ParamList) -> QbResult<()> {
    let markers = count_markers(sql);
    if markers == params.len() {
        return Ok(());
    }
    #[cfg(feature = "tracing")]
    tracing::warn!(
        target: "pgcompose.sql",
        markers,
        param_count = params.len(),
        sql = %truncate_sql_bytes(sql, MAX_LOGGED_SQL),
        "marker count does not match bound values"
    );
    Err(QbError::validation(format!(
        "statement has {markers} `?` markers but {} bound values",
        params.len()
    )))
}

#[cfg(feature = "tracing")]
fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params;
    use std::sync::Mutex;
    use tokio_postgres::types::ToSql;

    /// Records statements instead of running them.
    #[derive(Default)]
    struct RecordingClient {
        seen: Mutex<Vec<(String, usize)>>,
    }

    impl RecordingClient {
        fn seen(&self) -> Vec<(String, usize)> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl GenericClient for RecordingClient {
        async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> QbResult<Vec<Row>> {
            self.seen.lock().unwrap().push((sql.to_string(), params.len()));
            Ok(Vec::new())
        }

        async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> QbResult<u64> {
            self.seen.lock().unwrap().push((sql.to_string(), params.len()));
            Ok(params.len() as u64)
        }
    }

    #[derive(Debug)]
    struct Never;

    impl FromRow for Never {
        fn from_row(_row: &Row) -> QbResult<Self> {
            Err(QbError::decode("never", "not expected to be called"))
        }
    }

    fn users_by_status() -> QueryBuilder {
        let mut qb = QueryBuilder::new();
        qb.from("users").columns(["id"]);
        qb.where_clause()
            .add_field_filter("status", "=", "active")
            .add_in_filter("role", vec!["a", "b"]);
        qb
    }

    #[test]
    fn prepare_rebinds_markers() {
        let (sql, params) = users_by_status().prepare().unwrap();
        assert_eq!(sql, "SELECT id FROM users WHERE status = $1 AND role IN ($2,$3)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn unbalanced_statement_is_rejected() {
        let stmt = BuiltQuery::new("SELECT * FROM t WHERE a = ? AND b = ?", params![1_i32]);
        let err = stmt.prepare().unwrap_err();
        assert!(err.is_validation());
        assert!(stmt.validate().is_err());
    }

    #[test]
    fn unbalanced_expression_is_caught_before_execution() {
        let mut qb = QueryBuilder::new();
        qb.from("t");
        qb.where_clause().add_expression("a = ?", params![]);
        assert!(qb.validate().unwrap_err().is_validation());
    }

    #[test]
    fn literal_question_marks_are_not_markers() {
        let stmt = BuiltQuery::new("SELECT '?' AS q, data ?? 'k' FROM t WHERE id = ?", params![1_i64]);
        let (sql, _) = stmt.prepare().unwrap();
        assert_eq!(sql, "SELECT '?' AS q, data ? 'k' FROM t WHERE id = $1");
    }

    #[cfg(feature = "tracing")]
    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_sql_bytes("SELECT 1", 200), "SELECT 1");
        assert_eq!(truncate_sql_bytes("ééé", 3), "é");
    }

    #[tokio::test]
    async fn query_sends_rebound_sql_and_all_arguments() {
        let client = RecordingClient::default();
        let rows = users_by_status().query(&client).await.unwrap();
        assert!(rows.is_empty());
        assert_eq!(
            client.seen(),
            [(
                "SELECT id FROM users WHERE status = $1 AND role IN ($2,$3)".to_string(),
                3
            )]
        );
    }

    #[tokio::test]
    async fn fetch_one_without_rows_is_not_found() {
        let client = RecordingClient::default();
        let err = users_by_status().fetch_one::<Never>(&client).await.unwrap_err();
        assert!(err.is_not_found());

        let none = users_by_status().fetch_opt::<Never>(&client).await.unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn invalid_statement_never_reaches_client() {
        let client = RecordingClient::default();
        let stmt = BuiltQuery::new("DELETE FROM t WHERE id = ?", ParamList::new());
        assert!(stmt.execute(&client).await.is_err());
        assert!(client.seen().is_empty());
    }

    #[tokio::test]
    async fn execute_passes_arguments() {
        let client = RecordingClient::default();
        let stmt = BuiltQuery::new("UPDATE t SET a = ? WHERE id = ?", params!["x", 1_i64]);
        assert_eq!(stmt.execute(&client).await.unwrap(), 2);
        assert_eq!(client.seen()[0].0, "UPDATE t SET a = $1 WHERE id = $2");
    }
}
