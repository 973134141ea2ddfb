//! Dictionary table: typed code/label pairs grouped by `type`.

use crate::builder::QueryBuilder;
use crate::client::GenericClient;
use crate::error::QbResult;
use crate::exec::Executable;
use crate::model::{Model, ModelColumn};
use crate::param::Param;
use crate::params;
use crate::row::{FromRow, RowExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS dictionary
(
  id         INT PRIMARY KEY                                 NOT NULL,
  type       TEXT                                            NOT NULL,
  code       TEXT                                            NOT NULL,
  label      TEXT,
  created_at TIMESTAMP WITH TIME ZONE DEFAULT localtimestamp NOT NULL,
  updated_at TIMESTAMP WITH TIME ZONE,
  deleted_at TIMESTAMP WITH TIME ZONE
)";

const CREATE_INDEX_SQL: &str =
    "CREATE INDEX IF NOT EXISTS dictionary_type_idx ON dictionary (type)";

/// One dictionary entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryModel {
    pub id: i32,
    pub r#type: String,
    pub code: String,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Model for DictionaryModel {
    const TABLE: &'static str = "public.dictionary";
    const COLUMNS: &'static [ModelColumn] = &[
        ModelColumn::new("id", "id"),
        ModelColumn::new("type", "type"),
        ModelColumn::new("code", "code"),
        ModelColumn::new("label", "label"),
        ModelColumn::new("created_at", "created_at"),
        ModelColumn::new("updated_at", "updated_at"),
        ModelColumn::new("deleted_at", "deleted_at"),
    ];

    fn values(&self) -> Vec<Param> {
        params![
            self.id,
            self.r#type.clone(),
            self.code.clone(),
            self.label.clone(),
            self.created_at,
            self.updated_at,
            self.deleted_at,
        ]
    }
}

impl FromRow for DictionaryModel {
    fn from_row(row: &Row) -> QbResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            r#type: row.try_get_column("type")?,
            code: row.try_get_column("code")?,
            label: row.try_get_column("label")?,
            created_at: row.try_get_column("created_at")?,
            updated_at: row.try_get_column("updated_at")?,
            deleted_at: row.try_get_column("deleted_at")?,
        })
    }
}

impl DictionaryModel {
    /// Every entry, ordered by type, creation time and id.
    pub fn search_query() -> QueryBuilder {
        let mut qb = QueryBuilder::new();
        qb.from(Self::TABLE)
            .columns(Self::column_names())
            .add_order("type", "ASC")
            .add_order("created_at", "ASC")
            .add_order("id", "ASC");
        qb
    }

    /// Load every entry, returning the rows and their ids in the same order.
    pub async fn search(conn: &impl GenericClient) -> QbResult<(Vec<Self>, Vec<i32>)> {
        let rows: Vec<Self> = Self::search_query().fetch_all(conn).await?;
        let ids = rows.iter().map(|r| r.id).collect();
        Ok((rows, ids))
    }

    /// Create the dictionary table and its type index when missing.
    pub async fn create_table(conn: &impl GenericClient) -> QbResult<()> {
        conn.execute(CREATE_TABLE_SQL, &[]).await?;
        conn.execute(CREATE_INDEX_SQL, &[]).await?;
        Ok(())
    }
}
