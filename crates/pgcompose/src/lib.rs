//! # pgcompose
//!
//! Parameterized SQL composition for PostgreSQL.
//!
//! ## Features
//!
//! - **Composable predicates**: `Expression` → `Condition` → nested AND/OR groups
//! - **Structured SELECTs**: columns, FROM, joins, WHERE, CTEs, UNION/INTERSECT/EXCEPT, sub-queries
//! - **Aligned arguments**: rendering emits text and bound values in one pass, so
//!   the argument list always matches the `?` markers, however deep the nesting
//! - **Checked execution**: marker/argument mismatches are rejected before the
//!   statement reaches the database, then `?` is rebound to `$n`
//! - **Transaction-friendly**: run against any `GenericClient` (client, transaction, pooled client)
//!
//! ## Example
//!
//! ```ignore
//! use pgcompose::{Executable, QueryBuilder};
//!
//! let mut recent = QueryBuilder::new();
//! recent.from("orders").columns(["user_id"]);
//! recent.where_clause().add_field_filter("created_at", ">", since);
//!
//! let mut qb = QueryBuilder::new();
//! qb.with("recent", recent)
//!     .from("users u")
//!     .columns(["u.id", "u.name"])
//!     .relate("JOIN recent r ON r.user_id = u.id")
//!     .add_order("u.name", "ASC")
//!     .set_pagination(20, 0);
//! qb.where_clause().add_in_filter("u.status", vec!["active", "trial"]);
//!
//! let users = qb.fetch_all::<User>(&client).await?;
//! ```

pub mod builder;
pub mod client;
pub mod condition;
pub mod dictionary;
pub mod error;
pub mod exec;
pub mod expr;
pub mod filter;
pub mod model;
pub mod ordering;
pub mod param;
pub mod rebind;
pub mod row;

pub use builder::{QueryBuilder, SetOperator};
pub use client::GenericClient;
pub use condition::{Condition, ConditionOperator, OptionalCondition};
pub use dictionary::DictionaryModel;
pub use error::{QbError, QbResult};
pub use exec::{BuiltQuery, Executable};
pub use expr::Expression;
pub use filter::{DEFAULT_LIMIT, Filter};
pub use model::{
    Model, ModelColumn, delete_query, insert_query, model_column, model_columns, model_values,
    update_query,
};
pub use ordering::{OrderBy, Pagination};
pub use param::{Param, ParamList};
pub use rebind::{count_markers, rebind};
pub use row::{FromRow, RowExt};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{PoolConfig, create_pool, create_pool_with_config, create_pool_with_tls};
