//! Database access.
//!
//! [`DatabaseProvider`] is the only way the transfer workflows reach a
//! database; [`ConnectionFactory`] is the only way a provider gets built.

mod clickhouse;
mod error;
mod provider;
mod types;

pub use clickhouse::{ClickHouseConnectionFactory, ClickHouseProvider};
pub use error::{DatabaseError, DatabaseResult};
pub use provider::{ConnectionFactory, DatabaseProvider};
pub use types::{value_to_field, ColumnInfo, Row};
