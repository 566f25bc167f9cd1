//! # flatbridge
//!
//! Moves data between ClickHouse and delimited flat files.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────┐        ┌──────────────────────────┐
//! │  tables + columns (+join)│        │   uploaded CSV / TSV     │
//! └──────────────────────────┘        └──────────────────────────┘
//!              │                                   │
//!              ▼ [transfer::alias]                 ▼ [flatfile::parser]
//! ┌──────────────────────────┐        ┌──────────────────────────┐
//! │    ResolvedSelection     │        │  ParsedTable + Projection│
//! └──────────────────────────┘        └──────────────────────────┘
//!              │                                   │
//!              ▼ [transfer::builder]               ▼ [flatfile::infer]
//! ┌──────────────────────────┐        ┌──────────────────────────┐
//! │  SELECT ... JOIN ... LIMIT│       │ CREATE TABLE + INSERT    │
//! └──────────────────────────┘        └──────────────────────────┘
//!              │                                   │
//!              ▼ [database]                        ▼ [database]
//! ┌──────────────────────────┐        ┌──────────────────────────┐
//! │ preview rows / CSV export│        │    rows in ClickHouse    │
//! └──────────────────────────┘        └──────────────────────────┘
//! ```
//!
//! [`transfer::Orchestrator`] sequences each workflow. The `server`
//! feature adds an HTTP surface in [`web`].

pub mod config;
pub mod database;
pub mod flatfile;
pub mod sql;
pub mod transfer;

#[cfg(feature = "server")]
pub mod web;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::{ConnectionConfig, Settings};
    pub use crate::database::{ConnectionFactory, DatabaseProvider};
    pub use crate::flatfile::{Delimiter, InferredSchema, ParsedTable};
    pub use crate::sql::{Dialect, Query};
    pub use crate::transfer::{
        ColumnRef, FileFormat, ImportRequest, Orchestrator, Selection, TransferError,
        TransferOptions,
    };
}

pub use sql::Dialect;
pub use transfer::{Orchestrator, TransferError, TransferResult};
