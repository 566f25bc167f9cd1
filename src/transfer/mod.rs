//! ClickHouse to flat-file transfers and back.
//!
//! - [`alias`] - output names for selected columns
//! - [`selection`] - validated selections and join plans
//! - [`builder`] - SELECT, CREATE TABLE and INSERT statements
//! - [`orchestrator`] - the discovery, preview, export and import workflows
//! - [`upload`] - temporary uploaded files

pub mod alias;
pub mod builder;
pub mod error;
pub mod orchestrator;
pub mod selection;
pub mod upload;

pub use alias::{resolve_aliases, AliasedColumn, ColumnRef};
pub use builder::{build_create_table, build_insert, build_select};
pub use error::{Stage, TransferError, TransferResult};
pub use orchestrator::{
    ExportResult, FileFormat, ImportRequest, ImportResult, Orchestrator, PreviewResult,
    TransferOptions,
};
pub use selection::{JoinPlan, JoinSpec, JoinStep, ResolvedSelection, Selection};
pub use upload::TempUpload;
