//! Table catalog declared by the host.
//!
//! The host describes its tables once at boot. Plugins inspect these
//! declarations in their pre-requisite checks before activation.

mod column;
mod index;
mod schemas;
mod table_def;
mod types;

pub use column::ColumnDef;
pub use index::IndexDef;
pub use schemas::TableSchemas;
pub use table_def::TableDef;
pub use types::ColumnType;
