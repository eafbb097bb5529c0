//! Keyward Schema - declarative models, structural validation, and table catalogs.
//!
//! Every plugin declares the shape of the configuration it accepts as a
//! [`Model`]; the host validates configuration and request data against it
//! before the plugin is allowed to attach to the pipeline. The host's own
//! table declarations are normalized into [`TableSchemas`] so plugins can
//! check their storage prerequisites at boot.

pub mod error;
pub mod model;
pub mod table;
pub mod validator;
pub mod value;

pub use error::{Expected, ModelError, TableSchemaError, ValidationError};
pub use model::{Model, ObjectModel, PrimitiveTag};
pub use table::{ColumnDef, ColumnType, IndexDef, TableDef, TableSchemas};
pub use validator::{format_model, validate};
pub use value::{Callable, Map, Value};
