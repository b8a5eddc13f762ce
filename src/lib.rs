//! Column-selection resolution for a column-oriented table engine.
//!
//! `resolve` turns a `Selection` into a `ColumnSet`: either a strided `ViewSlice` whose columns
//! are produced by a routine registered in a `CodeGenContext`, or an `ExplicitList` of
//! `(source, name)` entries.

pub mod error;
pub mod config;
pub mod table;
pub mod selection;
pub mod slice;
pub mod columnset;
pub mod codegen;
pub mod resolve;
pub mod explain;

pub use codegen::{CodeGenContext, Routine, UnitContext, ViewColumns, ViewRoutine};
pub use columnset::{ColumnRef, ColumnSet, ExplicitList, ViewSlice};
pub use error::{MaterializeError, SelectResult, SelectionError};
pub use resolve::{resolve, resolve_with};
pub use selection::{ColumnExpr, SelectFn, Selection, SliceBound, SliceSpec, TableExpr};
pub use slice::{normalize, normalize_numeric, NormalizedSlice};
pub use table::{ColumnDescriptor, DataTable, SharedTable, Storage, StorageType, Table};
