//! Table capability consumed by the resolver, plus `DataTable`, an in-memory implementation
//! that can be built from a polars `DataFrame` or as a view over another `DataTable`.
//!
//! A view table never points at another view: `DataTable::view` flattens chains so that every
//! view descriptor indexes straight into the owning table's column array.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use polars::prelude::{DataFrame, DataType};
use serde::{Deserialize, Serialize};

use crate::error::{SelectResult, SelectionError};

/// Physical storage type tag of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    Void,
    Bool,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Str32,
    Str64,
    Obj,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageType::Void => "void",
            StorageType::Bool => "bool",
            StorageType::I8 => "i8",
            StorageType::I16 => "i16",
            StorageType::I32 => "i32",
            StorageType::I64 => "i64",
            StorageType::F32 => "f32",
            StorageType::F64 => "f64",
            StorageType::Str32 => "str32",
            StorageType::Str64 => "str64",
            StorageType::Obj => "obj",
        }
    }

    /// Accepts the `as_str` spellings plus a few common aliases (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        let t = s.trim().to_ascii_lowercase();
        Some(match t.as_str() {
            "void" | "null" => StorageType::Void,
            "bool" | "boolean" => StorageType::Bool,
            "i8" | "int8" => StorageType::I8,
            "i16" | "int16" => StorageType::I16,
            "i32" | "int32" => StorageType::I32,
            "i64" | "int64" | "int" => StorageType::I64,
            "f32" | "float32" => StorageType::F32,
            "f64" | "float64" | "float" => StorageType::F64,
            "str32" | "str" | "string" => StorageType::Str32,
            "str64" => StorageType::Str64,
            "obj" | "object" => StorageType::Obj,
            _ => return None,
        })
    }

    pub fn from_dtype(dt: &DataType) -> Self {
        match dt {
            DataType::Null => StorageType::Void,
            DataType::Boolean => StorageType::Bool,
            DataType::Int8 => StorageType::I8,
            DataType::Int16 | DataType::UInt8 => StorageType::I16,
            DataType::Int32 | DataType::UInt16 => StorageType::I32,
            DataType::Int64 | DataType::UInt32 => StorageType::I64,
            DataType::Float32 => StorageType::F32,
            DataType::Float64 => StorageType::F64,
            DataType::String => StorageType::Str32,
            _ => StorageType::Obj,
        }
    }
}

/// Whether a column owns its data or borrows another table's column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Storage {
    Owned,
    View { src_index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub stype: StorageType,
    pub storage: Storage,
}

impl ColumnDescriptor {
    pub fn owned(stype: StorageType) -> Self { Self { stype, storage: Storage::Owned } }
    pub fn view(src_index: usize, stype: StorageType) -> Self { Self { stype, storage: Storage::View { src_index } } }
    pub fn is_view(&self) -> bool { matches!(self.storage, Storage::View { .. }) }
    pub fn src_index(&self) -> Option<usize> {
        match self.storage { Storage::View { src_index } => Some(src_index), Storage::Owned => None }
    }
}

/// What the resolver and the view routines need to know about a table.
pub trait Table: Debug + Send + Sync {
    fn ncols(&self) -> usize { self.names().len() }
    /// Column names in column order; length is `ncols()`.
    fn names(&self) -> &[String];
    fn column_index(&self, name: &str) -> Option<usize>;
    fn is_view(&self) -> bool;
    /// The table's own descriptors (view descriptors when `is_view()`).
    fn columns(&self) -> &[ColumnDescriptor];
    /// The array the data actually lives in: the table's own columns, or its source's columns
    /// when the table is a view.
    fn physical_columns(&self) -> &[ColumnDescriptor];
}

pub type SharedTable = Arc<dyn Table>;

#[derive(Debug, Clone)]
pub struct DataTable {
    names: Vec<String>,
    index: HashMap<String, usize>,
    columns: Vec<ColumnDescriptor>,
    source: Option<Arc<DataTable>>,
}

fn build_index(names: &[String]) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(names.len());
    // first occurrence wins on duplicate names
    for (i, n) in names.iter().enumerate() { index.entry(n.clone()).or_insert(i); }
    index
}

impl DataTable {
    pub fn new<S: Into<String>>(cols: Vec<(S, StorageType)>) -> Self {
        let mut names = Vec::with_capacity(cols.len());
        let mut columns = Vec::with_capacity(cols.len());
        for (n, st) in cols {
            names.push(n.into());
            columns.push(ColumnDescriptor::owned(st));
        }
        let index = build_index(&names);
        Self { names, index, columns, source: None }
    }

    /// Owned table of `i64` columns with the given names.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(names.iter().map(|n| (n.as_ref().to_string(), StorageType::I64)).collect())
    }

    pub fn from_frame(df: &DataFrame) -> Self {
        Self::new(
            df.get_columns()
                .iter()
                .map(|c| (c.name().as_str().to_string(), StorageType::from_dtype(c.dtype())))
                .collect(),
        )
    }

    /// View over `indices` of `source`. When `source` is itself a view the new descriptors point
    /// into `source`'s own source, so the result is never a view of a view.
    pub fn view(source: &Arc<DataTable>, indices: &[usize]) -> SelectResult<Self> {
        let base = match &source.source { Some(s) => s.clone(), None => source.clone() };
        let mut names = Vec::with_capacity(indices.len());
        let mut columns = Vec::with_capacity(indices.len());
        for &i in indices {
            let col = source.columns.get(i).ok_or(SelectionError::IndexOutOfRange {
                ncols: source.ncols(),
                index: i as i64,
            })?;
            let src_index = col.src_index().unwrap_or(i);
            columns.push(ColumnDescriptor::view(src_index, col.stype));
            names.push(source.names[i].clone());
        }
        let index = build_index(&names);
        Ok(Self { names, index, columns, source: Some(base) })
    }

    pub fn source(&self) -> Option<&Arc<DataTable>> { self.source.as_ref() }

    pub fn into_shared(self) -> SharedTable { Arc::new(self) }
}

impl Table for DataTable {
    fn names(&self) -> &[String] { &self.names }
    fn column_index(&self, name: &str) -> Option<usize> { self.index.get(name).copied() }
    fn is_view(&self) -> bool { self.source.is_some() }
    fn columns(&self) -> &[ColumnDescriptor] { &self.columns }
    fn physical_columns(&self) -> &[ColumnDescriptor] {
        match &self.source { Some(s) => &s.columns, None => &self.columns }
    }
}
