//! Per-unit code generation context and the routines registered in it.
//!
//! A `CodeGenContext` hands out unique names and keeps one routine per name. It is mutable
//! state owned by a single compilation unit: mutation goes through `&mut self`, so sharing one
//! context between threads needs external locking, and independent units should each use
//! their own `UnitContext`.

use std::collections::HashMap;

use tracing::debug;

use crate::config::{ColsetConfig, DEFAULT_ROUTINE_PREFIX};
use crate::error::MaterializeError;
use crate::table::{ColumnDescriptor, SharedTable};

pub trait CodeGenContext {
    fn new_unique_name(&mut self) -> String;
    fn has_function(&self, name: &str) -> bool;
    /// Register `body` under `name`. Registering a name that is already present is a no-op.
    fn add_function(&mut self, name: &str, body: Routine);
    fn function(&self, name: &str) -> Option<&Routine>;
    fn routine_prefix(&self) -> &str { DEFAULT_ROUTINE_PREFIX }
}

/// A routine emitted into a context.
#[derive(Debug, Clone)]
pub enum Routine {
    ViewColumns(ViewRoutine),
}

impl Routine {
    pub fn name(&self) -> &str {
        match self { Routine::ViewColumns(r) => r.name() }
    }

    pub fn call(&self) -> Result<ViewColumns, MaterializeError> {
        match self { Routine::ViewColumns(r) => r.call() }
    }

    /// Human readable listing of what the routine does.
    pub fn listing(&self) -> String {
        match self { Routine::ViewColumns(r) => r.listing() }
    }
}

/// Builds `count` view descriptors selecting `start, start+step, ...` of a table.
#[derive(Debug, Clone)]
pub struct ViewRoutine {
    name: String,
    table: SharedTable,
    start: i64,
    count: usize,
    step: i64,
}

impl ViewRoutine {
    pub fn new(name: impl Into<String>, table: SharedTable, start: i64, count: usize, step: i64) -> Self {
        Self { name: name.into(), table, start, count, step }
    }

    pub fn name(&self) -> &str { &self.name }

    /// Allocate and fill the descriptor array. On success the caller owns every descriptor;
    /// on failure nothing partial escapes.
    pub fn call(&self) -> Result<ViewColumns, MaterializeError> {
        let mut cols: Vec<ColumnDescriptor> = Vec::new();
        cols.try_reserve_exact(self.count).map_err(|_| MaterializeError::Alloc(self.count))?;
        let own = self.table.columns();
        let srccols = self.table.physical_columns();
        let mut j = self.start;
        for _ in 0..self.count {
            let col = usize::try_from(j)
                .ok()
                .and_then(|i| own.get(i).map(|c| (i, c)))
                .ok_or(MaterializeError::SourceOutOfBounds { index: j, ncols: own.len() })?;
            let k = if self.table.is_view() {
                col.1.src_index().ok_or(MaterializeError::MissingSource(col.0))?
            } else {
                col.0
            };
            let src = srccols
                .get(k)
                .ok_or(MaterializeError::SourceOutOfBounds { index: k as i64, ncols: srccols.len() })?;
            if src.is_view() {
                return Err(MaterializeError::NestedView(k));
            }
            cols.push(ColumnDescriptor::view(k, src.stype));
            // past the last column j may leave i64; saturating keeps it out of bounds
            j = j.saturating_add(self.step);
        }
        Ok(ViewColumns { columns: cols.into_boxed_slice() })
    }

    pub fn listing(&self) -> String {
        let srccols = if self.table.is_view() { "table.source.columns" } else { "table.columns" };
        let mut out = String::new();
        out.push_str(&format!("fn {}() -> ViewColumns {{\n", self.name));
        out.push_str(&format!("    cols = alloc({}) else fail\n", self.count));
        out.push_str(&format!("    srccols = {}\n", srccols));
        out.push_str(&format!("    j = {}\n", self.start));
        out.push_str(&format!("    repeat {}: cols.push(view(srccols, j)); j += {}\n", self.count, self.step));
        out.push_str("    return cols\n}\n");
        out
    }
}

/// Owned result of a view routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewColumns {
    columns: Box<[ColumnDescriptor]>,
}

impl ViewColumns {
    pub fn len(&self) -> usize { self.columns.len() }
    pub fn is_empty(&self) -> bool { self.columns.is_empty() }
    pub fn as_slice(&self) -> &[ColumnDescriptor] { &self.columns }
    pub fn iter(&self) -> std::slice::Iter<'_, ColumnDescriptor> { self.columns.iter() }
    pub fn into_vec(self) -> Vec<ColumnDescriptor> { self.columns.into_vec() }
}

/// In-memory context for one evaluation unit.
#[derive(Debug)]
pub struct UnitContext {
    var_prefix: String,
    routine_prefix: String,
    counter: usize,
    functions: Vec<Routine>,
    by_name: HashMap<String, usize>,
}

impl Default for UnitContext {
    fn default() -> Self { Self::from_config(&ColsetConfig::default()) }
}

impl UnitContext {
    pub fn new() -> Self { Self::default() }

    pub fn from_config(cfg: &ColsetConfig) -> Self {
        Self {
            var_prefix: cfg.var_prefix.clone(),
            routine_prefix: cfg.routine_prefix.clone(),
            counter: 0,
            functions: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Registered routines in registration order.
    pub fn functions(&self) -> &[Routine] { &self.functions }
    pub fn len(&self) -> usize { self.functions.len() }
    pub fn is_empty(&self) -> bool { self.functions.is_empty() }
}

impl CodeGenContext for UnitContext {
    fn new_unique_name(&mut self) -> String {
        self.counter += 1;
        format!("{}{}", self.var_prefix, self.counter)
    }

    fn has_function(&self, name: &str) -> bool { self.by_name.contains_key(name) }

    fn add_function(&mut self, name: &str, body: Routine) {
        if self.by_name.contains_key(name) {
            debug!(target: "colset::codegen", "routine '{}' already registered; keeping existing body", name);
            return;
        }
        debug!(target: "colset::codegen", "registering routine '{}'", name);
        self.by_name.insert(name.to_string(), self.functions.len());
        self.functions.push(body);
    }

    fn function(&self, name: &str) -> Option<&Routine> {
        self.by_name.get(name).and_then(|&i| self.functions.get(i))
    }

    fn routine_prefix(&self) -> &str { &self.routine_prefix }
}
