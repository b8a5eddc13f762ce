//! Resolved column sets.
//!
//! `ColumnSet::View` is a strided window over the table that is never materialized column by
//! column; the pipeline asks it for a routine name and runs the routine to get view
//! descriptors. `ColumnSet::List` is everything else: an ordered list of source references
//! with output names.

use std::fmt;
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use serde_json::json;
use tracing::debug;

use crate::codegen::{CodeGenContext, Routine, ViewRoutine};
use crate::error::{SelectResult, SelectionError};
use crate::selection::ColumnExpr;
use crate::slice::NormalizedSlice;
use crate::table::SharedTable;

/// Source of one output column in an explicit list.
#[derive(Debug, Clone)]
pub enum ColumnRef {
    /// Validated column index.
    Index(usize),
    /// Expression whose columns the pipeline resolves later.
    Expr(Arc<dyn ColumnExpr>),
}

impl PartialEq for ColumnRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ColumnRef::Index(a), ColumnRef::Index(b)) => a == b,
            (ColumnRef::Expr(a), ColumnRef::Expr(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            _ => false,
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Index(i) => write!(f, "#{}", i),
            ColumnRef::Expr(e) => write!(f, "expr({})", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExplicitList {
    entries: Vec<(ColumnRef, String)>,
}

impl ExplicitList {
    pub fn new() -> Self { Self::default() }

    pub fn from_pairs<S: Into<String>>(pairs: Vec<(ColumnRef, S)>) -> Self {
        Self { entries: pairs.into_iter().map(|(r, n)| (r, n.into())).collect() }
    }

    pub fn push(&mut self, r: ColumnRef, name: impl Into<String>) { self.entries.push((r, name.into())); }

    /// Make room for `additional` more entries, failing instead of aborting when the
    /// request cannot be satisfied.
    pub fn try_reserve(&mut self, additional: usize) -> SelectResult<()> {
        self.entries.try_reserve(additional).map_err(|_| SelectionError::TooManyColumns(additional))
    }

    pub fn entries(&self) -> &[(ColumnRef, String)] { &self.entries }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn n_columns(&self) -> usize { self.entries.len() }
    /// Entries that reference an existing column (as opposed to a computed expression).
    pub fn n_view_columns(&self) -> usize {
        self.entries.iter().filter(|(r, _)| matches!(r, ColumnRef::Index(_))).count()
    }
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ { self.entries.iter().map(|(_, n)| n.as_str()) }

    pub fn to_json(&self) -> serde_json::Value {
        let entries: Vec<serde_json::Value> = self.entries.iter().map(|(r, n)| match r {
            ColumnRef::Index(i) => json!({"index": i, "name": n}),
            ColumnRef::Expr(e) => json!({"expr": e.to_string(), "name": n}),
        }).collect();
        json!({"kind": "list", "entries": entries})
    }
}

/// Strided window `start, start+step, ...` (`count` columns) over `table`.
/// `step == 0` repeats column `start` `count` times.
#[derive(Clone)]
pub struct ViewSlice {
    table: SharedTable,
    start: i64,
    count: usize,
    step: i64,
    routine: OnceCell<String>,
}

impl ViewSlice {
    pub fn new(table: SharedTable, start: i64, count: usize, step: i64) -> Self {
        Self { table, start, count, step, routine: OnceCell::new() }
    }

    pub fn from_normalized(table: SharedTable, ns: NormalizedSlice) -> Self {
        Self::new(table, ns.start, ns.count, ns.step)
    }

    pub fn table(&self) -> &SharedTable { &self.table }
    pub fn start(&self) -> i64 { self.start }
    pub fn count(&self) -> usize { self.count }
    pub fn step(&self) -> i64 { self.step }
    pub fn n_columns(&self) -> usize { self.count }
    /// Every column of a view slice is a view column.
    pub fn n_view_columns(&self) -> usize { self.count }

    pub fn source_indices(&self) -> impl Iterator<Item = i64> {
        NormalizedSlice::new(self.start, self.count, self.step).indices()
    }

    /// Output names in selection order, produced lazily: a repeat slice may be far longer than
    /// anything worth materializing.
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        let names = self.table.names();
        self.source_indices()
            .filter_map(move |i| usize::try_from(i).ok().and_then(|i| names.get(i)))
            .map(String::as_str)
    }

    /// Name of the routine that materializes this slice. The first call allocates the name and
    /// registers the routine in `ctx`; later calls return the same name without touching `ctx`.
    pub fn routine_name(&self, ctx: &mut dyn CodeGenContext) -> String {
        self.routine.get_or_init(|| self.emit_routine(ctx)).clone()
    }

    fn emit_routine(&self, ctx: &mut dyn CodeGenContext) -> String {
        let var = ctx.new_unique_name();
        let name = format!("{}{}", ctx.routine_prefix(), var);
        if !ctx.has_function(&name) {
            ctx.add_function(&name, Routine::ViewColumns(self.routine(&name)));
        }
        debug!(target: "colset::codegen", "view routine '{}': start={} count={} step={} source_is_view={}",
            name, self.start, self.count, self.step, self.table.is_view());
        name
    }

    /// Routine body for this slice under `name`.
    pub fn routine(&self, name: &str) -> ViewRoutine {
        ViewRoutine::new(name, self.table.clone(), self.start, self.count, self.step)
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "kind": "view",
            "start": self.start,
            "count": self.count,
            "step": self.step,
            "source_is_view": self.table.is_view(),
        })
    }
}

impl fmt::Debug for ViewSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewSlice")
            .field("start", &self.start)
            .field("count", &self.count)
            .field("step", &self.step)
            .field("routine", &self.routine.get())
            .finish()
    }
}

impl PartialEq for ViewSlice {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.table), Arc::as_ptr(&other.table))
            && self.start == other.start
            && self.count == other.count
            && self.step == other.step
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSet {
    View(ViewSlice),
    List(ExplicitList),
}

impl ColumnSet {
    pub fn kind(&self) -> &'static str {
        match self { ColumnSet::View(_) => "view", ColumnSet::List(_) => "list" }
    }

    pub fn n_columns(&self) -> usize {
        match self { ColumnSet::View(v) => v.n_columns(), ColumnSet::List(l) => l.n_columns() }
    }

    pub fn n_view_columns(&self) -> usize {
        match self { ColumnSet::View(v) => v.n_view_columns(), ColumnSet::List(l) => l.n_view_columns() }
    }

    pub fn column_names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            ColumnSet::View(v) => Box::new(v.column_names()),
            ColumnSet::List(l) => Box::new(l.column_names()),
        }
    }

    /// At most `limit` names joined with ", ", followed by a count of the ones left out.
    pub fn names_preview(&self, limit: usize) -> String {
        let shown: Vec<&str> = self.column_names().take(limit).collect();
        let rest = self.n_columns().saturating_sub(shown.len());
        if rest == 0 { shown.join(", ") } else { format!("{}, ... (+{} more)", shown.join(", "), rest) }
    }

    pub fn as_view(&self) -> Option<&ViewSlice> {
        match self { ColumnSet::View(v) => Some(v), ColumnSet::List(_) => None }
    }

    pub fn as_list(&self) -> Option<&ExplicitList> {
        match self { ColumnSet::List(l) => Some(l), ColumnSet::View(_) => None }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self { ColumnSet::View(v) => v.to_json(), ColumnSet::List(l) => l.to_json() }
    }
}
