//! Selection resolution: `Selection` + table -> `ColumnSet`.
//!
//! Rules:
//! - `...` selects every column as a view.
//! - A lone slice (bare, or the only element of a list) becomes a view; the same slice next to
//!   other elements is expanded into explicit entries.
//! - Any list with more than one element is an explicit list, even when it happens to be
//!   contiguous. Duplicates and order are kept as given.
//! - A function spec is called once with the table and its result is resolved with functions
//!   disallowed, so a function returning a function is rejected.

use tracing::debug;

use crate::columnset::{ColumnRef, ColumnSet, ExplicitList, ViewSlice};
use crate::error::{SelectResult, SelectionError};
use crate::selection::{Selection, TableExpr};
use crate::slice::normalize;
use crate::table::SharedTable;

pub fn resolve(spec: &Selection, table: &SharedTable) -> SelectResult<ColumnSet> {
    let res = resolve_with(spec, table, true);
    match &res {
        Ok(cs) => debug!(target: "colset::resolve", "resolved {} selection {} into {} of {} columns",
            spec.kind(), spec, cs.kind(), cs.n_columns()),
        Err(e) => debug!(target: "colset::resolve", "selection {} rejected: {}", spec, e),
    }
    res
}

/// `allow_nested` gates whether a `Selection::Func` may be invoked.
pub fn resolve_with(spec: &Selection, table: &SharedTable, allow_nested: bool) -> SelectResult<ColumnSet> {
    match spec {
        Selection::All => Ok(ColumnSet::View(ViewSlice::new(table.clone(), 0, table.ncols(), 1))),
        Selection::Index(_) | Selection::Name(_) | Selection::Slice(_) | Selection::Expr(_) => {
            resolve_sequence(std::slice::from_ref(spec), table)
        }
        Selection::List(items) => resolve_sequence(items, table),
        Selection::Func(f) if allow_nested => {
            let produced = f.call(&TableExpr::new(table.as_ref()));
            debug!(target: "colset::resolve", "selection function produced {}", produced);
            resolve_with(&produced, table, false)
        }
        other => Err(SelectionError::UnknownArgument(other.to_string())),
    }
}

fn resolve_sequence(items: &[Selection], table: &SharedTable) -> SelectResult<ColumnSet> {
    let ncols = table.ncols();
    let names = table.names();
    let mut out = ExplicitList::new();
    for item in items {
        match item {
            Selection::Index(i) => {
                let idx = if *i < 0 { *i + ncols as i64 } else { *i };
                if idx < 0 || idx >= ncols as i64 {
                    return Err(SelectionError::IndexOutOfRange { ncols, index: *i });
                }
                out.push(ColumnRef::Index(idx as usize), names[idx as usize].clone());
            }
            Selection::Name(s) => {
                let idx = table.column_index(s).ok_or_else(|| SelectionError::ColumnNotFound(s.clone()))?;
                out.push(ColumnRef::Index(idx), s.clone());
            }
            Selection::Slice(sl) => {
                let ns = normalize(sl, table.as_ref())?;
                if items.len() == 1 {
                    return Ok(ColumnSet::View(ViewSlice::from_normalized(table.clone(), ns)));
                }
                out.try_reserve(ns.count)?;
                for j in ns.indices() {
                    out.push(ColumnRef::Index(j as usize), names[j as usize].clone());
                }
            }
            Selection::Expr(e) => out.push(ColumnRef::Expr(e.clone()), e.to_string()),
            other => return Err(SelectionError::UnknownArgument(other.to_string())),
        }
    }
    Ok(ColumnSet::List(out))
}
