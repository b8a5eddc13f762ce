//! Selection specs: what a caller may pass as the column selector of a table query.
//!
//! A spec is either built directly (`Selection::from(..)`, `SliceSpec::range`, ...), parsed
//! from a small text syntax (`Selection::parse`) or decoded from JSON (`Selection::from_json`).

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{SelectResult, SelectionError};
use crate::table::Table;

/// Opaque expression handle. The resolver only needs its display form, which becomes the
/// output column name; evaluating it is the pipeline's business.
pub trait ColumnExpr: fmt::Display + fmt::Debug + Send + Sync {}

/// One endpoint of a slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SliceBound {
    Index(i64),
    Name(String),
}

impl fmt::Display for SliceBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SliceBound::Index(i) => write!(f, "{}", i),
            SliceBound::Name(n) => write!(f, "{:?}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SliceSpec {
    pub start: Option<SliceBound>,
    pub stop: Option<SliceBound>,
    pub step: Option<i64>,
}

impl SliceSpec {
    pub fn new(start: Option<SliceBound>, stop: Option<SliceBound>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }

    /// Numeric slice `start:stop:step`.
    pub fn range(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start: start.map(SliceBound::Index), stop: stop.map(SliceBound::Index), step }
    }

    /// Name-bounded slice; both endpoints are inclusive.
    pub fn names(start: Option<&str>, stop: Option<&str>) -> Self {
        Self {
            start: start.map(|s| SliceBound::Name(s.to_string())),
            stop: stop.map(|s| SliceBound::Name(s.to_string())),
            step: None,
        }
    }

    pub fn is_name_slice(&self) -> bool {
        matches!(self.start, Some(SliceBound::Name(_))) || matches!(self.stop, Some(SliceBound::Name(_)))
    }
}

impl fmt::Display for SliceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = |x: &Option<SliceBound>| x.as_ref().map(|v| v.to_string()).unwrap_or_default();
        write!(f, "[{}:{}", b(&self.start), b(&self.stop))?;
        if let Some(s) = self.step { write!(f, ":{}", s)?; }
        write!(f, "]")
    }
}

/// Read-only handle a `SelectFn` receives; builds selections against the table it wraps.
#[derive(Debug, Clone, Copy)]
pub struct TableExpr<'a> {
    table: &'a dyn Table,
}

impl<'a> TableExpr<'a> {
    pub fn new(table: &'a dyn Table) -> Self { Self { table } }
    pub fn table(&self) -> &'a dyn Table { self.table }
    pub fn ncols(&self) -> usize { self.table.ncols() }
    pub fn names(&self) -> &'a [String] { self.table.names() }
    pub fn col(&self, name: &str) -> Selection { Selection::Name(name.to_string()) }
    pub fn col_at(&self, index: i64) -> Selection { Selection::Index(index) }
    pub fn all(&self) -> Selection { Selection::All }
}

type SelectFnInner = dyn for<'a> Fn(&TableExpr<'a>) -> Selection + Send + Sync;

/// Deferred selection computed from the table it is applied to.
#[derive(Clone)]
pub struct SelectFn(Arc<SelectFnInner>);

impl SelectFn {
    pub fn new<F>(f: F) -> Self
    where
        F: for<'a> Fn(&TableExpr<'a>) -> Selection + Send + Sync + 'static,
    {
        SelectFn(Arc::new(f))
    }

    pub fn call(&self, t: &TableExpr<'_>) -> Selection { (self.0)(t) }
}

impl fmt::Debug for SelectFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "SelectFn(..)") }
}

#[derive(Debug, Clone)]
pub enum Selection {
    /// Every column (`...`).
    All,
    Index(i64),
    Name(String),
    Slice(SliceSpec),
    Expr(Arc<dyn ColumnExpr>),
    List(Vec<Selection>),
    Func(SelectFn),
}

impl Selection {
    pub fn expr<E: ColumnExpr + 'static>(e: E) -> Self { Selection::Expr(Arc::new(e)) }

    pub fn func<F>(f: F) -> Self
    where
        F: for<'a> Fn(&TableExpr<'a>) -> Selection + Send + Sync + 'static,
    {
        Selection::Func(SelectFn::new(f))
    }

    /// Short label of the selection shape, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Selection::All => "all",
            Selection::Index(_) => "index",
            Selection::Name(_) => "name",
            Selection::Slice(s) if s.is_name_slice() => "name_slice",
            Selection::Slice(_) => "slice",
            Selection::Expr(_) => "expr",
            Selection::List(_) => "list",
            Selection::Func(_) => "func",
        }
    }

    /// Decode a JSON selection:
    /// `null`/`"..."` -> all, integer -> index, string -> name, array -> list,
    /// `{"start", "stop", "step"}` -> slice.
    pub fn from_json(v: &Value) -> SelectResult<Selection> {
        match v {
            Value::Null => Ok(Selection::All),
            Value::String(s) if s == "..." => Ok(Selection::All),
            Value::String(s) => Ok(Selection::Name(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .map(Selection::Index)
                .ok_or_else(|| SelectionError::UnknownArgument(n.to_string())),
            Value::Array(items) => Ok(Selection::List(items.iter().map(Selection::from_json).collect::<SelectResult<Vec<_>>>()?)),
            Value::Object(map) => {
                if map.is_empty() || map.keys().any(|k| !matches!(k.as_str(), "start" | "stop" | "step")) {
                    return Err(SelectionError::UnknownArgument(v.to_string()));
                }
                let bound = |key: &str| -> SelectResult<Option<SliceBound>> {
                    match map.get(key) {
                        None | Some(Value::Null) => Ok(None),
                        Some(Value::String(s)) => Ok(Some(SliceBound::Name(s.clone()))),
                        Some(Value::Number(n)) => n
                            .as_i64()
                            .map(|i| Some(SliceBound::Index(i)))
                            .ok_or_else(|| SelectionError::NonInteger(v.to_string())),
                        Some(_) => Err(SelectionError::NonInteger(v.to_string())),
                    }
                };
                let step = match map.get("step") {
                    None | Some(Value::Null) => None,
                    Some(s) => Some(s.as_i64().ok_or_else(|| SelectionError::NonInteger(v.to_string()))?),
                };
                Ok(Selection::Slice(SliceSpec::new(bound("start")?, bound("stop")?, step)))
            }
            Value::Bool(_) => Err(SelectionError::UnknownArgument(v.to_string())),
        }
    }

    /// Parse the comma-separated text form, e.g. `A,2,-1`, `B:D`, `::2`, `...`.
    /// A single item parses to a scalar selection, several to a list.
    pub fn parse(text: &str) -> SelectResult<Selection> {
        let items: Vec<&str> = text.split(',').map(|s| s.trim()).collect();
        if items.iter().any(|s| s.is_empty()) {
            return Err(SelectionError::UnknownArgument(text.to_string()));
        }
        let mut out = items.into_iter().map(parse_item).collect::<SelectResult<Vec<_>>>()?;
        if out.len() == 1 { Ok(out.remove(0)) } else { Ok(Selection::List(out)) }
    }
}

static SLICE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^:]*):([^:]*)(?::([^:]*))?$").expect("slice regex"));

fn parse_item(item: &str) -> SelectResult<Selection> {
    if item == "..." { return Ok(Selection::All); }
    if let Ok(i) = item.parse::<i64>() { return Ok(Selection::Index(i)); }
    if item.contains(':') {
        let caps = SLICE_RE.captures(item).ok_or_else(|| SelectionError::UnknownArgument(item.to_string()))?;
        let bound = |idx: usize| -> SelectResult<Option<SliceBound>> {
            let s = caps.get(idx).map(|m| m.as_str().trim()).unwrap_or("");
            if s.is_empty() { return Ok(None); }
            if let Ok(i) = s.parse::<i64>() { return Ok(Some(SliceBound::Index(i))); }
            if s.parse::<f64>().is_ok() { return Err(SelectionError::NonInteger(item.to_string())); }
            Ok(Some(SliceBound::Name(unquote(s))))
        };
        let step = match caps.get(3).map(|m| m.as_str().trim()).filter(|s| !s.is_empty()) {
            None => None,
            Some(s) => Some(s.parse::<i64>().map_err(|_| SelectionError::NonInteger(item.to_string()))?),
        };
        return Ok(Selection::Slice(SliceSpec::new(bound(1)?, bound(2)?, step)));
    }
    if item.parse::<f64>().is_ok() {
        return Err(SelectionError::UnknownArgument(item.to_string()));
    }
    Ok(Selection::Name(unquote(item)))
}

fn unquote(s: &str) -> String {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') { s[1..s.len() - 1].to_string() } else { s.to_string() }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => write!(f, "..."),
            Selection::Index(i) => write!(f, "{}", i),
            Selection::Name(n) => write!(f, "{:?}", n),
            Selection::Slice(s) => write!(f, "{}", s),
            Selection::Expr(e) => write!(f, "{}", e),
            Selection::List(items) => {
                write!(f, "[")?;
                for (i, it) in items.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", it)?;
                }
                write!(f, "]")
            }
            Selection::Func(_) => write!(f, "<function>"),
        }
    }
}

impl From<i64> for Selection {
    fn from(i: i64) -> Self { Selection::Index(i) }
}

impl From<&str> for Selection {
    fn from(s: &str) -> Self { Selection::Name(s.to_string()) }
}

impl From<String> for Selection {
    fn from(s: String) -> Self { Selection::Name(s) }
}

impl From<SliceSpec> for Selection {
    fn from(s: SliceSpec) -> Self { Selection::Slice(s) }
}

impl<T: Into<Selection>> From<Vec<T>> for Selection {
    fn from(v: Vec<T>) -> Self { Selection::List(v.into_iter().map(Into::into).collect()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_scalars_and_lists() {
        assert!(matches!(Selection::parse("...").unwrap(), Selection::All));
        assert!(matches!(Selection::parse("-1").unwrap(), Selection::Index(-1)));
        assert!(matches!(Selection::parse("A").unwrap(), Selection::Name(ref n) if n == "A"));
        match Selection::parse("A, 2 ,\"x y\"").unwrap() {
            Selection::List(items) => {
                assert_eq!(items.len(), 3);
                assert!(matches!(items[1], Selection::Index(2)));
                assert!(matches!(items[2], Selection::Name(ref n) if n == "x y"));
            }
            other => panic!("expected list, got {}", other),
        }
    }

    #[test]
    fn parse_slices() {
        match Selection::parse("::2").unwrap() {
            Selection::Slice(s) => assert_eq!(s, SliceSpec::range(None, None, Some(2))),
            other => panic!("expected slice, got {}", other),
        }
        match Selection::parse("B:D").unwrap() {
            Selection::Slice(s) => {
                assert!(s.is_name_slice());
                assert_eq!(s, SliceSpec::names(Some("B"), Some("D")));
            }
            other => panic!("expected slice, got {}", other),
        }
        match Selection::parse("-3:").unwrap() {
            Selection::Slice(s) => assert_eq!(s, SliceSpec::range(Some(-3), None, None)),
            other => panic!("expected slice, got {}", other),
        }
    }

    #[test]
    fn parse_rejects_non_integers() {
        assert!(matches!(Selection::parse("1.5:3"), Err(SelectionError::NonInteger(_))));
        assert!(matches!(Selection::parse("0:3:x"), Err(SelectionError::NonInteger(_))));
        assert!(matches!(Selection::parse("1:2:3:4"), Err(SelectionError::UnknownArgument(_))));
        assert!(matches!(Selection::parse("2.5"), Err(SelectionError::UnknownArgument(_))));
        assert!(matches!(Selection::parse("A,,B"), Err(SelectionError::UnknownArgument(_))));
    }

    #[test]
    fn json_shapes() {
        assert!(matches!(Selection::from_json(&json!(null)).unwrap(), Selection::All));
        assert!(matches!(Selection::from_json(&json!("...")).unwrap(), Selection::All));
        assert!(matches!(Selection::from_json(&json!(3)).unwrap(), Selection::Index(3)));
        match Selection::from_json(&json!({"start": "C", "stop": "A"})).unwrap() {
            Selection::Slice(s) => assert_eq!(s, SliceSpec::names(Some("C"), Some("A"))),
            other => panic!("expected slice, got {}", other),
        }
        match Selection::from_json(&json!([0, "B", {"step": -1}])).unwrap() {
            Selection::List(items) => {
                assert_eq!(items.len(), 3);
                assert_eq!(items[2].kind(), "slice");
            }
            other => panic!("expected list, got {}", other),
        }
    }

    #[test]
    fn json_rejects_bad_shapes() {
        assert!(matches!(Selection::from_json(&json!({"start": 1.5})), Err(SelectionError::NonInteger(_))));
        assert!(matches!(Selection::from_json(&json!({"step": "2"})), Err(SelectionError::NonInteger(_))));
        assert!(matches!(Selection::from_json(&json!({"begin": 1})), Err(SelectionError::UnknownArgument(_))));
        assert!(matches!(Selection::from_json(&json!(true)), Err(SelectionError::UnknownArgument(_))));
        assert!(matches!(Selection::from_json(&json!(2.5)), Err(SelectionError::UnknownArgument(_))));
    }

    #[test]
    fn display_forms() {
        let s = Selection::from(vec![Selection::from(1), Selection::from("A"), Selection::from(SliceSpec::range(None, Some(3), Some(2)))]);
        assert_eq!(s.to_string(), "[1, \"A\", [:3:2]]");
        assert_eq!(Selection::func(|t| t.all()).to_string(), "<function>");
    }
}
