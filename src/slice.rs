//! Slice normalization: numeric and name-bounded slices -> canonical `(start, count, step)`.
//!
//! Numeric slices follow the usual open-ended slice rules (negative bounds count from the end,
//! out-of-range bounds clamp). A step of 0 is the degenerate "repeat" form: `start:n:0` selects
//! column `start` `n` times. Name slices include both named endpoints and run backwards when
//! the stop column precedes the start column.

use crate::error::{SelectResult, SelectionError};
use crate::selection::{SliceBound, SliceSpec};
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedSlice {
    pub start: i64,
    pub count: usize,
    pub step: i64,
}

impl NormalizedSlice {
    pub fn new(start: i64, count: usize, step: i64) -> Self { Self { start, count, step } }

    /// Source positions in selection order.
    pub fn indices(&self) -> impl Iterator<Item = i64> {
        let (start, step) = (self.start, self.step);
        (0..self.count as i64).map(move |i| start.saturating_add(i.saturating_mul(step)))
    }
}

pub fn normalize(slice: &SliceSpec, table: &dyn Table) -> SelectResult<NormalizedSlice> {
    if slice.is_name_slice() {
        normalize_names(slice, table)
    } else {
        let int = |b: &Option<SliceBound>| match b {
            Some(SliceBound::Index(i)) => Ok(Some(*i)),
            None => Ok(None),
            Some(SliceBound::Name(_)) => Err(SelectionError::NonInteger(slice.to_string())),
        };
        normalize_range(int(&slice.start)?, int(&slice.stop)?, slice.step, table.ncols(), slice)
    }
}

/// Numeric slice over `n` columns.
pub fn normalize_numeric(start: Option<i64>, stop: Option<i64>, step: Option<i64>, n: usize) -> SelectResult<NormalizedSlice> {
    normalize_range(start, stop, step, n, &SliceSpec::range(start, stop, step))
}

fn normalize_range(start: Option<i64>, stop: Option<i64>, step: Option<i64>, n: usize, spec: &SliceSpec) -> SelectResult<NormalizedSlice> {
    if n == 0 {
        return Ok(NormalizedSlice::new(0, 0, 1));
    }
    let n = n as i64;
    let step = step.unwrap_or(1);
    if step == 0 {
        return normalize_repeat(start, stop, n, spec);
    }
    let (start, stop) = if step > 0 {
        let clamp = |x: Option<i64>, default: i64| match x {
            None => default,
            Some(v) if v < 0 => (v + n).max(0),
            Some(v) => v.min(n),
        };
        (clamp(start, 0), clamp(stop, n))
    } else {
        let clamp = |x: Option<i64>, default: i64| match x {
            None => default,
            Some(v) if v < 0 => (v + n).max(-1),
            Some(v) => v.min(n - 1),
        };
        (clamp(start, n - 1), clamp(stop, -1))
    };
    // bounds are clamped to [-1, n] here, so only the step can be extreme
    let count = if step > 0 {
        if stop > start { (stop - start - 1) as u64 / step as u64 + 1 } else { 0 }
    } else if start > stop {
        (start - stop - 1) as u64 / step.unsigned_abs() + 1
    } else {
        0
    };
    Ok(NormalizedSlice::new(start, count as usize, step))
}

fn normalize_repeat(start: Option<i64>, stop: Option<i64>, n: i64, spec: &SliceSpec) -> SelectResult<NormalizedSlice> {
    let zero_step = |reason: &str| SelectionError::ZeroStep { slice: spec.to_string(), reason: reason.to_string() };
    match (start, stop) {
        (Some(s), Some(c)) if s >= 0 && c >= 0 => {
            if s < n {
                Ok(NormalizedSlice::new(s, c as usize, 0))
            } else {
                Err(zero_step(&format!("start {} is out of range for {} columns", s, n)))
            }
        }
        _ => Err(zero_step("start and stop must be non-negative integers, stop being the repeat count")),
    }
}

fn normalize_names(slice: &SliceSpec, table: &dyn Table) -> SelectResult<NormalizedSlice> {
    let lookup = |name: &str| table.column_index(name).ok_or_else(|| SelectionError::ColumnNotFound(name.to_string()));
    let col0 = match &slice.start {
        None => 0,
        Some(SliceBound::Name(s)) => lookup(s)? as i64,
        Some(SliceBound::Index(_)) => return Err(SelectionError::MixedNameSlice(slice.to_string())),
    };
    let mut col1 = match &slice.stop {
        None => table.ncols() as i64,
        Some(SliceBound::Name(s)) => lookup(s)? as i64 + 1,
        Some(SliceBound::Index(_)) => return Err(SelectionError::MixedNameSlice(slice.to_string())),
    };
    let mut step = match slice.step {
        None | Some(1) => 1,
        Some(_) => return Err(SelectionError::NameSliceStride(slice.to_string())),
    };
    if col1 <= col0 {
        // stop named before start: walk start..=stop backwards
        col1 -= 2;
        step = -1;
    }
    let count = (col1 - col0) / step;
    Ok(NormalizedSlice::new(col0, count as usize, step))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::DataTable;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    // Straightforward walk of a slice over 0..n, used as ground truth.
    fn reference_indices(start: Option<i64>, stop: Option<i64>, step: Option<i64>, n: i64) -> Vec<i64> {
        let step = step.unwrap_or(1);
        let adj = |v: i64| if v < 0 { v + n } else { v };
        let mut out = Vec::new();
        if step > 0 {
            let mut i = start.map(adj).unwrap_or(0).max(0);
            let end = stop.map(adj).unwrap_or(n).min(n);
            while i < end { out.push(i); i += step; }
        } else {
            let mut i = start.map(adj).unwrap_or(n - 1).min(n - 1);
            let end = stop.map(adj).unwrap_or(-1).max(-1);
            while i > end { if i >= 0 { out.push(i); } i += step; }
        }
        out
    }

    #[test]
    fn numeric_defaults() {
        assert_eq!(normalize_numeric(None, None, None, 5).unwrap(), NormalizedSlice::new(0, 5, 1));
        assert_eq!(normalize_numeric(None, None, Some(-1), 5).unwrap(), NormalizedSlice::new(4, 5, -1));
        assert_eq!(normalize_numeric(Some(-2), None, None, 5).unwrap(), NormalizedSlice::new(3, 2, 1));
        assert_eq!(normalize_numeric(Some(1), Some(100), Some(2), 5).unwrap(), NormalizedSlice::new(1, 2, 2));
        assert_eq!(normalize_numeric(Some(4), Some(1), None, 5).unwrap().count, 0);
        assert_eq!(normalize_numeric(Some(-100), Some(-100), Some(-1), 5).unwrap().count, 0);
        assert_eq!(normalize_numeric(Some(3), None, None, 0).unwrap(), NormalizedSlice::new(0, 0, 1));
    }

    #[test]
    fn numeric_matches_reference_walk() {
        let mut rng = StdRng::seed_from_u64(0x5EED_C0DE);
        for _ in 0..5000 {
            let n: i64 = rng.gen_range(1..12);
            let bound = |rng: &mut StdRng| if rng.gen_bool(0.2) { None } else { Some(rng.gen_range(-15i64..15)) };
            let start = bound(&mut rng);
            let stop = bound(&mut rng);
            let step = if rng.gen_bool(0.2) { None } else {
                let s = rng.gen_range(1i64..5);
                Some(if rng.gen_bool(0.5) { s } else { -s })
            };
            let ns = normalize_numeric(start, stop, step, n as usize).unwrap();
            let got: Vec<i64> = ns.indices().collect();
            let want = reference_indices(start, stop, step, n);
            assert_eq!(got, want, "slice {:?}:{:?}:{:?} over {}", start, stop, step, n);
            assert!(got.iter().all(|&i| i >= 0 && i < n));
        }
    }

    #[test]
    fn extreme_steps_select_one_column() {
        assert_eq!(normalize_numeric(Some(0), Some(5), Some(i64::MAX), 5).unwrap(), NormalizedSlice::new(0, 1, i64::MAX));
        assert_eq!(normalize_numeric(None, None, Some(i64::MIN), 5).unwrap(), NormalizedSlice::new(4, 1, i64::MIN));
        assert_eq!(
            normalize_numeric(Some(i64::MIN), Some(i64::MAX), Some(i64::MAX), 3).unwrap(),
            NormalizedSlice::new(0, 1, i64::MAX)
        );
        assert_eq!(
            normalize_numeric(Some(i64::MAX), Some(i64::MIN), Some(i64::MIN), 3).unwrap(),
            NormalizedSlice::new(2, 1, i64::MIN)
        );
        let ns = normalize_numeric(Some(2), None, Some(i64::MAX - 1), 5).unwrap();
        assert_eq!(ns.indices().collect::<Vec<_>>(), vec![2]);
        assert_eq!(normalize_numeric(Some(4), Some(0), Some(i64::MAX), 5).unwrap().count, 0);
        assert_eq!(normalize_numeric(Some(0), Some(4), Some(i64::MIN), 5).unwrap().count, 0);
    }

    #[test]
    fn zero_step_repeats() {
        assert_eq!(normalize_numeric(Some(2), Some(4), Some(0), 3).unwrap(), NormalizedSlice::new(2, 4, 0));
        assert_eq!(normalize_numeric(Some(2), Some(4), Some(0), 3).unwrap().indices().collect::<Vec<_>>(), vec![2, 2, 2, 2]);
        assert!(matches!(normalize_numeric(Some(3), Some(1), Some(0), 3), Err(SelectionError::ZeroStep { .. })));
        assert!(matches!(normalize_numeric(None, Some(1), Some(0), 3), Err(SelectionError::ZeroStep { .. })));
        assert!(matches!(normalize_numeric(Some(-1), Some(1), Some(0), 3), Err(SelectionError::ZeroStep { .. })));
    }

    #[test]
    fn name_slices_forward_and_open() {
        let t = DataTable::from_names(&["A", "B", "C", "D"]);
        assert_eq!(normalize(&SliceSpec::names(Some("B"), Some("C")), &t).unwrap(), NormalizedSlice::new(1, 2, 1));
        assert_eq!(normalize(&SliceSpec::names(None, Some("B")), &t).unwrap(), NormalizedSlice::new(0, 2, 1));
        assert_eq!(normalize(&SliceSpec::names(Some("C"), None), &t).unwrap(), NormalizedSlice::new(2, 2, 1));
        assert_eq!(normalize(&SliceSpec::names(Some("B"), Some("B")), &t).unwrap(), NormalizedSlice::new(1, 1, 1));
    }

    #[test]
    fn reversed_name_slices_cover_every_endpoint_pair() {
        let names = ["A", "B", "C", "D", "E"];
        let t = DataTable::from_names(&names);
        for s in 0..names.len() {
            for e in 0..s {
                let ns = normalize(&SliceSpec::names(Some(names[s]), Some(names[e])), &t).unwrap();
                let got: Vec<i64> = ns.indices().collect();
                let want: Vec<i64> = (e as i64..=s as i64).rev().collect();
                assert_eq!(got, want, "{}:{}", names[s], names[e]);
                assert_eq!(ns.step, -1);
            }
        }
    }

    #[test]
    fn name_slice_errors() {
        let t = DataTable::from_names(&["A", "B", "C"]);
        let mixed = SliceSpec::new(Some(SliceBound::Name("A".into())), Some(SliceBound::Index(2)), None);
        assert!(matches!(normalize(&mixed, &t), Err(SelectionError::MixedNameSlice(_))));
        let mixed = SliceSpec::new(Some(SliceBound::Index(0)), Some(SliceBound::Name("B".into())), None);
        assert!(matches!(normalize(&mixed, &t), Err(SelectionError::MixedNameSlice(_))));
        let strided = SliceSpec { step: Some(2), ..SliceSpec::names(Some("A"), Some("C")) };
        let err = normalize(&strided, &t).unwrap_err();
        assert!(err.to_string().contains("name slices cannot use a stride"));
        let unit = SliceSpec { step: Some(1), ..SliceSpec::names(Some("A"), Some("C")) };
        assert_eq!(normalize(&unit, &t).unwrap(), NormalizedSlice::new(0, 3, 1));
        assert_eq!(
            normalize(&SliceSpec::names(Some("Q"), None), &t).unwrap_err(),
            SelectionError::ColumnNotFound("Q".into())
        );
    }
}
