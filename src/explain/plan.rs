use crate::codegen::CodeGenContext;
use crate::columnset::ColumnSet;
use crate::selection::Selection;

use super::options::ExplainOptions;

/// Longest name list printed by the `names` stage.
pub const NAMES_PREVIEW: usize = 64;

/// What a selection resolved to, independent of how it is rendered.
#[derive(Debug, Clone)]
pub struct ColumnSetSummary {
    pub kind: &'static str,
    pub n_columns: usize,
    pub n_view_columns: usize,
    /// Routine registered for a view; `None` for explicit lists.
    pub routine: Option<String>,
    /// Structural form of the column set (`ColumnSet::to_json`).
    pub detail: serde_json::Value,
}

impl ColumnSetSummary {
    pub fn of(cs: &ColumnSet) -> Self {
        Self {
            kind: cs.kind(),
            n_columns: cs.n_columns(),
            n_view_columns: cs.n_view_columns(),
            routine: None,
            detail: cs.to_json(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExplainPlan {
    pub selection: String,
    pub shape: &'static str,
    pub columnset: ColumnSetSummary,
    pub stages: Vec<ExplainStage>,
}

#[derive(Debug, Clone)]
pub struct ExplainStage {
    pub name: String,
    pub details: String,
}

impl ExplainPlan {
    pub fn new(spec: &Selection, cs: &ColumnSet) -> Self {
        Self { selection: spec.to_string(), shape: spec.kind(), columnset: ColumnSetSummary::of(cs), stages: Vec::new() }
    }
    pub fn with_stage(mut self, name: impl Into<String>, details: impl Into<String>) -> Self {
        self.stages.push(ExplainStage { name: name.into(), details: details.into() });
        self
    }
    pub fn stage(&self, name: &str) -> Option<&ExplainStage> {
        self.stages.iter().find(|s| s.name == name)
    }
}

/// Describe a resolved selection. For a view this requests the routine from `ctx` (registering
/// it on first use) and runs it once to report the descriptors it builds.
pub fn explain_columnset(spec: &Selection, cs: &ColumnSet, ctx: &mut dyn CodeGenContext, opts: &ExplainOptions) -> ExplainPlan {
    let mut plan = ExplainPlan::new(spec, cs)
        .with_stage("resolve", format!("{} selection -> {} of {} columns ({} view)", spec.kind(), cs.kind(), cs.n_columns(), cs.n_view_columns()));
    match cs {
        ColumnSet::View(v) => {
            plan = plan.with_stage("view", format!("start={} count={} step={} source_is_view={}", v.start(), v.count(), v.step(), v.table().is_view()));
            let name = v.routine_name(ctx);
            plan.columnset.routine = Some(name.clone());
            plan = plan.with_stage("routine", name.clone());
            if let Some(routine) = ctx.function(&name) {
                if opts.verbose {
                    plan = plan.with_stage("listing", routine.listing().trim_end().to_string());
                }
                let details = match routine.call() {
                    Ok(cols) => {
                        let idx: Vec<String> = cols.iter().map(|c| match c.src_index() {
                            Some(i) => format!("{}:{}", i, c.stype.as_str()),
                            None => format!("?:{}", c.stype.as_str()),
                        }).collect();
                        format!("ok: {} view columns [{}]", cols.len(), idx.join(", "))
                    }
                    Err(e) => format!("failed: {}: {}", e.code(), e),
                };
                plan = plan.with_stage("materialize", details);
            }
        }
        ColumnSet::List(l) => {
            let entries: Vec<String> = l.entries().iter().map(|(r, n)| format!("{} as {:?}", r, n)).collect();
            plan = plan.with_stage("entries", entries.join(", "));
        }
    }
    plan.with_stage("names", cs.names_preview(NAMES_PREVIEW))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::UnitContext;
    use crate::explain::{explain_json, explain_text, ExplainFormat};
    use crate::resolve::resolve;
    use crate::selection::SliceSpec;
    use crate::table::{DataTable, SharedTable};
    use std::sync::Arc;

    #[test]
    fn explain_view_selection() {
        let t: SharedTable = Arc::new(DataTable::from_names(&["A", "B", "C"]));
        let spec = Selection::parse("C:A").unwrap();
        let cs = resolve(&spec, &t).unwrap();
        let mut ctx = UnitContext::new();
        let opts = ExplainOptions { format: ExplainFormat::Text, verbose: true };
        let plan = explain_columnset(&spec, &cs, &mut ctx, &opts);
        assert_eq!(plan.stage("routine").unwrap().details, "get_v1");
        assert_eq!(plan.columnset.routine.as_deref(), Some("get_v1"));
        assert_eq!(plan.stage("names").unwrap().details, "C, B, A");
        assert_eq!(plan.stage("materialize").unwrap().details, "ok: 3 view columns [2:i64, 1:i64, 0:i64]");
        let text = explain_text(&plan);
        assert!(text.contains("- listing:\n    fn get_v1() -> ViewColumns {"));
        assert!(text.contains("columnset: view, 3 columns (3 view) via get_v1"), "{}", text);

        // same ColumnSet, same routine
        let again = explain_columnset(&spec, &cs, &mut ctx, &opts);
        assert_eq!(again.stage("routine").unwrap().details, "get_v1");
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn explain_list_selection_json() {
        let t: SharedTable = Arc::new(DataTable::from_names(&["A", "B", "C"]));
        let spec = Selection::parse("B,0").unwrap();
        let cs = resolve(&spec, &t).unwrap();
        let mut ctx = UnitContext::new();
        let plan = explain_columnset(&spec, &cs, &mut ctx, &ExplainOptions::default());
        assert!(plan.stage("routine").is_none());
        assert!(ctx.is_empty());
        let j = explain_json(&plan);
        assert_eq!(j["selection"]["shape"], "list");
        assert_eq!(j["columnset"]["kind"], "list");
        assert_eq!(j["columnset"]["n_columns"], 2);
        assert!(j["columnset"]["routine"].is_null());
        assert_eq!(j["columnset"]["detail"]["entries"][0]["index"], 1);
        assert_eq!(j["stages"]["entries"], "#1 as \"B\", #0 as \"A\"");
    }

    #[test]
    fn explain_huge_repeat_view_reports_failure() {
        let t: SharedTable = Arc::new(DataTable::from_names(&["A", "B"]));
        let spec = Selection::from(SliceSpec::range(Some(1), Some(i64::MAX), Some(0)));
        let cs = resolve(&spec, &t).unwrap();
        let mut ctx = UnitContext::new();
        let plan = explain_columnset(&spec, &cs, &mut ctx, &ExplainOptions::default());
        assert!(plan.stage("materialize").unwrap().details.starts_with("failed: alloc_failed"));
        let names = &plan.stage("names").unwrap().details;
        assert!(names.starts_with("B, B, B"));
        assert!(names.ends_with(&format!("(+{} more)", i64::MAX as usize - NAMES_PREVIEW)));
    }
}
