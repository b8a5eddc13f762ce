use serde_json::{json, Map, Value};

use super::plan::ExplainPlan;

/// Stages are keyed by name so callers can pick one out without scanning.
pub fn explain_json(plan: &ExplainPlan) -> Value {
    let stages: Map<String, Value> = plan
        .stages
        .iter()
        .map(|s| (s.name.clone(), Value::String(s.details.clone())))
        .collect();
    let cs = &plan.columnset;
    json!({
        "selection": { "text": plan.selection, "shape": plan.shape },
        "columnset": {
            "kind": cs.kind,
            "n_columns": cs.n_columns,
            "n_view_columns": cs.n_view_columns,
            "routine": cs.routine,
            "detail": cs.detail,
        },
        "stages": stages,
    })
}
