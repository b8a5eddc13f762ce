use super::plan::ExplainPlan;

pub fn explain_text(plan: &ExplainPlan) -> String {
    let cs = &plan.columnset;
    let mut out = String::new();
    out.push_str(&format!("EXPLAIN SELECTION {} ({})\n", plan.selection, plan.shape));
    out.push_str(&format!("columnset: {}, {} columns ({} view)", cs.kind, cs.n_columns, cs.n_view_columns));
    if let Some(r) = &cs.routine { out.push_str(&format!(" via {}", r)); }
    out.push('\n');
    for st in &plan.stages {
        if st.details.contains('\n') {
            out.push_str(&format!("- {}:\n", st.name));
            for line in st.details.lines() { out.push_str(&format!("    {}\n", line)); }
        } else {
            out.push_str(&format!("- {}: {}\n", st.name, st.details));
        }
    }
    out
}
