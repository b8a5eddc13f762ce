//! Describes how a resolved selection would execute: the column set it became, the view
//! routine it registers and the descriptors that routine builds.

pub mod options;
pub mod plan;
pub mod render_json;
pub mod render_text;

pub use options::{ExplainFormat, ExplainOptions};
pub use plan::{explain_columnset, ColumnSetSummary, ExplainPlan, ExplainStage, NAMES_PREVIEW};
pub use render_json::explain_json;
pub use render_text::explain_text;

/// Render `plan` in `format`. JSON output is pretty-printed.
pub fn render(plan: &ExplainPlan, format: ExplainFormat) -> String {
    match format {
        ExplainFormat::Text => explain_text(plan),
        ExplainFormat::Json => {
            let v = explain_json(plan);
            let mut s = serde_json::to_string_pretty(&v).unwrap_or_else(|_| v.to_string());
            s.push('\n');
            s
        }
    }
}
