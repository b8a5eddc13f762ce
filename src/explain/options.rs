#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplainFormat { Text, Json }

impl ExplainFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Some(ExplainFormat::Text),
            "json" => Some(ExplainFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExplainOptions {
    pub format: ExplainFormat,
    /// Include the routine listing for view selections.
    pub verbose: bool,
}

impl Default for ExplainOptions {
    fn default() -> Self { Self { format: ExplainFormat::Text, verbose: false } }
}
