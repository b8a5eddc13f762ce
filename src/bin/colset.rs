//!
//! colset CLI binary
//! -----------------
//! Resolve a column selection against an ad-hoc table and print how it would be executed:
//! the resolved column set, the view routine (when the selection collapses to a view) and the
//! descriptors that routine builds.

use std::env;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use colset::config::{init_logging, ColsetConfig};
use colset::explain::{explain_columnset, render, ExplainFormat, ExplainOptions};
use colset::{resolve, DataTable, Selection, SharedTable, StorageType, UnitContext};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} --names <A,B,C> [--stypes <i64,str,..>] [--view <2,0,1>] [--json] [--format text|json] [--verbose] <selection>\n\nFlags:\n  --names <list>     Comma-separated column names of the table (required)\n  --stypes <list>    Storage types per column (default i64 for all)\n  --view <list>      Select against a view over these column indices of the table\n  --json             Parse <selection> as JSON instead of the text syntax\n  --format <fmt>     Output format: text (default) or json\n  --verbose          Include the routine listing for view selections\n  -h, --help         Show this help\n\nSelection text syntax:\n  ...                every column\n  2, -1              column by position\n  A                  column by name\n  1:5:2, ::-1        numeric slice\n  B:D, D:B           name slice (inclusive, may run backwards)\n  A,2,B:C            several of the above (never collapses to a view)\n\nExamples:\n  {program} --names A,B,C,D 'D:B'\n  {program} --names A,B,C --json '[0, 0, {{\"start\": -1}}]' --format json"
    );
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect()
}

fn build_table(names: &[String], stypes: Option<&[String]>, view: Option<&[String]>) -> Result<SharedTable> {
    let types: Vec<StorageType> = match stypes {
        None => vec![StorageType::I64; names.len()],
        Some(list) => {
            if list.len() != names.len() {
                bail!("--stypes has {} entries but --names has {}", list.len(), names.len());
            }
            list.iter()
                .map(|s| StorageType::parse(s).with_context(|| format!("unknown storage type '{}'", s)))
                .collect::<Result<Vec<_>>>()?
        }
    };
    let base = DataTable::new(names.iter().cloned().zip(types).collect());
    match view {
        None => Ok(base.into_shared()),
        Some(idx) => {
            let indices = idx.iter()
                .map(|s| s.parse::<usize>().with_context(|| format!("bad --view index '{}'", s)))
                .collect::<Result<Vec<_>>>()?;
            let v = DataTable::view(&Arc::new(base), &indices)?;
            Ok(v.into_shared())
        }
    }
}

fn main() -> Result<()> {
    let cfg = ColsetConfig::from_env();
    init_logging(&cfg);

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);

    let mut names: Option<Vec<String>> = None;
    let mut stypes: Option<Vec<String>> = None;
    let mut view: Option<Vec<String>> = None;
    let mut json_input = false;
    let mut opts = ExplainOptions::default();
    let mut selection: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--names" => {
                if i + 1 >= args.len() { eprintln!("--names requires a value"); print_usage(&program); std::process::exit(2); }
                names = Some(split_list(&args[i+1]));
                i += 2; continue;
            }
            "--stypes" => {
                if i + 1 >= args.len() { eprintln!("--stypes requires a value"); print_usage(&program); std::process::exit(2); }
                stypes = Some(split_list(&args[i+1]));
                i += 2; continue;
            }
            "--view" => {
                if i + 1 >= args.len() { eprintln!("--view requires a value"); print_usage(&program); std::process::exit(2); }
                view = Some(split_list(&args[i+1]));
                i += 2; continue;
            }
            "--format" => {
                if i + 1 >= args.len() { eprintln!("--format requires a value"); print_usage(&program); std::process::exit(2); }
                opts.format = match ExplainFormat::parse(&args[i+1]) {
                    Some(f) => f,
                    None => { eprintln!("unknown format '{}'", args[i+1]); std::process::exit(2); }
                };
                i += 2; continue;
            }
            "--json" => { json_input = true; i += 1; continue; }
            "--verbose" | "-v" => { opts.verbose = true; i += 1; continue; }
            "-h" | "--help" => {
                print_usage(&program);
                return Ok(());
            }
            unk => {
                if selection.is_none() { selection = Some(unk.to_string()); i += 1; continue; }
                eprintln!("Unrecognized argument: {}", unk);
                print_usage(&program);
                std::process::exit(2);
            }
        }
    }

    let Some(names) = names else { print_usage(&program); std::process::exit(2); };
    let Some(selection) = selection else { print_usage(&program); std::process::exit(2); };
    info!(target: "colset", "colset starting: ncols={} view={} json_input={} routine_prefix='{}'",
        names.len(), view.is_some(), json_input, cfg.routine_prefix);

    let table = build_table(&names, stypes.as_deref(), view.as_deref())?;

    let parsed = if json_input {
        let value: serde_json::Value = serde_json::from_str(&selection).context("selection is not valid JSON")?;
        Selection::from_json(&value)
    } else {
        Selection::parse(&selection)
    };
    let resolved = parsed.and_then(|spec| resolve(&spec, &table).map(|cs| (spec, cs)));
    let (spec, cs) = match resolved {
        Ok(v) => v,
        Err(e) => {
            match opts.format {
                ExplainFormat::Json => println!("{}", serde_json::json!({"error": e.report()})),
                ExplainFormat::Text => eprintln!("error[{}]: {}", e.code(), e),
            }
            std::process::exit(1);
        }
    };

    let mut ctx = UnitContext::from_config(&cfg);
    let plan = explain_columnset(&spec, &cs, &mut ctx, &opts);
    print!("{}", render(&plan, opts.format));
    Ok(())
}
