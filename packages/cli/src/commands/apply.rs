use crate::script::parse_script;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use quire_editor::{Editor, EditorConfig};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Document JSON file. Invalid documents start from an empty paragraph.
    pub input: PathBuf,

    /// JSON array of command steps
    #[arg(short, long)]
    pub script: PathBuf,

    /// Write the save payload here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Title stored in the save payload
    #[arg(short, long, default_value = "")]
    pub title: String,

    /// Fail when a step does not apply
    #[arg(long)]
    pub strict: bool,
}

pub fn apply(args: ApplyArgs, cwd: &str) -> Result<()> {
    let config = EditorConfig::load(cwd)?;

    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("Cannot read {}", args.input.display()))?;
    let content: Option<Value> = serde_json::from_str(&source).ok();

    let script = fs::read_to_string(&args.script)
        .with_context(|| format!("Cannot read {}", args.script.display()))?;
    let steps = parse_script(&script)
        .with_context(|| format!("Invalid script {}", args.script.display()))?;

    let mut editor = Editor::new(config);
    editor.mount(content.as_ref(), args.title.clone());

    eprintln!("▶ {} {} steps", "Applying".green().bold(), steps.len());
    let mut skipped = 0;
    for (i, step) in steps.iter().enumerate() {
        if step.run(&mut editor) {
            eprintln!("   {} {}", "✓".green(), step.label());
        } else {
            skipped += 1;
            eprintln!("   {} {} (not applicable)", "–".yellow(), step.label());
            if args.strict {
                return Err(anyhow::anyhow!("Step {} ({}) did not apply", i + 1, step.label()));
            }
        }
    }
    info!(version = editor.version(), skipped, "Script finished");

    let payload = editor
        .save_payload()
        .ok_or_else(|| anyhow::anyhow!("Editor is not mounted"))?;
    let json = serde_json::to_string_pretty(&payload)?;

    match &args.out {
        Some(out) => {
            fs::write(out, json)?;
            eprintln!("   {} Wrote {}", "✓".green(), out.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
