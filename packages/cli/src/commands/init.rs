use anyhow::Result;
use clap::Args;
use colored::Colorize;
use quire_editor::{EditorConfig, DEFAULT_CONFIG_NAME};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory to write the config to
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Placeholder for the first empty paragraph
    #[arg(short, long)]
    pub placeholder: Option<String>,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let dir = PathBuf::from(cwd).join(&args.dir);
    let config_path = dir.join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Quire config...".bright_blue().bold());

    if !dir.exists() {
        fs::create_dir_all(&dir)?;
        println!("  {} Created {}/", "✓".green(), args.dir.display());
    }

    let mut config = EditorConfig::default();
    if let Some(placeholder) = args.placeholder {
        config.placeholder = placeholder;
    }
    fs::write(&config_path, config.to_json_pretty()?)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("Next steps:");
    println!("  1. Adjust {}", DEFAULT_CONFIG_NAME);
    println!("  2. Run: quire apply <doc.json> --script <steps.json>");

    Ok(())
}
