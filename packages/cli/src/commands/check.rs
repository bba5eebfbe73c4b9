use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use quire_model::{Node, NodeKind};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Document JSON file
    pub input: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStats {
    pub characters: usize,
    pub words: usize,
    pub blocks: usize,
    pub main_images: usize,
    pub nodes: BTreeMap<String, usize>,
}

impl DocumentStats {
    pub fn of(doc: &Node) -> Self {
        let text = doc.text_between(0, doc.content().size(), " ", None);
        let mut nodes = BTreeMap::new();
        doc.descendants(&mut |node, _, _, _| {
            *nodes.entry(node.kind().name().to_string()).or_insert(0) += 1;
            true
        });
        Self {
            characters: text.chars().filter(|c| !c.is_whitespace()).count(),
            words: text.split_whitespace().count(),
            blocks: doc.child_count(),
            main_images: doc.count_kind(NodeKind::MainImage),
            nodes,
        }
    }
}

pub fn check(args: CheckArgs, _cwd: &str) -> Result<()> {
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("Cannot read {}", args.input.display()))?;
    let value: Value = serde_json::from_str(&source)
        .with_context(|| format!("{} is not JSON", args.input.display()))?;

    let doc = match Node::from_value(&value) {
        Ok(doc) if doc.kind() == NodeKind::Doc => doc,
        Ok(doc) => {
            return Err(anyhow::anyhow!(
                "Expected a doc at the root, found {}",
                doc.kind().name()
            ))
        }
        Err(err) => {
            eprintln!("{} {}", "✗".red(), args.input.display());
            return Err(err.into());
        }
    };

    let stats = DocumentStats::of(&doc);
    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{} {}", "✓".green(), args.input.display());
    println!("   Blocks:     {}", stats.blocks);
    println!("   Words:      {}", stats.words);
    println!("   Characters: {}", stats.characters);
    if stats.main_images > 1 {
        println!("   {} {} main images", "Warning:".yellow(), stats.main_images);
    }
    for (kind, count) in &stats.nodes {
        println!("   {} {}", format!("{kind}:").dimmed(), count);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::builders::*;

    #[test]
    fn test_stats() {
        let d = doc(vec![
            main_image("c.png"),
            heading(2, vec![txt("Big news")]),
            p(vec![txt("It "), bold("works")]),
        ]);
        let stats = DocumentStats::of(&d);
        assert_eq!(stats.blocks, 3);
        assert_eq!(stats.words, 4);
        assert_eq!(stats.characters, 14);
        assert_eq!(stats.main_images, 1);
        assert_eq!(stats.nodes.get("paragraph"), Some(&1));
        assert_eq!(stats.nodes.get("text"), Some(&3));
    }
}
