//! Standalone checker for project manifests.

use anyhow::Result;
use clap::Parser;
use ood_predict::manifest::ProjectManifest;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "manifest-check",
    about = "Validate a project manifest: dependency constraints and tool configuration",
    version
)]
struct Args {
    /// Manifest file to check (TOML)
    #[arg(value_name = "MANIFEST")]
    manifest: PathBuf,

    /// Emit issues as JSON instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let manifest = match ProjectManifest::from_file(&args.manifest) {
        Ok(manifest) => manifest,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    let issues = manifest.issues();

    if issues.is_empty() {
        println!(
            "✅ {} {}: {} dependencies, manifest is valid",
            manifest.project.name,
            manifest.project.version,
            manifest.dependencies.len() + manifest.dev_dependencies.len()
        );
        return Ok(());
    }

    if args.json {
        let report: Vec<serde_json::Value> = issues
            .iter()
            .map(|i| serde_json::json!({ "field": i.field, "message": i.message }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        eprintln!("❌ {} issue(s) found in {}", issues.len(), args.manifest.display());
        for issue in &issues {
            eprintln!("  - {}", issue);
        }
    }

    std::process::exit(1);
}
