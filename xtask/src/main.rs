use anyhow::Context;
use clap::{Parser, Subcommand};
use fs_err as fs;
use std::path::Path;
use std::process::Command as ProcessCommand;

#[derive(Debug, Parser)]
#[command(name = "xtask", about = "Workspace helper tasks")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print schema identifiers used by pwpatch.
    PrintSchemas,
    /// List the built-in patches.
    ListPatches {
        /// Emit JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Bless golden fixtures (overwrite expected outputs).
    BlessFixtures,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::PrintSchemas => {
            println!("{}", pwpatch_types::schema::PWPATCH_REPORT_V1);
        }
        Command::ListPatches { json } => list_patches(json)?,
        Command::BlessFixtures => {
            let fixtures = Path::new(env!("CARGO_MANIFEST_DIR"))
                .join("..")
                .join("tests")
                .join("fixtures");
            let count = fs::read_dir(&fixtures)
                .with_context(|| format!("read {}", fixtures.display()))?
                .count();
            println!("blessing {count} fixtures in {}", fixtures.display());

            let status = ProcessCommand::new("cargo")
                .args(["test", "-p", "pwpatch-domain", "--test", "golden_fixtures"])
                .env("PWPATCH_BLESS", "1")
                .status()
                .context("run golden fixture blessing")?;
            if !status.success() {
                anyhow::bail!("bless-fixtures failed");
            }
        }
    }
    Ok(())
}

fn list_patches(json: bool) -> anyhow::Result<()> {
    let metas = pwpatch_domain::builtin_patch_metas();
    if json {
        let patches: Vec<_> = metas
            .iter()
            .map(|m| {
                serde_json::json!({
                    "id": m.id,
                    "title": m.title,
                    "command": m.command,
                    "target": m.target,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&patches)?);
        return Ok(());
    }

    println!("  {:<28} {:<24} {:<22} TITLE", "ID", "COMMAND", "TARGET");
    println!("  {:<28} {:<24} {:<22} -----", "--", "-------", "------");
    for m in &metas {
        println!(
            "  {:<28} {:<24} {:<22} {}",
            m.id, m.command, m.target, m.title
        );
    }
    Ok(())
}
