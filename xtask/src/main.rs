use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for the portal scene")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Formatting, lints, tests and docs, stopping at the first failure
    Check,
    Fmt,
    Clippy,
    Test,
    Doc,
    /// Verify an assets directory loads and assembles
    Assets {
        #[arg(long, default_value = "static")]
        dir: PathBuf,
    },
}

/// Run `cargo <args>` and fail with `what` if it exits unsuccessfully.
fn cargo(what: &str, args: &[&str]) -> Result<()> {
    println!("==> {what}: cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        bail!("{what} failed ({status})");
    }
    Ok(())
}

fn fmt() -> Result<()> {
    cargo("format check", &["fmt", "--all", "--", "--check"])
}

fn clippy() -> Result<()> {
    cargo(
        "clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn test() -> Result<()> {
    cargo("tests", &["test", "--workspace"])
}

fn doc() -> Result<()> {
    cargo("docs", &["doc", "--workspace", "--no-deps"])
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            fmt()?;
            clippy()?;
            test()?;
            doc()?;
        }
        Commands::Fmt => fmt()?,
        Commands::Clippy => clippy()?,
        Commands::Test => test()?,
        Commands::Doc => doc()?,
        Commands::Assets { dir } => {
            let dir = dir.to_string_lossy();
            cargo(
                "asset inspection",
                &["run", "-q", "-p", "portal-cli", "--", "inspect", "--assets", &dir],
            )?;
        }
    }

    Ok(())
}
