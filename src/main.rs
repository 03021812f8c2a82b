use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use opacity_migrate::{FileOutcome, FileReport, Migrator, Summary};
use similar::{ChangeTag, TextDiff};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser)]
#[command(name = "opacity-migrate")]
#[command(
    about = "Rewrite deprecated .withOpacity(x) calls to .withValues(alpha: x) in Dart sources",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Root directory to scan recursively for .dart files
    #[arg(env = "OPACITY_MIGRATE_ROOT")]
    root: PathBuf,

    /// Show unified diff of each fixed file
    #[arg(short, long)]
    diff: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let summary = cmd_migrate(&cli.root, cli.diff)?;

    if !summary.is_clean() {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_migrate(root: &Path, show_diff: bool) -> Result<Summary> {
    let migrator = Migrator::new(root)
        .with_context(|| format!("invalid root directory {}", root.display()))?;
    debug!(root = %migrator.root().display(), "root resolved");

    let summary = migrator.run(|report| match report {
        FileReport::Done(outcome) => {
            if let FileOutcome::Fixed {
                file,
                original,
                rewritten,
                ..
            } = outcome
            {
                println!("{outcome}");
                if show_diff {
                    display_diff(file, original, rewritten);
                }
            }
        }
        FileReport::Failed { file, error } => {
            match file {
                Some(file) => eprintln!("{} {}: {}", "✗".red(), file.display(), error),
                None => eprintln!("{} {}", "✗".red(), error),
            }
        }
    });

    println!();
    println!("Total files fixed: {}", summary.fixed_count());
    println!(
        "  {} unchanged",
        format!("{}", summary.unchanged).yellow()
    );
    println!(
        "  {} skipped",
        format!("{}", summary.skipped_count()).red()
    );

    Ok(summary)
}

/// Helper: Show unified diff between original and rewritten content
fn display_diff(file: &Path, original: &str, rewritten: &str) {
    println!("{}", format!("--- {} (original)", file.display()).dimmed());
    println!("{}", format!("+++ {} (migrated)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, rewritten);

    for hunk in diff.unified_diff().context_radius(2).iter_hunks() {
        println!("{}", hunk.header().to_string().cyan());
        for change in hunk.iter_changes() {
            let line = match change.tag() {
                ChangeTag::Delete => format!("-{change}").red(),
                ChangeTag::Insert => format!("+{change}").green(),
                ChangeTag::Equal => format!(" {change}").normal(),
            };
            print!("{line}");
            if change.missing_newline() {
                println!();
            }
        }
    }
}
