mod manifest;
mod naming;
mod progress;
mod scan;

use anyhow::{bail, Result};
use clap::Parser;
use manifest::{ManifestConfig, DEFAULT_FALLBACK_ID, DEFAULT_GROUP};
use progress::{format_duration, ProgressConfig, ProgressMode, ProgressReporter};
use scan::{ExtensionSet, DEFAULT_EXTENSIONS};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gif-manifest",
    version,
    about = "Scan a folder of GIF/APNG/WEBP files and write a JSON manifest (id, name, group, file)"
)]
struct Cli {
    /// Folder to scan recursively
    #[arg(long, default_value = "public/gifs")]
    root: PathBuf,

    /// Manifest destination; parent directories are created as needed
    #[arg(long, default_value = "public/gifs/manifest.json")]
    output: PathBuf,

    /// Base URL for the `file` field (e.g. https://cdn.example.com/gifs).
    /// Without it, `file` is the encoded path relative to --root.
    #[arg(long, env = "GIFS_BASE_URL")]
    base_url: Option<String>,

    /// Accepted extensions, repeatable or comma separated (leading dot optional)
    #[arg(
        long = "ext",
        value_delimiter = ',',
        default_values_t = DEFAULT_EXTENSIONS.map(String::from)
    )]
    extensions: Vec<String>,

    /// Group label for files directly under --root
    #[arg(long, default_value = DEFAULT_GROUP)]
    default_group: String,

    /// Id used when a file name has no letters or digits to slugify
    #[arg(long, default_value = DEFAULT_FALLBACK_ID)]
    fallback_id: String,

    /// Progress display mode: auto (TTY-aware), rich, plain, quiet.
    #[arg(long, value_enum, default_value_t = ProgressMode::Auto)]
    progress: ProgressMode,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let extensions = ExtensionSet::new(&cli.extensions)?;
    let fallback_id = validate_fallback_id(&cli.fallback_id)?;
    let config = ManifestConfig {
        base_url: cli.base_url,
        default_group: cli.default_group,
        fallback_id,
    };

    let mut progress = ProgressReporter::new("manifest", ProgressConfig::new(cli.progress));
    progress.log(format!(
        "scanning {} for {} files",
        cli.root.display(),
        extensions
    ));

    progress.set_stage("scan");
    let files = scan::gather_files(&cli.root, &extensions, &mut progress)?;
    if files.is_empty() {
        bail!(
            "no {} files found in {}",
            extensions,
            cli.root.display()
        );
    }

    progress.set_stage("build");
    let entries = manifest::build_manifest(&cli.root, &files, &config)?;

    progress.set_stage("write");
    manifest::write_manifest(&cli.output, &entries)?;

    let outcome = progress.finish(format!("{} entries", entries.len()));

    println!(
        "Manifest written to {} with {} entries.",
        cli.output.display(),
        entries.len()
    );
    if outcome.warning_count > 0 {
        println!(
            "Scan summary: duration={} scanned={} matched={} warnings={}",
            format_duration(outcome.elapsed),
            outcome.scanned_entries,
            outcome.matched_files,
            outcome.warning_count,
        );
        for warning in outcome.warnings {
            println!("  warning: {}", warning);
        }
    }

    Ok(())
}

fn validate_fallback_id(raw: &str) -> Result<String> {
    let slug = naming::slugify(raw);
    if slug.is_empty() {
        bail!("--fallback-id must contain at least one letter or digit");
    }
    Ok(slug)
}
