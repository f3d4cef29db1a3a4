//! `asset-version`: append content-hash versions to static asset paths.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use asset_versioning::config::ProjectConfig;
use asset_versioning::logging::init_logging;
use asset_versioning::markup::append_versions_to_markup;
use clap::{Args, Parser, Subcommand};

/// Cache-busting helper for static assets
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// Config file path (default: ./asset-version.json when present)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the versioned form of each asset path
    #[command(visible_alias = "v")]
    Version {
        #[command(flatten)]
        provider: ProviderArgs,

        /// Root-relative asset paths such as /css/site.css
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Version src/href attributes of asset tags in an HTML file
    #[command(visible_alias = "r")]
    Rewrite {
        #[command(flatten)]
        provider: ProviderArgs,

        /// HTML file to rewrite
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Overwrite the file instead of printing the result
        #[arg(short, long)]
        in_place: bool,
    },
}

#[derive(Args, Debug)]
struct ProviderArgs {
    /// Content root holding the static assets, relative to the config directory
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    root: Option<PathBuf>,

    /// Virtual sub-path the application is mounted under
    #[arg(short, long)]
    app_name: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (mut config, base_dir) = load_config(cli.config.as_deref())?;
    // One-shot runs never see a file change, so watching would only cost a watcher thread.
    config.cache = false;

    match cli.command {
        Commands::Version { provider, paths } => {
            let versioner = apply_overrides(config, &provider).build_provider(&base_dir)?;
            for path in paths {
                println!("{}", versioner.add_version_to_file_path(&path)?);
            }
            Ok(())
        }
        Commands::Rewrite {
            provider,
            file,
            in_place,
        } => {
            let versioner = apply_overrides(config, &provider).build_provider(&base_dir)?;
            let html = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let rewritten = append_versions_to_markup(&html, &versioner)?;

            if in_place {
                fs::write(&file, rewritten)
                    .with_context(|| format!("failed to write {}", file.display()))?;
                tracing::info!(file = %file.display(), "rewrote asset references");
            } else {
                print!("{rewritten}");
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<(ProjectConfig, PathBuf)> {
    let cwd = std::env::current_dir().context("failed to determine the working directory")?;
    match path {
        Some(path) => {
            let config = ProjectConfig::load(path)?;
            let base_dir = path
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .map(|parent| cwd.join(parent))
                .unwrap_or(cwd);
            Ok((config, base_dir))
        }
        None => Ok((ProjectConfig::discover(&cwd), cwd)),
    }
}

fn apply_overrides(mut config: ProjectConfig, args: &ProviderArgs) -> ProjectConfig {
    if let Some(root) = &args.root {
        config.content_root = root.to_string_lossy().into_owned();
    }
    if let Some(app_name) = &args.app_name {
        config.app_name = Some(app_name.clone());
    }
    config
}
