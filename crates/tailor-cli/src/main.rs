//! Tailor CLI - OSCAL profile resolution and control document tool
//!
//! Resolves profiles into catalogs, renders control parameters, and
//! reconciles the YAML headers of edited control markdown.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod config;
mod error;
mod output;

use tailor::control::{param_to_str, ParameterRep};
use tailor::{
    init_tracing, reconcile_markdown, DocumentFormat, DocumentStore, HeaderMerge, OscalDocument,
    ProfileResolver, TailorConfig,
};

use config::TailorToml;
use error::{CliError, Result};

/// Tailor CLI - OSCAL Profile Resolution Tool
#[derive(Parser)]
#[command(name = "tailor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to tailor.toml configuration file
    #[arg(short, long, default_value = "tailor.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a profile into a catalog
    Resolve {
        /// Profile href, relative to the workspace root
        profile: String,

        /// Write the resolved catalog here (format from the extension)
        #[arg(short, long)]
        output: Option<String>,

        /// Keep withdrawn controls
        #[arg(long)]
        retain_withdrawn: bool,

        /// Output a JSON report
        #[arg(long)]
        json: bool,
    },

    /// Render the parameters of a control
    Params {
        /// Catalog href, relative to the workspace root
        catalog: String,

        /// Control to render
        control_id: String,

        /// Representation: value, label, value-or-label, value-or-empty, moustache
        #[arg(long, default_value = "value")]
        rep: String,

        /// Wrap rendered text in [ ]
        #[arg(long)]
        brackets: bool,

        /// Prefix selection choices with "Choose <how-many>:"
        #[arg(long)]
        verbose: bool,

        /// Template with a single '.' replaced by the rendered text
        #[arg(long)]
        format: Option<String>,
    },

    /// Merge a generated markdown header into an edited one
    Header {
        /// Edited markdown file
        edits: PathBuf,

        /// Freshly generated markdown file
        generated: PathBuf,

        /// Generated values replace edited ones
        #[arg(long)]
        overwrite: bool,

        /// Write the result back to the edited file instead of stdout
        #[arg(long)]
        write: bool,
    },

    /// Initialize a new tailor.toml
    Init {
        /// Workspace root recorded in the file
        #[arg(short, long, default_value = ".")]
        root: String,

        /// Overwrite existing configuration
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resolve {
            profile,
            output,
            retain_withdrawn,
            json,
        } => cmd_resolve(&cli.config, &profile, output.as_deref(), retain_withdrawn, json),

        Commands::Params {
            catalog,
            control_id,
            rep,
            brackets,
            verbose,
            format,
        } => cmd_params(&cli.config, &catalog, &control_id, &rep, brackets, verbose, format.as_deref()),

        Commands::Header {
            edits,
            generated,
            overwrite,
            write,
        } => cmd_header(&cli.config, &edits, &generated, overwrite, write),

        Commands::Init { root, force } => cmd_init(&cli.config, &root, force),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.category() {
                Some(category) => output::error(&format!("{} ({} error)", e, category)),
                None => output::error(&e.to_string()),
            }
            ExitCode::FAILURE
        }
    }
}

/// Load configuration, install logging and open the document store
fn load_workspace(config_path: &Path) -> Result<(DocumentStore, TailorConfig)> {
    let (file, config) = TailorToml::load_or_env(config_path)?;
    if let Err(e) = init_tracing(&config.log) {
        output::warning(&e.to_string());
    }

    let root = match config_path.parent() {
        Some(dir) if file.workspace.root.is_relative() => dir.join(&file.workspace.root),
        _ => file.workspace.root.clone(),
    };
    tracing::debug!(root = %root.display(), "Opened workspace");
    Ok((DocumentStore::new(root), config))
}

// =============================================================================
// Command Implementations
// =============================================================================

fn cmd_resolve(
    config_path: &Path,
    profile: &str,
    out: Option<&str>,
    retain_withdrawn: bool,
    json: bool,
) -> Result<()> {
    let (store, mut config) = load_workspace(config_path)?;
    config.resolve.retain_withdrawn |= retain_withdrawn;

    let resolution = ProfileResolver::new(&store)
        .with_options(config.resolve)
        .resolve(profile)?;
    let control_count = resolution.catalog.all_controls().len();
    let doc = OscalDocument::from(resolution.catalog);

    let Some(out) = out else {
        // No destination: the catalog itself is the output
        print!("{}", DocumentStore::serialize(&doc, DocumentFormat::Json)?);
        return Ok(());
    };

    let written = store.save(&doc, out)?;

    if json {
        let report = serde_json::json!({
            "profile": profile,
            "output": out,
            "written": written,
            "controls": control_count,
            "warnings": resolution.warnings,
        });
        output::print_json(&report)?;
    } else {
        output::header(&format!("Resolved: {}", profile));
        output::print_alter_warnings(&resolution.warnings);
        if written {
            output::success(&format!("Wrote {} controls to {}", control_count, out));
        } else {
            output::info(&format!("{} is up to date ({} controls)", out, control_count));
        }
    }

    Ok(())
}

fn cmd_params(
    config_path: &Path,
    catalog_href: &str,
    control_id: &str,
    rep: &str,
    brackets: bool,
    verbose: bool,
    format: Option<&str>,
) -> Result<()> {
    let rep = ParameterRep::parse(rep)
        .ok_or_else(|| CliError::invalid("rep", format!("unknown representation: {}", rep)))?;

    let (store, _) = load_workspace(config_path)?;
    let catalog = store.read_catalog(catalog_href)?;
    let control = catalog
        .find_control(control_id)
        .ok_or_else(|| CliError::ControlNotFound {
            control_id: control_id.to_string(),
            catalog: catalog_href.to_string(),
        })?;

    output::header(&format!("{} {}", control.id, control.title));
    if control.params().is_empty() {
        output::info("No parameters");
        return Ok(());
    }
    for param in control.params() {
        let text = param_to_str(param, rep, verbose, brackets, format)?;
        output::print_param(&param.id, text.as_deref());
    }

    Ok(())
}

fn cmd_header(
    config_path: &Path,
    edits: &Path,
    generated: &Path,
    overwrite: bool,
    write: bool,
) -> Result<()> {
    load_workspace(config_path)?;
    let edited = read_text(edits)?;
    let fresh = read_text(generated)?;

    let mode = if overwrite {
        HeaderMerge::Regenerate
    } else {
        HeaderMerge::PreserveEdits
    };
    let merged = reconcile_markdown(&edited, &fresh, mode)?;

    if !write {
        print!("{}", merged);
        return Ok(());
    }

    if merged == edited {
        output::info(&format!("{} is up to date", edits.display()));
        return Ok(());
    }
    std::fs::write(edits, &merged).map_err(|e| CliError::FileWrite {
        path: edits.to_path_buf(),
        source: e,
    })?;
    output::success(&format!("Updated header of {}", edits.display()));

    Ok(())
}

fn cmd_init(config_path: &Path, root: &str, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        return Err(CliError::AlreadyExists {
            path: config_path.to_path_buf(),
        });
    }

    std::fs::write(config_path, config::init_template(root)).map_err(|e| CliError::FileWrite {
        path: config_path.to_path_buf(),
        source: e,
    })?;

    output::success(&format!("Created {}", config_path.display()));
    output::info("Edit the configuration and run 'tailor resolve <profile>'");

    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| CliError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}
