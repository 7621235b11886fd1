use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use knwf_convert::{ConvertConfig, Converter, ExtractedWorkflow, WORKFLOW_JSON};

/// knwf - convert workflow archives to an editable settings form and back
#[derive(Parser)]
#[command(name = "knwf")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.knwf)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Root of the per-node template directories (default: <data-dir>/templates)
  #[arg(long, global = true, env = "KNWF_TEMPLATES")]
  templates: Option<PathBuf>,

  /// Scratch directory for unpacked and staged files (default: <data-dir>/work)
  #[arg(long, global = true)]
  work_dir: Option<PathBuf>,

  /// Log at debug level unless RUST_LOG says otherwise
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Print the nodes and connections of an archive
  Inspect {
    /// Path to the workflow archive (.knwf)
    archive: PathBuf,
  },

  /// Extract every node's settings into an editable workflow.json
  Extract {
    /// Path to the workflow archive (.knwf)
    archive: PathBuf,

    /// Directory to write workflow.json into
    #[arg(long, default_value = ".")]
    out: PathBuf,
  },

  /// Rebuild an archive from an edited workflow.json
  Build {
    /// Path to the workflow.json written by `extract`
    workflow_json: PathBuf,

    /// Output archive name without extension (default: <workflow>_new)
    #[arg(long)]
    output: Option<PathBuf>,
  },

  /// Extract and rebuild an archive in one step
  Convert {
    /// Path to the workflow archive (.knwf)
    archive: PathBuf,

    /// Output archive name without extension (default: <archive>_new)
    #[arg(long)]
    output: Option<PathBuf>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".knwf"),
  };
  let config = ConvertConfig::new(
    cli.templates.unwrap_or_else(|| data_dir.join("templates")),
    cli.work_dir.unwrap_or_else(|| data_dir.join("work")),
  );
  tracing::debug!(
    templates = %config.templates_dir.display(),
    work_dir = %config.work_dir.display(),
    "resolved configuration"
  );

  match cli.command {
    Some(Commands::Inspect { archive }) => inspect(config, &archive)?,
    Some(Commands::Extract { archive, out }) => extract(config, &archive, &out)?,
    Some(Commands::Build {
      workflow_json,
      output,
    }) => build(config, &workflow_json, output)?,
    Some(Commands::Convert { archive, output }) => convert(config, &archive, output)?,
    None => {
      println!("knwf - use --help to see available commands");
    }
  }

  Ok(())
}

fn init_tracing(verbose: bool) {
  let default_level = if verbose { "debug" } else { "info" };
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

fn inspect(config: ConvertConfig, archive: &Path) -> Result<()> {
  let workflow = Converter::new(config)
    .extract(archive)
    .with_context(|| format!("failed to read workflow archive: {}", archive.display()))?;

  let graph = workflow.topology.graph();
  let nodes: Vec<_> = workflow
    .nodes
    .iter()
    .map(|node| {
      json!({
        "id": node.id,
        "name": node.name,
        "filename": node.filename,
        "entries": node.model.entry_count(),
        "downstream": graph.downstream(&node.id),
      })
    })
    .collect();

  let output = json!({
    "name": workflow.name,
    "nodes": nodes,
    "connections": workflow.topology.connections,
    "entry_points": graph.entry_points(),
  });
  println!("{}", serde_json::to_string_pretty(&output)?);

  Ok(())
}

fn extract(config: ConvertConfig, archive: &Path, out: &Path) -> Result<()> {
  let workflow = Converter::new(config)
    .extract(archive)
    .with_context(|| format!("failed to extract workflow archive: {}", archive.display()))?;

  let json_path = out.join(WORKFLOW_JSON);
  workflow
    .save(&json_path)
    .with_context(|| format!("failed to write {}", json_path.display()))?;

  eprintln!(
    "Extracted {} nodes from {}",
    workflow.nodes.len(),
    workflow.name
  );
  println!("{}", json_path.display());

  Ok(())
}

fn build(config: ConvertConfig, workflow_json: &Path, output: Option<PathBuf>) -> Result<()> {
  let workflow = ExtractedWorkflow::load(workflow_json)
    .with_context(|| format!("failed to load {}", workflow_json.display()))?;

  let output = output.unwrap_or_else(|| PathBuf::from(format!("{}_new", workflow.name)));
  let archive = Converter::new(config)
    .build(&workflow, &output)
    .context("failed to rebuild workflow archive")?;

  println!("{}", archive.display());
  Ok(())
}

fn convert(config: ConvertConfig, archive: &Path, output: Option<PathBuf>) -> Result<()> {
  let output = output.unwrap_or_else(|| default_output(archive));
  let rebuilt = Converter::new(config)
    .convert(archive, &output)
    .with_context(|| format!("failed to convert {}", archive.display()))?;

  println!("{}", rebuilt.display());
  Ok(())
}

/// `<dir>/<stem>_new` next to the input archive.
fn default_output(archive: &Path) -> PathBuf {
  let stem = archive
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_else(|| "workflow".to_string());
  archive.with_file_name(format!("{stem}_new"))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_output_sits_next_to_archive() {
    assert_eq!(
      default_output(Path::new("flows/Flow.knwf")),
      PathBuf::from("flows/Flow_new")
    );
  }

  #[test]
  fn test_cli_parses_build() {
    let cli = Cli::parse_from([
      "knwf",
      "--templates",
      "/opt/templates",
      "build",
      "edit/workflow.json",
      "--output",
      "dist/Flow_new",
    ]);

    assert_eq!(cli.templates, Some(PathBuf::from("/opt/templates")));
    match cli.command {
      Some(Commands::Build {
        workflow_json,
        output,
      }) => {
        assert_eq!(workflow_json, PathBuf::from("edit/workflow.json"));
        assert_eq!(output, Some(PathBuf::from("dist/Flow_new")));
      }
      _ => panic!("expected build command"),
    }
  }
}
