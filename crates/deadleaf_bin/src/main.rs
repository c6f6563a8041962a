use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use logger::{Logger, StdioLogger};

#[derive(Parser, Debug)]
#[command(name = "deadleaf")]
struct CliArgs {
    /// Path to the JSON configuration file.
    #[arg(short, long, default_value = None)]
    config_path: Option<String>,
    /// Log per-file resolution details.
    #[arg(short, long)]
    verbose: bool,
    /// Write the dependency graph as JSON to this path.
    #[arg(long)]
    graph: Option<PathBuf>,
}

const DEFAULT_CONFIG_PATH: &str = "deadleaf.json";

fn main() -> Result<()> {
    let args = CliArgs::parse();
    let logger = StdioLogger::new(args.verbose);
    let logger = &logger;

    let config_path = args.config_path.unwrap_or_else(|| {
        logger.log("no config file path provided, using the default");
        DEFAULT_CONFIG_PATH.to_string()
    });
    logger.log(format!("reading config from {}", config_path));

    let config_str = fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read config file {}", config_path))?;
    let json_config: deadleaf::DeadleafJSONConfig = serde_json::from_str(&config_str)
        .with_context(|| format!("failed to parse config file {}", config_path))?;
    let mut config: deadleaf::DeadleafConfig = json_config.try_into()?;

    // rootDir in the config file is relative to the config's directory,
    // not to wherever the binary was launched.
    let config_dir = Path::new(&config_path).parent().unwrap_or(Path::new("."));
    if config.root_dir.is_relative() {
        config.root_dir = config_dir.join(&config.root_dir);
    }

    let start_time = std::time::Instant::now();
    let result = deadleaf::find_unused_files(logger, &config)?;
    let report = deadleaf::DeadleafReport::from(&result);
    let delta = start_time.elapsed();
    println!("result ({}ms):\n{}", delta.as_millis(), report);

    if let Some(graph_path) = args.graph {
        let map = result.graph.to_relative_map(&result.root_dir);
        let serialized =
            serde_json::to_string_pretty(&map).context("failed to serialize the graph export")?;
        fs::write(&graph_path, serialized)
            .with_context(|| format!("failed to write graph export {}", graph_path.display()))?;
        logger.log(format!(
            "wrote dependency graph to {}",
            graph_path.display()
        ));
    }

    Ok(())
}
