//! DTF Command Line Interface

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use dtf_core::{ClusterConfigBuilder, ClusterMembership, Config, DryRunLauncher, Launcher, TaskFile};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "dtf")]
#[command(version = dtf_core::VERSION)]
#[command(about = "Declare distributed TensorFlow training tasks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to $DTF_CONFIG, then ./dtf.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the post-setup command for every node
    PostSetup {
        /// Port the workers listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Node addresses, head first
        #[arg(required = true)]
        nodes: Vec<String>,
    },

    /// Print the distributed config JSON for one node
    TfConfig {
        /// Port the workers listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Position of the node in the address list
        #[arg(short, long, default_value_t = 0)]
        index: usize,

        /// Node addresses, head first
        #[arg(required = true)]
        nodes: Vec<String>,
    },

    /// Build a task from a YAML file and show what a launcher would run
    Plan {
        /// Task file
        task_file: PathBuf,

        /// Node addresses, head first
        #[arg(short, long, required = true, num_args = 1..)]
        nodes: Vec<String>,

        /// Cluster name (overrides config)
        #[arg(long)]
        cluster_name: Option<String>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dtf_core::logging::init(cli.verbose)?;

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::from_env()?,
    };

    match cli.command {
        Commands::PostSetup { port, nodes } => post_setup(&config, port, nodes)?,
        Commands::TfConfig { port, index, nodes } => tf_config(&config, port, index, nodes)?,
        Commands::Plan {
            task_file,
            nodes,
            cluster_name,
            json,
        } => plan(&config, task_file, nodes, cluster_name, json).await?,
    }

    Ok(())
}

fn config_builder(config: &Config, port: Option<u16>) -> ClusterConfigBuilder {
    let builder = ClusterConfigBuilder::from_settings(&config.distributed);
    match port {
        Some(port) => builder.with_port(port),
        None => builder,
    }
}

fn post_setup(config: &Config, port: Option<u16>, nodes: Vec<String>) -> anyhow::Result<()> {
    let cluster = ClusterMembership::parse(nodes)?;
    let commands = config_builder(config, port).build(&cluster)?;

    info!("Generated post-setup commands for {} node(s)", cluster.len());

    for node in &cluster {
        let command = commands
            .get(node)
            .with_context(|| format!("no command generated for {}", node))?;
        let label = if cluster.is_head(node) {
            format!("{} (head)", node)
        } else {
            node.to_string()
        };
        println!("{}", label.bright_cyan().bold());
        println!("  {}", command);
    }

    Ok(())
}

fn tf_config(config: &Config, port: Option<u16>, index: usize, nodes: Vec<String>) -> anyhow::Result<()> {
    let cluster = ClusterMembership::parse(nodes)?;
    let configs = config_builder(config, port).configs(&cluster)?;

    let node_config = configs
        .get(index)
        .with_context(|| format!("index {} is out of range for {} node(s)", index, cluster.len()))?;
    println!("{}", node_config.to_json()?);

    Ok(())
}

async fn plan(
    config: &Config,
    task_file: PathBuf,
    nodes: Vec<String>,
    cluster_name: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let cluster = ClusterMembership::parse(nodes)?;
    let task = TaskFile::load(&task_file)
        .with_context(|| format!("failed to load task file {}", task_file.display()))?
        .into_builder(cluster)?
        .distributed(ClusterConfigBuilder::from_settings(&config.distributed))
        .build()?;

    let launcher = DryRunLauncher::from_config(config);
    let handle = launcher.launch(task, cluster_name.as_deref()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&handle)?);
        return Ok(());
    }

    println!("{}", "📋 Launch plan (dry run)".bright_cyan().bold());
    println!("  {} {}", "Task:".bright_white(), handle.plan.task_name);
    println!("  {} {}", "Task ID:".bright_white(), handle.task_id.bright_yellow());
    println!("  {} {}", "Cluster:".bright_white(), handle.cluster_name);
    println!();

    for node in &handle.plan.nodes {
        let role = if node.is_head { "head" } else { "worker" };
        println!(
            "{} {} [{}]",
            format!("#{}", node.index).bright_white(),
            node.node.to_string().bright_green().bold(),
            role
        );
        for step in &node.steps {
            let phase = format!("{:<13}", step.phase.to_string());
            println!("  {} {}", phase.bright_white(), step.action.trim());
        }
        println!();
    }

    Ok(())
}
