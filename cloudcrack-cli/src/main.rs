use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;

use cloudcrack_core::error::{ProvisionError, ProvisionResult};
use cloudcrack_core::job::{
    self, StatusRow, fetch_result, job_status, list_wordlists, submit_crack_job, upload_wordlist,
};
use cloudcrack_core::provision::{converge, teardown};
use cloudcrack_core::{ToolConfig, fields};
use cloudcrack_provider_aws::{AwsCloud, ImagePublisher};
use cloudcrack_state::{Checkpoint, CheckpointStore, JobHistoryStore};

/// Directory holding the Dockerfile for the cracking image
const DOCKER_CONTEXT_DIR: &str = "Docker";

#[derive(Parser)]
#[command(name = "cloudcrack")]
#[command(about = "Run hashcat in the cloud", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the cloud environment
    Setup {
        #[command(subcommand)]
        command: SetupCommands,
    },
    /// Manage wordlists
    Wordlists {
        #[command(subcommand)]
        command: WordlistCommands,
    },
    /// Crack a file
    Crack {
        #[command(subcommand)]
        command: CrackCommands,
    },
}

#[derive(Subcommand)]
enum SetupCommands {
    /// Create the cloud resources and publish the cracking image
    Create,
    /// Delete every created resource and the local state files
    Cleanup {
        /// Skip confirmation prompt
        #[arg(long)]
        auto_approve: bool,
    },
}

#[derive(Subcommand)]
enum WordlistCommands {
    /// List all uploaded wordlists
    List,
    /// Upload a wordlist
    Upload {
        /// Path to the wordlist file
        #[arg(short)]
        f: PathBuf,
    },
}

#[derive(Subcommand)]
enum CrackCommands {
    /// Initiate a new cracking job
    Initiate {
        /// Path to the file to crack
        #[arg(short)]
        f: PathBuf,

        /// Name of the wordlist to use for cracking
        #[arg(short)]
        w: String,

        /// Additional hashcat options
        #[arg(long)]
        options: String,
    },
    /// Check cracking job status
    Status,
    /// Get the result from a completed cracking job
    Result {
        /// File to get the results for
        #[arg(short)]
        f: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Setup { command } => match command {
            SetupCommands::Create => run_setup_create().await,
            SetupCommands::Cleanup { auto_approve } => run_setup_cleanup(auto_approve).await,
        },
        Commands::Wordlists { command } => match command {
            WordlistCommands::List => run_wordlists_list().await,
            WordlistCommands::Upload { f } => run_wordlists_upload(&f).await,
        },
        Commands::Crack { command } => match command {
            CrackCommands::Initiate { f, w, options } => run_crack_initiate(&f, &w, &options).await,
            CrackCommands::Status => run_crack_status().await,
            CrackCommands::Result { f } => run_crack_result(&f).await,
        },
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_checkpoint(store: &CheckpointStore) -> ProvisionResult<Checkpoint> {
    store
        .load()?
        .ok_or_else(|| ProvisionError::NotProvisioned("no resources found".to_string()))
}

async fn run_setup_create() -> ProvisionResult<()> {
    let config = ToolConfig::load(ToolConfig::DEFAULT_PATH)?;
    let store = CheckpointStore::new();
    let mut checkpoint = store.load()?.unwrap_or_default();

    if checkpoint.is_empty() {
        println!("{}", "No existing resources found, building environment.".cyan());
    } else {
        println!("{}", "Resuming from existing resources.".cyan());
    }

    let cloud = AwsCloud::new(&config).await;
    let handlers = cloud.handlers(&config);

    converge(&handlers, &mut checkpoint, &store).await?;

    println!("{}", "✓ All resources ready.".green().bold());

    publish_image(&cloud, &checkpoint).await?;

    Ok(())
}

/// Build and push the cracking image when a Docker context directory is
/// present. Setup stays usable on hosts without Docker; the image can be
/// published later by re-running create.
async fn publish_image(cloud: &AwsCloud, checkpoint: &Checkpoint) -> ProvisionResult<()> {
    let context = Path::new(DOCKER_CONTEXT_DIR);
    if !context.is_dir() {
        println!(
            "{}",
            format!(
                "No '{}' directory found; skipping image publish.",
                DOCKER_CONTEXT_DIR
            )
            .yellow()
        );
        return Ok(());
    }

    let repository_uri = checkpoint
        .get(fields::REPOSITORY_URI)
        .ok_or_else(|| ProvisionError::NotProvisioned(fields::REPOSITORY_URI.to_string()))?;

    println!("{}", "Building and pushing the cracking image...".cyan());

    let publisher = ImagePublisher::new(cloud.clone())?;
    let image = publisher.publish(context, repository_uri).await?;

    println!("{}", format!("✓ Image published: {}", image).green().bold());
    Ok(())
}

async fn run_setup_cleanup(auto_approve: bool) -> ProvisionResult<()> {
    let config = ToolConfig::load(ToolConfig::DEFAULT_PATH)?;
    let store = CheckpointStore::new();
    let history = JobHistoryStore::new();

    let Some(mut checkpoint) = store.load()? else {
        println!("{}", "No resources to clean up.".yellow());
        return Ok(());
    };

    if !auto_approve && !confirm_cleanup()? {
        println!("{}", "Cleanup cancelled.".yellow());
        return Ok(());
    }

    println!("{}", "Deleting resources...".red().bold());

    let cloud = AwsCloud::new(&config).await;
    let handlers = cloud.handlers(&config);

    teardown(&handlers, &mut checkpoint, &store, &history).await?;

    println!("{}", "✓ Cleanup complete.".green().bold());
    Ok(())
}

fn confirm_cleanup() -> ProvisionResult<bool> {
    println!(
        "{}",
        "Do you really want to delete all resources?".yellow().bold()
    );
    println!("  {}", "This action cannot be undone. Type 'yes' to confirm.".yellow());
    print!("\n  Enter a value: ");
    std::io::Write::flush(&mut std::io::stdout())
        .map_err(|e| ProvisionError::provider("cleanup", e.to_string()))?;

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .map_err(|e| ProvisionError::provider("cleanup", e.to_string()))?;

    Ok(input.trim() == "yes")
}

async fn run_wordlists_list() -> ProvisionResult<()> {
    let config = ToolConfig::load(ToolConfig::DEFAULT_PATH)?;
    let checkpoint = load_checkpoint(&CheckpointStore::new())?;
    let cloud = AwsCloud::new(&config).await;

    let names = list_wordlists(&cloud, &checkpoint).await?;

    if names.is_empty() {
        println!("{}", "No wordlists uploaded yet.".yellow());
        return Ok(());
    }

    println!("{}", "Available wordlists:".cyan().bold());
    for name in names {
        println!("  • {}", name);
    }
    Ok(())
}

async fn run_wordlists_upload(path: &Path) -> ProvisionResult<()> {
    let config = ToolConfig::load(ToolConfig::DEFAULT_PATH)?;
    let checkpoint = load_checkpoint(&CheckpointStore::new())?;
    let cloud = AwsCloud::new(&config).await;

    let url = upload_wordlist(&cloud, &checkpoint, path).await?;

    println!("{}", format!("✓ Wordlist uploaded to {}", url).green().bold());
    Ok(())
}

async fn run_crack_initiate(input: &Path, wordlist: &str, options: &str) -> ProvisionResult<()> {
    let config = ToolConfig::load(ToolConfig::DEFAULT_PATH)?;
    let checkpoint = load_checkpoint(&CheckpointStore::new())?;
    let history = JobHistoryStore::new();
    let cloud = AwsCloud::new(&config).await;

    let job_id = submit_crack_job(
        &cloud,
        &checkpoint,
        &config,
        &history,
        input,
        wordlist,
        options,
    )
    .await?;

    println!(
        "{}",
        format!("✓ Cracking job submitted (id: {}).", job_id).green().bold()
    );
    Ok(())
}

async fn run_crack_status() -> ProvisionResult<()> {
    let config = ToolConfig::load(ToolConfig::DEFAULT_PATH)?;
    let history = JobHistoryStore::new();
    let cloud = AwsCloud::new(&config).await;

    let rows = job_status(&cloud, &history).await?;

    if rows.is_empty() {
        println!("{}", "No jobs submitted yet.".yellow());
        return Ok(());
    }

    print_status_table(&rows);
    Ok(())
}

fn colorize_status(status: &str, width: usize) -> String {
    let padded = format!("{:<width$}", status, width = width);
    match status {
        "SUCCEEDED" => padded.green().to_string(),
        "FAILED" => padded.red().to_string(),
        "RUNNING" => padded.cyan().to_string(),
        _ => padded,
    }
}

fn print_status_table(rows: &[StatusRow]) {
    let file_width = rows
        .iter()
        .map(|r| r.file.len())
        .chain(["Hash File".len()].into_iter())
        .max()
        .unwrap_or(0);
    let status_width = rows
        .iter()
        .map(|r| r.status.len())
        .chain(["Status".len()].into_iter())
        .max()
        .unwrap_or(0);

    println!(
        "{:<file_width$}  {:<status_width$}  {}",
        "Hash File".bold(),
        "Status".bold(),
        "Runtime".bold(),
        file_width = file_width,
        status_width = status_width,
    );

    for row in rows {
        println!(
            "{:<file_width$}  {}  {}",
            row.file,
            colorize_status(&row.status, status_width),
            row.runtime,
            file_width = file_width,
        );
    }
}

async fn run_crack_result(file: &str) -> ProvisionResult<()> {
    let config = ToolConfig::load(ToolConfig::DEFAULT_PATH)?;
    let checkpoint = load_checkpoint(&CheckpointStore::new())?;
    let cloud = AwsCloud::new(&config).await;

    // Accept either a bare name or the original path given to initiate
    let name = file.rsplit('/').next().unwrap_or(file);

    match fetch_result(&cloud, &checkpoint, name).await? {
        Some(content) => {
            println!("{}", format!("Cracked results for '{}':", name).green().bold());
            println!("{}", content);
        }
        None => {
            println!(
                "{}",
                format!(
                    "No results for '{}' yet; it lands under '{}/' when the job completes.",
                    name,
                    job::CRACKED_PREFIX
                )
                .yellow()
            );
        }
    }
    Ok(())
}
