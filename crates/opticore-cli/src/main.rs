use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "opticore")]
#[command(about = "OptiCore - banner generation, product vision and complaint insights", long_about = None)]
struct Cli {
    /// Enable debug logging (otherwise RUST_LOG applies, defaulting to info)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a promotional banner from two product images
    Banner {
        /// First input image
        #[arg(long)]
        image1: PathBuf,
        /// Second input image
        #[arg(long)]
        image2: PathBuf,
        /// Style instruction forwarded to the workflow
        #[arg(long, default_value = "default")]
        prompt: String,
    },
    /// Check a pending banner job
    Status {
        #[arg(long)]
        job_id: String,
    },
    /// Generate product copy from a photo or a hosted image URL
    Describe {
        /// Local image file
        #[arg(long, conflicts_with = "url")]
        image: Option<PathBuf>,
        /// Image URL already hosted somewhere
        #[arg(long)]
        url: Option<String>,
        /// Extra instructions appended to the vision prompt
        #[arg(long, default_value = "")]
        prompt_extra: String,
        /// Basic description to enrich (URL mode only)
        #[arg(long)]
        desc: Option<String>,
    },
    /// Classify a CSV batch of complaints and store the results
    Classify {
        /// CSV file with complaint rows
        #[arg(long)]
        input: PathBuf,
        /// Classify and print, but skip the store
        #[arg(long)]
        dry_run: bool,
    },
    /// Classify and store a single complaint
    Submit {
        /// Complaint text
        #[arg(long)]
        text: String,
        /// Customer DNI, when known
        #[arg(long)]
        dni: Option<i64>,
    },
    /// Summarize stored complaints
    Report {
        /// Keep only these sentiment labels (repeatable)
        #[arg(long)]
        sentiment: Vec<String>,
        /// Inclusive start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Inclusive end date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Banner {
            image1,
            image2,
            prompt,
        } => commands::banner::run(&image1, &image2, &prompt).await?,
        Commands::Status { job_id } => commands::status::run(&job_id).await?,
        Commands::Describe {
            image,
            url,
            prompt_extra,
            desc,
        } => {
            commands::describe::run(image.as_deref(), url.as_deref(), &prompt_extra, desc.as_deref())
                .await?
        }
        Commands::Classify { input, dry_run } => commands::classify::run(&input, dry_run).await?,
        Commands::Submit { text, dni } => commands::submit::run(&text, dni).await?,
        Commands::Report {
            sentiment,
            from,
            to,
        } => commands::report::run(sentiment, from, to).await?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
