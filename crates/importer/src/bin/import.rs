use clap::{Parser, Subcommand};
use importer::{CsvExport, CsvImporter, CsvUpload, ImportSummary};
use std::path::PathBuf;
use storage::{
    Database,
    dto::filter::AthleteQuery,
    repository::{AthleteStore, InMemoryAthleteRepository},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ttrank-import")]
#[command(about = "Athlete CSV importer and exporter", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Import athletes from a CSV file
    Csv {
        file: PathBuf,

        /// Check every row without writing to the database
        #[arg(long)]
        validate_only: bool,
    },
    /// Export athletes as CSV
    Export {
        /// Destination file, stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        club: Option<String>,

        #[arg(long)]
        ranking_points: Option<String>,

        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        ordering: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("ttrank_import={},importer={}", log_level, log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Csv {
            file,
            validate_only,
        } => {
            handle_csv_import(file, validate_only, cli.database_url.as_deref()).await?;
        }
        Commands::Export {
            output,
            club,
            ranking_points,
            search,
            ordering,
        } => {
            let query = AthleteQuery {
                club,
                ranking_points,
                search,
                ordering,
            };
            handle_export(query, output, cli.database_url.as_deref()).await?;
        }
    }

    Ok(())
}

async fn connect(database_url: Option<&str>) -> Result<Database, Box<dyn std::error::Error>> {
    let database_url = database_url.ok_or("DATABASE_URL is not set (use --database-url)")?;

    tracing::info!("Connecting to database...");
    Ok(Database::new(database_url).await?)
}

async fn handle_csv_import(
    file: PathBuf,
    validate_only: bool,
    database_url: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Loading CSV from: {}", file.display());

    let content = tokio::fs::read(&file).await?;
    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let upload = CsvUpload::new(filename, content);

    let summary = if validate_only {
        tracing::info!("Validate-only run, nothing will be written to the database");
        let scratch = InMemoryAthleteRepository::new();
        CsvImporter::new(&scratch).import(Some(upload)).await?
    } else {
        let db = connect(database_url).await?;
        let repo = db.athletes();
        CsvImporter::new(&repo).import(Some(upload)).await?
    };

    report(&summary);
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

fn report(summary: &ImportSummary) {
    for error in &summary.errors {
        tracing::warn!("  {}", error);
    }
    tracing::info!(
        "Summary: {} processed, {} succeeded, {} failed",
        summary.total_processed,
        summary.successful,
        summary.failed
    );
}

async fn handle_export(
    query: AthleteQuery,
    output: Option<PathBuf>,
    database_url: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = query.into_filter()?;

    let db = connect(database_url).await?;
    let athletes = db.athletes().list(&filter).await?;
    tracing::info!("Exporting {} athletes", athletes.len());

    let export = CsvExport::new(athletes);
    let written = match output {
        Some(path) => {
            let file = std::fs::File::create(&path)?;
            let written = export.write_to(std::io::BufWriter::new(file))?;
            tracing::info!("Exported to: {}", path.display());
            written
        }
        None => export.write_to(std::io::stdout().lock())?,
    };

    tracing::info!("{} records written", written);

    Ok(())
}
