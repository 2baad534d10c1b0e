use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

// Use library instead of local modules
use service_catalog::{
    assign_ids_in_file, load_remote_snapshot, run, write_run, CsvRowSource, PipelineConfig,
    RowSource,
};

#[derive(Parser)]
#[command(name = "service-catalog")]
#[command(about = "Turn the clinic services sheet into linked JSON collections", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, collect and reconcile a CSV export
    Process {
        /// CSV export of the services sheet
        #[arg(short, long)]
        input: PathBuf,

        /// JSON snapshot of the remote categories (missing file = empty list)
        #[arg(short, long)]
        remote: Option<PathBuf>,

        /// Directory for the JSON collections and the sync report
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// TOML pipeline config
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Give every item of a JSON array a unique id, in place
    AssignIds {
        #[arg(short, long)]
        file: PathBuf,

        /// Smallest id handed out to items without one
        #[arg(long, default_value_t = 1)]
        start_id: i64,

        #[arg(long, default_value = "id")]
        id_field: String,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            remote,
            output,
            config,
        } => run_process(input, remote, output, config),
        Commands::AssignIds {
            file,
            start_id,
            id_field,
        } => run_assign_ids(file, start_id, &id_field),
    }
}

fn run_process(
    input: PathBuf,
    remote: Option<PathBuf>,
    output: PathBuf,
    config: Option<PathBuf>,
) -> Result<()> {
    println!("🗂️  Service Catalog Sync");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = match config {
        Some(path) => PipelineConfig::from_file(&path)?,
        None => PipelineConfig::default(),
    };

    // 1. Load rows
    println!("\n📂 Loading CSV...");
    let source = CsvRowSource::new(&input).with_id_column(&config.columns.id);
    let rows = source.rows()?;
    println!("✓ Loaded {} rows from {}", rows.len(), source.describe());

    // 2. Remote snapshot
    let remote = match remote {
        Some(path) => load_remote_snapshot(&path)?,
        None => Vec::new(),
    };
    println!("✓ Remote snapshot: {} categories", remote.len());

    // 3. Run
    println!("\n🔄 Running pipeline...");
    let result = match run(&rows, &remote, &config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("❌ Run aborted: {}", e);
            std::process::exit(1);
        }
    };

    // 4. Write
    println!("\n💾 Writing output...");
    for path in write_run(&output, &result)? {
        println!("✓ {}", path.display());
    }

    // 5. Report
    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{}", result.report.render());
    println!(
        "✓ {} categories, {} practitioners, {} services, {} links",
        result.categories.len(),
        result.practitioners.len(),
        result.services.len(),
        result.service_practitioners.len()
    );

    if !result.held_services.is_empty() {
        println!("⚠️  {} services held back (unresolved category)", result.held_services.len());
    }

    if result.has_errors() {
        println!("\n⚠️  {} errors:", result.errors.len());
        for error in &result.errors {
            println!("   - {}", error);
        }
    } else {
        println!("✅ No errors");
    }

    Ok(())
}

fn run_assign_ids(file: PathBuf, start_id: i64, id_field: &str) -> Result<()> {
    println!("🔢 Assigning IDs: {}", file.display());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let summary = assign_ids_in_file(&file, id_field, start_id)?;

    println!("  Total items:            {}", summary.total_items);
    println!("  Already had ID:         {}", summary.had_id);
    println!("  Assigned new ID:        {}", summary.assigned_new);
    println!("  Reassigned (conflict):  {}", summary.reassigned_conflicts);
    println!("  Conflicts found:        {}", summary.conflicts_found);
    match summary.max_id {
        Some(max_id) => println!("  Max ID:                 {}", max_id),
        None => println!("  Max ID:                 -"),
    }

    Ok(())
}
