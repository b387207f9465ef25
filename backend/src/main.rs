//! metabolon2maf CLI - Convert Metabolon spreadsheets to MAF tables
//!
//! # Main Commands
//!
//! ```bash
//! metabolon2maf convert study.xlsx -o m_maf.tsv   # Convert a sheet
//! metabolon2maf serve                             # Start HTTP server (port 3000)
//! metabolon2maf cache list                        # Manage cached lookups
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! metabolon2maf inspect study.xlsx            # Row roles, samples, planned splits
//! metabolon2maf split "PC(16:0/18:1)/serine"  # Show a compound-name split decision
//! metabolon2maf resolve --hint HMDB06029      # Run one identifier lookup
//! metabolon2maf headers                       # Show the destination headers
//! ```

use clap::{Parser, Subcommand};
use metabolon2maf::{
    annotate, collect_sample_columns, convert_file, convert_grid, grid_to_tsv, load_grid,
    plan_splits, split_compound_name, AppState, CompoundNameSplit, IdentifierResolver,
    LookupBackend, LookupCache, MafConfig, RowRole, StandardHeaderProvider,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "metabolon2maf")]
#[command(about = "Convert Metabolon metabolomics spreadsheets to MAF tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full conversion: sheet → split rows → resolved MAF table
    Convert {
        /// Input workbook (xlsx, xls, ods) or delimited text
        input: PathBuf,

        /// Output MAF file (default: TSV on stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (default: embedded MetaboLights MS headers)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Skip identifier lookups entirely
        #[arg(long)]
        offline: bool,

        /// Don't read or write the lookup cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Show row roles, sample columns and planned splits without converting
    Inspect {
        /// Input workbook or delimited text
        input: PathBuf,
    },

    /// Show how a compound name would be split
    Split {
        /// Compound name, e.g. "glucose/fructose"
        name: String,
    },

    /// Resolve one compound to a database identifier
    Resolve {
        /// Database hint (HMDB or KEGG id)
        #[arg(long)]
        hint: Option<String>,

        /// Compound name
        #[arg(long)]
        name: Option<String>,

        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Skip identifier lookups entirely
        #[arg(long)]
        offline: bool,
    },

    /// Show the destination standard headers
    Headers {
        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Skip identifier lookups entirely
        #[arg(long)]
        offline: bool,
    },

    /// Manage the identifier lookup cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cached lookups
    List,

    /// Delete every cached lookup
    Clear,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            config,
            offline,
            no_cache,
        } => cmd_convert(&input, output.as_deref(), config.as_deref(), offline, no_cache).await,

        Commands::Inspect { input } => cmd_inspect(&input),

        Commands::Split { name } => cmd_split(&name),

        Commands::Resolve {
            hint,
            name,
            config,
            offline,
        } => cmd_resolve(hint.as_deref(), name.as_deref(), config.as_deref(), offline).await,

        Commands::Headers { config } => cmd_headers(config.as_deref()),

        Commands::Serve {
            port,
            config,
            offline,
        } => cmd_serve(port, config.as_deref(), offline).await,

        Commands::Cache { action } => cmd_cache(action),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
    offline: bool,
    no_cache: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let config = MafConfig::resolve(config_path)?;
    let backend = LookupBackend::from_config(&config, offline, no_cache);
    eprintln!("   Lookup: {}", backend.describe());
    let resolver = IdentifierResolver::new(backend);

    let result = match output {
        Some(path) => convert_file(input, path, &config, &resolver).await?,
        None => {
            let source = load_grid(input)?;
            let result = convert_grid(source, &config.standard_headers(), &resolver).await;
            print!("{}", grid_to_tsv(&result.table)?);
            result
        }
    };

    resolver.service().flush()?;

    let stats = &result.stats;
    eprintln!("\n📊 Summary:");
    eprintln!("   Compound rows:   {}", stats.source_data_rows);
    eprintln!("   Split rows:      {}", stats.split_rows);
    eprintln!("   MAF rows:        {}", stats.destination_rows);
    eprintln!("   Samples:         {}", result.sample_columns.len());
    eprintln!("   By database id:  {}", stats.resolved_by_external_id);
    eprintln!("   By name:         {}", stats.resolved_by_name);
    eprintln!("   Unresolved:      {}", stats.unresolved);
    if !result.issues.is_empty() {
        eprintln!("   ⚠️  Empty cells:  {}", result.issues.len());
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_inspect(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("🔍 Inspecting: {}", input.display());

    let mut grid = load_grid(input)?;
    annotate(&mut grid);

    println!("Rows: {} ({} columns)", grid.row_count(), grid.width());
    for (index, role) in (0..grid.row_count().min(5)).map(|i| (i, metabolon2maf::classify(i))) {
        println!("  [{}] {}", index, role);
    }
    let data_rows = grid.row_count().saturating_sub(5);
    println!("  {} {} rows", data_rows, RowRole::Data);

    let samples = collect_sample_columns(&grid);
    println!("\nSample columns ({}):", samples.len());
    for sample in &samples {
        println!("  {}", sample);
    }

    let plan = plan_splits(&grid);
    println!("\nPlanned splits ({}):", plan.len());
    for split in &plan {
        println!("  row {}: {} | {}", split.row, split.first, split.second);
    }

    Ok(())
}

fn cmd_split(name: &str) -> Result<(), Box<dyn std::error::Error>> {
    match split_compound_name(name) {
        CompoundNameSplit::Split(first, second) => {
            println!("split");
            println!("  1: {}", first);
            println!("  2: {}", second);
        }
        CompoundNameSplit::NoSplit => println!("no split"),
    }
    Ok(())
}

async fn cmd_resolve(
    hint: Option<&str>,
    name: Option<&str>,
    config_path: Option<&Path>,
    offline: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if hint.is_none() && name.is_none() {
        return Err("Give --hint, --name or both".into());
    }

    let config = MafConfig::resolve(config_path)?;
    let backend = LookupBackend::from_config(&config, offline, false);
    eprintln!("🔎 Lookup: {}", backend.describe());
    let resolver = IdentifierResolver::new(backend);

    for step in resolver.plan(hint, name) {
        eprintln!("   → {:?}", step);
    }

    let resolution = resolver.resolve_traced(hint, name).await;
    resolver.service().flush()?;

    println!("{}", serde_json::to_string_pretty(&resolution)?);
    Ok(())
}

fn cmd_headers(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = MafConfig::resolve(config_path)?;
    // Element 0 is the row-label placeholder
    for (index, header) in config.standard_headers().iter().enumerate().skip(1) {
        println!("{:2}  {}", index - 1, header);
    }
    Ok(())
}

async fn cmd_serve(
    port: u16,
    config_path: Option<&Path>,
    offline: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = MafConfig::resolve(config_path)?;
    let backend = LookupBackend::from_config(&config, offline, false);
    metabolon2maf::server::start_server(port, AppState::new(&config, backend)).await
}

fn cmd_cache(action: CacheAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = MafConfig::resolve(None)?;
    let mut cache = LookupCache::with_dir(&config.cache.dir);

    match action {
        CacheAction::List => {
            let entries = cache.list();
            if entries.is_empty() {
                eprintln!("📋 No cached lookups in {}", cache.dir().display());
                return Ok(());
            }

            eprintln!("📋 Cached lookups ({}):\n", entries.len());
            for entry in entries {
                let answer = entry
                    .record
                    .as_ref()
                    .and_then(|r| r.identifier.as_deref())
                    .unwrap_or("(no match)");
                println!("  {} → {}", entry.key, answer);
                println!("     Cached: {}", entry.cached_at);
                println!("     Hits: {}", entry.hits);
                if let Some(ref last) = entry.last_used {
                    println!("     Last used: {}", last);
                }
            }
        }

        CacheAction::Clear => {
            let removed = cache.clear()?;
            eprintln!("🗑️  Removed {} cached lookups", removed);
        }
    }

    Ok(())
}
