//! mgtload CLI - derive MGT codes and export them by segment
//!
//! # Main Commands
//!
//! ```bash
//! mgtload run main.xlsx prefixes.xlsx --mode ALL          # One combined file
//! mgtload run main.xlsx prefixes.xlsx --mode "BY SEGMENT" # One file per segment
//! mgtload run main.xlsx prefixes.xlsx                     # Ask for the mode
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! mgtload derive main.xlsx prefixes.xlsx   # Derived rows as JSON
//! mgtload lookup prefixes.xlsx             # Prefix map as JSON
//! mgtload parse main.xlsx                  # Loaded table as JSON
//! mgtload example-config                   # Default job config
//! ```

use clap::{Parser, Subcommand};
use mgtload::{
    load_inputs, load_table, run, transform_table, ColumnRef, JobConfig, LookupIndex,
    OutputFormat, RunOptions,
};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mgtload")]
#[command(about = "Derive MGT codes from a spreadsheet and export them by segment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct LayoutArgs {
    /// JSON job config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Code column: letter (C) or header:<name>
    #[arg(long)]
    code_column: Option<ColumnRef>,

    /// Segment column in the unmodified main table: letter (D) or header:<name>
    #[arg(long)]
    segment_column: Option<ColumnRef>,
}

impl LayoutArgs {
    fn load(&self) -> Result<JobConfig, Box<dyn std::error::Error>> {
        let mut config = JobConfig::load(self.config.as_deref())?;
        if let Some(ref col) = self.code_column {
            config.code_column = col.clone();
        }
        if let Some(ref col) = self.segment_column {
            config.segment_column = col.clone();
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: load, derive, group by segment, export
    Run {
        /// Main spreadsheet
        main: PathBuf,

        /// Prefix reference table
        lookup: PathBuf,

        /// Export mode: ALL or "BY SEGMENT" (asked interactively if omitted)
        #[arg(short, long)]
        mode: Option<String>,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Output format: xlsx or csv
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Also write the main table with derived columns inserted
        #[arg(long)]
        augmented: Option<PathBuf>,

        /// Write a JSON run report
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Print derived rows as JSON
    Derive {
        main: PathBuf,
        lookup: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the prefix lookup map as JSON
    Lookup {
        lookup: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load a table and print it as JSON
    Parse {
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the default job config
    ExampleConfig,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            main,
            lookup,
            mode,
            layout,
            output_dir,
            format,
            augmented,
            report,
        } => cmd_run(
            &main,
            &lookup,
            mode,
            &layout,
            output_dir,
            format,
            augmented,
            report.as_deref(),
        ),

        Commands::Derive {
            main,
            lookup,
            layout,
            output,
        } => cmd_derive(&main, &lookup, &layout, output.as_deref()),

        Commands::Lookup { lookup, output } => cmd_lookup(&lookup, output.as_deref()),

        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::ExampleConfig => cmd_example_config(),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_run(
    main: &Path,
    lookup: &Path,
    mode: Option<String>,
    layout: &LayoutArgs,
    output_dir: Option<PathBuf>,
    format: Option<OutputFormat>,
    augmented: Option<PathBuf>,
    report: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = layout.load()?;
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    if let Some(format) = format {
        config.output_format = format;
    }

    let options = RunOptions { config, augmented };
    let result = run(main, lookup, &options, || {
        mode.or_else(|| {
            prompt_mode().unwrap_or_else(|e| {
                eprintln!("⚠️  Could not read export mode: {}", e);
                None
            })
        })
    })?;

    if let Some(path) = report {
        fs::write(path, result.to_json()?)?;
        eprintln!("💾 Report written to: {}", path.display());
    }

    eprintln!("\n✨ Processing completed successfully.");
    Ok(())
}

/// Ask for the export mode on stdin. EOF means no selection.
fn prompt_mode() -> io::Result<Option<String>> {
    eprint!("Type 'ALL' for a single file or 'BY SEGMENT' for separate files: ");
    io::stderr().flush()?;

    let mut line = String::new();
    let read = io::stdin().lock().read_line(&mut line)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

fn cmd_derive(
    main: &Path,
    lookup: &Path,
    layout: &LayoutArgs,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = layout.load()?;
    let (table, index) = load_inputs(main, lookup)?;
    let resolved = config.resolve_layout(&table)?;

    let records = transform_table(&table, &index, &resolved);
    eprintln!("⚙️  Derived {} rows", records.len());

    let json = serde_json::to_string_pretty(&records)?;
    write_output(&json, output)
}

fn cmd_lookup(lookup: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Reading lookup table: {}", lookup.display());

    let table = load_table(lookup)?;
    let index = LookupIndex::build(&table)?;
    eprintln!("✅ {} prefixes", index.len());

    let json = serde_json::to_string_pretty(&index.to_json())?;
    write_output(&json, output)
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing: {}", input.display());

    let table = load_table(input)?;
    eprintln!("   Columns: {}", table.width());
    eprintln!("✅ Parsed {} rows", table.row_count());

    let json = serde_json::to_string_pretty(&table)?;
    write_output(&json, output)
}

fn cmd_example_config() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", JobConfig::default().to_json()?);
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
