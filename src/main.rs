//! tagfill - Fill DOCX templates from JSON data

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::{LevelFilter, info};

use tagfill::{Context, generate};

#[derive(Parser)]
#[command(name = "tagfill")]
#[command(version, about = "Template based DOCX report generation", long_about = None)]
#[command(after_help = "EXAMPLES:
    tagfill template.docx report.docx data.json           Fill template.docx into report.docx
    tagfill -v template.docx out/report.docx data.json    Same, logging every tag decision")]
struct Cli {
    /// Existing DOCX file used as the template
    #[arg(value_name = "TEMPLATE")]
    template: PathBuf,

    /// Generated DOCX file
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// JSON file with text tags, table tags and templates
    #[arg(value_name = "DATA")]
    data: PathBuf,

    /// Fail instead of replacing an existing output file
    #[arg(long)]
    no_overwrite: bool,

    /// Only log warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log every tag decision
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.quiet {
        LevelFilter::Warn
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = env_logger::builder()
        .filter_module("tagfill", level)
        .format_timestamp(None)
        .try_init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> tagfill::Result<()> {
    info!("Using template: {}", cli.template.display());
    info!("Writing to: {}", cli.output.display());

    let start = Instant::now();
    let context = Context::from_json_file(&cli.data)?;
    generate(&cli.template, &cli.output, &context, !cli.no_overwrite)?;
    info!("Finished in {:.3} seconds", start.elapsed().as_secs_f64());
    Ok(())
}
