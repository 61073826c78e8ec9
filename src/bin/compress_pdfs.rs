use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use pdf_squeeze::domains::batch::BatchRunner;
use pdf_squeeze::domains::compression::{CompressionLevel, PdfCompressor};
use pdf_squeeze::domains::settings::CompressorConfig;
use pdf_squeeze::logging::init_logging;
use pdf_squeeze::utils::format_file_size;

const USAGE: &str = "Usage: compress_pdfs <input_dir> <output_dir> [low|medium|high] [config.json]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 2 || args.iter().any(|arg| arg == "-h" || arg == "--help") {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    }

    let input_dir = PathBuf::from(&args[0]);
    let output_dir = PathBuf::from(&args[1]);
    let level = args.get(2).map(|raw| raw.parse::<CompressionLevel>()).transpose()?;
    let config_path = args.get(3).map(PathBuf::from);

    let config = Arc::new(CompressorConfig::load(config_path.as_deref())?);
    init_logging(&config.log_level);

    let compressor = PdfCompressor::new(config.clone(), level).await?;
    log::info!("Compressor settings: {}", serde_json::to_string(&compressor.describe())?);

    let runner = BatchRunner::new(compressor, config);
    let stats = runner.run(&input_dir, &output_dir).await?;

    let stats_path = output_dir.join("stats.json");
    stats.save_json(&stats_path).await?;

    println!("PDF compression finished ({} level)", stats.compression_level);
    println!("  files found:     {}", stats.files_found);
    println!("  processed:       {}", stats.files_processed);
    println!("  failed:          {}", stats.files_failed);
    println!("  skipped:         {}", stats.files_skipped);
    println!(
        "  size:            {} -> {}",
        format_file_size(stats.total_size_before),
        format_file_size(stats.total_size_after)
    );
    println!("  saved:           {:.1}%", stats.percent_saved());
    for failure in &stats.errors {
        println!("  ! {}: {}", failure.file_name, failure.message);
    }
    println!("  statistics:      {}", stats_path.display());

    if stats.has_failures() {
        std::process::exit(1);
    }
    Ok(())
}
