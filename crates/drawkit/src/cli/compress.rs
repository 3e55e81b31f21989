//! The `drawkit compress` command: batch background compression.

use base64::Engine as _;
use clap::{Args, ValueEnum};
use drawkit_core::pipeline::{DiscoveredFile, FileDiscovery};
use drawkit_core::{
    BackgroundCompressor, CompressionReport, Config, ImageSource, OutputFormat, Quality,
    ReportFormat, ReportWriter,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Arguments for the `compress` command.
#[derive(Args, Debug)]
pub struct CompressArgs {
    /// Image file or directory to compress
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output directory (defaults to output.dir from config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Encoder quality, 0-100 (defaults to output.quality from config)
    #[arg(short, long)]
    pub quality: Option<u32>,

    /// Output image format (defaults to output.format from config)
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Number of parallel workers (defaults to processing.parallel_workers)
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Write a per-image report to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value = "json")]
    pub report_format: ReportFormatArg,

    /// Print the result as a base64 data URI instead of writing a file
    #[arg(long)]
    pub base64: bool,
}

/// Output image format for CLI args.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Png,
    #[value(alias = "jpg")]
    Jpeg,
    Webp,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Jpeg => OutputFormat::Jpeg,
            FormatArg::Webp => OutputFormat::WebP,
        }
    }
}

/// Report format for CLI args.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReportFormatArg {
    Json,
    Jsonl,
}

impl From<ReportFormatArg> for ReportFormat {
    fn from(arg: ReportFormatArg) -> Self {
        match arg {
            ReportFormatArg::Json => ReportFormat::Json,
            ReportFormatArg::Jsonl => ReportFormat::JsonLines,
        }
    }
}

/// Execute the compress command.
pub async fn execute(args: CompressArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(format) = args.format {
        config.output.format = format.into();
    }
    if let Some(parallel) = args.parallel {
        config.processing.parallel_workers = parallel.max(1);
    }
    let quality = args.quality.unwrap_or(config.output.quality);
    // Reject bad quality before touching any files
    Quality::new(quality)?;

    let discovery = FileDiscovery::new(config.processing.clone());
    let files = discovery.discover(&args.input);
    if files.is_empty() {
        anyhow::bail!("No supported images found at {:?}", args.input);
    }

    let compressor = Arc::new(BackgroundCompressor::new(&config));

    if args.base64 {
        return print_data_uri(compressor, files, quality).await;
    }

    let out_dir = args.output.clone().unwrap_or_else(|| config.output_dir());
    std::fs::create_dir_all(&out_dir)?;

    tracing::info!(
        "Compressing {} image(s) ({:.1} MB) to {:?}",
        files.len(),
        FileDiscovery::total_size(&files) as f64 / 1_000_000.0,
        out_dir
    );

    let summary = compress_all(
        compressor,
        files,
        Arc::new(out_dir),
        quality,
        config.processing.parallel_workers,
    )
    .await;

    if let Some(report_path) = &args.report {
        write_report(report_path, args.report_format.into(), &summary.reports)?;
        tracing::info!("Report written to {:?}", report_path);
    }

    print_summary(&summary);
    if summary.reports.is_empty() {
        anyhow::bail!("All {} image(s) failed", summary.failed);
    }
    Ok(())
}

struct BatchSummary {
    reports: Vec<CompressionReport>,
    failed: u64,
    input_bytes: u64,
    elapsed: std::time::Duration,
}

/// Compress every file with at most `workers` pipeline calls in flight.
async fn compress_all(
    compressor: Arc<BackgroundCompressor>,
    files: Vec<DiscoveredFile>,
    out_dir: Arc<PathBuf>,
    quality: u32,
    workers: usize,
) -> BatchSummary {
    let progress = create_progress_bar(files.len() as u64);
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let input_bytes = FileDiscovery::total_size(&files);
    let start_time = std::time::Instant::now();

    let mut tasks = JoinSet::new();
    for file in files {
        let compressor = compressor.clone();
        let semaphore = semaphore.clone();
        let out_dir = out_dir.clone();
        tasks.spawn(run_bounded(semaphore, compressor, file, out_dir, quality));
    }

    let mut reports = Vec::new();
    let mut failed: u64 = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(report)) => reports.push(report),
            Ok(Err(e)) => {
                failed += 1;
                tracing::error!("Failed: {}", e);
            }
            Err(e) => {
                failed += 1;
                tracing::error!("Compression task panicked: {e}");
            }
        }

        progress.inc(1);
        let elapsed = start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            let done = reports.len() as u64 + failed;
            progress.set_message(format!("{:.1} img/sec", done as f64 / elapsed));
        }
    }
    progress.finish_and_clear();

    // Completion order is arbitrary; reports follow input order
    reports.sort_by(|a, b| a.source.cmp(&b.source));

    BatchSummary {
        reports,
        failed,
        input_bytes,
        elapsed: start_time.elapsed(),
    }
}

async fn run_bounded(
    semaphore: Arc<Semaphore>,
    compressor: Arc<BackgroundCompressor>,
    file: DiscoveredFile,
    out_dir: Arc<PathBuf>,
    quality: u32,
) -> anyhow::Result<CompressionReport> {
    let _permit = semaphore.acquire_owned().await?;
    let path = file.path;
    let task_path = path.clone();
    tokio::task::spawn_blocking(move || compress_one(&compressor, &task_path, &out_dir, quality))
        .await?
        .map_err(|e| anyhow::anyhow!("{:?}: {}", path, e))
}

/// Run the pipeline on one file and write `<stem>.<ext>` into `out_dir`.
fn compress_one(
    compressor: &BackgroundCompressor,
    path: &Path,
    out_dir: &Path,
    quality: u32,
) -> anyhow::Result<CompressionReport> {
    let source = ImageSource::file(path);
    let background = compressor.process(&source, quality)?;

    let format = compressor.encoder().format();
    let output = output_path(out_dir, path, format);
    std::fs::write(&output, background.bytes.as_bytes())?;
    tracing::debug!("Wrote {:?} ({} bytes)", output, background.bytes.len());

    Ok(CompressionReport::new(path.to_path_buf(), &background, format, quality)
        .with_output(output))
}

fn output_path(out_dir: &Path, input: &Path, format: OutputFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "background".to_string());
    out_dir.join(format!("{}.{}", stem, format.extension()))
}

async fn print_data_uri(
    compressor: Arc<BackgroundCompressor>,
    files: Vec<DiscoveredFile>,
    quality: u32,
) -> anyhow::Result<()> {
    let [file] = files.as_slice() else {
        anyhow::bail!("--base64 takes a single image, found {}", files.len());
    };
    let source = ImageSource::file(&file.path);
    let format = compressor.encoder().format();
    let bytes = tokio::task::spawn_blocking(move || compressor.compress(&source, quality))
        .await??;
    println!("{}", data_uri(format, bytes.as_bytes()));
    Ok(())
}

fn data_uri(format: OutputFormat, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        format.mime_type(),
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

fn write_report(
    path: &Path,
    format: ReportFormat,
    reports: &[CompressionReport],
) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let mut writer = ReportWriter::new(BufWriter::new(file), format, true);
    writer.write_all(reports)?;
    writer.flush()?;
    Ok(())
}

fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after batch compression.
fn print_summary(summary: &BatchSummary) {
    let succeeded = summary.reports.len() as u64;
    let total = succeeded + summary.failed;
    let output_bytes: usize = summary.reports.iter().map(|r| r.encoded_bytes).sum();
    let secs = summary.elapsed.as_secs_f64();
    let rate = if secs > 0.0 { total as f64 / secs } else { 0.0 };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", succeeded);
    if summary.failed > 0 {
        eprintln!("    Failed:       {:>8}", summary.failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", total);
    eprintln!("    Duration:     {:>7.1}s", secs);
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!(
        "    Size:         {:>7.1} MB -> {:.1} MB",
        summary.input_bytes as f64 / 1_000_000.0,
        output_bytes as f64 / 1_000_000.0
    );
    eprintln!("  ====================================");
}
