use cbam_report::config::Config;
use cbam_report::heuristics::MatcherChain;
use cbam_report::pdf_extract::{EvidenceKind, process_evidence};
use cbam_report::snapshot::{ReportSnapshot, update_energy_in_file};
use cbam_report::summary_pdf::SummaryComposer;
use cbam_report::template_fill::TemplateMapper;
use clap::{Parser, Subcommand};
use std::{
    fs,
    path::{Path, PathBuf},
};
use time::OffsetDateTime;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cbam-report",
    version,
    about = "Quarterly CBAM communication workbook and summary generator"
)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = ".config/cbam.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill the communication template from a report snapshot
    Excel {
        /// Report snapshot (TOML)
        snapshot: PathBuf,

        /// Output workbook (default: <export_dir>/<org>_CBAM_<year>_Q<n>.xlsx)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Compose the summary PDF from a report snapshot
    Pdf {
        /// Report snapshot (TOML)
        snapshot: PathBuf,

        /// Output document (default: <export_dir>/<org>_CBAM_<year>_Q<n>.pdf)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Recover energy figures from an invoice PDF
    Extract {
        /// Evidence PDF
        evidence: PathBuf,

        /// What the document is evidence for: electricity, gas or evidence
        #[arg(short, long, default_value = "evidence")]
        kind: EvidenceKind,

        /// Write an accepted figure back into this snapshot's [energy] table
        #[arg(long, value_name = "SNAPSHOT")]
        apply: Option<PathBuf>,
    },
    /// Print the effective template layout
    Layout,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = Config::load_or_default(&cli.config)?;

    // init tracing; RUST_LOG overrides the configured filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.log_filter));
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter(filter)
        .init();

    match cli.command {
        Commands::Excel { snapshot, output } => excel(&cfg, &snapshot, output),
        Commands::Pdf { snapshot, output } => pdf(&cfg, &snapshot, output),
        Commands::Extract {
            evidence,
            kind,
            apply,
        } => extract(&evidence, kind, apply.as_deref()),
        Commands::Layout => {
            print!("{}", cfg.template_layout()?.to_toml()?);
            Ok(())
        }
    }
}

fn excel(
    cfg: &Config,
    snapshot_path: &Path,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = ReportSnapshot::load(snapshot_path)?;
    let layout = cfg.template_layout()?;
    let label = cfg.process_label();
    let destination = output_path(cfg, &snapshot, output, "xlsx")?;

    let summary = TemplateMapper::new(&layout, &label).fill(
        &cfg.template_path,
        &destination,
        &snapshot.period,
        &snapshot.products,
    )?;

    info!(
        rows = summary.rows_written,
        total_direct = summary.totals.direct,
        total_indirect = summary.totals.indirect,
        "EXCEL DONE"
    );
    println!("{}", destination.display());
    Ok(())
}

fn pdf(
    cfg: &Config,
    snapshot_path: &Path,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = ReportSnapshot::load(snapshot_path)?;
    let destination = output_path(cfg, &snapshot, output, "pdf")?;

    let summary = SummaryComposer::new(&cfg.organization).compose(
        &destination,
        &snapshot.period,
        &snapshot.products,
        snapshot.energy.as_ref(),
    )?;

    info!(
        rows = summary.rows_rendered,
        omitted = summary.rows_omitted,
        "PDF DONE"
    );
    println!("{}", destination.display());
    Ok(())
}

fn extract(
    evidence: &Path,
    kind: EvidenceKind,
    apply: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = fs::read(evidence)?;
    let report = process_evidence(&bytes, kind, &MatcherChain::default());
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(snapshot) = apply {
        let updated =
            update_energy_in_file(snapshot, kind, &report.result, OffsetDateTime::now_utc())?;
        info!(snapshot = %snapshot.display(), updated, "APPLY");
    }
    Ok(())
}

/// Explicit output, or `<export_dir>/<org>_CBAM_<year>_Q<n>.<ext>`.
fn output_path(
    cfg: &Config,
    snapshot: &ReportSnapshot,
    output: Option<PathBuf>,
    extension: &str,
) -> std::io::Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path);
    }
    fs::create_dir_all(&cfg.export_dir)?;
    Ok(cfg
        .export_dir
        .join(format!("{}.{extension}", snapshot.export_stem(&cfg.organization))))
}
