mod cli;
mod report;

use crate::cli::{Cli, Reporter};
use crate::report::Failure;
use clap::Parser;
use exhume_config::Config;
use exhume_library::{Progress, Site};
use exhume_render::{DirectoryResources, TextExporter};
use miette::IntoDiagnostic;
use tracing::{info, warn};

fn report<E: std::error::Error + Send + Sync + 'static>(err: exn::Exn<E>) -> Failure {
    Failure::from_exn(&err)
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_env_filter(cli.filter()).with_target(false).init();
    if !exhume_archive::SNIFFING {
        warn!("built without content sniffing; extensions come from names only");
    }

    let config = Config::load(cli.config.as_deref()).map_err(report)?;
    let mut site = Site::open(&cli.input, cli.output.clone(), config).map_err(report)?;
    if let Some(dir) = &cli.resources {
        site = site.with_resources(DirectoryResources::new(dir));
    }
    if let Some(dir) = &cli.export_text {
        site = site.with_exporter(TextExporter::new(dir));
    }

    let mut reporter = Reporter::default();
    let mut progress = |p: Progress| reporter.report(p);
    let restored = site.restore(cli.dry_run, &mut progress).map_err(report)?;
    if cli.dry_run {
        info!(planned = restored.planned, skipped = restored.skipped, "dry run finished; nothing written");
        return Ok(());
    }
    if !cli.no_rehome {
        site.rehome(&mut progress).map_err(report)?;
    }
    if !cli.no_transform {
        let summary = site.transform(&mut progress).map_err(report)?;
        info!(pages = summary.pages, misses = summary.misses, "site written");
    }

    let root = std::path::absolute(&site.output().root).into_diagnostic()?;
    info!(root = %root.display(), "done");
    Ok(())
}
