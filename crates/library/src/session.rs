//! One reconstruction run over one export.

use crate::assemble::{self, Assembler};
use crate::error::{ErrorKind, Result};
use crate::output::{self, OutputLayout};
use crate::progress::{Phase, Progress};
use crate::rehome;
use crate::restore::{self, Restorer};
use exhume_archive::{Layout, Source};
use exhume_config::Config;
use exhume_descriptor::Descriptor;
use exhume_render::{DocumentExporter, NoResources, ResourceLocator};
use exhume_storage::fs as local;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// An opened export and where its reconstruction goes.
///
/// The phases are [`Site::restore`], [`Site::rehome`] and
/// [`Site::transform`], meant to run in that order. Each reports progress
/// through the callback it is given.
pub struct Site {
    source: Source,
    entries: Vec<String>,
    layout: Layout,
    descriptor: Option<Descriptor>,
    output: OutputLayout,
    config: Config,
    resources: Box<dyn ResourceLocator>,
    exporter: Option<Box<dyn DocumentExporter>>,
}

/// Fills descriptor gaps from every standalone page document. A document
/// that cannot be read or parsed is logged and skipped.
fn merge_page_documents(source: &mut Source, pages: &[String], descriptor: &mut Descriptor) {
    let mut merged = 0;
    for name in pages {
        let result = source
            .read(name)
            .or_raise(|| ErrorKind::Open(PathBuf::from(name)))
            .and_then(|bytes| descriptor.merge_page_document(&bytes).or_raise(|| ErrorKind::Open(PathBuf::from(name))));
        match result {
            Ok(Some(_)) => merged += 1,
            Ok(None) => debug!(document = %name, "page document names no page"),
            Err(err) => warn!(document = %name, error = ?err, "page document skipped"),
        }
    }
    if !pages.is_empty() {
        info!(documents = pages.len(), merged, "page documents merged");
    }
}

impl Site {
    /// Opens `input` (a zip archive or an extracted directory) and parses its
    /// descriptor. Without an `output` root, one is derived from the input's
    /// location and the space key.
    #[instrument(skip_all, fields(input = %input.as_ref().display()))]
    pub fn open(input: impl AsRef<Path>, output: Option<PathBuf>, config: Config) -> Result<Self> {
        let input = input.as_ref();
        let mut source = Source::open(input).or_raise(|| ErrorKind::Open(input.to_path_buf()))?;
        let entries = source.entries().or_raise(|| ErrorKind::Open(input.to_path_buf()))?;
        let layout = Layout::discover(&entries);

        let mut descriptor = match layout.descriptor.as_deref() {
            Some(name) => {
                let bytes = source.read(name).or_raise(|| ErrorKind::Open(input.to_path_buf()))?;
                Some(exhume_descriptor::parse(&bytes))
            },
            None if !layout.pages.is_empty() => Some(Descriptor::default()),
            None => {
                warn!("no descriptor in export; attachments will keep id-based names");
                None
            },
        };
        if let Some(descriptor) = descriptor.as_mut() {
            merge_page_documents(&mut source, &layout.pages, descriptor);
        }
        if layout.attachments.is_none() {
            warn!("no attachment root in export; nothing to restore");
        }

        let space = descriptor.as_ref().map(Descriptor::space_key).unwrap_or(exhume_descriptor::UNKNOWN_SPACE);
        let root = output.unwrap_or_else(|| output::default_root(input, space, output::now()));
        info!(root = %root.display(), space = %space, entries = entries.len(), "export opened");

        Ok(Self {
            output: OutputLayout::new(root, &config.layout),
            source,
            entries,
            layout,
            descriptor,
            config,
            resources: Box::new(NoResources),
            exporter: None,
        })
    }

    pub fn with_resources(mut self, resources: impl ResourceLocator + 'static) -> Self {
        self.resources = Box::new(resources);
        self
    }

    pub fn with_exporter(mut self, exporter: impl DocumentExporter + 'static) -> Self {
        self.exporter = Some(Box::new(exporter));
        self
    }

    pub fn descriptor(&self) -> Option<&Descriptor> {
        self.descriptor.as_ref()
    }

    pub fn output(&self) -> &OutputLayout {
        &self.output
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn create_root(&self) -> Result<()> {
        local::create_dir_all(&self.output.root).or_raise(|| ErrorKind::OutputRoot(self.output.root.clone()))
    }

    /// Restores every attachment entry. A dry run resolves every name but
    /// writes nothing, not even the output root.
    #[instrument(skip_all, fields(dry_run = dry_run))]
    pub fn restore(&mut self, dry_run: bool, progress: &mut dyn FnMut(Progress)) -> Result<restore::Summary> {
        if !dry_run {
            self.create_root()?;
        }
        let entries: Vec<(String, String)> = self
            .layout
            .attachment_entries(&self.entries)
            .into_iter()
            .map(|(name, relative)| (name.to_string(), relative.to_string()))
            .collect();

        let empty = Descriptor::default();
        let descriptor = self.descriptor.as_ref().unwrap_or(&empty);
        let mut restorer = Restorer::new(descriptor, &self.output, dry_run)
            .with_sidecars(self.config.restore.sidecars)
            .with_skip_archives(self.config.restore.skip_archives)
            .with_normalize_names(self.config.restore.normalize_names);

        let mut summary = restore::Summary::default();
        let total = entries.len();
        for (done, (name, relative)) in entries.iter().enumerate() {
            match self.source.read(name) {
                Ok(data) => match restorer.restore(relative, &data) {
                    Ok(outcome) => summary.record(&outcome),
                    Err(err) => {
                        warn!(entry = %relative, error = ?err, "entry not restored");
                        summary.failed += 1;
                    },
                },
                Err(err) => {
                    warn!(entry = %relative, error = ?err, "cannot read entry");
                    summary.failed += 1;
                },
            }
            progress(Progress::of(Phase::Restore, done + 1, total));
        }
        if total == 0 {
            progress(Progress::of(Phase::Restore, 0, 0));
        }
        info!(
            restored = summary.restored,
            planned = summary.planned,
            skipped = summary.skipped,
            failed = summary.failed,
            "restore finished"
        );
        Ok(summary)
    }

    /// Moves restored attachments that carry markers into their page folders.
    pub fn rehome(&mut self, progress: &mut dyn FnMut(Progress)) -> Result<rehome::Summary> {
        let summary = rehome::rehome(&self.output.attachments, |done, total| {
            progress(Progress::of(Phase::Rehome, done, total));
        })
        .or_raise(|| ErrorKind::Rehome)?;
        progress(Progress::of(Phase::Rehome, 1, 1));
        Ok(summary)
    }

    /// Writes every page document and the navigation index, then reports
    /// completion.
    pub fn transform(&mut self, progress: &mut dyn FnMut(Progress)) -> Result<assemble::Summary> {
        let Some(descriptor) = self.descriptor.as_ref() else {
            exn::bail!(ErrorKind::NoDescriptor);
        };
        self.create_root()?;
        let mut assembler = Assembler::new(descriptor, &self.output, &self.config, self.resources.as_ref());
        if let Some(exporter) = self.exporter.as_deref_mut() {
            assembler = assembler.with_exporter(exporter);
        }
        let summary = assembler.run(progress).or_raise(|| ErrorKind::Transform)?;
        progress(Progress::complete());
        Ok(summary)
    }
}
