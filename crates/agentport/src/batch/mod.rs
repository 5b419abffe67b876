//! Batch driver: discovery, concurrent per-file conversion, preview/commit,
//! and the optional agents index.
//!
//! A driver handles exactly one run. Per-file failures are collected in the
//! [`ConversionReport`]; only discovery problems abort the run.

pub mod discover;
pub mod index;
pub mod report;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::convert::{ConvertOptions, Converted, convert_record};
use crate::error::{ConvertError, Result};
use crate::inference::InferenceTables;
use crate::parser::DefinitionParser;
use crate::parser::agent_md::AgentMarkdownParser;

pub use discover::{Candidate, discover, scan_root};
pub use index::render_index;
pub use report::{ConversionFailure, ConversionReport, ConvertedEntry};

pub const DEFAULT_INDEX_NAME: &str = "agents_index.md";
pub const DEFAULT_GROUPS_DIR: &str = "plugins";
pub const DEFAULT_DEFINITIONS_DIR: &str = "agents";
pub const DEFAULT_EXTENSION: &str = "md";
pub const DEFAULT_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Report targets and conflicts; write nothing.
    Preview,
    Commit,
}

#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub source_root: PathBuf,
    pub output_root: PathBuf,
    pub mode: Mode,
    /// Write `<output_root>/<index_name>` after a commit run.
    pub write_index: bool,
    pub index_name: String,
    pub groups_dir: String,
    pub definitions_dir: String,
    pub extension: String,
    /// Max files read and converted at once.
    pub concurrency: usize,
}

impl BatchSettings {
    pub fn new(source_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            output_root: output_root.into(),
            mode: Mode::Commit,
            write_index: false,
            index_name: DEFAULT_INDEX_NAME.to_string(),
            groups_dir: DEFAULT_GROUPS_DIR.to_string(),
            definitions_dir: DEFAULT_DEFINITIONS_DIR.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn target_for(&self, identifier: &str) -> PathBuf {
        self.output_root.join(format!("{identifier}.json"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Idle,
    Discovering,
    Converting,
    Previewing,
    Writing,
    IndexWriting,
    Done,
}

pub struct BatchDriver {
    settings: BatchSettings,
    tables: Arc<InferenceTables>,
    options: Arc<ConvertOptions>,
    phase: BatchPhase,
}

impl BatchDriver {
    pub fn new(settings: BatchSettings, tables: InferenceTables, options: ConvertOptions) -> Self {
        Self {
            settings,
            tables: Arc::new(tables),
            options: Arc::new(options),
            phase: BatchPhase::Idle,
        }
    }

    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    fn enter(&mut self, next: BatchPhase) {
        tracing::debug!(from = ?self.phase, to = ?next, "batch phase");
        self.phase = next;
    }

    /// Run the batch to completion. Consumes the driver.
    pub async fn run(mut self) -> Result<ConversionReport> {
        let mut report = ConversionReport::new(self.settings.mode);

        self.enter(BatchPhase::Discovering);
        let candidates = discover(&self.settings)?;
        report.discovered = candidates.len();
        tracing::info!(
            count = candidates.len(),
            root = %self.settings.source_root.display(),
            "discovered agent definitions"
        );

        self.enter(BatchPhase::Converting);
        let (converted, failures) = self.convert_all(candidates).await;
        report.failures = failures;

        for c in &converted {
            let target = self.settings.target_for(&c.record.name);
            if tokio::fs::try_exists(&target).await.unwrap_or(false) {
                report.conflicts.push(target);
            }
        }

        match self.settings.mode {
            Mode::Preview => {
                self.enter(BatchPhase::Previewing);
                report.records = converted.into_iter().map(|c| self.entry(c)).collect();
                if self.settings.write_index {
                    tracing::info!("preview mode: index not written");
                }
            }
            Mode::Commit => {
                self.enter(BatchPhase::Writing);
                let out = self.settings.output_root.clone();
                if let Err(source) = tokio::fs::create_dir_all(&out).await {
                    // every record shares the root, so each one fails with the same cause
                    let reason = ConvertError::Write {
                        path: out.clone(),
                        source,
                    }
                    .to_string();
                    tracing::warn!("cannot create output root: {}", reason);
                    for c in converted {
                        report.failures.push(ConversionFailure {
                            identifier: c.record.name,
                            reason: reason.clone(),
                        });
                    }
                } else {
                    for c in converted {
                        let entry = self.entry(c);
                        match write_record(&entry).await {
                            Ok(()) => {
                                report.written += 1;
                                report.records.push(entry);
                            }
                            Err(e) => {
                                tracing::warn!(identifier = %entry.record.name, error = %e, "write failed");
                                report.failures.push(ConversionFailure {
                                    identifier: entry.record.name.clone(),
                                    reason: e.to_string(),
                                });
                            }
                        }
                    }
                    if self.settings.write_index {
                        self.enter(BatchPhase::IndexWriting);
                        let path = out.join(&self.settings.index_name);
                        match tokio::fs::write(&path, render_index(&report.records)).await {
                            Ok(()) => report.index_path = Some(path),
                            Err(e) => {
                                tracing::warn!("failed to write index {}: {}", path.display(), e);
                                report.failures.push(ConversionFailure {
                                    identifier: self.settings.index_name.clone(),
                                    reason: ConvertError::Write { path, source: e }.to_string(),
                                });
                            }
                        }
                    }
                }
            }
        }

        report.failures.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        self.enter(BatchPhase::Done);
        tracing::info!("{}", report.summary());
        Ok(report)
    }

    fn entry(&self, c: Converted) -> ConvertedEntry {
        let target = self.settings.target_for(&c.record.name);
        ConvertedEntry {
            record: c.record,
            category: c.category,
            target,
        }
    }

    /// One task per file, bounded by a semaphore; results sorted by identifier.
    async fn convert_all(
        &self,
        candidates: Vec<Candidate>,
    ) -> (Vec<Converted>, Vec<ConversionFailure>) {
        let permits = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let mut pending: BTreeSet<String> = BTreeSet::new();
        let mut set = JoinSet::new();
        for cand in candidates {
            let label = cand.label();
            pending.insert(label.clone());
            let permits = permits.clone();
            let tables = self.tables.clone();
            let options = self.options.clone();
            set.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => convert_file(&cand, &tables, &options).await,
                    Err(e) => Err(ConvertError::ConversionFailed {
                        identifier: label.clone(),
                        reason: e.to_string(),
                    }),
                };
                (label, result)
            });
        }

        let mut converted = Vec::new();
        let mut failures = Vec::new();
        while let Some(res) = set.join_next().await {
            match res {
                Ok((identifier, Ok(c))) => {
                    pending.remove(&identifier);
                    converted.push(c);
                }
                Ok((identifier, Err(e))) => {
                    pending.remove(&identifier);
                    tracing::warn!("skipping {}: {}", identifier, e);
                    failures.push(ConversionFailure {
                        identifier,
                        reason: e.to_string(),
                    });
                }
                Err(e) => tracing::warn!("conversion task failed: {}", e),
            }
        }
        // tasks that panicked or were cancelled never reported back
        for identifier in pending {
            failures.push(ConversionFailure {
                identifier,
                reason: "conversion task did not complete".to_string(),
            });
        }

        converted.sort_by(|a, b| a.record.name.cmp(&b.record.name));
        failures.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        (converted, failures)
    }
}

async fn convert_file(
    cand: &Candidate,
    tables: &InferenceTables,
    options: &ConvertOptions,
) -> Result<Converted> {
    tracing::debug!("converting {}", cand.path.display());
    if cand.identifier.is_empty() {
        return Err(ConvertError::ConversionFailed {
            identifier: cand.label(),
            reason: "file name has no usable characters for an identifier".to_string(),
        });
    }
    let content = tokio::fs::read_to_string(&cand.path)
        .await
        .map_err(|source| ConvertError::Read {
            path: cand.path.clone(),
            source,
        })?;
    let source = AgentMarkdownParser::parse(&cand.identifier, &content)?;
    convert_record(&source, tables, options)
}

async fn write_record(entry: &ConvertedEntry) -> Result<()> {
    let json = entry.record.to_json()?;
    write_file(&entry.target, json.as_bytes()).await
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| ConvertError::Write {
            path: path.to_path_buf(),
            source,
        })
}
