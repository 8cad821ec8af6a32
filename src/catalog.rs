//! Checkpoint selection over a project.
//!
//! Listing paths match tags with [`TagMatch::Any`]. Paths that act on the
//! selection ([`CheckpointCatalog::download_checkpoint`] and
//! [`CheckpointCatalog::remove_checkpoint`]) match with [`TagMatch::All`].

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::NotebookClient;
use crate::error::Result;
use crate::types::{Checkpoint, CheckpointQuery, NotebookRecord, TagMatch};
use crate::validation::file_stem_for;

/// Non-fatal condition that stops a download or removal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionWarning {
    #[error("no checkpoint matches the given criteria")]
    NoMatch,

    #[error("{} checkpoints match the given criteria ({}); refusing to pick one", .ids.len(), .ids.join(", "))]
    Ambiguous { ids: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded { checkpoint: Checkpoint, path: PathBuf },
    Skipped(SelectionWarning),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed(Checkpoint),
    Skipped(SelectionWarning),
}

pub struct CheckpointCatalog {
    client: Arc<dyn NotebookClient>,
    project: String,
}

impl CheckpointCatalog {
    pub fn new(client: Arc<dyn NotebookClient>, project: impl Into<String>) -> Self {
        Self {
            client,
            project: project.into(),
        }
    }

    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Checkpoints matching every supplied criterion, latest first.
    pub fn query(&self, query: &CheckpointQuery, mode: TagMatch) -> Result<Vec<Checkpoint>> {
        let checkpoints = self.client.list_checkpoints(&self.project, query)?;
        let notebooks = if query.needs_notebooks() {
            self.client.list_notebooks(&self.project)?
        } else {
            Vec::new()
        };

        let selected = select(&notebooks, checkpoints, query, mode);
        debug!(
            project = %self.project,
            matched = selected.len(),
            ?mode,
            "Checkpoint query"
        );
        Ok(selected)
    }

    /// Listing: tags match if any listed tag is present.
    pub fn get_checkpoints(&self, query: &CheckpointQuery) -> Result<Vec<Checkpoint>> {
        self.query(query, TagMatch::Any)
    }

    /// Distinct tags used by the checkpoints a listing would return.
    pub fn list_tags(&self, query: &CheckpointQuery) -> Result<Vec<String>> {
        let tags: BTreeSet<String> = self
            .get_checkpoints(query)?
            .into_iter()
            .flat_map(|c| c.tags)
            .collect();
        Ok(tags.into_iter().collect())
    }

    /// Download the most recent matching checkpoint to
    /// `<destination_dir>/<name>.ipynb`.
    pub fn download_checkpoint(
        &self,
        query: &CheckpointQuery,
        destination_dir: &Path,
    ) -> Result<DownloadOutcome> {
        let Some(checkpoint) = self.query(query, TagMatch::All)?.into_iter().next() else {
            let warning = SelectionWarning::NoMatch;
            warn!(project = %self.project, ?query, "Skipping download: {warning}");
            return Ok(DownloadOutcome::Skipped(warning));
        };

        let path = destination_dir.join(format!("{}.ipynb", file_stem_for(&checkpoint.name)));
        checkpoint.download(self.client.as_ref(), &path)?;

        Ok(DownloadOutcome::Downloaded { checkpoint, path })
    }

    /// Remove the matching checkpoint, but only if exactly one matches.
    pub fn remove_checkpoint(&self, query: &CheckpointQuery) -> Result<RemoveOutcome> {
        let mut matches = self.query(query, TagMatch::All)?;

        match matches.len() {
            0 => {
                debug!(project = %self.project, ?query, "Nothing to remove: {}", SelectionWarning::NoMatch);
                Ok(RemoveOutcome::Skipped(SelectionWarning::NoMatch))
            }
            1 => {
                let checkpoint = matches.remove(0);
                self.client.remove_checkpoint(&checkpoint.id)?;
                info!(
                    checkpoint_id = %checkpoint.id,
                    name = %checkpoint.name,
                    "Removed checkpoint"
                );
                Ok(RemoveOutcome::Removed(checkpoint))
            }
            _ => {
                let warning = SelectionWarning::Ambiguous {
                    ids: matches.into_iter().map(|c| c.id).collect(),
                };
                warn!(project = %self.project, ?query, "Skipping removal: {warning}");
                Ok(RemoveOutcome::Skipped(warning))
            }
        }
    }
}

impl Checkpoint {
    /// Write this checkpoint's `.ipynb` content to `destination`, creating
    /// missing parent directories. A failed transfer leaves any existing file
    /// at `destination` untouched.
    pub fn download(&self, client: &dyn NotebookClient, destination: &Path) -> Result<()> {
        let mut content = client.fetch_checkpoint_content(&self.id)?;

        let parent = match destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        // Existing content at `destination` is only replaced once the whole
        // checkpoint has been received.
        let mut file = NamedTempFile::new_in(parent)?;
        let bytes = io::copy(&mut content, &mut file)?;
        file.persist(destination).map_err(|e| e.error)?;

        info!(
            checkpoint_id = %self.id,
            bytes,
            "Downloaded checkpoint to {}",
            destination.display()
        );
        Ok(())
    }
}

/// Filter `checkpoints` by `query` and order them latest first, ties broken by
/// ascending id.
///
/// Notebook name and owner criteria are resolved through `notebooks`; a
/// checkpoint whose notebook is missing from it never matches those criteria.
#[must_use]
pub fn select(
    notebooks: &[NotebookRecord],
    checkpoints: Vec<Checkpoint>,
    query: &CheckpointQuery,
    mode: TagMatch,
) -> Vec<Checkpoint> {
    let by_id: HashMap<&str, &NotebookRecord> =
        notebooks.iter().map(|n| (n.id.as_str(), n)).collect();

    let mut selected: Vec<Checkpoint> = checkpoints
        .into_iter()
        .filter(|c| matches(c, by_id.get(c.notebook_id.as_str()).copied(), query, mode))
        .collect();

    selected.sort_by(recent_first);
    selected
}

fn matches(
    checkpoint: &Checkpoint,
    notebook: Option<&NotebookRecord>,
    query: &CheckpointQuery,
    mode: TagMatch,
) -> bool {
    if let Some(ids) = &query.checkpoint_id {
        if !ids.contains(&checkpoint.id) {
            return false;
        }
    }
    if let Some(ids) = &query.notebook_id {
        if !ids.contains(&checkpoint.notebook_id) {
            return false;
        }
    }
    if let Some(tags) = &query.tag {
        if !tags.matches_tags(&checkpoint.tags, mode) {
            return false;
        }
    }
    if let Some(names) = &query.notebook_name {
        if !notebook.is_some_and(|n| names.contains(&n.name)) {
            return false;
        }
    }
    if let Some(owners) = &query.owner {
        if !notebook.is_some_and(|n| owners.contains(&n.owner)) {
            return false;
        }
    }
    true
}

fn recent_first(a: &Checkpoint, b: &Checkpoint) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}
