use std::io::Read;
use std::path::Path;

use crate::error::Result;
use crate::types::{Checkpoint, CheckpointQuery, NewCheckpoint, NotebookRecord, ValueSet};

/// NotebookClient is the capability surface of the notebook-versioning
/// service. Transport, authentication and retries live behind it.
///
/// Implementations report their own failures as
/// [`Error::Remote`](crate::error::Error::Remote) (or a more specific variant);
/// callers propagate them unchanged.
pub trait NotebookClient: Send + Sync {
    /// Create a notebook in `project` from the `.ipynb` content at `source_path`.
    fn create_notebook(
        &self,
        project: &str,
        source_path: &Path,
        content: &mut dyn Read,
    ) -> Result<NotebookRecord>;

    fn get_notebook(&self, project: &str, notebook_id: &str) -> Result<NotebookRecord>;
    fn list_notebooks(&self, project: &str) -> Result<Vec<NotebookRecord>>;

    /// Upload a new checkpoint. `source_path` is absolute.
    fn create_checkpoint(
        &self,
        notebook_id: &str,
        source_path: &Path,
        content: &mut dyn Read,
        options: &NewCheckpoint,
    ) -> Result<Checkpoint>;

    /// Most recently created checkpoint of a notebook.
    fn get_last_checkpoint(&self, project: &str, notebook_id: &str) -> Result<Checkpoint>;

    fn fetch_checkpoint_content(&self, checkpoint_id: &str) -> Result<Box<dyn Read + Send>>;

    fn remove_checkpoint(&self, checkpoint_id: &str) -> Result<()>;

    /// Checkpoints of `project`. The query is a narrowing hint only: an
    /// implementation may return a superset and callers re-apply it.
    fn list_checkpoints(&self, project: &str, query: &CheckpointQuery) -> Result<Vec<Checkpoint>>;

    /// Add tags to an existing checkpoint, returning the updated record.
    fn tag_checkpoint(&self, checkpoint_id: &str, tags: &ValueSet) -> Result<Checkpoint>;
}
