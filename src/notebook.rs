use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::catalog::CheckpointCatalog;
use crate::client::NotebookClient;
use crate::error::Result;
use crate::types::{Checkpoint, CheckpointQuery, NewCheckpoint, NotebookRecord};
use crate::validation::validate_notebook_path;

/// A notebook in a project, backed by a [`NotebookClient`].
///
/// `id` and `owner` are fixed at construction. Everything else is read from
/// the service on demand.
pub struct Notebook {
    client: Arc<dyn NotebookClient>,
    project: String,
    id: String,
    owner: String,
}

impl Notebook {
    pub fn new(
        client: Arc<dyn NotebookClient>,
        project: impl Into<String>,
        id: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            client,
            project: project.into(),
            id: id.into(),
            owner: owner.into(),
        }
    }

    pub fn from_record(client: Arc<dyn NotebookClient>, record: NotebookRecord) -> Self {
        Self::new(client, record.project, record.id, record.owner)
    }

    /// Create a notebook in `project` from a local `.ipynb` file.
    pub fn create(
        client: Arc<dyn NotebookClient>,
        project: impl Into<String>,
        file_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let project = project.into();
        let source_path = validate_notebook_path(file_path.as_ref())?;

        let record = {
            let mut file = File::open(&source_path)?;
            client.create_notebook(&project, &source_path, &mut file)?
        };

        info!(
            notebook_id = %record.id,
            project = %project,
            "Created notebook '{}'",
            record.name
        );
        Ok(Self::from_record(client, record))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Upload the `.ipynb` file at `file_path` as a new checkpoint.
    ///
    /// The path is checked before anything is sent; an invalid path yields
    /// [`Error::Validation`](crate::error::Error::Validation).
    pub fn add_checkpoint(
        &self,
        file_path: impl AsRef<Path>,
        options: NewCheckpoint,
    ) -> Result<Checkpoint> {
        let source_path = validate_notebook_path(file_path.as_ref())?;

        let checkpoint = {
            let mut file = File::open(&source_path)?;
            self.client
                .create_checkpoint(&self.id, &source_path, &mut file, &options)?
        };

        info!(
            notebook_id = %self.id,
            checkpoint_id = %checkpoint.id,
            "Added checkpoint '{}'",
            checkpoint.name
        );
        Ok(checkpoint)
    }

    /// Checkpoints of this notebook matching `query`, latest first.
    ///
    /// Tags match if any listed tag is present. Any `notebook_id` criterion in
    /// `query` is replaced by this notebook's id.
    pub fn get_checkpoints(&self, query: &CheckpointQuery) -> Result<Vec<Checkpoint>> {
        self.catalog().get_checkpoints(&self.scoped(query))
    }

    pub fn list_tags(&self) -> Result<Vec<String>> {
        self.catalog()
            .list_tags(&CheckpointQuery::new().notebook_id(self.id.as_str()))
    }

    /// Source path of the latest checkpoint.
    pub fn get_path(&self) -> Result<String> {
        Ok(self.client.get_last_checkpoint(&self.project, &self.id)?.path)
    }

    /// Name of the latest checkpoint.
    pub fn get_name(&self) -> Result<String> {
        Ok(self.client.get_last_checkpoint(&self.project, &self.id)?.name)
    }

    fn catalog(&self) -> CheckpointCatalog {
        CheckpointCatalog::new(Arc::clone(&self.client), self.project.clone())
    }

    fn scoped(&self, query: &CheckpointQuery) -> CheckpointQuery {
        query.clone().notebook_id(self.id.as_str())
    }
}

impl std::fmt::Debug for Notebook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notebook")
            .field("project", &self.project)
            .field("id", &self.id)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}
