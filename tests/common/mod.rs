#![allow(dead_code)]

use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use nbcheckpoint::client::NotebookClient;
use nbcheckpoint::error::{Error, Result};
use nbcheckpoint::types::{Checkpoint, CheckpointQuery, NewCheckpoint, NotebookRecord, ValueSet};

pub const PROJECT: &str = "research";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateNotebook { project: String, path: PathBuf },
    GetNotebook(String),
    ListNotebooks(String),
    CreateCheckpoint {
        notebook_id: String,
        path: PathBuf,
        content: Vec<u8>,
    },
    GetLastCheckpoint(String),
    FetchContent(String),
    Remove(String),
    ListCheckpoints(String),
    Tag(String),
}

/// In-memory client double that records every call it receives.
#[derive(Default)]
pub struct RecordingClient {
    pub notebooks: Mutex<Vec<NotebookRecord>>,
    pub checkpoints: Mutex<Vec<Checkpoint>>,
    /// When set, content streams yield a few bytes and then fail with this kind.
    pub stream_error: Mutex<Option<io::ErrorKind>>,
    calls: Mutex<Vec<Call>>,
}

/// Reader that fails after its prefix is consumed, like a dropped connection.
struct BrokenStream {
    prefix: Cursor<Vec<u8>>,
    kind: io::ErrorKind,
}

impl Read for BrokenStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.prefix.read(buf)? {
            0 => Err(io::Error::new(self.kind, "stream interrupted")),
            n => Ok(n),
        }
    }
}

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub fn notebook(id: &str, name: &str, owner: &str) -> NotebookRecord {
    NotebookRecord {
        id: id.to_string(),
        project: PROJECT.to_string(),
        name: name.to_string(),
        owner: owner.to_string(),
        created_at: at(0),
    }
}

pub fn checkpoint(id: &str, notebook_id: &str, name: &str, tags: &[&str], secs: i64) -> Checkpoint {
    Checkpoint {
        id: id.to_string(),
        notebook_id: notebook_id.to_string(),
        name: name.to_string(),
        description: None,
        path: format!("/work/{notebook_id}.ipynb"),
        tags: tags.iter().copied().collect(),
        created_at: at(secs),
    }
}

impl RecordingClient {
    pub fn with(notebooks: Vec<NotebookRecord>, checkpoints: Vec<Checkpoint>) -> Self {
        Self {
            notebooks: Mutex::new(notebooks),
            checkpoints: Mutex::new(checkpoints),
            stream_error: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Notebooks `nb-1` ("eda", james) and `nb-2` ("training", anna) with
    /// checkpoints tagged `{a}`, `{b}`, `{a,b}` and `{c}`.
    pub fn fixture() -> Self {
        Self::with(
            vec![
                notebook("nb-1", "eda", "james"),
                notebook("nb-2", "training", "anna"),
            ],
            vec![
                checkpoint("c1", "nb-1", "first", &["a"], 10),
                checkpoint("c2", "nb-1", "second", &["b"], 20),
                checkpoint("c3", "nb-2", "third", &["a", "b"], 30),
                checkpoint("c4", "nb-2", "fourth", &["c"], 40),
            ],
        )
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Remove(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl NotebookClient for RecordingClient {
    fn create_notebook(
        &self,
        project: &str,
        source_path: &Path,
        _content: &mut dyn Read,
    ) -> Result<NotebookRecord> {
        self.record(Call::CreateNotebook {
            project: project.to_string(),
            path: source_path.to_path_buf(),
        });
        let mut notebooks = self.notebooks.lock().unwrap();
        let record = NotebookRecord {
            id: format!("nb-{}", notebooks.len() + 1),
            project: project.to_string(),
            name: source_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            owner: "james".to_string(),
            created_at: at(0),
        };
        notebooks.push(record.clone());
        Ok(record)
    }

    fn get_notebook(&self, _project: &str, notebook_id: &str) -> Result<NotebookRecord> {
        self.record(Call::GetNotebook(notebook_id.to_string()));
        self.notebooks
            .lock()
            .unwrap()
            .iter()
            .find(|n| n.id == notebook_id)
            .cloned()
            .ok_or(Error::NotFound)
    }

    fn list_notebooks(&self, project: &str) -> Result<Vec<NotebookRecord>> {
        self.record(Call::ListNotebooks(project.to_string()));
        Ok(self.notebooks.lock().unwrap().clone())
    }

    fn create_checkpoint(
        &self,
        notebook_id: &str,
        source_path: &Path,
        content: &mut dyn Read,
        options: &NewCheckpoint,
    ) -> Result<Checkpoint> {
        let mut buf = Vec::new();
        content.read_to_end(&mut buf)?;
        self.record(Call::CreateCheckpoint {
            notebook_id: notebook_id.to_string(),
            path: source_path.to_path_buf(),
            content: buf,
        });

        let mut checkpoints = self.checkpoints.lock().unwrap();
        let created_at = at(100 + checkpoints.len() as i64);
        let created = Checkpoint {
            id: format!("new-{}", checkpoints.len() + 1),
            notebook_id: notebook_id.to_string(),
            name: options
                .name
                .clone()
                .unwrap_or_else(|| created_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            description: options.description.clone(),
            path: source_path.to_string_lossy().into_owned(),
            tags: options.tags.clone(),
            created_at,
        };
        checkpoints.push(created.clone());
        Ok(created)
    }

    fn get_last_checkpoint(&self, _project: &str, notebook_id: &str) -> Result<Checkpoint> {
        self.record(Call::GetLastCheckpoint(notebook_id.to_string()));
        self.checkpoints
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.notebook_id == notebook_id)
            .max_by_key(|c| c.created_at)
            .cloned()
            .ok_or(Error::NotFound)
    }

    fn fetch_checkpoint_content(&self, checkpoint_id: &str) -> Result<Box<dyn Read + Send>> {
        self.record(Call::FetchContent(checkpoint_id.to_string()));
        let content = format!("{{\"checkpoint\": \"{checkpoint_id}\"}}");
        if let Some(kind) = *self.stream_error.lock().unwrap() {
            return Ok(Box::new(BrokenStream {
                prefix: Cursor::new(content.into_bytes()[..4].to_vec()),
                kind,
            }));
        }
        Ok(Box::new(Cursor::new(content.into_bytes())))
    }

    fn remove_checkpoint(&self, checkpoint_id: &str) -> Result<()> {
        self.record(Call::Remove(checkpoint_id.to_string()));
        self.checkpoints
            .lock()
            .unwrap()
            .retain(|c| c.id != checkpoint_id);
        Ok(())
    }

    fn list_checkpoints(&self, project: &str, _query: &CheckpointQuery) -> Result<Vec<Checkpoint>> {
        self.record(Call::ListCheckpoints(project.to_string()));
        // Unordered on purpose so callers have to sort.
        let mut checkpoints = self.checkpoints.lock().unwrap().clone();
        checkpoints.reverse();
        if !checkpoints.is_empty() {
            checkpoints.rotate_left(1);
        }
        Ok(checkpoints)
    }

    fn tag_checkpoint(&self, checkpoint_id: &str, tags: &ValueSet) -> Result<Checkpoint> {
        self.record(Call::Tag(checkpoint_id.to_string()));
        let mut checkpoints = self.checkpoints.lock().unwrap();
        let checkpoint = checkpoints
            .iter_mut()
            .find(|c| c.id == checkpoint_id)
            .ok_or(Error::NotFound)?;
        checkpoint.tags.extend(tags.iter().cloned());
        Ok(checkpoint.clone())
    }
}

/// Client whose every call fails, standing in for a broken transport.
pub struct FailingClient;

fn unavailable<T>() -> Result<T> {
    Err(Error::remote("service unavailable"))
}

impl NotebookClient for FailingClient {
    fn create_notebook(&self, _: &str, _: &Path, _: &mut dyn Read) -> Result<NotebookRecord> {
        unavailable()
    }

    fn get_notebook(&self, _: &str, _: &str) -> Result<NotebookRecord> {
        unavailable()
    }

    fn list_notebooks(&self, _: &str) -> Result<Vec<NotebookRecord>> {
        unavailable()
    }

    fn create_checkpoint(
        &self,
        _: &str,
        _: &Path,
        _: &mut dyn Read,
        _: &NewCheckpoint,
    ) -> Result<Checkpoint> {
        unavailable()
    }

    fn get_last_checkpoint(&self, _: &str, _: &str) -> Result<Checkpoint> {
        unavailable()
    }

    fn fetch_checkpoint_content(&self, _: &str) -> Result<Box<dyn Read + Send>> {
        unavailable()
    }

    fn remove_checkpoint(&self, _: &str) -> Result<()> {
        unavailable()
    }

    fn list_checkpoints(&self, _: &str, _: &CheckpointQuery) -> Result<Vec<Checkpoint>> {
        unavailable()
    }

    fn tag_checkpoint(&self, _: &str, _: &ValueSet) -> Result<Checkpoint> {
        unavailable()
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
