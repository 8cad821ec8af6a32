pub const SCHEMA: &str = r#"
-- Notebooks group successive checkpoints of one document
CREATE TABLE IF NOT EXISTS notebooks (
    id TEXT PRIMARY KEY,
    project TEXT NOT NULL,
    name TEXT NOT NULL,
    owner TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_notebooks_project ON notebooks(project);

-- Checkpoints are immutable snapshots; names are not unique
CREATE TABLE IF NOT EXISTS checkpoints (
    id TEXT PRIMARY KEY,
    notebook_id TEXT NOT NULL REFERENCES notebooks(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    description TEXT,
    path TEXT NOT NULL,
    content BLOB NOT NULL,
    created_at TEXT NOT NULL  -- RFC 3339, fixed width, sorts lexically
);

CREATE INDEX IF NOT EXISTS idx_checkpoints_notebook ON checkpoints(notebook_id, created_at);

-- Checkpoint tags (many-to-many with free-form labels)
CREATE TABLE IF NOT EXISTS checkpoint_tags (
    checkpoint_id TEXT NOT NULL REFERENCES checkpoints(id) ON DELETE CASCADE,
    tag TEXT NOT NULL,
    PRIMARY KEY (checkpoint_id, tag)
);

CREATE INDEX IF NOT EXISTS idx_checkpoint_tags_tag ON checkpoint_tags(tag);
"#;
