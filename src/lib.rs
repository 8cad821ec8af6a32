//! # nbcheckpoint
//!
//! Client-side data model for a notebook-versioning service: notebooks,
//! their checkpoints, and a catalog for selecting checkpoints by notebook,
//! owner, tag or id.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use nbcheckpoint::catalog::CheckpointCatalog;
//! use nbcheckpoint::config::CatalogConfig;
//! use nbcheckpoint::notebook::Notebook;
//! use nbcheckpoint::types::{CheckpointQuery, NewCheckpoint};
//!
//! let config = CatalogConfig::load_default()?;
//! let client = Arc::new(config.open_store()?);
//!
//! let notebook = Notebook::create(client.clone(), &config.project, "eda.ipynb")?;
//! notebook.add_checkpoint("eda.ipynb", NewCheckpoint::named("plots").with_tags("client"))?;
//!
//! let catalog = CheckpointCatalog::new(client, &config.project);
//! let latest = catalog.get_checkpoints(&CheckpointQuery::new().tag("client"))?;
//! catalog.download_checkpoint(&CheckpointQuery::new().tag("client"), "./out".as_ref())?;
//! ```
//!
//! ## Feature Flags
//!
//! - `sqlite` (default): Includes the local SQLite-backed client in [`store`].

pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod notebook;
#[cfg(feature = "sqlite")]
pub mod store;
pub mod types;
pub mod validation;
