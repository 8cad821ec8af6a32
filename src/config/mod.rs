mod catalog;

pub use catalog::{CatalogConfig, config_path};
