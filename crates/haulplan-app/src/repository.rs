//! Repository adapters for persistence layer

use std::path::PathBuf;

use haulplan_infra::FileQuoteRepository;
use haulplan_types::Result;

use crate::config::Config;

/// Open the file-based quote repository under the configured store dir
pub fn open_quote_repo(config: &Config) -> Result<FileQuoteRepository> {
    open_quote_repo_at(config.store_dir()?)
}

/// Open the file-based quote repository at a custom directory
pub fn open_quote_repo_at(store_dir: PathBuf) -> Result<FileQuoteRepository> {
    FileQuoteRepository::open(store_dir)
}
