//! File-based quote repository
//!
//! Each quote aggregate is one JSON document named `<id>.json`. Writes go
//! to a temporary file in the same directory which is then renamed over the
//! target, so a reader sees either the old aggregate or the new one.
//! Write preconditions are checked under a lock held by this handle, so
//! one store directory should be written through a single handle.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use haulplan_domain::model::Quote;
use haulplan_domain::repository::{check_insert, check_replace, QuoteRepository, VersionCheck};
use haulplan_types::{Error, PlanError, Result};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use uuid::Uuid;

/// File-based implementation of QuoteRepository
pub struct FileQuoteRepository {
    quotes_dir: PathBuf,
    /// Serializes write preconditions with the writes that follow them
    write_lock: Mutex<()>,
}

impl FileQuoteRepository {
    /// Open (creating if needed) a store under `store_dir/quotes`
    pub fn open(store_dir: PathBuf) -> Result<Self> {
        let quotes_dir = store_dir.join("quotes");
        fs::create_dir_all(&quotes_dir)?;
        Ok(Self {
            quotes_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn quotes_dir(&self) -> &Path {
        &self.quotes_dir
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.quotes_dir.join(format!("{}.json", id))
    }

    fn read_quote(path: &Path) -> Result<Quote> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write to a sibling temp file, then rename over the target
    fn write_quote(&self, quote: &Quote) -> Result<()> {
        let temp = NamedTempFile::new_in(&self.quotes_dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, quote)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        let path = self.path_for(quote.id);
        temp.persist(&path).map_err(|e| Error::Io(e.error))?;
        debug!(quote = %quote.id, path = %path.display(), "quote written");
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| Error::Store("quote store lock poisoned".to_string()))
    }
}

impl QuoteRepository for FileQuoteRepository {
    fn insert(&self, quote: &Quote) -> std::result::Result<(), Error> {
        let _guard = self.lock()?;
        if self.path_for(quote.id).exists() {
            return Err(Error::Store(format!("quote {} already exists", quote.id)));
        }
        check_insert(quote, &self.find_by_lineage(quote.lineage_id)?)?;
        self.write_quote(quote)
    }

    fn replace(&self, quote: &Quote, check: VersionCheck) -> std::result::Result<(), Error> {
        let _guard = self.lock()?;
        let stored = self.find_by_id(quote.id)?.ok_or_else(|| PlanError::QuoteNotFound {
            id: quote.id.to_string(),
        })?;
        check_replace(quote, &stored, &self.find_by_lineage(quote.lineage_id)?, check)?;
        self.write_quote(quote)
    }

    fn find_by_id(&self, id: Uuid) -> std::result::Result<Option<Quote>, Error> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        Self::read_quote(&path).map(Some)
    }

    fn find_all(&self) -> std::result::Result<Vec<Quote>, Error> {
        let mut quotes = Vec::new();
        for entry in fs::read_dir(&self.quotes_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_quote(&path) {
                Ok(quote) => quotes.push(quote),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable quote file"),
            }
        }
        quotes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::sample_quote;
    use chrono::Utc;
    use haulplan_types::QuoteStatus;
    use tempfile::TempDir;

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let repo = FileQuoteRepository::open(dir.path().to_path_buf()).unwrap();
        let quote = sample_quote();
        repo.insert(&quote).unwrap();
        assert!(repo.quotes_dir().join(format!("{}.json", quote.id)).exists());
        assert_eq!(repo.find_by_id(quote.id).unwrap(), Some(quote));
        assert_eq!(repo.find_by_id(Uuid::new_v4()).unwrap(), None);
    }

    #[test]
    fn test_replace_swaps_whole_document() {
        let dir = TempDir::new().unwrap();
        let repo = FileQuoteRepository::open(dir.path().to_path_buf()).unwrap();
        let mut quote = sample_quote();
        repo.insert(&quote).unwrap();
        quote.status = QuoteStatus::Sent;
        quote.touch(Utc::now());
        repo.replace(&quote, VersionCheck::Latest).unwrap();

        let reopened = FileQuoteRepository::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(
            reopened.find_by_id(quote.id).unwrap().unwrap().status,
            QuoteStatus::Sent
        );
        // No temp files left behind
        let files = fs::read_dir(repo.quotes_dir()).unwrap().count();
        assert_eq!(files, 1);
    }

    #[test]
    fn test_insert_duplicate_and_replace_missing() {
        let dir = TempDir::new().unwrap();
        let repo = FileQuoteRepository::open(dir.path().to_path_buf()).unwrap();
        let mut quote = sample_quote();
        quote.touch(Utc::now());
        assert!(repo.replace(&quote, VersionCheck::Any).is_err());
        repo.insert(&quote).unwrap();
        assert!(repo.insert(&quote).is_err());
    }

    #[test]
    fn test_stale_revision_not_written() {
        let dir = TempDir::new().unwrap();
        let repo = FileQuoteRepository::open(dir.path().to_path_buf()).unwrap();
        let quote = sample_quote();
        repo.insert(&quote).unwrap();

        let mut sent = quote.clone();
        sent.status = QuoteStatus::Sent;
        sent.touch(Utc::now());
        repo.replace(&sent, VersionCheck::Latest).unwrap();

        let mut stale = quote.clone();
        stale.tenant_id = "late".to_string();
        stale.touch(Utc::now());
        let err = repo.replace(&stale, VersionCheck::Latest).unwrap_err();
        assert!(matches!(err.as_plan_error(), Some(PlanError::QuoteConflict { .. })));
        assert_eq!(repo.find_by_id(quote.id).unwrap().unwrap().status, QuoteStatus::Sent);
    }

    #[test]
    fn test_version_taken_in_lineage() {
        let dir = TempDir::new().unwrap();
        let repo = FileQuoteRepository::open(dir.path().to_path_buf()).unwrap();
        let v1 = sample_quote();
        repo.insert(&v1).unwrap();
        repo.insert(&v1.next_version(2, Utc::now())).unwrap();
        let err = repo.insert(&v1.next_version(2, Utc::now())).unwrap_err();
        assert!(matches!(err.as_plan_error(), Some(PlanError::QuoteConflict { .. })));
    }

    #[test]
    fn test_find_all_skips_foreign_files() {
        let dir = TempDir::new().unwrap();
        let repo = FileQuoteRepository::open(dir.path().to_path_buf()).unwrap();
        repo.insert(&sample_quote()).unwrap();
        repo.insert(&sample_quote()).unwrap();
        fs::write(repo.quotes_dir().join("notes.txt"), "hello").unwrap();
        fs::write(repo.quotes_dir().join("broken.json"), "{").unwrap();
        assert_eq!(repo.find_all().unwrap().len(), 2);
    }
}
