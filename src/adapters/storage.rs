use crate::domain::model::SeenSet;
use crate::domain::ports::SeenStore;
use crate::utils::error::{Result, ScanError};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Seen-item store backed by a newline-delimited text file.
#[derive(Debug, Clone)]
pub struct FileSeenStore {
    path: PathBuf,
}

impl FileSeenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persistence_error(&self, source: io::Error) -> ScanError {
        ScanError::PersistenceError {
            path: self.path.clone(),
            source,
        }
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// 寫入暫存檔後 rename，避免中途崩潰留下半個檔案
    fn write_atomically(&self, content: &str) -> io::Result<()> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// One link per line; BTreeSet iteration keeps the lines sorted.
pub fn serialize_seen(seen: &SeenSet) -> String {
    let mut content = String::new();
    for link in seen {
        content.push_str(link);
        content.push('\n');
    }
    content
}

pub fn parse_seen(content: &str) -> SeenSet {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

impl SeenStore for FileSeenStore {
    async fn load(&self) -> Result<SeenSet> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let seen = parse_seen(&content);
                tracing::debug!(
                    "Loaded {} seen items from {}",
                    seen.len(),
                    self.path.display()
                );
                Ok(seen)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(
                    "🆕 No seen-items file at {}, starting empty",
                    self.path.display()
                );
                self.write_atomically("")
                    .map_err(|e| self.persistence_error(e))?;
                Ok(SeenSet::new())
            }
            Err(e) => Err(self.persistence_error(e)),
        }
    }

    async fn save(&self, seen: &SeenSet) -> Result<()> {
        self.write_atomically(&serialize_seen(seen))
            .map_err(|e| self.persistence_error(e))?;
        tracing::debug!("Saved {} seen items to {}", seen.len(), self.path.display());
        Ok(())
    }
}
