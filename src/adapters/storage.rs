use crate::domain::ports::Storage;
use crate::utils::error::{EnrollmentError, Result};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }
}

/// OS-level exclusive lock on a file, released on drop.
#[derive(Debug)]
pub struct FileLock {
    file: File,
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl Storage for LocalStorage {
    type Lock = FileLock;

    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write-then-rename so a crash never leaves a half-written file.
        // The pid keeps writers in different processes off each other's
        // staging file.
        let staging = full_path.with_extension(format!("{}.tmp", std::process::id()));
        tokio::fs::write(&staging, data).await?;
        tokio::fs::rename(&staging, &full_path).await?;
        Ok(())
    }

    async fn lock(&self, path: &str) -> Result<FileLock> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file = tokio::task::spawn_blocking(move || -> std::io::Result<File> {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&full_path)?;
            FileExt::lock_exclusive(&file)?;
            Ok(file)
        })
        .await
        .map_err(|e| EnrollmentError::StorageError {
            message: format!("lock task failed: {}", e),
        })??;

        Ok(FileLock { file })
    }
}

/// Process-local storage. Clones share the same files and locks.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn file_names(&self) -> Vec<String> {
        let files = self.files.lock().await;
        let mut names: Vec<String> = files.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Storage for MemoryStorage {
    type Lock = OwnedMutexGuard<()>;

    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let files = self.files.lock().await;
        files.get(path).cloned().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path),
            )
            .into()
        })
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let mut files = self.files.lock().await;
        files.insert(path.to_string(), data.to_vec());
        Ok(())
    }

    async fn lock(&self, path: &str) -> Result<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(path.to_string()).or_default().clone()
        };
        Ok(lock.lock_owned().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_storage_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

        storage.write_file("outbox/1.json", b"{}").await.unwrap();

        assert_eq!(storage.read_file("outbox/1.json").await.unwrap(), b"{}");
        let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path().join("outbox"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("1.json")]);
    }

    #[tokio::test]
    async fn test_local_lock_excludes_a_second_holder() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

        let guard = storage.lock("store.json.lock").await.unwrap();
        let contender = {
            let storage = storage.clone();
            tokio::spawn(async move { storage.lock("store.json.lock").await.map(|_| ()) })
        };

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_memory_locks_are_per_name_and_shared_by_clones() {
        let storage = MemoryStorage::new();
        let _held = storage.lock("a.lock").await.unwrap();

        // A different name is free.
        storage.lock("b.lock").await.unwrap();

        let clone = storage.clone();
        let waiting = tokio::spawn(async move { clone.lock("a.lock").await.map(|_| ()) });
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!waiting.is_finished());

        drop(_held);
        waiting.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_missing_files_report_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let local = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
        let memory = MemoryStorage::new();

        for err in [
            local.read_file("nope.json").await.unwrap_err(),
            memory.read_file("nope.json").await.unwrap_err(),
        ] {
            assert!(matches!(
                err,
                EnrollmentError::IoError(ref e) if e.kind() == std::io::ErrorKind::NotFound
            ));
        }
    }

    #[tokio::test]
    async fn test_memory_storage_clones_share_files() {
        let storage = MemoryStorage::new();
        let other = storage.clone();

        storage.write_file("a.json", b"1").await.unwrap();

        assert_eq!(other.read_file("a.json").await.unwrap(), b"1");
        assert_eq!(other.file_names().await, vec!["a.json".to_string()]);
    }
}
