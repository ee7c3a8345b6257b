use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::constants::{COOKIE_FILE_NAME, WORKDIR_PREFIX};
use crate::error::{AppError, Result};

/// Isolated directory for a single request.
///
/// `release` removes it on the blocking pool. If the request future is dropped
/// before that, `TempDir`'s own drop still removes it.
pub struct WorkDir {
    dir: TempDir,
}

/// Runs filesystem work that has no async counterpart off the runtime threads
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> std::io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Io(std::io::Error::other(e)))?;
    Ok(result?)
}

impl WorkDir {
    /// Creates a fresh uniquely named directory under `base`, or the system temp dir
    pub async fn create(base: Option<PathBuf>) -> Result<Self> {
        let dir = blocking(move || {
            let mut builder = tempfile::Builder::new();
            builder.prefix(WORKDIR_PREFIX);
            match &base {
                Some(base) => builder.tempdir_in(base),
                None => builder.tempdir(),
            }
        })
        .await?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes the cookie blob verbatim and returns the file path
    pub async fn write_cookies(&self, cookies: &str) -> Result<PathBuf> {
        let path = self.path().join(COOKIE_FILE_NAME);
        tokio::fs::write(&path, cookies).await?;
        Ok(path)
    }

    /// Finds the single file with extension `ext`
    pub async fn find_output(&self, ext: &str) -> Result<PathBuf> {
        let mut matches = Vec::new();
        let mut entries = tokio::fs::read_dir(self.path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_file() && path.extension().is_some_and(|e| e == ext) {
                matches.push(path);
            }
        }

        match matches.len() {
            0 => Err(AppError::NoOutputProduced(ext.to_string())),
            1 => Ok(matches.remove(0)),
            n => Err(AppError::AmbiguousOutput(n)),
        }
    }

    /// Removes the directory, or leaves it on disk when `keep` is set and
    /// returns its path
    pub async fn release(self, keep: bool) -> Result<Option<PathBuf>> {
        if keep {
            return Ok(Some(self.dir.into_path()));
        }
        let dir = self.dir;
        blocking(move || dir.close()).await?;
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[tokio::test]
    async fn directories_are_unique_and_released() {
        let base = tempfile::tempdir().unwrap();
        let a = WorkDir::create(Some(base.path().to_path_buf())).await.unwrap();
        let b = WorkDir::create(Some(base.path().to_path_buf())).await.unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().file_name().unwrap().to_string_lossy().starts_with("ytmp3_"));

        let path = a.path().to_path_buf();
        assert_eq!(a.release(false).await.unwrap(), None);
        assert!(!path.exists());
        assert!(b.path().exists());
    }

    #[tokio::test]
    async fn dropped_directory_is_removed() {
        let dir = WorkDir::create(None).await.unwrap();
        let path = dir.path().to_path_buf();
        drop(dir);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn kept_directory_survives() {
        let base = tempfile::tempdir().unwrap();
        let dir = WorkDir::create(Some(base.path().to_path_buf())).await.unwrap();
        let path = dir.release(true).await.unwrap().expect("kept path");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn locates_single_output() {
        let dir = WorkDir::create(None).await.unwrap();
        fs::write(dir.path().join("Some Title.mp3"), b"id3").unwrap();
        fs::write(dir.path().join("Some Title.webp"), b"img").unwrap();
        fs::create_dir(dir.path().join("nested.mp3")).unwrap();
        let found = dir.find_output("mp3").await.unwrap();
        assert_eq!(found.file_name().unwrap(), "Some Title.mp3");
    }

    #[tokio::test]
    async fn missing_output_is_an_error() {
        let dir = WorkDir::create(None).await.unwrap();
        dir.write_cookies("# Netscape HTTP Cookie File\n").await.unwrap();
        assert!(matches!(dir.find_output("mp3").await, Err(AppError::NoOutputProduced(ext)) if ext == "mp3"));
    }

    #[tokio::test]
    async fn several_outputs_are_ambiguous() {
        let dir = WorkDir::create(None).await.unwrap();
        fs::write(dir.path().join("a.mp3"), b"1").unwrap();
        fs::write(dir.path().join("b.mp3"), b"2").unwrap();
        assert!(matches!(dir.find_output("mp3").await, Err(AppError::AmbiguousOutput(2))));
    }

    #[tokio::test]
    async fn cookies_are_written_verbatim() {
        let dir = WorkDir::create(None).await.unwrap();
        let blob = "# Netscape HTTP Cookie File\n.youtube.com\tTRUE\t/\tTRUE\t0\tSID\tabc\n";
        let path = dir.write_cookies(blob).await.unwrap();
        assert_eq!(path.parent(), Some(dir.path()));
        assert_eq!(fs::read_to_string(path).unwrap(), blob);
    }
}
