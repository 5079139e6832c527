//! File-system resource provider.
//!
//! Serves `file://` URIs. Only paths inside the configured allowed
//! directories are readable; a directory URI returns its entry names, one
//! per line, sorted.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use super::{ResourceError, ResourceProvider};

const SCHEME_PREFIX: &str = "file://";

/// Provides access to local files.
#[derive(Debug, Clone)]
pub struct FileSystemResource {
    allowed_paths: Vec<PathBuf>,
}

impl FileSystemResource {
    /// Creates a provider restricted to `allowed_paths`.
    ///
    /// With no allowed paths every read is denied.
    #[must_use]
    pub const fn new(allowed_paths: Vec<PathBuf>) -> Self {
        Self { allowed_paths }
    }

    /// Resolves `path` and checks that it lies within an allowed directory.
    ///
    /// A path that cannot be resolved is reported as an I/O error only when
    /// it lies under an allowed directory. Anything else is denied.
    async fn validate_path(&self, path: &Path) -> Result<PathBuf, ResourceError> {
        let mut canonical_allowed = Vec::with_capacity(self.allowed_paths.len());
        for allowed in &self.allowed_paths {
            match tokio::fs::canonicalize(allowed).await {
                Ok(resolved) => canonical_allowed.push(resolved),
                Err(e) => {
                    tracing::debug!(path = %allowed.display(), error = %e, "Skipping unresolvable allowed path");
                }
            }
        }

        let canonical_path = match tokio::fs::canonicalize(path).await {
            Ok(resolved) => resolved,
            Err(source) => {
                let escapes = path.components().any(|c| c == Component::ParentDir);
                let under_allowed = !escapes
                    && self
                        .allowed_paths
                        .iter()
                        .chain(&canonical_allowed)
                        .any(|allowed| path.starts_with(allowed));
                if under_allowed {
                    return Err(ResourceError::Io {
                        path: path.to_path_buf(),
                        source,
                    });
                }
                return Err(ResourceError::AccessDenied);
            }
        };

        if canonical_allowed
            .iter()
            .any(|allowed| canonical_path.starts_with(allowed))
        {
            return Ok(canonical_path);
        }

        // Don't echo the resolved path back to the caller
        Err(ResourceError::AccessDenied)
    }

    async fn list_directory(path: &Path) -> Result<String, ResourceError> {
        let io_err = |source| ResourceError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut entries = tokio::fs::read_dir(path).await.map_err(io_err)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names.join("\n"))
    }
}

#[async_trait]
impl ResourceProvider for FileSystemResource {
    fn name(&self) -> &'static str {
        "file-system"
    }

    fn description(&self) -> &'static str {
        "Provides access to file system resources"
    }

    fn schemes(&self) -> &'static [&'static str] {
        &["file"]
    }

    async fn read(&self, uri: &str) -> Result<String, ResourceError> {
        let raw_path = uri
            .strip_prefix(SCHEME_PREFIX)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ResourceError::UnsupportedUri {
                uri: uri.to_string(),
            })?;

        let path = self.validate_path(Path::new(raw_path)).await?;
        tracing::debug!(path = %path.display(), "Reading file resource");

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(source) => return Err(ResourceError::Io { path, source }),
        };
        if metadata.is_dir() {
            return Self::list_directory(&path).await;
        }

        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ResourceError::Io { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_uri(path: &Path) -> String {
        format!("{SCHEME_PREFIX}{}", path.display())
    }

    #[tokio::test]
    async fn reads_allowed_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "hello").unwrap();

        let provider = FileSystemResource::new(vec![dir.path().to_path_buf()]);
        assert_eq!(provider.read(&file_uri(&file)).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn lists_directory_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "").unwrap();
        std::fs::write(dir.path().join("a.txt"), "").unwrap();

        let provider = FileSystemResource::new(vec![dir.path().to_path_buf()]);
        let listing = provider.read(&file_uri(dir.path())).await.unwrap();
        assert_eq!(listing, "a.txt\nb.txt");
    }

    #[tokio::test]
    async fn denies_path_outside_allowed() {
        let allowed = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let file = other.path().join("secret.txt");
        std::fs::write(&file, "nope").unwrap();

        let provider = FileSystemResource::new(vec![allowed.path().to_path_buf()]);
        let err = provider.read(&file_uri(&file)).await.unwrap_err();
        assert!(matches!(err, ResourceError::AccessDenied));
    }

    #[tokio::test]
    async fn denies_everything_without_allowed_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.txt");
        std::fs::write(&file, "x").unwrap();

        let provider = FileSystemResource::new(Vec::new());
        assert!(matches!(
            provider.read(&file_uri(&file)).await,
            Err(ResourceError::AccessDenied)
        ));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = FileSystemResource::new(vec![dir.path().to_path_buf()]);
        let err = provider
            .read(&file_uri(&dir.path().join("absent.txt")))
            .await
            .unwrap_err();
        assert!(matches!(err, ResourceError::Io { .. }));
    }

    #[tokio::test]
    async fn missing_file_outside_allowed_is_denied() {
        let allowed = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();

        let provider = FileSystemResource::new(vec![allowed.path().to_path_buf()]);
        let err = provider
            .read(&file_uri(&other.path().join("absent.txt")))
            .await
            .unwrap_err();
        assert!(matches!(err, ResourceError::AccessDenied));
    }

    #[tokio::test]
    async fn rejects_other_schemes() {
        let provider = FileSystemResource::new(Vec::new());
        assert!(matches!(
            provider.read("https://example.com").await,
            Err(ResourceError::UnsupportedUri { .. })
        ));
    }
}
