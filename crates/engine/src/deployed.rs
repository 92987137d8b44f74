//! Reads the installed version from a deployment directory's `current` link.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{Error, Result};

/// Name of the link pointing at the active release.
pub const CURRENT_LINK: &str = "current";

/// Version deployed under `deploy_dir`, taken from the final segment of the
/// `current` link's target.
///
/// Returns `Ok(None)` when there is no `current` entry at all.
///
/// # Errors
///
/// Returns [`Error::BrokenSymlink`] when `current` exists but is not a link,
/// points at nothing, or its target has no final segment.
pub async fn current_version(deploy_dir: impl AsRef<Path>) -> Result<Option<String>> {
    let link = deploy_dir.as_ref().join(CURRENT_LINK);

    match tokio::fs::symlink_metadata(&link).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(link = %link.display(), "No current link");
            return Ok(None);
        }
        Err(e) => return Err(Error::broken_symlink(&link, e)),
    }

    let target = tokio::fs::read_link(&link)
        .await
        .map_err(|e| Error::broken_symlink(&link, e))?;

    // The target has to exist for the version to be real.
    let resolved = tokio::fs::canonicalize(&link)
        .await
        .map_err(|e| Error::broken_symlink(&link, e))?;

    let version = final_segment(&target)
        .or_else(|| final_segment(&resolved))
        .ok_or_else(|| {
            Error::broken_symlink(
                &link,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("target '{}' has no final segment", target.display()),
                ),
            )
        })?;

    debug!(link = %link.display(), %version, "Found deployed version");
    Ok(Some(version))
}

fn final_segment(path: &Path) -> Option<String> {
    let normalized: PathBuf = path.components().collect();
    normalized
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_version_from_absolute_link() {
        let dir = TempDir::new().unwrap();
        let release = dir.path().join("releases/2.0.65");
        std::fs::create_dir_all(&release).unwrap();
        symlink(&release, dir.path().join(CURRENT_LINK)).unwrap();

        let version = current_version(dir.path()).await.unwrap();
        assert_eq!(version.as_deref(), Some("2.0.65"));
    }

    #[tokio::test]
    async fn test_version_from_relative_link_with_trailing_slash() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("releases/1.4.0")).unwrap();
        symlink("releases/1.4.0/", dir.path().join(CURRENT_LINK)).unwrap();

        let version = current_version(dir.path()).await.unwrap();
        assert_eq!(version.as_deref(), Some("1.4.0"));
    }

    #[tokio::test]
    async fn test_no_link_is_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(current_version(dir.path()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_deploy_dir_is_none() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("never-deployed");
        assert_eq!(current_version(&missing).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_dangling_link_is_broken() {
        let dir = TempDir::new().unwrap();
        symlink(dir.path().join("releases/gone"), dir.path().join(CURRENT_LINK)).unwrap();

        let err = current_version(dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::BrokenSymlink { .. }));
    }

    #[tokio::test]
    async fn test_plain_directory_is_broken() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(CURRENT_LINK)).unwrap();

        let err = current_version(dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::BrokenSymlink { .. }));
    }

    #[test]
    fn test_final_segment() {
        assert_eq!(final_segment(Path::new("/srv/app/releases/2.0.65")).as_deref(), Some("2.0.65"));
        assert_eq!(final_segment(Path::new("releases/2.0.65/")).as_deref(), Some("2.0.65"));
        assert_eq!(final_segment(Path::new("..")), None);
    }
}
