//! Filesystem helpers.

use std::io;
use std::path::Path;

use tokio::fs::DirBuilder;

/// Creates `path` and any missing parents. Existing directories are fine.
///
/// New directories get mode `0755` on Unix.
pub async fn create_directory_if_not_exist(path: impl AsRef<Path>) -> io::Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o755);
    builder.create(path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_nested_and_tolerates_existing() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("a/b/c");

        create_directory_if_not_exist(&dir).await.unwrap();
        assert!(dir.is_dir());
        create_directory_if_not_exist(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn fails_when_a_file_is_in_the_way() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("taken");
        std::fs::write(&file, b"x").unwrap();

        assert!(create_directory_if_not_exist(file.join("sub")).await.is_err());
    }
}
