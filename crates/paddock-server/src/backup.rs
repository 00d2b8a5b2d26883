use std::path::{Path, PathBuf};

use paddock_core::time::file_stamp_now;

/// Write an export document as `paddock_backup_<stamp>.csv` under `dir`,
/// creating the directory if needed.
pub async fn write_backup(dir: &Path, contents: String) -> std::io::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("paddock_backup_{}.csv", file_stamp_now()));
    tokio::fs::write(&path, contents).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_stamped_file() {
        let dir = std::env::temp_dir().join(format!("paddock-backup-test-{}", std::process::id()));
        let path = write_backup(&dir, "Phase,race\n".to_string()).await.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("paddock_backup_"));
        assert!(name.ends_with(".csv"));
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "Phase,race\n");
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
