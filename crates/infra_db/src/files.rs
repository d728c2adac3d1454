//! Upload storage on the local filesystem
//!
//! Email attachments and evidence photos are written below a single upload
//! root; the database keeps the relative path returned by [`FileStore::save`].

use std::path::{Path, PathBuf};

use tracing::debug;

/// Longest stored file name, extension included
const MAX_FILE_NAME_LEN: usize = 120;

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `data` to `<root>/<folder>/<prefix>_<file name>`
    ///
    /// # Arguments
    ///
    /// * `folder` - Relative folder, e.g. `intake/<email id>`
    /// * `prefix` - Unique prefix so equal file names never collide
    /// * `file_name` - Name supplied by the sender, sanitized before use
    ///
    /// # Returns
    ///
    /// The path relative to the upload root
    pub async fn save(&self, folder: &str, prefix: &str, file_name: &str, data: &[u8]) -> std::io::Result<String> {
        let relative = format!("{}/{}_{}", folder.trim_matches('/'), prefix, sanitize_file_name(file_name));
        let path = self.root.join(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;
        debug!(path = %path.display(), bytes = data.len(), "stored upload");
        Ok(relative)
    }

    pub async fn read(&self, relative: &str) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(self.root.join(relative)).await
    }
}

/// Keeps letters, digits, dots, dashes and underscores; never empty
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        return "file".to_string();
    }
    if cleaned.len() <= MAX_FILE_NAME_LEN {
        return cleaned.to_string();
    }
    match cleaned.rfind('.') {
        Some(dot) if cleaned.len() - dot <= 10 => {
            let ext = &cleaned[dot..];
            format!("{}{}", &cleaned[..MAX_FILE_NAME_LEN - ext.len()], ext)
        }
        _ => cleaned[..MAX_FILE_NAME_LEN].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_paths_and_symbols() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\temp\\Policy Copy (1).pdf"), "Policy_Copy__1_.pdf");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "file");
    }

    #[test]
    fn test_sanitize_keeps_extension_when_truncating() {
        let long = format!("{}.pdf", "a".repeat(300));
        let cleaned = sanitize_file_name(&long);
        assert_eq!(cleaned.len(), MAX_FILE_NAME_LEN);
        assert!(cleaned.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn test_save_and_read_back() {
        let root = std::env::temp_dir().join(format!("claims-desk-files-{}", uuid::Uuid::new_v4()));
        let store = FileStore::new(&root);

        let relative = store.save("intake/abc", "01", "spot photo.jpg", b"jpeg").await.unwrap();
        assert_eq!(relative, "intake/abc/01_spot_photo.jpg");
        assert_eq!(store.read(&relative).await.unwrap(), b"jpeg");

        tokio::fs::remove_dir_all(root).await.unwrap();
    }
}
