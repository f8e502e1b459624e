use crate::core::PreferenceStore;
use crate::utils::error::Result;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const PREFERENCES_FILE: &str = "preferences.json";

/// 以狀態目錄下的 `preferences.json` 保存偏好設定
#[derive(Debug, Clone)]
pub struct LocalPreferenceStore {
    base_path: String,
}

impl LocalPreferenceStore {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    pub fn file_path(&self) -> PathBuf {
        Path::new(&self.base_path).join(PREFERENCES_FILE)
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match tokio::fs::read(self.file_path()).await {
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl PreferenceStore for LocalPreferenceStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.read_all().await?;
        Ok(values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.read_all().await?;
        values.insert(key.to_string(), value.to_string());

        let full_path = self.file_path();
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let data = serde_json::to_vec_pretty(&values)?;
        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalPreferenceStore::new(temp_dir.path().to_str().unwrap().to_string());
        assert_eq!(store.get("theme").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_creates_directory_and_keeps_other_keys() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("nested/state");
        let store = LocalPreferenceStore::new(base.to_str().unwrap().to_string());

        store.set("theme", "dark").await.unwrap();
        store.set("locale", "en-IN").await.unwrap();
        store.set("theme", "light").await.unwrap();

        assert_eq!(store.get("theme").await.unwrap().as_deref(), Some("light"));
        assert_eq!(store.get("locale").await.unwrap().as_deref(), Some("en-IN"));
        assert!(base.join("preferences.json").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("preferences.json"), "not json").unwrap();
        let store = LocalPreferenceStore::new(temp_dir.path().to_str().unwrap().to_string());
        assert!(store.get("theme").await.is_err());
    }
}
