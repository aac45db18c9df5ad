use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tokio::fs;

// STORAGE DIRECTORY

/// Read-only view of a directory of `<name>.json` files. Resolving it never
/// touches the filesystem.
#[derive(Debug, Clone)]
pub struct StorageDir {
    // Absolute path to the storage directory (e.g., ".../target/debug/storage")
    pub base_dir: PathBuf,
}

impl StorageDir {
    /// `relative_path` next to the running executable.
    pub fn new_relative<P: AsRef<Path>>(relative_path: P) -> anyhow::Result<Self> {
        let exe_path = std::env::current_exe()?;
        let base_dir = exe_path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Could not find binary directory"))?
            .join(relative_path);
        Ok(Self::new(base_dir))
    }

    pub fn new<P: Into<PathBuf>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", filename))
    }

    pub fn exists(&self, filename: &str) -> bool {
        self.path_of(filename).is_file()
    }

    /// Reads `<filename>.json` into `T`.
    pub async fn load<T: DeserializeOwned>(&self, filename: &str) -> anyhow::Result<T> {
        load_json(self.path_of(filename)).await
    }
}

/// Reads raw bytes and lets serde_json do the UTF-8 scan while parsing.
pub async fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> anyhow::Result<T> {
    let content = fs::read(path).await?;
    Ok(serde_json::from_slice(&content)?)
}

/// Writes to a `.tmp` sibling first and renames it over the target, so a
/// crash mid-write never leaves a truncated file behind.
pub async fn write_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> anyhow::Result<()> {
    let final_path = path.as_ref();
    if let Some(parent) = final_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let mut tmp_name = final_path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("{} has no file name", final_path.display()))?
        .to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = final_path.with_file_name(tmp_name);

    fs::write(&tmp_path, bytes).await?;
    fs::rename(&tmp_path, final_path).await?;
    Ok(())
}
