use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use directories::ProjectDirs;
use tracing::debug;

pub const KEY_STORE_FILE_NAME: &str = "keys.json";

/// Where keyguard keeps its files on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDirectory {
    root: PathBuf,
}

impl DataDirectory {
    /// Use `root_dir` if given, otherwise the platform-specific data
    /// directory, e.g. `~/.local/share/keyguard` on Linux.
    pub fn get(root_dir: Option<PathBuf>) -> Result<Self> {
        let root = match root_dir {
            Some(explicit_root) => explicit_root,
            None => ProjectDirs::from("", "", "keyguard")
                .context("Could not determine data directory")?
                .data_dir()
                .to_path_buf(),
        };
        debug!("Data directory is {}", root.display());

        Ok(Self { root })
    }

    pub fn root_dir_path(&self) -> &Path {
        &self.root
    }

    /// The key store file: `explicit` if given, otherwise
    /// [`KEY_STORE_FILE_NAME`] inside the data directory.
    pub fn key_store_file_path(&self, explicit: Option<PathBuf>) -> PathBuf {
        explicit.unwrap_or_else(|| self.root.join(KEY_STORE_FILE_NAME))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn explicit_root_is_used_verbatim() {
        let data_dir = DataDirectory::get(Some(PathBuf::from("/tmp/keyguard-test"))).unwrap();
        assert_eq!(Path::new("/tmp/keyguard-test"), data_dir.root_dir_path());
        assert_eq!(
            PathBuf::from("/tmp/keyguard-test/keys.json"),
            data_dir.key_store_file_path(None)
        );
    }

    #[test]
    fn explicit_key_store_overrides_data_dir() {
        let data_dir = DataDirectory::get(Some(PathBuf::from("/tmp/keyguard-test"))).unwrap();
        assert_eq!(
            PathBuf::from("/elsewhere/keys.json"),
            data_dir.key_store_file_path(Some(PathBuf::from("/elsewhere/keys.json")))
        );
    }
}
