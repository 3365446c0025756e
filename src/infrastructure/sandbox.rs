//! Isolated execution environment for managed blade children
//! (`spec.md` §4.5), the Rust-native analogue of `ensure_virtualenv` in
//! `multi.py`. A compiled binary has no package manager to invoke, so
//! "provisioning" here is directory materialization plus an optional
//! manifest check, preserving the original's "proceed bare and warn"
//! fallback rather than inventing a dependency installer.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Tracks which sandbox directories have already been ensured this
/// process lifetime, so repeated respawns of the same managed node don't
/// redo the check (`spec.md`: "Environment creation is one-shot and
/// cached").
#[derive(Default)]
pub struct SandboxRegistry {
    ensured: Mutex<HashSet<PathBuf>>,
}

impl SandboxRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensures `venv_path` exists, creating it if absent. If a
    /// `requirements.txt` sits next to `manifest_dir`, its presence is
    /// logged; if absent, a warning is logged and the bare directory is
    /// used (`multi.py`'s "proceeding without installing packages").
    pub fn ensure(&self, venv_path: &Path, manifest_dir: &Path) -> std::io::Result<()> {
        {
            let ensured = self.ensured.lock().expect("sandbox registry lock poisoned");
            if ensured.contains(venv_path) {
                return Ok(());
            }
        }

        if venv_path.exists() {
            tracing::info!(path = %venv_path.display(), "sandbox already exists");
        } else {
            tracing::info!(path = %venv_path.display(), "creating sandbox");
            std::fs::create_dir_all(venv_path)?;

            let manifest = manifest_dir.join("requirements.txt");
            if manifest.exists() {
                tracing::info!(manifest = %manifest.display(), "found dependency manifest");
            } else {
                tracing::warn!(
                    manifest = %manifest.display(),
                    "manifest not found - proceeding without provisioning"
                );
            }
        }

        self.ensured
            .lock()
            .expect("sandbox registry lock poisoned")
            .insert(venv_path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_directory_once() {
        let tmp = tempfile::tempdir().unwrap();
        let venv = tmp.path().join("node_one");
        let registry = SandboxRegistry::new();

        registry.ensure(&venv, tmp.path()).unwrap();
        assert!(venv.exists());

        // Second call is a no-op hitting the cache, not an error.
        registry.ensure(&venv, tmp.path()).unwrap();
    }
}
