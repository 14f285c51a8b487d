use anyhow::Context;
use relsync_core::config::{find_config, Config};
use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigSource {
    Explicit(PathBuf),
    Discovered(PathBuf),
    Builtin,
}

/// Decide where the configuration comes from.
///
/// Priority:
/// 1. `--config` flag / `RELSYNC_CONFIG` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `relsync.yaml`
/// 3. The configuration built into the binary
pub fn resolve_config_source(explicit: Option<&Path>, cwd: &Path) -> ConfigSource {
    if let Some(p) = explicit {
        return ConfigSource::Explicit(p.to_path_buf());
    }
    match find_config(cwd) {
        Some(found) => ConfigSource::Discovered(found),
        None => ConfigSource::Builtin,
    }
}

pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match resolve_config_source(explicit, &cwd) {
        ConfigSource::Explicit(path) | ConfigSource::Discovered(path) => {
            tracing::info!(path = %path.display(), "loading config");
            Config::load(&path).with_context(|| format!("failed to load {}", path.display()))
        }
        ConfigSource::Builtin => {
            tracing::info!("using built-in config");
            Config::builtin().context("built-in config is invalid")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_config_wins() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("relsync.yaml"), "").unwrap();
        let explicit = dir.path().join("other.yaml");
        assert_eq!(
            resolve_config_source(Some(&explicit), dir.path()),
            ConfigSource::Explicit(explicit)
        );
    }

    #[test]
    fn finds_config_in_parent() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("relsync.yaml"), "").unwrap();
        let subdir = dir.path().join("src/deep");
        std::fs::create_dir_all(&subdir).unwrap();
        assert_eq!(
            resolve_config_source(None, &subdir),
            ConfigSource::Discovered(dir.path().join("relsync.yaml"))
        );
    }
}
