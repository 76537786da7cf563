use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::FerryConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["ferry.toml", "ferry.yaml", "ferry.yml", "ferry.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<FerryConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let config = parse_config(&substitute_env(&raw), path)?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?;
    Ok(config)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./ferry.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/ferry/ferry.{toml,yaml,yml,json}` (user-global)
///
/// Returns `FerryConfig::default()` if no usable config file is found.
pub fn discover_and_load() -> FerryConfig {
    let dirs = std::iter::once(PathBuf::from(".")).chain(config_dir());
    load_or_default(find_config_file(dirs))
}

/// Returns the user-global config directory (`~/.config/ferry/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "ferry").map(|d| d.config_dir().to_path_buf())
}

/// First existing config file, trying every file name in a directory
/// before moving on to the next directory.
fn find_config_file(dirs: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    dirs.into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)))
        .find(|p| p.is_file())
}

fn load_or_default(path: Option<PathBuf>) -> FerryConfig {
    let Some(path) = path else {
        debug!("no config file found, using defaults");
        return FerryConfig::default();
    };
    debug!(path = %path.display(), "loading config");
    match load_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            FerryConfig::default()
        },
    }
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<FerryConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "ferry.toml", "[chat.attachments]\nmax_bytes = 4096\n");
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.chat.attachments.max_bytes, 4096);
    }

    #[test]
    fn loads_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = write(
            &dir,
            "ferry.yaml",
            "chat:\n  attachments:\n    legacy_max_bytes: 10\n",
        );
        assert_eq!(
            load_config(&yaml).unwrap().chat.attachments.legacy_max_bytes,
            10
        );

        let json = write(
            &dir,
            "ferry.json",
            r#"{"chat":{"attachments":{"sniff_prefix_chars":64}}}"#,
        );
        assert_eq!(
            load_config(&json).unwrap().chat.attachments.sniff_prefix_chars,
            64
        );
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "ferry.ini", "max_bytes=1");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn rejects_zero_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "ferry.toml", "[chat.attachments]\nmax_bytes = 0\n");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("max_bytes must be greater than zero"));
    }

    #[test]
    fn search_prefers_earlier_directory_then_file_name() {
        let local = tempfile::tempdir().unwrap();
        let global = tempfile::tempdir().unwrap();
        let dirs = || [local.path().to_path_buf(), global.path().to_path_buf()];

        assert_eq!(find_config_file(dirs()), None);

        let global_toml = write(&global, "ferry.toml", "");
        assert_eq!(find_config_file(dirs()), Some(global_toml));

        let local_json = write(&local, "ferry.json", "{}");
        assert_eq!(find_config_file(dirs()), Some(local_json));

        let local_yaml = write(&local, "ferry.yaml", "{}");
        assert_eq!(find_config_file(dirs()), Some(local_yaml));
    }

    #[test]
    fn directory_named_like_config_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("ferry.toml")).unwrap();
        let json = write(&dir, "ferry.json", "{}");
        assert_eq!(find_config_file([dir.path().to_path_buf()]), Some(json));
    }

    #[test]
    fn discovered_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "ferry.yml", "chat:\n  attachments:\n    max_bytes: 512\n");
        let cfg = load_or_default(find_config_file([dir.path().to_path_buf()]));
        assert_eq!(cfg.chat.attachments.max_bytes, 512);
    }

    #[test]
    fn unusable_or_missing_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_or_default(None), FerryConfig::default());

        let bad = write(&dir, "ferry.toml", "[chat.attachments]\nmax_bytes = 0\n");
        assert_eq!(load_or_default(Some(bad)), FerryConfig::default());
    }

    #[test]
    fn global_dir_is_named_after_the_gateway() {
        if let Some(dir) = config_dir() {
            assert!(dir.to_string_lossy().contains("ferry"), "{}", dir.display());
        }
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(&dir.path().join("absent.toml")).is_err());
    }
}
