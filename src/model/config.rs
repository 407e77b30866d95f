use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SweepError};
use crate::model::keywords::ReservedPrefixes;

/// Repo-local overlay, looked up at the repository root.
pub const REPO_CONFIG_FILE: &str = ".keyword-sweep.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    pub layout: LayoutConfig,
    pub keywords: KeywordConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    pub wrappers_dir: String,
    pub manifest_file: String,
    pub catalog_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeywordConfig {
    pub reserved_prefixes: Vec<String>,
}

// Overlay layers only carry the fields they set.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    #[serde(default)]
    layout: Option<PartialLayout>,
    #[serde(default)]
    keywords: Option<PartialKeywords>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialLayout {
    wrappers_dir: Option<String>,
    manifest_file: Option<String>,
    catalog_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialKeywords {
    reserved_prefixes: Option<Vec<String>>,
}

impl SweepConfig {
    /// Load configuration with layering: defaults → user config → repo config → `explicit`.
    pub fn load(repo_root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::builtin()?;

        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "keyword-sweep") {
            let user_path = proj_dirs.config_dir().join("config.toml");
            if user_path.is_file() {
                config.overlay_file(&user_path)?;
            }
        }

        let repo_path = repo_root.join(REPO_CONFIG_FILE);
        if repo_path.is_file() {
            config.overlay_file(&repo_path)?;
        }

        if let Some(path) = explicit {
            config.overlay_file(path)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// The embedded defaults, with no overlays applied.
    pub fn builtin() -> Result<Self> {
        let defaults = include_str!("../../config/default.toml");
        toml::from_str(defaults).map_err(|source| SweepError::ConfigSyntax {
            path: PathBuf::from("<builtin>"),
            source,
        })
    }

    fn overlay_file(&mut self, path: &Path) -> Result<()> {
        let raw = fs::read_to_string(path).map_err(|source| SweepError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.overlay_str(&raw, path)
    }

    fn overlay_str(&mut self, raw: &str, origin: &Path) -> Result<()> {
        let partial: PartialConfig =
            toml::from_str(raw).map_err(|source| SweepError::ConfigSyntax {
                path: origin.to_path_buf(),
                source,
            })?;

        if let Some(layout) = partial.layout {
            if let Some(dir) = layout.wrappers_dir {
                self.layout.wrappers_dir = dir;
            }
            if let Some(file) = layout.manifest_file {
                self.layout.manifest_file = file;
            }
            if let Some(dir) = layout.catalog_dir {
                self.layout.catalog_dir = dir;
            }
        }

        if let Some(prefixes) = partial.keywords.and_then(|k| k.reserved_prefixes) {
            self.keywords.reserved_prefixes = prefixes;
        }

        tracing::debug!("applied config overlay {}", origin.display());
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.keywords.reserved_prefixes.is_empty() {
            return Err(SweepError::ConfigInvalid {
                message: "keywords.reserved_prefixes must not be empty".to_string(),
            });
        }
        if self
            .keywords
            .reserved_prefixes
            .iter()
            .any(|prefix| prefix.is_empty())
        {
            return Err(SweepError::ConfigInvalid {
                message: "keywords.reserved_prefixes must not contain an empty prefix".to_string(),
            });
        }
        if self.layout.manifest_file.trim().is_empty() {
            return Err(SweepError::ConfigInvalid {
                message: "layout.manifest_file must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn wrappers_path(&self, repo_root: &Path) -> PathBuf {
        resolve(repo_root, &self.layout.wrappers_dir)
    }

    pub fn catalog_path(&self, repo_root: &Path) -> PathBuf {
        resolve(repo_root, &self.layout.catalog_dir)
    }

    pub fn reserved_prefixes(&self) -> ReservedPrefixes {
        ReservedPrefixes::new(self.keywords.reserved_prefixes.iter().cloned())
    }
}

// Relative paths hang off the repo root; `~` expands to the home directory.
fn resolve(repo_root: &Path, configured: &str) -> PathBuf {
    if let Some(rest) = configured.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }

    let path = Path::new(configured);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        repo_root.join(path)
    }
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_defaults_match_catalog_layout() {
        let config = SweepConfig::builtin().unwrap();
        assert_eq!(config.layout.wrappers_dir, "dynamic-plugins/wrappers");
        assert_eq!(config.layout.manifest_file, "package.json");
        assert_eq!(
            config.layout.catalog_dir,
            "catalog-entities/marketplace/packages"
        );
        assert_eq!(
            config.keywords.reserved_prefixes,
            vec!["support:".to_string(), "lifecycle:".to_string()]
        );
    }

    #[test]
    fn overlay_replaces_only_fields_it_sets() {
        let mut config = SweepConfig::builtin().unwrap();
        config
            .overlay_str(
                "[keywords]\nreserved_prefixes = [\"support:\", \"lifecycle:\", \"tier:\"]\n",
                Path::new("overlay.toml"),
            )
            .unwrap();

        assert_eq!(config.layout.wrappers_dir, "dynamic-plugins/wrappers");
        assert_eq!(config.keywords.reserved_prefixes.len(), 3);
    }

    #[test]
    fn overlay_rejects_unknown_keys() {
        let mut config = SweepConfig::builtin().unwrap();
        let err = config
            .overlay_str("[layout]\nwrapper_dir = \"x\"\n", Path::new("typo.toml"))
            .unwrap_err();
        assert!(matches!(err, SweepError::ConfigSyntax { .. }));
    }

    #[test]
    fn repo_local_config_is_applied() {
        let repo = tempfile::tempdir().unwrap();
        fs::write(
            repo.path().join(REPO_CONFIG_FILE),
            "[layout]\nwrappers_dir = \"plugins/wrappers\"\n",
        )
        .unwrap();

        let config = SweepConfig::load(repo.path(), None).unwrap();
        assert_eq!(
            config.wrappers_path(repo.path()),
            repo.path().join("plugins/wrappers")
        );
    }

    #[test]
    fn empty_prefix_list_is_rejected() {
        let repo = tempfile::tempdir().unwrap();
        let explicit = repo.path().join("custom.toml");
        fs::write(&explicit, "[keywords]\nreserved_prefixes = []\n").unwrap();

        let err = SweepConfig::load(repo.path(), Some(&explicit)).unwrap_err();
        assert!(matches!(err, SweepError::ConfigInvalid { .. }));
    }

    #[test]
    fn absolute_paths_are_kept() {
        let mut config = SweepConfig::builtin().unwrap();
        config.layout.catalog_dir = "/srv/catalog".to_string();
        assert_eq!(
            config.catalog_path(Path::new("/repo")),
            PathBuf::from("/srv/catalog")
        );
    }
}
