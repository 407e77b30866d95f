use anyhow::Context;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::model::config::SweepConfig;
use crate::model::keywords::ReservedPrefixes;
use crate::model::wrappers;
use crate::plugin::catalog::{Catalog, CatalogEntity};
use crate::plugin::manifest::PackageManifest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsistencyStatus {
    Consistent,
    Mismatch,
    NoYaml,
}

impl ConsistencyStatus {
    /// Statuses that block keyword removal.
    pub fn is_problem(self) -> bool {
        matches!(self, Self::Mismatch | Self::NoYaml)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Consistent => "CONSISTENT",
            Self::Mismatch => "MISMATCH",
            Self::NoYaml => "NO_YAML",
        }
    }
}

impl fmt::Display for ConsistencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The checker's verdict for one wrapper package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyResult {
    pub package: String,
    pub manifest_path: PathBuf,
    pub status: ConsistencyStatus,
    pub detail: Option<String>,
}

impl ConsistencyResult {
    pub fn new(package: impl Into<String>, manifest_path: PathBuf, status: ConsistencyStatus) -> Self {
        Self {
            package: package.into(),
            manifest_path,
            status,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Problem counts derived from a verdict list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProblemCounts {
    pub consistent: usize,
    pub mismatch: usize,
    pub no_yaml: usize,
}

impl ProblemCounts {
    pub fn tally(results: &[ConsistencyResult]) -> Self {
        results.iter().fold(Self::default(), |mut counts, result| {
            match result.status {
                ConsistencyStatus::Consistent => counts.consistent += 1,
                ConsistencyStatus::Mismatch => counts.mismatch += 1,
                ConsistencyStatus::NoYaml => counts.no_yaml += 1,
            }
            counts
        })
    }

    pub fn problems(&self) -> usize {
        self.mismatch + self.no_yaml
    }
}

/// Classifies every wrapper package under a repository root.
pub trait ConsistencyChecker {
    fn check(&self, repo_root: &Path) -> anyhow::Result<Vec<ConsistencyResult>>;
}

/// Compares wrapper manifest keywords with the marketplace catalog YAML files.
#[derive(Debug, Clone)]
pub struct CatalogChecker {
    config: SweepConfig,
    prefixes: ReservedPrefixes,
}

impl CatalogChecker {
    pub fn new(config: SweepConfig) -> Self {
        let prefixes = config.reserved_prefixes();
        Self { config, prefixes }
    }

    /// `None` for a manifest that cannot be parsed; the removal pass skips it too.
    fn classify(
        &self,
        wrapper: &wrappers::Wrapper,
        catalog: &Catalog,
    ) -> Option<ConsistencyResult> {
        let manifest = match PackageManifest::load(&wrapper.manifest_path) {
            Ok(manifest) => manifest,
            Err(err) => {
                tracing::warn!(
                    "not checking {}: {err}",
                    wrapper.manifest_path.display()
                );
                return None;
            }
        };

        let package = manifest.name().unwrap_or(&wrapper.name).to_string();
        let Some(entity) = catalog.find(&wrapper.name, manifest.name()) else {
            return Some(ConsistencyResult::new(
                package,
                wrapper.manifest_path.clone(),
                ConsistencyStatus::NoYaml,
            ));
        };

        let conflicts = self.conflicts(&manifest, entity);
        let result = ConsistencyResult::new(
            package,
            wrapper.manifest_path.clone(),
            if conflicts.is_empty() {
                ConsistencyStatus::Consistent
            } else {
                ConsistencyStatus::Mismatch
            },
        );

        if conflicts.is_empty() {
            Some(result)
        } else {
            Some(result.with_detail(conflicts.join("; ")))
        }
    }

    // One entry per reserved keyword the catalog entity disagrees with.
    fn conflicts(&self, manifest: &PackageManifest, entity: &CatalogEntity) -> Vec<String> {
        manifest
            .keywords()
            .iter()
            .filter_map(|kw| kw.as_str())
            .filter_map(|kw| {
                let prefix = self.prefixes.matching(kw)?;
                let field = prefix.trim_end_matches(':');
                let value = &kw[prefix.len()..];
                match entity.spec.field(field) {
                    Some(expected) if expected == value => None,
                    Some(expected) => Some(format!(
                        "{field}: package.json has '{value}', {} has '{expected}'",
                        entity.source.display()
                    )),
                    None => Some(format!(
                        "{field}: package.json has '{value}', {} has none",
                        entity.source.display()
                    )),
                }
            })
            .collect()
    }
}

impl ConsistencyChecker for CatalogChecker {
    fn check(&self, repo_root: &Path) -> anyhow::Result<Vec<ConsistencyResult>> {
        let wrappers = wrappers::discover(
            &self.config.wrappers_path(repo_root),
            &self.config.layout.manifest_file,
        )
        .context("failed to list wrapper packages")?;
        let catalog = Catalog::load(&self.config.catalog_path(repo_root))
            .context("failed to load marketplace catalog")?;

        let results: Vec<ConsistencyResult> = wrappers
            .iter()
            .filter_map(|wrapper| self.classify(wrapper, &catalog))
            .collect();

        for result in results.iter().filter(|r| r.status.is_problem()) {
            tracing::warn!(
                "{} {} ({}): {}",
                result.status,
                result.package,
                result.manifest_path.display(),
                result.detail.as_deref().unwrap_or("no catalog entity")
            );
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    struct Repo {
        dir: tempfile::TempDir,
    }

    impl Repo {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::create_dir_all(dir.path().join("dynamic-plugins/wrappers")).unwrap();
            fs::create_dir_all(dir.path().join("catalog-entities/marketplace/packages")).unwrap();
            Self { dir }
        }

        fn wrapper(&self, name: &str, manifest: &str) -> &Self {
            let dir = self.dir.path().join("dynamic-plugins/wrappers").join(name);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("package.json"), manifest).unwrap();
            self
        }

        fn entity(&self, file: &str, yaml: &str) -> &Self {
            fs::write(
                self.dir
                    .path()
                    .join("catalog-entities/marketplace/packages")
                    .join(file),
                yaml,
            )
            .unwrap();
            self
        }

        fn check(&self) -> Vec<ConsistencyResult> {
            CatalogChecker::new(SweepConfig::builtin().unwrap())
                .check(self.dir.path())
                .unwrap()
        }
    }

    fn statuses(results: &[ConsistencyResult]) -> Vec<(&str, ConsistencyStatus)> {
        results
            .iter()
            .map(|r| (r.package.as_str(), r.status))
            .collect()
    }

    #[test]
    fn classifies_each_wrapper() {
        let repo = Repo::new();
        repo.wrapper(
            "alpha-dynamic",
            r#"{"name": "alpha-dynamic", "keywords": ["support:production", "lifecycle:active"]}"#,
        )
        .wrapper(
            "beta-dynamic",
            r#"{"name": "beta-dynamic", "keywords": ["support:tech-preview"]}"#,
        )
        .wrapper("gamma-dynamic", r#"{"name": "gamma-dynamic"}"#)
        .entity(
            "alpha.yaml",
            "kind: Package\nmetadata:\n  name: alpha\nspec:\n  dynamicArtifact: ./dynamic-plugins/dist/alpha-dynamic\n  support: production\n  lifecycle: active\n",
        )
        .entity(
            "beta.yaml",
            "kind: Package\nmetadata:\n  name: beta\nspec:\n  packageName: beta-dynamic\n  support: production\n",
        );

        let results = repo.check();
        assert_eq!(
            statuses(&results),
            vec![
                ("alpha-dynamic", ConsistencyStatus::Consistent),
                ("beta-dynamic", ConsistencyStatus::Mismatch),
                ("gamma-dynamic", ConsistencyStatus::NoYaml),
            ]
        );
        assert!(
            results[1]
                .detail
                .as_deref()
                .unwrap()
                .contains("support: package.json has 'tech-preview'")
        );

        let counts = ProblemCounts::tally(&results);
        assert_eq!(counts.problems(), 2);
        assert_eq!(counts.consistent, 1);
    }

    #[test]
    fn catalog_without_field_is_a_mismatch() {
        let repo = Repo::new();
        repo.wrapper("a", r#"{"name": "a", "keywords": ["lifecycle:deprecated"]}"#)
            .entity("a.yaml", "kind: Package\nmetadata:\n  name: a\nspec: {}\n");

        let results = repo.check();
        assert_eq!(results[0].status, ConsistencyStatus::Mismatch);
        assert!(results[0].detail.as_deref().unwrap().ends_with("has none"));
    }

    #[test]
    fn unparsable_manifest_gets_no_verdict() {
        let repo = Repo::new();
        repo.wrapper("a-broken", "{not json")
            .wrapper("b-good", r#"{"name": "b-good", "keywords": ["support:production"]}"#)
            .entity(
                "b.yaml",
                "kind: Package\nmetadata:\n  name: b-good\nspec:\n  support: production\n",
            );

        let results = repo.check();
        assert_eq!(
            statuses(&results),
            vec![("b-good", ConsistencyStatus::Consistent)]
        );
    }

    #[test]
    fn missing_catalog_dir_fails_the_check() {
        let repo = Repo::new();
        fs::remove_dir_all(repo.dir.path().join("catalog-entities")).unwrap();

        let checker = CatalogChecker::new(SweepConfig::builtin().unwrap());
        assert!(checker.check(repo.dir.path()).is_err());
    }
}
