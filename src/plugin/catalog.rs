use ignore::WalkBuilder;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SweepError};

const PACKAGE_KIND: &str = "Package";

/// A marketplace `Package` entity from the catalog directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogEntity {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub metadata: EntityMetadata,
    #[serde(default)]
    pub spec: PackageSpec,
    #[serde(skip)]
    pub source: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityMetadata {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSpec {
    #[serde(default)]
    pub package_name: Option<String>,
    #[serde(default)]
    pub dynamic_artifact: Option<String>,
    /// Everything else under `spec`, including `support` and `lifecycle`.
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_yaml::Value>,
}

impl PackageSpec {
    /// A scalar `spec` field rendered as text.
    pub fn field(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl CatalogEntity {
    /// Whether this entity describes the wrapper `dir_name` whose manifest is named `package_name`.
    pub fn describes(&self, dir_name: &str, package_name: Option<&str>) -> bool {
        let artifact_matches = self.spec.dynamic_artifact.as_deref().is_some_and(|artifact| {
            artifact
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .is_some_and(|last| last == dir_name)
        });
        let package_matches = matches!(
            (self.spec.package_name.as_deref(), package_name),
            (Some(a), Some(b)) if a == b
        );
        let name_matches = self.metadata.name.as_deref() == Some(dir_name);

        artifact_matches || package_matches || name_matches
    }
}

/// Every `Package` entity found under the catalog directory.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub entities: Vec<CatalogEntity>,
}

impl Catalog {
    pub fn load(catalog_dir: &Path) -> Result<Self> {
        if !catalog_dir.is_dir() {
            return Err(SweepError::CatalogDirMissing {
                path: catalog_dir.to_path_buf(),
            });
        }

        let mut files: Vec<PathBuf> = WalkBuilder::new(catalog_dir)
            .standard_filters(false)
            .build()
            .flatten()
            .map(|entry| entry.into_path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| ext == "yaml" || ext == "yml")
            })
            .collect();
        files.sort();

        let mut entities = Vec::new();
        for path in files {
            let raw = fs::read_to_string(&path).map_err(|source| SweepError::Read {
                path: path.clone(),
                source,
            })?;
            entities.extend(parse_entities(&path, &raw)?);
        }

        tracing::debug!(
            "loaded {} catalog entities from {}",
            entities.len(),
            catalog_dir.display()
        );
        Ok(Self { entities })
    }

    pub fn find(&self, dir_name: &str, package_name: Option<&str>) -> Option<&CatalogEntity> {
        self.entities
            .iter()
            .find(|entity| entity.describes(dir_name, package_name))
    }
}

/// Parse every `Package` document in one YAML file. Documents of any other
/// kind or shape are skipped without being deserialized.
pub fn parse_entities(path: &Path, raw: &str) -> Result<Vec<CatalogEntity>> {
    let syntax = |source| SweepError::CatalogSyntax {
        path: path.to_path_buf(),
        source,
    };

    let mut entities = Vec::new();
    for document in serde_yaml::Deserializer::from_str(raw) {
        let value = serde_yaml::Value::deserialize(document).map_err(syntax)?;
        if value.get("kind").and_then(serde_yaml::Value::as_str) != Some(PACKAGE_KIND) {
            continue;
        }

        let mut entity: CatalogEntity = serde_yaml::from_value(value).map_err(syntax)?;
        entity.source = path.to_path_buf();
        entities.push(entity);
    }
    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ADOPTION_INSIGHTS: &str = r#"
apiVersion: extensions.backstage.io/v1alpha1
kind: Package
metadata:
  name: red-hat-developer-hub-backstage-plugin-adoption-insights-backend
spec:
  packageName: "@red-hat-developer-hub/backstage-plugin-adoption-insights-backend"
  dynamicArtifact: ./dynamic-plugins/dist/red-hat-developer-hub-backstage-plugin-adoption-insights-backend-dynamic
  version: 0.2.1
  support: tech-preview
  lifecycle: active
"#;

    #[test]
    fn parses_package_spec_fields() {
        let entities = parse_entities(Path::new("a.yaml"), ADOPTION_INSIGHTS).unwrap();
        assert_eq!(entities.len(), 1);

        let spec = &entities[0].spec;
        assert_eq!(spec.field("support").as_deref(), Some("tech-preview"));
        assert_eq!(spec.field("lifecycle").as_deref(), Some("active"));
        assert_eq!(spec.field("version").as_deref(), Some("0.2.1"));
        assert_eq!(spec.field("owner"), None);
        assert_eq!(entities[0].source, PathBuf::from("a.yaml"));
    }

    #[test]
    fn multi_document_files_skip_other_kinds() {
        let raw = format!(
            "{ADOPTION_INSIGHTS}\n---\nkind: Plugin\nmetadata:\n  name: adoption-insights\n---\n"
        );
        let entities = parse_entities(Path::new("a.yaml"), &raw).unwrap();
        assert_eq!(entities.len(), 1);
    }

    #[test]
    fn other_kinds_of_any_shape_are_skipped() {
        let raw = format!(
            "{ADOPTION_INSIGHTS}\n---\nkind: Plugin\nmetadata:\n  name: [x, y]\n---\n- just\n- a list\n---\nplain scalar\n"
        );
        let entities = parse_entities(Path::new("a.yaml"), &raw).unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].kind.as_deref(), Some("Package"));
    }

    #[test]
    fn malformed_package_is_still_an_error() {
        let raw = "kind: Package\nmetadata:\n  name: [x, y]\n";
        let err = parse_entities(Path::new("bad.yaml"), raw).unwrap_err();
        assert!(matches!(err, SweepError::CatalogSyntax { .. }));
    }

    #[test]
    fn entity_matches_by_artifact_package_or_name() {
        let entity = parse_entities(Path::new("a.yaml"), ADOPTION_INSIGHTS)
            .unwrap()
            .remove(0);

        assert!(entity.describes(
            "red-hat-developer-hub-backstage-plugin-adoption-insights-backend-dynamic",
            None
        ));
        assert!(entity.describes(
            "renamed-dir",
            Some("@red-hat-developer-hub/backstage-plugin-adoption-insights-backend")
        ));
        assert!(entity.describes(
            "red-hat-developer-hub-backstage-plugin-adoption-insights-backend",
            None
        ));
        assert!(!entity.describes("something-else", Some("@other/plugin")));
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let err = parse_entities(Path::new("bad.yaml"), "kind: [Package\n").unwrap_err();
        assert!(matches!(err, SweepError::CatalogSyntax { .. }));
    }

    #[test]
    fn load_reads_yaml_and_yml_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a.yaml"), ADOPTION_INSIGHTS).unwrap();
        fs::write(
            dir.path().join("nested/b.yml"),
            "kind: Package\nmetadata:\n  name: b\nspec:\n  support: production\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "kind: Package").unwrap();

        let catalog = Catalog::load(dir.path()).unwrap();
        assert_eq!(catalog.entities.len(), 2);
        assert!(catalog.find("b", None).is_some());
        assert!(catalog.find("c", None).is_none());
    }

    #[test]
    fn missing_catalog_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::load(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, SweepError::CatalogDirMissing { .. }));
    }
}
