//! Datasource resources and lookup
//!
//! The datasource store is the first layer of a resolution context: variable
//! queries name a datasource through a [`DatasourceSelector`] and the store
//! decides which resource answers it. Project datasources shadow global ones
//! of the same name.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{DomainError, DomainResult};
use crate::variable::validate_name;

/// Identity of a datasource resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasourceMetadata {
    /// Datasource name.
    pub name: String,
    /// Owning project. `None` means the datasource is global.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

/// Plugin backing a datasource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourcePlugin {
    /// Plugin kind, e.g. `PrometheusDatasource`.
    pub kind: String,
    /// Plugin-specific configuration.
    #[serde(default)]
    pub spec: serde_json::Value,
}

/// Datasource definition payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceSpec {
    /// Whether this is the default datasource for its plugin kind.
    #[serde(default)]
    pub default: bool,
    /// Backing plugin.
    pub plugin: DatasourcePlugin,
}

/// A datasource resource as listed by the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasourceResource {
    /// Identity.
    pub metadata: DatasourceMetadata,
    /// Payload.
    pub spec: DatasourceSpec,
}

impl DatasourceResource {
    /// Creates a global datasource of the given plugin kind.
    #[must_use]
    pub fn global(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            metadata: DatasourceMetadata {
                name: name.into(),
                project: None,
            },
            spec: DatasourceSpec {
                default: false,
                plugin: DatasourcePlugin {
                    kind: kind.into(),
                    spec: serde_json::Value::Null,
                },
            },
        }
    }

    /// Creates a project datasource of the given plugin kind.
    #[must_use]
    pub fn project(
        project: impl Into<String>,
        name: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        let mut resource = Self::global(name, kind);
        resource.metadata.project = Some(project.into());
        resource
    }

    /// Marks this datasource as the default for its kind.
    #[must_use]
    pub fn as_default(mut self) -> Self {
        self.spec.default = true;
        self
    }

    /// Returns the plugin kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.spec.plugin.kind
    }

    /// Returns the datasource name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// Reference from a variable to a datasource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasourceSelector {
    /// Plugin kind.
    pub kind: String,
    /// Datasource name. `None` selects the default datasource of `kind`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl DatasourceSelector {
    /// Selects the default datasource of `kind`.
    #[must_use]
    pub fn kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: None,
        }
    }

    /// Selects a named datasource of `kind`.
    #[must_use]
    pub fn named(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: Some(name.into()),
        }
    }
}

/// Datasources addressable from one project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasourceStore {
    project: Option<String>,
    project_datasources: Vec<DatasourceResource>,
    global_datasources: Vec<DatasourceResource>,
}

impl DatasourceStore {
    /// Builds the store for `project` from the full inventory.
    ///
    /// Datasources belonging to other projects are not addressable and are
    /// left out.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidDatasource` if a datasource has an
    /// invalid name, an empty plugin kind, or if two datasources share a name
    /// within the same scope.
    pub fn new(project: Option<&str>, inventory: Vec<DatasourceResource>) -> DomainResult<Self> {
        let project = project.filter(|p| !p.is_empty()).map(ToString::to_string);
        let mut seen = HashSet::new();
        let mut project_datasources = Vec::new();
        let mut global_datasources = Vec::new();

        for datasource in inventory {
            validate_name(&datasource.metadata.name)
                .map_err(|e| DomainError::InvalidDatasource(e.to_string()))?;
            if datasource.kind().trim().is_empty() {
                return Err(DomainError::InvalidDatasource(format!(
                    "datasource '{}' has no plugin kind",
                    datasource.name()
                )));
            }
            if !seen.insert(datasource.metadata.clone()) {
                return Err(DomainError::InvalidDatasource(format!(
                    "duplicate datasource '{}'",
                    datasource.name()
                )));
            }

            match &datasource.metadata.project {
                None => global_datasources.push(datasource),
                Some(owner) if Some(owner) == project.as_ref() => {
                    project_datasources.push(datasource);
                }
                Some(_) => {}
            }
        }

        Ok(Self {
            project,
            project_datasources,
            global_datasources,
        })
    }

    /// Returns the project this store resolves for.
    #[must_use]
    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    /// Finds the datasource answering `selector`.
    ///
    /// A named selector matches by kind and name, project first. An unnamed
    /// selector picks the default datasource of the kind, project first.
    #[must_use]
    pub fn find(&self, selector: &DatasourceSelector) -> Option<&DatasourceResource> {
        let scopes = [&self.project_datasources, &self.global_datasources];
        scopes.into_iter().find_map(|datasources| {
            datasources.iter().find(|ds| {
                ds.kind() == selector.kind
                    && selector
                        .name
                        .as_deref()
                        .map_or(ds.spec.default, |name| ds.name() == name)
            })
        })
    }

    /// Lists every addressable datasource, project ones first, with global
    /// datasources shadowed by a project datasource of the same name omitted.
    #[must_use]
    pub fn list(&self) -> Vec<&DatasourceResource> {
        let shadowed: HashSet<&str> = self
            .project_datasources
            .iter()
            .map(DatasourceResource::name)
            .collect();
        self.project_datasources
            .iter()
            .chain(
                self.global_datasources
                    .iter()
                    .filter(|ds| !shadowed.contains(ds.name())),
            )
            .collect()
    }

    /// Returns the number of addressable datasources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.list().len()
    }

    /// Returns true if no datasource is addressable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.project_datasources.is_empty() && self.global_datasources.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PROM: &str = "PrometheusDatasource";

    fn inventory() -> Vec<DatasourceResource> {
        vec![
            DatasourceResource::global("prom", PROM).as_default(),
            DatasourceResource::global("tempo", "TempoDatasource"),
            DatasourceResource::project("infra", "prom", PROM),
            DatasourceResource::project("infra", "prom-infra", PROM).as_default(),
            DatasourceResource::project("web", "prom-web", PROM).as_default(),
        ]
    }

    #[test]
    fn test_project_datasource_shadows_global() {
        let store = DatasourceStore::new(Some("infra"), inventory()).expect("Should build");

        let found = store
            .find(&DatasourceSelector::named(PROM, "prom"))
            .expect("Should find");
        assert_eq!(found.metadata.project.as_deref(), Some("infra"));
    }

    #[test]
    fn test_default_prefers_project() {
        let store = DatasourceStore::new(Some("infra"), inventory()).expect("Should build");

        let found = store.find(&DatasourceSelector::kind(PROM)).expect("Should find");
        assert_eq!(found.name(), "prom-infra");
    }

    #[test]
    fn test_default_falls_back_to_global() {
        let store = DatasourceStore::new(None, inventory()).expect("Should build");

        let found = store.find(&DatasourceSelector::kind(PROM)).expect("Should find");
        assert_eq!(found.name(), "prom");
        assert!(found.metadata.project.is_none());
    }

    #[test]
    fn test_other_projects_are_not_addressable() {
        let store = DatasourceStore::new(Some("infra"), inventory()).expect("Should build");

        assert!(store.find(&DatasourceSelector::named(PROM, "prom-web")).is_none());
        let names: Vec<&str> = store.list().iter().map(|ds| ds.name()).collect();
        assert_eq!(names, vec!["prom", "prom-infra", "tempo"]);
    }

    #[test]
    fn test_duplicate_datasource_is_rejected() {
        let inventory = vec![
            DatasourceResource::global("prom", PROM),
            DatasourceResource::global("prom", PROM),
        ];
        let result = DatasourceStore::new(None, inventory);
        assert!(matches!(result, Err(DomainError::InvalidDatasource(_))));
    }

    #[test]
    fn test_missing_kind_is_rejected() {
        let result = DatasourceStore::new(None, vec![DatasourceResource::global("x", " ")]);
        assert!(matches!(result, Err(DomainError::InvalidDatasource(_))));
    }
}
