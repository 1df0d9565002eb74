//! File-based resource store.
//!
//! Variables and datasources are stored as one JSON file per resource:
//! ```text
//! data_dir/
//!   globalvariables/
//!     region.json
//!   globaldatasources/
//!     prom.json
//!   projects/
//!     infra/
//!       variables/
//!         region.json
//!       datasources/
//!         prom-infra.json
//! ```
//! The directory a file lives in decides its scope; a `project` field in the
//! file that disagrees with it is overwritten on load.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use varscope_application::ports::{DatasourceRepository, RepositoryError, VariableRepository};
use varscope_domain::variable::validate_name;
use varscope_domain::{DatasourceResource, Variable};

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

const GLOBAL_VARIABLES: &str = "globalvariables";
const GLOBAL_DATASOURCES: &str = "globaldatasources";
const PROJECTS: &str = "projects";
const VARIABLES: &str = "variables";
const DATASOURCES: &str = "datasources";

/// Resource store backed by a directory tree.
#[derive(Debug, Clone)]
pub struct FileResourceStore {
    root: PathBuf,
}

impl FileResourceStore {
    /// Creates a store rooted at `root`. Nothing is created until the first
    /// save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn variables_dir(&self, project: Option<&str>) -> PathBuf {
        match project {
            Some(project) => self.root.join(PROJECTS).join(project).join(VARIABLES),
            None => self.root.join(GLOBAL_VARIABLES),
        }
    }

    fn datasources_dir(&self, project: Option<&str>) -> PathBuf {
        match project {
            Some(project) => self.root.join(PROJECTS).join(project).join(DATASOURCES),
            None => self.root.join(GLOBAL_DATASOURCES),
        }
    }

    fn variable_path(&self, variable: &Variable) -> Result<PathBuf, RepositoryError> {
        validate_name(variable.name()).map_err(|e| RepositoryError::Invalid(e.to_string()))?;
        if let Some(project) = variable.project_name() {
            validate_name(project).map_err(|e| RepositoryError::Invalid(e.to_string()))?;
        }
        Ok(self
            .variables_dir(variable.project_name())
            .join(format!("{}.json", variable.name())))
    }

    /// Saves a datasource resource.
    ///
    /// # Errors
    /// Returns an error if the name is invalid or the file cannot be
    /// written.
    pub async fn save_datasource(&self, datasource: &DatasourceResource) -> Result<(), RepositoryError> {
        validate_name(datasource.name()).map_err(|e| RepositoryError::Invalid(e.to_string()))?;
        let project = datasource.metadata.project.as_deref();
        if let Some(project) = project {
            validate_name(project).map_err(|e| RepositoryError::Invalid(e.to_string()))?;
        }
        let path = self
            .datasources_dir(project)
            .join(format!("{}.json", datasource.name()));
        write_resource(&path, datasource).await
    }

    async fn project_names(&self) -> Result<Vec<String>, RepositoryError> {
        let mut names: Vec<String> = list_entries(&self.root.join(PROJECTS))
            .await?
            .into_iter()
            .filter_map(|path| {
                path.file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .collect();
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl VariableRepository for FileResourceStore {
    async fn list_global(&self) -> Result<Vec<Variable>, RepositoryError> {
        let mut variables: Vec<Variable> = read_resources(&self.variables_dir(None)).await?;
        for variable in &mut variables {
            variable.metadata.project = None;
        }
        Ok(variables)
    }

    async fn list_project(&self, project: &str) -> Result<Vec<Variable>, RepositoryError> {
        validate_name(project).map_err(|e| RepositoryError::Invalid(e.to_string()))?;
        let mut variables: Vec<Variable> =
            read_resources(&self.variables_dir(Some(project))).await?;
        for variable in &mut variables {
            variable.metadata.project = Some(project.to_string());
        }
        Ok(variables)
    }

    async fn save(&self, variable: &Variable) -> Result<(), RepositoryError> {
        let path = self.variable_path(variable)?;
        write_resource(&path, variable).await?;
        tracing::debug!(path = %path.display(), "Variable written");
        Ok(())
    }

    async fn delete(&self, variable: &Variable) -> Result<(), RepositoryError> {
        let path = self.variable_path(variable)?;
        fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RepositoryError::NotFound(variable.name().to_string())
            } else {
                RepositoryError::Io(e)
            }
        })?;
        tracing::debug!(path = %path.display(), "Variable removed");
        Ok(())
    }
}

#[async_trait]
impl DatasourceRepository for FileResourceStore {
    async fn list_all(&self) -> Result<Vec<DatasourceResource>, RepositoryError> {
        let mut datasources: Vec<DatasourceResource> =
            read_resources(&self.datasources_dir(None)).await?;
        for datasource in &mut datasources {
            datasource.metadata.project = None;
        }

        for project in self.project_names().await? {
            let owned: Vec<DatasourceResource> =
                read_resources(&self.datasources_dir(Some(&project))).await?;
            datasources.extend(owned.into_iter().map(|mut datasource| {
                datasource.metadata.project = Some(project.clone());
                datasource
            }));
        }
        Ok(datasources)
    }
}

/// Lists a directory, sorted. A missing directory is empty.
async fn list_entries(dir: &Path) -> Result<Vec<PathBuf>, RepositoryError> {
    let mut reader = match fs::read_dir(dir).await {
        Ok(reader) => reader,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(RepositoryError::Io(e)),
    };

    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        entries.push(entry.path());
    }
    entries.sort();
    Ok(entries)
}

/// Reads every `*.json` resource in `dir`, in file name order.
async fn read_resources<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>, RepositoryError> {
    let mut resources = Vec::new();
    for path in list_entries(dir).await? {
        if path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let content = fs::read(&path).await?;
        let resource = from_json_bytes(&content).map_err(|e| {
            RepositoryError::Serialization(format!("{}: {e}", path.display()))
        })?;
        resources.push(resource);
    }
    Ok(resources)
}

async fn write_resource<T: Serialize + Sync>(path: &Path, resource: &T) -> Result<(), RepositoryError> {
    let content =
        to_json_stable_bytes(resource).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, content).await?;
    Ok(())
}
