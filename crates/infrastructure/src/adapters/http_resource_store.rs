//! Resource store client using reqwest.
//!
//! Talks to a dashboard server exposing the resource API:
//! ```text
//! /api/v1/globalvariables[/{name}]
//! /api/v1/projects/{project}/variables[/{name}]
//! /api/v1/globaldatasources
//! /api/v1/projects/{project}/datasources
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;
use varscope_application::ports::{DatasourceRepository, RepositoryError, VariableRepository};
use varscope_domain::{DatasourceResource, Variable};

const API_PREFIX: [&str; 2] = ["api", "v1"];

/// Errors raised by the HTTP resource store.
#[derive(Debug, thiserror::Error)]
pub enum HttpRepositoryError {
    /// The base URL cannot carry a path.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The request could not be sent or its body not decoded.
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with an error status.
    #[error("Server returned {status}: {body}")]
    Status {
        /// HTTP status.
        status: StatusCode,
        /// Response body, for diagnostics.
        body: String,
    },
}

impl From<HttpRepositoryError> for RepositoryError {
    fn from(error: HttpRepositoryError) -> Self {
        match error {
            HttpRepositoryError::Status { status, body } if status == StatusCode::NOT_FOUND => {
                Self::NotFound(body)
            }
            HttpRepositoryError::Status { status, body }
                if status == StatusCode::BAD_REQUEST
                    || status == StatusCode::UNPROCESSABLE_ENTITY =>
            {
                Self::Invalid(body)
            }
            HttpRepositoryError::Request(e) if e.is_decode() => Self::Serialization(e.to_string()),
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Variable and datasource store backed by the resource API.
#[derive(Debug, Clone)]
pub struct HttpResourceStore {
    client: Client,
    base: Url,
}

impl HttpResourceStore {
    /// Creates a store for the server at `base`.
    ///
    /// # Errors
    /// Returns an error if `base` cannot carry a path or the client cannot
    /// be built.
    pub fn new(base: Url) -> Result<Self, HttpRepositoryError> {
        if base.cannot_be_a_base() {
            return Err(HttpRepositoryError::InvalidBaseUrl(base.to_string()));
        }
        let client = Client::builder()
            .user_agent(concat!("varscope/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, base })
    }

    /// Creates a store with a custom reqwest client.
    ///
    /// # Errors
    /// Returns an error if `base` cannot carry a path.
    pub fn with_client(client: Client, base: Url) -> Result<Self, HttpRepositoryError> {
        if base.cannot_be_a_base() {
            return Err(HttpRepositoryError::InvalidBaseUrl(base.to_string()));
        }
        Ok(Self { client, base })
    }

    /// Builds the URL of `segments` below the API prefix. Segments are
    /// percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, HttpRepositoryError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| HttpRepositoryError::InvalidBaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(segments);
        Ok(url)
    }

    fn variables_url(&self, project: Option<&str>, name: Option<&str>) -> Result<Url, HttpRepositoryError> {
        let mut segments = match project {
            Some(project) => vec!["projects", project, "variables"],
            None => vec!["globalvariables"],
        };
        segments.extend(name);
        self.endpoint(&segments)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, HttpRepositoryError> {
        let response = check(self.client.get(url).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn save_variable(&self, variable: &Variable) -> Result<(), HttpRepositoryError> {
        let project = variable.project_name();
        let url = self.variables_url(project, Some(variable.name()))?;
        let response = self.client.put(url).json(variable).send().await?;

        // An unknown resource is created instead.
        if response.status() == StatusCode::NOT_FOUND {
            let url = self.variables_url(project, None)?;
            check(self.client.post(url).json(variable).send().await?).await?;
        } else {
            check(response).await?;
        }
        Ok(())
    }

    async fn delete_variable(&self, variable: &Variable) -> Result<(), HttpRepositoryError> {
        let url = self.variables_url(variable.project_name(), Some(variable.name()))?;
        check(self.client.delete(url).send().await?).await?;
        Ok(())
    }

    async fn list_datasources(&self) -> Result<Vec<DatasourceResource>, HttpRepositoryError> {
        let mut datasources: Vec<DatasourceResource> =
            self.get_json(self.endpoint(&["globaldatasources"])?).await?;
        let projects: Vec<ProjectResource> = self.get_json(self.endpoint(&["projects"])?).await?;

        for project in projects {
            let name = project.metadata.name;
            let owned: Vec<DatasourceResource> = self
                .get_json(self.endpoint(&["projects", &name, "datasources"])?)
                .await?;
            datasources.extend(owned.into_iter().map(|mut datasource| {
                datasource.metadata.project = Some(name.clone());
                datasource
            }));
        }
        Ok(datasources)
    }
}

#[derive(serde::Deserialize)]
struct ProjectResource {
    metadata: ProjectMetadata,
}

#[derive(serde::Deserialize)]
struct ProjectMetadata {
    name: String,
}

/// Turns an error status into `HttpRepositoryError::Status`.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, HttpRepositoryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(%status, %body, "Resource API error");
    Err(HttpRepositoryError::Status { status, body })
}

#[async_trait]
impl VariableRepository for HttpResourceStore {
    async fn list_global(&self) -> Result<Vec<Variable>, RepositoryError> {
        let mut variables: Vec<Variable> = self.get_json(self.variables_url(None, None)?).await?;
        for variable in &mut variables {
            variable.metadata.project = None;
        }
        Ok(variables)
    }

    async fn list_project(&self, project: &str) -> Result<Vec<Variable>, RepositoryError> {
        let mut variables: Vec<Variable> =
            self.get_json(self.variables_url(Some(project), None)?).await?;
        for variable in &mut variables {
            variable.metadata.project = Some(project.to_string());
        }
        Ok(variables)
    }

    async fn save(&self, variable: &Variable) -> Result<(), RepositoryError> {
        Ok(self.save_variable(variable).await?)
    }

    async fn delete(&self, variable: &Variable) -> Result<(), RepositoryError> {
        Ok(self.delete_variable(variable).await?)
    }
}

#[async_trait]
impl DatasourceRepository for HttpResourceStore {
    async fn list_all(&self) -> Result<Vec<DatasourceResource>, RepositoryError> {
        Ok(self.list_datasources().await?)
    }
}
