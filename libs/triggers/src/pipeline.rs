//! Starting Codefresh pipelines for a fired trigger.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error};
use url::Url;

const DEFAULT_BRANCH: &str = "master";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to find '{name}' pipeline in {repo_owner}/{repo_name}")]
    NotFound {
        name: String,
        repo_owner: String,
        repo_name: String,
    },
    #[error("invalid codefresh url '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("codefresh request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("codefresh returned {status} for {path}")]
    Status { status: u16, path: String },
    #[error("pipeline '{name}' failed: {message}")]
    Failed { name: String, message: String },
}

/// Starts one pipeline and returns the id of the resulting build.
#[async_trait]
pub trait PipelineRunner: Send + Sync {
    async fn run_pipeline(
        &self,
        name: &str,
        repo_owner: &str,
        repo_name: &str,
        vars: &BTreeMap<String, String>,
    ) -> Result<String, PipelineError>;
}

pub type SharedPipelineRunner = Arc<dyn PipelineRunner>;

#[derive(Deserialize)]
struct ServicePipeline {
    #[serde(rename = "_id")]
    id: String,
    name: String,
}

#[derive(Serialize)]
struct BuildRequest<'a> {
    branch: &'a str,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    variables: &'a BTreeMap<String, String>,
}

/// Runs pipelines through the Codefresh REST API.
///
/// The pipeline id is looked up by name under `api/services/<owner>/<repo>`, then a build
/// of the default branch is requested with the event variables.
#[derive(Clone)]
pub struct CodefreshPipelineRunner {
    client: Client,
    base: String,
    token: String,
}

impl CodefreshPipelineRunner {
    pub fn new(base: impl Into<String>, token: impl Into<String>) -> Result<Self, PipelineError> {
        let base = base.into();
        Url::parse(&base).map_err(|source| PipelineError::InvalidBaseUrl {
            url: base.clone(),
            source,
        })?;
        Ok(Self {
            client: Client::new(),
            base: base.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    async fn pipeline_id(
        &self,
        name: &str,
        repo_owner: &str,
        repo_name: &str,
    ) -> Result<String, PipelineError> {
        let path = format!(
            "api/services/{}/{}",
            urlencoding::encode(repo_owner),
            urlencoding::encode(repo_name)
        );
        let resp = self
            .client
            .get(format!("{}/{path}", self.base))
            .header("x-access-token", &self.token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(PipelineError::Status {
                status: resp.status().as_u16(),
                path,
            });
        }
        let pipelines: Vec<ServicePipeline> = resp.json().await?;
        pipelines
            .into_iter()
            .find(|p| p.name == name)
            .map(|p| {
                debug!(pipeline = %name, id = %p.id, "found pipeline id");
                p.id
            })
            .ok_or_else(|| PipelineError::NotFound {
                name: name.to_string(),
                repo_owner: repo_owner.to_string(),
                repo_name: repo_name.to_string(),
            })
    }
}

#[async_trait]
impl PipelineRunner for CodefreshPipelineRunner {
    async fn run_pipeline(
        &self,
        name: &str,
        repo_owner: &str,
        repo_name: &str,
        vars: &BTreeMap<String, String>,
    ) -> Result<String, PipelineError> {
        let id = self
            .pipeline_id(name, repo_owner, repo_name)
            .await
            .inspect_err(|err| error!(pipeline = %name, error = %err, "pipeline lookup failed"))?;

        let path = format!("api/builds/{}", urlencoding::encode(&id));
        let resp = self
            .client
            .post(format!("{}/{path}", self.base))
            .header("x-access-token", &self.token)
            .json(&BuildRequest {
                branch: DEFAULT_BRANCH,
                variables: vars,
            })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            error!(pipeline = %name, status = status.as_u16(), "failed to start build");
            return Err(PipelineError::Status {
                status: status.as_u16(),
                path,
            });
        }
        let body = resp.text().await?;
        let build = build_id_from_body(&body).unwrap_or(id);
        debug!(pipeline = %name, build = %build, "pipeline is running");
        Ok(build)
    }
}

/// The builds endpoint answers with the build id either as a JSON string, an object with
/// `id`, or plain text.
fn build_id_from_body(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(id)) => Some(id),
        Ok(serde_json::Value::Object(obj)) => obj
            .get("id")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        Ok(_) => None,
        Err(_) => Some(body.to_string()),
    }
}

/// One recorded `run_pipeline` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineCall {
    pub name: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub vars: BTreeMap<String, String>,
}

enum Scripted {
    Missing,
    Fail(String),
}

/// Records invocations; pipelines fail only when scripted to.
#[derive(Clone, Default)]
pub struct InMemoryPipelineRunner {
    calls: Arc<Mutex<Vec<PipelineCall>>>,
    scripted: Arc<Mutex<HashMap<String, Scripted>>>,
}

impl InMemoryPipelineRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `name` answer with `PipelineError::NotFound`.
    pub async fn missing(&self, name: &str) {
        self.scripted
            .lock()
            .await
            .insert(name.to_string(), Scripted::Missing);
    }

    pub async fn fail(&self, name: &str, message: &str) {
        self.scripted
            .lock()
            .await
            .insert(name.to_string(), Scripted::Fail(message.to_string()));
    }

    pub async fn calls(&self) -> Vec<PipelineCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl PipelineRunner for InMemoryPipelineRunner {
    async fn run_pipeline(
        &self,
        name: &str,
        repo_owner: &str,
        repo_name: &str,
        vars: &BTreeMap<String, String>,
    ) -> Result<String, PipelineError> {
        let mut calls = self.calls.lock().await;
        calls.push(PipelineCall {
            name: name.to_string(),
            repo_owner: repo_owner.to_string(),
            repo_name: repo_name.to_string(),
            vars: vars.clone(),
        });
        match self.scripted.lock().await.get(name) {
            Some(Scripted::Missing) => Err(PipelineError::NotFound {
                name: name.to_string(),
                repo_owner: repo_owner.to_string(),
                repo_name: repo_name.to_string(),
            }),
            Some(Scripted::Fail(message)) => Err(PipelineError::Failed {
                name: name.to_string(),
                message: message.clone(),
            }),
            None => Ok(format!("build-{}", calls.len())),
        }
    }
}
