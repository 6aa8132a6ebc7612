use std::time::Duration;

use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::{ModelInfo, ModelsResponse};
use crate::core::config::ApiConfig;
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

const DEFAULT_OWNER: &str = "DeepSeek";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Model {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created: Option<u64>,
    pub owned_by: Option<String>,
}

impl Model {
    fn fallback(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: Some(description.to_string()),
            created: None,
            owned_by: Some(DEFAULT_OWNER.to_string()),
        }
    }
}

impl From<ModelInfo> for Model {
    fn from(info: ModelInfo) -> Self {
        let name = info
            .id
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or(&info.id)
            .to_string();
        Self {
            name,
            description: info.description.filter(|d| !d.is_empty()),
            created: info.created,
            owned_by: info
                .owned_by
                .filter(|o| !o.is_empty())
                .or_else(|| Some(DEFAULT_OWNER.to_string())),
            id: info.id,
        }
    }
}

/// The catalogue reported when live discovery fails.
pub fn fallback_models() -> Vec<Model> {
    vec![
        Model::fallback("deepseek-chat", "DeepSeek Chat", "General purpose chat model"),
        Model::fallback("deepseek-coder", "DeepSeek Coder", "Specialized for coding tasks"),
        Model::fallback(
            "deepseek-llm-67b-chat",
            "DeepSeek LLM 67B Chat",
            "67B parameter chat model",
        ),
        Model::fallback("deepseek-math", "DeepSeek Math", "Specialized for mathematical tasks"),
    ]
}

pub async fn fetch_models(
    client: &reqwest::Client,
    config: &ApiConfig,
    timeout: Duration,
) -> Result<Vec<Model>, ApiError> {
    let models_url = construct_api_url(&config.base_url, "models");
    let request = add_auth_headers(client.get(models_url), &config.api_key).timeout(timeout);

    let response = request
        .send()
        .await
        .map_err(|err| ApiError::from_transport(err, timeout))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::from_status(status, &body));
    }

    let models_response = response
        .json::<ModelsResponse>()
        .await
        .map_err(|err| ApiError::from_transport(err, timeout))?;

    Ok(models_response.data.into_iter().map(Model::from).collect())
}

/// Newest first; models without a creation time sort after dated ones, by id.
pub fn sort_models(models: &mut [Model]) {
    models.sort_by(|a, b| match (a.created, b.created) {
        (Some(a_created), Some(b_created)) => b_created.cmp(&a_created).then(a.id.cmp(&b.id)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.id.cmp(&b.id),
    });
}
