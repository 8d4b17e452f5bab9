use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Map, Value, json};
use tracing::info;

use crate::{
    config::{ModelConfig, ReplicateConfig},
    error::ServiceError,
    prediction::{PredictionClient, PredictionResult, types::RawPrediction},
};

pub struct ReplicateClient {
    http: reqwest::Client,
    api_url: String,
    api_token: String,
    model: ModelConfig,
}

impl ReplicateClient {
    pub fn new(config: &ReplicateConfig, model: ModelConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            model,
        }
    }

    fn model_for(&self, name: &str) -> Result<&ModelConfig, ServiceError> {
        if self.model.name == name {
            Ok(&self.model)
        } else {
            Err(ServiceError::UnknownModel(name.to_string()))
        }
    }

    /// Pinned versions go through `/predictions`; otherwise the model's
    /// latest version is used through the official-model endpoint.
    fn prediction_request(&self, model: &ModelConfig, input: Value) -> (String, Value) {
        match model.version.as_deref() {
            Some(version) => (
                format!("{}/predictions", self.api_url),
                json!({ "version": version, "input": input }),
            ),
            None => (
                format!("{}/models/{}/predictions", self.api_url, model.reference),
                json!({ "input": input }),
            ),
        }
    }
}

#[async_trait]
impl PredictionClient for ReplicateClient {
    async fn supported_formats(&self, model: &str) -> Result<Vec<String>, ServiceError> {
        Ok(self.model_for(model)?.output_formats.clone())
    }

    async fn create_prediction(
        &self,
        model: &str,
        mut input: Map<String, Value>,
        format: Option<&str>,
    ) -> Result<PredictionResult, ServiceError> {
        let model = self.model_for(model)?;
        if let Some(format) = format {
            input.insert("output_format".into(), Value::String(format.to_string()));
        }

        let (url, body) = self.prediction_request(model, Value::Object(input));
        info!(model = %model.reference, %url, "creating prediction");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(api_error(status, &text));
        }

        let raw: RawPrediction = resp.json().await?;
        let result = PredictionResult::from(raw);
        info!(id = %result.id, status = ?result.status, "prediction created");
        Ok(result)
    }
}

fn api_error(status: StatusCode, body: &str) -> ServiceError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    ServiceError::Prediction(format!("Replicate API error ({}): {detail}", status.as_u16()))
}
