use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle state reported by the prediction API. Statuses this service
/// does not know are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    Other(String),
}

impl PredictionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PredictionStatus::Starting => "starting",
            PredictionStatus::Processing => "processing",
            PredictionStatus::Succeeded => "succeeded",
            PredictionStatus::Failed => "failed",
            PredictionStatus::Canceled => "canceled",
            PredictionStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for PredictionStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "starting" => PredictionStatus::Starting,
            "processing" => PredictionStatus::Processing,
            "succeeded" => PredictionStatus::Succeeded,
            "failed" => PredictionStatus::Failed,
            "canceled" => PredictionStatus::Canceled,
            _ => PredictionStatus::Other(raw),
        }
    }
}

impl From<PredictionStatus> for String {
    fn from(status: PredictionStatus) -> Self {
        match status {
            PredictionStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PredictionResult {
    pub id: String,
    pub status: PredictionStatus,
    pub output: Option<String>,
}

/// Prediction as returned by the Replicate API. Only the fields this
/// service forwards are decoded.
#[derive(Debug, Deserialize)]
pub(crate) struct RawPrediction {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Value,
}

impl From<RawPrediction> for PredictionResult {
    fn from(raw: RawPrediction) -> Self {
        Self {
            id: raw.id,
            status: raw.status,
            output: output_url(&raw.output),
        }
    }
}

/// Image models report either a single URL or a list of URLs.
fn output_url(output: &Value) -> Option<String> {
    match output {
        Value::String(url) => Some(url.clone()),
        Value::Array(items) => items.iter().find_map(|v| v.as_str()).map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: Value) -> PredictionResult {
        serde_json::from_value::<RawPrediction>(body).unwrap().into()
    }

    #[test]
    fn pending_prediction_has_no_output() {
        let result = parse(json!({
            "id": "gm3qorzdhgbfurvjtvhg6dckhu",
            "status": "starting",
            "output": null,
            "urls": { "get": "https://api.replicate.com/v1/predictions/gm3qorzdhgbfurvjtvhg6dckhu" }
        }));
        assert_eq!(result.id, "gm3qorzdhgbfurvjtvhg6dckhu");
        assert_eq!(result.status, PredictionStatus::Starting);
        assert!(result.output.is_none());
    }

    #[test]
    fn missing_output_field_is_none() {
        let result = parse(json!({ "id": "p1", "status": "processing" }));
        assert_eq!(result.status, PredictionStatus::Processing);
        assert!(result.output.is_none());
    }

    #[test]
    fn string_output_is_used_directly() {
        let result = parse(json!({
            "id": "p1",
            "status": "succeeded",
            "output": "https://replicate.delivery/out.png"
        }));
        assert_eq!(result.output.as_deref(), Some("https://replicate.delivery/out.png"));
    }

    #[test]
    fn array_output_takes_first_url() {
        let result = parse(json!({
            "id": "p1",
            "status": "succeeded",
            "output": ["https://replicate.delivery/a.png", "https://replicate.delivery/b.png"]
        }));
        assert_eq!(result.output.as_deref(), Some("https://replicate.delivery/a.png"));
    }

    #[test]
    fn unrecognised_status_is_kept_verbatim() {
        let result = parse(json!({ "id": "p1", "status": "aborted" }));
        assert_eq!(result.status, PredictionStatus::Other("aborted".into()));
        assert_eq!(serde_json::to_value(&result.status).unwrap(), json!("aborted"));
    }

    #[test]
    fn known_status_round_trips_as_string() {
        let status: PredictionStatus = serde_json::from_value(json!("succeeded")).unwrap();
        assert_eq!(status, PredictionStatus::Succeeded);
        assert_eq!(status.as_str(), "succeeded");
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(PredictionStatus::Canceled).unwrap(),
            json!("canceled")
        );
    }
}
