//! JSON envelope around a finished (or failed) protocol run.

use crate::core::errors::SimulationError;
use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct SimulationResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable report, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    /// Error message if the run failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
}

impl<T: Serialize> SimulationResponse<T> {
    pub fn ok(data: T, analysis: Option<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            analysis,
            error: None,
            error_kind: None,
        }
    }

    pub fn failure(err: &SimulationError) -> Self {
        Self {
            success: false,
            data: None,
            analysis: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
        }
    }

    /// Wraps a run result, rendering the analysis only on success.
    pub fn from_result(
        result: Result<T, SimulationError>,
        analyze: impl FnOnce(&T) -> Option<String>,
    ) -> Self {
        match result {
            Ok(data) => {
                let analysis = analyze(&data);
                Self::ok(data, analysis)
            }
            Err(err) => Self::failure(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ParameterError;

    #[test]
    fn success_envelope_omits_error_fields() {
        let response = SimulationResponse::ok(vec![1, 2], Some("report".to_string()));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert_eq!(json["analysis"], "report");
        assert!(json.get("error").is_none());
        assert!(json.get("error_kind").is_none());
    }

    #[test]
    fn failure_envelope_carries_kind() {
        let err = SimulationError::from(ParameterError::InvalidProbability {
            name: "depolarization",
            value: 2.0,
        });
        let response = SimulationResponse::<u8>::from_result(Err(err), |_| None);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error_kind"], "invalid_parameters");
        assert!(json["error"].as_str().unwrap().contains("depolarization"));
        assert!(json.get("data").is_none());
    }
}
