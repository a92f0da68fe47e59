use reqwest::StatusCode;
use serde_json::{Map, Value};

use crate::endpoint::Endpoint;
use crate::error::{QueryError, status_detail};
use crate::table::ResultTable;

/// Standard AQS response: `{"Header": [{...}], "Data": [{...}, ...]}`.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct Envelope {
    #[serde(default, rename = "Header")]
    pub(crate) header: Vec<Header>,
    #[serde(default, rename = "Data")]
    pub(crate) data: Vec<Map<String, Value>>,
}

#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct Header {
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default)]
    pub(crate) rows: Option<u64>,
    // A single string on some services, a list on others.
    #[serde(default)]
    pub(crate) error: Option<Value>,
}

impl Header {
    pub(crate) fn is_failed(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case("failed"))
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        match &self.error {
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .filter(|s| !s.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl Envelope {
    /// Row count declared by the first header row, if any.
    pub(crate) fn declared_rows(&self) -> Option<u64> {
        self.header.first().and_then(|h| h.rows)
    }
}

/// Turns a raw HTTP exchange into a table or a classified failure.
///
/// Order of checks: HTTP status, body shape, `Failed` header, declared row count, and
/// finally an empty `Data` array, which counts as no data on every endpoint.
pub(crate) fn classify(
    endpoint: Endpoint,
    status: StatusCode,
    body: &str,
) -> Result<ResultTable, QueryError> {
    if !status.is_success() {
        // Error bodies often still carry the standard header with messages.
        let messages = serde_json::from_str::<Envelope>(body)
            .ok()
            .and_then(|env| env.header.into_iter().next())
            .map(|h| h.messages())
            .unwrap_or_default();
        return Err(QueryError::Status {
            endpoint,
            status,
            detail: status_detail(status, &messages),
        });
    }

    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|source| QueryError::Decode { endpoint, source })?;

    if let Some(header) = envelope.header.first() {
        if header.is_failed() {
            return Err(QueryError::Rejected {
                endpoint,
                messages: header.messages(),
            });
        }
    }

    if envelope.declared_rows() == Some(0) || envelope.data.is_empty() {
        return Err(QueryError::NoMatchingData { endpoint });
    }

    Ok(ResultTable::from_records(envelope.data, endpoint.renames()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use serde_json::json;

    fn ok(endpoint: Endpoint, body: Value) -> Result<ResultTable, QueryError> {
        classify(endpoint, StatusCode::OK, &body.to_string())
    }

    #[test]
    fn state_list_without_header_becomes_a_table() {
        let t = ok(
            Endpoint::States,
            json!({"Data": [{"code": "01", "value_represented": "Alabama"}]}),
        )
        .unwrap();
        assert_eq!(t.columns(), ["code", "state_name"]);
        assert_eq!(t.get_str(0, "code"), Some("01"));
        assert_eq!(t.get_str(0, "state_name"), Some("Alabama"));
    }

    #[test]
    fn parameter_classes_rename_both_columns() {
        let t = ok(
            Endpoint::ParameterClasses,
            json!({"Data": [{"code": "AQI", "value_represented": "AQI Pollutants"}]}),
        )
        .unwrap();
        assert_eq!(t.columns(), ["class_name", "class_description"]);
        assert_eq!(t.get_str(0, "class_name"), Some("AQI"));
        assert_eq!(t.get_str(0, "class_description"), Some("AQI Pollutants"));
    }

    #[test]
    fn zero_rows_is_no_matching_data_everywhere() {
        for ep in Endpoint::ALL {
            let err = ok(
                ep,
                json!({"Header": [{"status": "No data matched your selection", "rows": 0}], "Data": []}),
            )
            .unwrap_err();
            assert_eq!(err.kind(), FailureKind::NoMatchingData, "{ep}");
        }
    }

    #[test]
    fn zero_rows_wins_even_if_data_is_present() {
        let err = ok(
            Endpoint::AnnualByState,
            json!({"Header": [{"rows": 0}], "Data": [{"x": 1}]}),
        )
        .unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn failed_header_is_rejected_with_messages() {
        let err = ok(
            Endpoint::AnnualBySite,
            json!({"Header": [{"status": "Failed", "rows": 0, "error": ["Invalid email or key."]}]}),
        )
        .unwrap_err();
        match err {
            QueryError::Rejected { messages, .. } => {
                assert_eq!(messages, vec!["Invalid email or key.".to_string()])
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn non_success_status_is_transport_error() {
        let body = json!({"Header": [{"status": "Failed", "error": "server exploded"}]}).to_string();
        let err = classify(Endpoint::MonitorsBySite, StatusCode::INTERNAL_SERVER_ERROR, &body)
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport);
        assert!(err.to_string().contains("server exploded"));

        let err = classify(Endpoint::States, StatusCode::NOT_FOUND, "<html>").unwrap_err();
        assert_eq!(err.kind(), FailureKind::Transport);
    }

    #[test]
    fn garbage_body_is_decode_error() {
        let err = classify(Endpoint::MetroAreas, StatusCode::OK, "not json").unwrap_err();
        assert_eq!(err.kind(), FailureKind::Decode);
    }

    #[test]
    fn positive_row_count_keeps_all_records() {
        let t = ok(
            Endpoint::AnnualByCounty,
            json!({
                "Header": [{"status": "Success", "rows": 2}],
                "Data": [
                    {"parameter_code": "88101", "arithmetic_mean": 7.2},
                    {"parameter_code": "88101", "arithmetic_mean": 8.9}
                ]
            }),
        )
        .unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.columns(), ["parameter_code", "arithmetic_mean"]);
    }
}
