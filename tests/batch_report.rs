//! End-to-end tests for the batch report flow.
//!
//! The Data API and the OAuth token endpoint are played by wiremock servers,
//! so these run without network access or real credentials.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Timelike, Utc};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ga4_reports::client::{Credentials, DataApiClient, ServiceAccountKey};
use ga4_reports::errors::ReportError;
use ga4_reports::models::report_config::ReportConfig;
use ga4_reports::models::request::DateRange;
use ga4_reports::report::{AlignmentPolicy, BatchReportBuilder};
use ga4_reports::table::FixedProvenance;

const BATCH_PATH: &str = "/v1beta/properties/123456:batchRunReports";

fn client(server: &MockServer) -> DataApiClient {
    DataApiClient::new(server.uri(), "test-token", Duration::from_secs(5)).unwrap()
}

fn report(rows: serde_json::Value) -> serde_json::Value {
    json!({ "rows": rows, "kind": "analyticsData#runReport" })
}

fn row(dims: &[&str], mets: &[&str]) -> serde_json::Value {
    json!({
        "dimensionValues": dims.iter().map(|v| json!({ "value": v })).collect::<Vec<_>>(),
        "metricValues": mets.iter().map(|v| json!({ "value": v })).collect::<Vec<_>>(),
    })
}

fn two_reports() -> ReportConfig {
    ReportConfig::from_yaml_str(
        r#"
signal_data:
  - dimension: [date, userGender, userAgeBracket]
  - metric: [activeUsers]
active_usr:
  - dimension: [date]
  - metric: [active1DayUsers, active7DayUsers, active28DayUsers]
"#,
    )
    .unwrap()
}

mod scenarios {
    use super::*;

    #[tokio::test]
    async fn test_single_report_scenario() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(BATCH_PATH))
            .and(header("authorization", "Bearer test-token"))
            .and(body_partial_json(json!({
                "requests": [{
                    "dimensions": [{ "name": "date" }],
                    "metrics": [{ "name": "activeUsers" }],
                    "dateRanges": [{ "startDate": "2024-04-01", "endDate": "2024-04-30" }],
                    "limit": 100000
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "reports": [report(json!([row(&["20240401"], &["42"])]))],
                "kind": "analyticsData#batchRunReports"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = ReportConfig::from_yaml_str(
            r#"{"r1": [{"dimension": ["date"]}, {"metric": ["activeUsers"]}]}"#,
        )
        .unwrap();

        let tables = BatchReportBuilder::default()
            .generate_batch_report(&client(&server), "123456", &config)
            .await
            .unwrap();

        let table = tables.get("r1").unwrap();
        assert_eq!(table.column_names(), vec!["date", "activeUsers", "uuid", "emitted_at"]);
        let midnight = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(table.column("date").unwrap().as_date().unwrap(), [midnight]);
        assert_eq!(table.column("activeUsers").unwrap().as_integer().unwrap(), [42]);
    }

    #[tokio::test]
    async fn test_two_reports_demultiplexed_in_order() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(BATCH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "reports": [
                    report(json!([
                        row(&["20240401", "female", "25-34"], &["12"]),
                        row(&["20240401", "male", "35-44"], &["9"]),
                        row(&["20240402", "female", "18-24"], &["4"]),
                    ])),
                    report(json!([
                        row(&["20240401"], &["30", "110", "402"]),
                    ])),
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tables = BatchReportBuilder::new(DateRange::default())
            .generate_batch_report(&client(&server), "123456", &two_reports())
            .await
            .unwrap();

        assert_eq!(tables.names().collect::<Vec<_>>(), vec!["signal_data", "active_usr"]);

        let signal = tables.get("signal_data").unwrap();
        assert_eq!(signal.num_rows(), 3);
        assert_eq!(signal.num_columns(), 3 + 1 + 2);
        assert_eq!(
            signal.column("userAgeBracket").unwrap().as_text().unwrap(),
            ["25-34", "35-44", "18-24"]
        );
        assert_eq!(signal.column("activeUsers").unwrap().as_integer().unwrap(), [12, 9, 4]);

        let active = tables.get("active_usr").unwrap();
        assert_eq!(active.num_rows(), 1);
        assert_eq!(active.num_columns(), 1 + 3 + 2);
        assert_eq!(active.column("active28DayUsers").unwrap().as_integer().unwrap(), [402]);
        assert!(active.column("userGender").is_none());
    }

    #[tokio::test]
    async fn test_provenance_columns_per_table() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(BATCH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "reports": [
                    report(json!([
                        row(&["20240401", "female", "25-34"], &["1"]),
                        row(&["20240402", "male", "35-44"], &["2"]),
                    ])),
                    report(json!([row(&["20240401"], &["1", "2", "3"])])),
                ]
            })))
            .mount(&server)
            .await;

        let tables = BatchReportBuilder::default()
            .generate_batch_report(&client(&server), "123456", &two_reports())
            .await
            .unwrap();

        for table in &tables {
            let ids = table.column("uuid").unwrap().as_text().unwrap();
            assert_eq!(ids.iter().collect::<HashSet<_>>().len(), table.num_rows());
            assert!(ids.iter().all(|id| id.len() == 32));

            let stamps = table.column("emitted_at").unwrap().as_timestamp().unwrap();
            assert!(stamps.iter().all(|t| Some(*t) == table.emitted_at()));

            let dates = table.column("date").unwrap().as_date().unwrap();
            assert!(dates.iter().all(|d| d.num_seconds_from_midnight() == 0));
        }
    }

    #[tokio::test]
    async fn test_fixed_provenance_is_reproducible() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(BATCH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "reports": [
                    report(json!([row(&["20240401", "female", "25-34"], &["1"])])),
                    report(json!([row(&["20240401"], &["1", "2", "3"])])),
                ]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let at = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap();
        let builder = BatchReportBuilder::default();
        let client = client(&server);

        let first = builder
            .generate_batch_report_with(&client, "123456", &two_reports(), &mut FixedProvenance::new(at))
            .await
            .unwrap();
        let second = builder
            .generate_batch_report_with(&client, "123456", &two_reports(), &mut FixedProvenance::new(at))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.get("signal_data").unwrap().emitted_at(), Some(at));
    }

    #[tokio::test]
    async fn test_result_set_serializes_in_config_order() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(BATCH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "reports": [
                    report(json!([row(&["20240401", "female", "25-34"], &["5"])])),
                    report(json!([])),
                ]
            })))
            .mount(&server)
            .await;

        let at = Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap();
        let tables = BatchReportBuilder::default()
            .generate_batch_report_with(&client(&server), "123456", &two_reports(), &mut FixedProvenance::new(at))
            .await
            .unwrap();

        let out = serde_json::to_string(&tables).unwrap();
        assert!(out.starts_with(r#"{"signal_data":[{"date":"2024-04-01T00:00:00","userGender":"female""#));
        assert!(out.ends_with(r#""active_usr":[]}"#));
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn test_unknown_report_fails_before_sending() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reports": [] })))
            .expect(0)
            .mount(&server)
            .await;

        let config = ReportConfig::from_yaml_str("broken:\n  - dimension: [date]\n").unwrap();
        let err = BatchReportBuilder::default()
            .generate_batch_report(&client(&server), "123456", &config)
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::MissingFieldKind { .. }));
    }

    #[tokio::test]
    async fn test_short_response_strict_and_lenient() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(BATCH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "reports": [report(json!([row(&["20240401", "female", "25-34"], &["3"])]))]
            })))
            .mount(&server)
            .await;

        let err = BatchReportBuilder::default()
            .generate_batch_report(&client(&server), "123456", &two_reports())
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::ReportCountMismatch { requested: 2, returned: 1 }));

        let tables = BatchReportBuilder::default()
            .with_alignment(AlignmentPolicy::Lenient)
            .generate_batch_report(&client(&server), "123456", &two_reports())
            .await
            .unwrap();
        assert_eq!(tables.names().collect::<Vec<_>>(), vec!["signal_data"]);
        assert!(tables.get("active_usr").is_none());
    }

    #[tokio::test]
    async fn test_service_error_propagates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(BATCH_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "code": 400, "message": "Field fooBar is not a valid dimension.", "status": "INVALID_ARGUMENT" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = BatchReportBuilder::default()
            .generate_batch_report(&client(&server), "123456", &two_reports())
            .await
            .unwrap_err();

        match err {
            ReportError::Service { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("not a valid dimension"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_non_numeric_metric_is_fatal() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(BATCH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "reports": [
                    report(json!([row(&["20240401", "female", "25-34"], &["n/a"])])),
                    report(json!([])),
                ]
            })))
            .mount(&server)
            .await;

        let err = BatchReportBuilder::default()
            .generate_batch_report(&client(&server), "123456", &two_reports())
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Coercion { ref column, .. } if column == "activeUsers"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(BATCH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = BatchReportBuilder::default()
            .generate_batch_report(&client(&server), "123456", &two_reports())
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Decode(_)));
    }
}

mod credentials {
    use super::*;

    const PRIVATE_KEY: &str = include_str!("fixtures/test_key.pem");

    fn key_file(token_uri: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        let key = json!({
            "type": "service_account",
            "project_id": "demo",
            "private_key_id": "kid-1",
            "private_key": PRIVATE_KEY,
            "client_email": "reports@demo.iam.gserviceaccount.com",
            "token_uri": token_uri,
        });
        std::fs::write(file.path(), key.to_string()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_service_account_token_used_for_batch() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"))
            .and(body_string_contains("assertion="))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.minted",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(BATCH_PATH))
            .and(header("authorization", "Bearer ya29.minted"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "reports": [report(json!([])), report(json!([]))]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let file = key_file(&format!("{}/token", server.uri()));
        let credentials = Credentials::service_account_file(file.path()).unwrap();
        let client = DataApiClient::connect(server.uri(), &credentials, Duration::from_secs(5))
            .await
            .unwrap();

        let tables = BatchReportBuilder::default()
            .generate_batch_report(&client, "123456", &two_reports())
            .await
            .unwrap();
        assert_eq!(tables.len(), 2);
        assert!(tables.iter().all(|t| t.num_rows() == 0));
    }

    #[tokio::test]
    async fn test_rejected_token_exchange() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "invalid_grant" })))
            .expect(1)
            .mount(&server)
            .await;

        let key: ServiceAccountKey = serde_json::from_str(
            &std::fs::read_to_string(key_file(&format!("{}/token", server.uri())).path()).unwrap(),
        )
        .unwrap();
        let err = DataApiClient::connect(server.uri(), &Credentials::ServiceAccount(key), Duration::from_secs(5))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ReportError::Credentials(ref msg) if msg.contains("invalid_grant")));
    }
}
