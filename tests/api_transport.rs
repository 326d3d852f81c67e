//! Integration tests for the reqwest-backed GraphQL transport and the facet
//! fetcher on top of it.

mod helpers;

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::{mount_graphql, report_envelope, table_envelope, API_PATH, TEST_TOKEN};
use keystone_harvest::error_handling::FetchError;
use keystone_harvest::fetch::ReportFacets;
use keystone_harvest::{GraphQlTransport, ReportCode, WarcraftLogsClient};

fn client(server: &MockServer) -> WarcraftLogsClient {
    WarcraftLogsClient::new(
        Arc::new(reqwest::Client::new()),
        format!("{}{}", server.uri(), API_PATH),
        TEST_TOKEN,
    )
}

#[tokio::test]
async fn test_query_is_posted_as_json_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(header("content-type", "application/json"))
        .and(body_string_contains("\"query\":\"query ReportStart"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(report_envelope(json!({"startTime": 1_699_999_999_500u64}))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = client(&server);
    let code = ReportCode::new("ABC123");
    let facets = ReportFacets::new(&transport, &code);

    // Half-way values round to the even second
    assert_eq!(facets.report_start_secs().await.unwrap(), 1_700_000_000);
}

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthenticated."))
        .mount(&server)
        .await;

    let err = client(&server).execute("query Anything { }").await.unwrap_err();
    match err {
        FetchError::Status { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "Unauthenticated.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_graphql_errors_are_an_error() {
    let server = MockServer::start().await;
    mount_graphql(
        &server,
        &["ReportRoster"],
        json!({
            "errors": [{"message": "Invalid report code."}],
            "data": {"reportData": {"report": null}}
        }),
    )
    .await;

    let transport = client(&server);
    let code = ReportCode::new("nope");
    let err = ReportFacets::new(&transport, &code).roster().await.unwrap_err();
    assert!(matches!(err, FetchError::Api(ref message) if message == "Invalid report code."));
}

#[tokio::test]
async fn test_undecodable_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server).execute("query X { }").await.unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
}

#[tokio::test]
async fn test_fight_without_deaths_yields_empty_table() {
    let server = MockServer::start().await;
    mount_graphql(&server, &["DeathsTable", "fightIDs: [4]"], table_envelope(json!([]))).await;

    let transport = client(&server);
    let code = ReportCode::new("ABC123");
    let deaths = ReportFacets::new(&transport, &code).deaths(4).await.unwrap();
    assert!(deaths.is_empty());
}

#[tokio::test]
async fn test_missing_table_path_is_an_error() {
    let server = MockServer::start().await;
    mount_graphql(&server, &["DamageTable"], report_envelope(json!({"table": null}))).await;

    let transport = client(&server);
    let code = ReportCode::new("ABC123");
    let err = ReportFacets::new(&transport, &code).damage(1).await.unwrap_err();
    match err {
        FetchError::MissingPath { path } => assert_eq!(path, "data.reportData.report.table"),
        other => panic!("unexpected error: {other:?}"),
    }
}
