// Shared test helpers: a mock GraphQL endpoint and report fixtures.
//
// Every mock matches on fragments of the request body (operation name, report
// code, fight id), so one MockServer can serve several reports at once.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use keystone_harvest::{Config, LogFormat, LogLevel};

#[allow(dead_code)]
pub const API_PATH: &str = "/api/v2/client";
#[allow(dead_code)]
pub const TEST_TOKEN: &str = "test-token";

#[allow(dead_code)]
pub fn report_envelope(inner: Value) -> Value {
    json!({"data": {"reportData": {"report": inner}}})
}

#[allow(dead_code)]
pub fn table_envelope(entries: Value) -> Value {
    report_envelope(json!({"table": {"data": {"entries": entries}}}))
}

/// Mounts a 200 response for POSTs whose body contains every needle.
#[allow(dead_code)]
pub async fn mount_graphql(server: &MockServer, needles: &[&str], response: Value) {
    graphql_mock(needles)
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(server)
        .await;
}

/// Base mock builder for the GraphQL endpoint.
#[allow(dead_code)]
pub fn graphql_mock(needles: &[&str]) -> wiremock::MockBuilder {
    let mut builder = Mock::given(method("POST"))
        .and(path(API_PATH))
        .and(header("authorization", format!("Bearer {}", TEST_TOKEN).as_str()));
    for needle in needles {
        builder = builder.and(body_string_contains(*needle));
    }
    builder
}

/// Mounts an uploader listing of `(code, start)` pairs.
#[allow(dead_code)]
pub async fn mount_uploader(server: &MockServer, user_id: &str, reports: &[(&str, DateTime<Utc>)]) {
    let data: Vec<Value> = reports
        .iter()
        .map(|(code, start)| {
            json!({"code": code, "title": "Weekly keys", "startTime": start.timestamp_millis()})
        })
        .collect();
    let needle = format!("userID: {},", user_id);
    mount_graphql(
        server,
        &["UploaderReports", needle.as_str()],
        json!({"data": {"reportData": {"reports": {"data": data}}}}),
    )
    .await;
}

/// Player names of the fixture roster, by actor id 1..=25.
#[allow(dead_code)]
pub fn player_name(id: i64) -> String {
    format!("Player{:02}", id)
}

/// Mounts a report with a 25-player roster, fight 1 (players 1-5, keystone)
/// and fight 2 (players 1-20, raid-sized). Only fight 1 has table mocks.
/// `deaths` lists the actor ids of death events in fight 1.
#[allow(dead_code)]
pub async fn mount_report(server: &MockServer, code: &str, deaths: &[i64]) {
    let actors: Vec<Value> = (1..=25)
        .map(|id| json!({"name": player_name(id), "gameID": 90_000 + id, "id": id}))
        .collect();
    mount_graphql(
        server,
        &["ReportRoster", code],
        report_envelope(json!({"masterData": {"actors": actors}})),
    )
    .await;
    mount_graphql(
        server,
        &["ReportStart", code],
        report_envelope(json!({"startTime": 1_700_000_000_000u64})),
    )
    .await;

    let group: Vec<i64> = (1..=5).collect();
    let raid: Vec<i64> = (1..=20).collect();
    mount_graphql(
        server,
        &["ReportFights", code],
        report_envelope(json!({"fights": [
            {
                "id": 1,
                "friendlyPlayers": group,
                "gameZone": {"name": "The Dawnbreaker"},
                "difficulty": 10,
                "keystoneLevel": 12
            },
            {
                "id": 2,
                "friendlyPlayers": raid,
                "gameZone": {"name": "Nerub-ar Palace"},
                "difficulty": 10
            }
        ]})),
    )
    .await;
    mount_graphql(
        server,
        &["FightStart", code, "fightIDs: [1]"],
        report_envelope(json!({"fights": [{"id": 1, "startTime": 65_250}]})),
    )
    .await;

    let damage: Vec<Value> = (1..=5)
        .map(|id| {
            json!({
                "name": player_name(id),
                "id": id,
                "type": "Paladin",
                "itemLevel": 610.0 + id as f64,
                "total": 1_000_000 * id
            })
        })
        .collect();
    let healing: Vec<Value> = (1..=5)
        .map(|id| json!({"name": player_name(id), "id": id, "total": 50_000 * id}))
        .collect();
    let death_entries: Vec<Value> = deaths
        .iter()
        .map(|id| json!({"name": player_name(*id), "id": id, "type": "Paladin"}))
        .collect();
    mount_graphql(
        server,
        &["DamageTable", code, "fightIDs: [1]"],
        table_envelope(json!(damage)),
    )
    .await;
    mount_graphql(
        server,
        &["HealingTable", code, "fightIDs: [1]"],
        table_envelope(json!(healing)),
    )
    .await;
    mount_graphql(
        server,
        &["DeathsTable", code, "fightIDs: [1]"],
        table_envelope(json!(death_entries)),
    )
    .await;
}

/// Config pointing every path into `dir` and the API at `server`.
#[allow(dead_code)]
pub fn test_config(dir: &Path, server: &MockServer, uploader_ids: &[&str]) -> Config {
    Config {
        uploader_ids: uploader_ids.iter().map(|id| id.to_string()).collect(),
        ledger_path: dir.join("processed_codes.json"),
        staging_dir: dir.join("weekly_raw_data"),
        dataset_dir: dir.join("all_reports_parquet_dataset"),
        error_log_path: dir.join("error_log.txt"),
        env_file: dir.join(".env"),
        api_url: format!("{}{}", server.uri(), API_PATH),
        token_url: format!("{}/oauth/token", server.uri()),
        access_token: Some(TEST_TOKEN.to_string()),
        timeout_seconds: 5,
        user_agent: "keystone_harvest_test/1.0".to_string(),
        log_level: LogLevel::Error,
        log_format: LogFormat::Plain,
        ..Default::default()
    }
}
