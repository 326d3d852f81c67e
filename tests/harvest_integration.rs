//! Integration tests for the harvest run
//!
//! These tests drive `run_harvest` against a mock GraphQL endpoint and verify:
//! - Discovery, assembly, staging and compaction end to end
//! - Ledgered and already-staged codes are never fetched again
//! - A failing report is logged and does not block the others

mod helpers;

use std::collections::BTreeSet;

use chrono::{Duration, Utc};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::body_string_contains;
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::{graphql_mock, mount_graphql, mount_report, mount_uploader, player_name, test_config};
use keystone_harvest::storage::{ledger, read_dataset, ReportCache, StagingArea};
use keystone_harvest::{run_harvest, CharacterFightRecord, ReportCode, StagedReport};

fn ledger_codes(codes: &[&str]) -> BTreeSet<ReportCode> {
    codes.iter().map(|c| ReportCode::new(*c)).collect()
}

#[tokio::test]
async fn test_harvest_end_to_end() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp directory");
    let recent = Utc::now() - Duration::hours(6);
    let stale = Utc::now() - Duration::days(30);

    mount_uploader(&server, "297125", &[("ABC123", recent), ("OLD001", stale)]).await;
    mount_report(&server, "ABC123", &[3, 3]).await;
    // The 20-player fight must never be traversed
    graphql_mock(&["fightIDs: [2]"])
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    graphql_mock(&["OLD001"])
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let config = test_config(dir.path(), &server, &["297125"]);
    let report = run_harvest(config.clone()).await.expect("harvest failed");

    assert_eq!(report.discovered, 1);
    assert_eq!(report.work_list, 1);
    assert_eq!(report.staged, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.rows_appended, 5);

    let rows = read_dataset(&config.dataset_dir).expect("Failed to read dataset");
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|r| r.run_date == Utc::now().date_naive()));
    let records: Vec<&CharacterFightRecord> = rows.iter().map(|r| &r.record).collect();
    for (index, record) in records.iter().enumerate() {
        let id = index as i64 + 1;
        assert_eq!(record.name, player_name(id));
        assert_eq!(record.report_code.as_str(), "ABC123");
        assert_eq!(record.fight_id, 1);
        assert_eq!(record.dungeon_name, "The Dawnbreaker");
        assert_eq!(record.keystone_level, Some(12));
        assert_eq!(record.actor_id, Some(id));
        assert_eq!(record.game_id, Some(90_000 + id));
        assert_eq!(record.damage_done, Some(1_000_000.0 * id as f64));
        assert_eq!(record.healing_done, Some(50_000.0 * id as f64));
        assert_eq!(record.deaths, Some(if id == 3 { 2 } else { 0 }));
        assert_eq!(record.start_time.timestamp_millis(), 1_700_000_065_250);
    }

    assert_eq!(
        ledger::load(&config.ledger_path).await.unwrap(),
        ledger_codes(&["ABC123"])
    );
    assert!(!config.staging_dir.exists());
    assert!(!config.error_log_path.exists());
}

#[tokio::test]
async fn test_ledgered_code_is_never_fetched() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp directory");
    let recent = Utc::now() - Duration::hours(1);

    mount_uploader(&server, "297125", &[("ABC123", recent), ("XYZ789", recent)]).await;
    mount_report(&server, "XYZ789", &[]).await;
    Mock::given(body_string_contains("ABC123"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let config = test_config(dir.path(), &server, &["297125"]);
    ledger::save(&config.ledger_path, &ledger_codes(&["ABC123"]))
        .await
        .unwrap();

    let report = run_harvest(config.clone()).await.expect("harvest failed");

    assert_eq!(report.discovered, 2);
    assert_eq!(report.work_list, 1);
    assert_eq!(report.staged, 1);
    assert_eq!(
        ledger::load(&config.ledger_path).await.unwrap(),
        ledger_codes(&["ABC123", "XYZ789"])
    );

    // Second run: everything is ledgered, nothing is fetched or appended
    let again = run_harvest(config.clone()).await.expect("second harvest failed");
    assert_eq!(again.work_list, 0);
    assert_eq!(again.rows_appended, 0);
    assert_eq!(read_dataset(&config.dataset_dir).unwrap().len(), 5);
}

#[tokio::test]
async fn test_already_staged_code_is_compacted_without_fetching() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp directory");
    let config = test_config(dir.path(), &server, &["297125"]);

    mount_uploader(&server, "297125", &[("XYZ789", Utc::now())]).await;
    Mock::given(body_string_contains("XYZ789"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    // Left behind by an interrupted run
    let staging = StagingArea::new(&config.staging_dir);
    let staged = StagedReport {
        report_code: ReportCode::new("XYZ789"),
        data: vec![CharacterFightRecord {
            report_code: ReportCode::new("XYZ789"),
            fight_id: 7,
            dungeon_name: "Ara-Kara, City of Echoes".to_string(),
            keystone_level: Some(9),
            start_time: Utc::now(),
            name: "Leftover".to_string(),
            game_id: Some(1),
            actor_id: Some(1),
            class: Some("Druid".to_string()),
            item_level: Some(600.0),
            damage_done: Some(1.0),
            healing_done: Some(2.0),
            deaths: Some(0),
        }],
    };
    assert!(staging.stage(&staged).await.unwrap());

    let report = run_harvest(config.clone()).await.expect("harvest failed");

    assert_eq!(report.skipped, 1);
    assert_eq!(report.staged, 0);
    assert_eq!(report.rows_appended, 1);
    let rows = read_dataset(&config.dataset_dir).unwrap();
    assert_eq!(rows[0].record.name, "Leftover");
    assert!(ledger::load(&config.ledger_path)
        .await
        .unwrap()
        .contains(&ReportCode::new("XYZ789")));
}

#[tokio::test]
async fn test_failing_report_is_logged_and_retried_later() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp directory");
    let recent = Utc::now() - Duration::hours(2);

    mount_uploader(&server, "291792", &[("BAD999", recent), ("GOOD11", recent)]).await;
    mount_graphql(
        &server,
        &["BAD999"],
        json!({"errors": [{"message": "This report does not exist or is private."}], "data": null}),
    )
    .await;
    mount_report(&server, "GOOD11", &[]).await;

    let config = test_config(dir.path(), &server, &["291792"]);
    let report = run_harvest(config.clone()).await.expect("harvest failed");

    assert_eq!(report.failed, 1);
    assert_eq!(report.staged, 1);
    assert_eq!(report.rows_appended, 5);

    let log = std::fs::read_to_string(&config.error_log_path).expect("error log missing");
    assert!(log.contains("Error processing code 'BAD999'"));
    assert!(log.contains("This report does not exist or is private."));

    let processed = ledger::load(&config.ledger_path).await.unwrap();
    assert!(!processed.contains(&ReportCode::new("BAD999")));
    assert!(processed.contains(&ReportCode::new("GOOD11")));
}

#[tokio::test]
async fn test_nothing_new_leaves_dataset_untouched() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp directory");
    mount_uploader(&server, "297125", &[]).await;

    let config = test_config(dir.path(), &server, &["297125"]);
    let report = run_harvest(config.clone()).await.expect("harvest failed");

    assert_eq!(report.work_list, 0);
    assert_eq!(report.rows_appended, 0);
    assert!(!config.dataset_dir.exists());
    assert!(ledger::load(&config.ledger_path).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_compaction_failure_keeps_staging_and_ledger() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp directory");
    mount_uploader(&server, "297125", &[("ABC123", Utc::now() - Duration::hours(3))]).await;
    mount_report(&server, "ABC123", &[]).await;

    let config = test_config(dir.path(), &server, &["297125"]);
    std::fs::write(&config.dataset_dir, "not a directory").unwrap();

    let err = run_harvest(config.clone()).await.unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to compact staged reports"));

    let staging = StagingArea::new(&config.staging_dir);
    assert!(staging.exists(&ReportCode::new("ABC123")).await.unwrap());
    assert_eq!(
        ledger::load(&config.ledger_path).await.unwrap(),
        ledger_codes(&["ABC123"])
    );

    // Once the dataset location is usable, the leftover is compacted without refetching
    std::fs::remove_file(&config.dataset_dir).unwrap();
    let report = run_harvest(config.clone()).await.expect("harvest failed");
    assert_eq!(report.work_list, 0);
    assert_eq!(report.rows_appended, 5);
    assert!(!config.staging_dir.exists());
}

#[tokio::test]
async fn test_discovery_failure_is_fatal() {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp directory");
    graphql_mock(&["UploaderReports"])
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let config = test_config(dir.path(), &server, &["297125"]);
    let err = run_harvest(config.clone()).await.unwrap_err();

    assert!(format!("{:#}", err).contains("Failed to discover reports"));
    assert!(!config.ledger_path.exists());
}
