//! GraphQL payload builders.
//!
//! Every builder is a template substitution: the report code and fight id are
//! inserted as given. Malformed codes are not rejected here; the API reports them.
//! Each query carries its own operation name so it is identifiable in logs.

use crate::config::KEYSTONE_DIFFICULTY;

/// Fights of a report restricted to keystone dungeons, with zone names translated.
pub fn fight_list(report_code: &str) -> String {
    format!(
        r#"query ReportFights {{
    reportData {{
        report(code: "{report_code}") {{
            title
            fights(translate: true, difficulty: {KEYSTONE_DIFFICULTY}) {{
                id
                friendlyPlayers
                gameZone {{
                    name
                }}
                difficulty
                keystoneLevel
            }}
        }}
    }}
}}"#
    )
}

/// Player actors of a report (name, gameID, report-local id).
pub fn roster(report_code: &str) -> String {
    format!(
        r#"query ReportRoster {{
    reportData {{
        report(code: "{report_code}") {{
            masterData {{
                actors(type: "Player") {{
                    name
                    gameID
                    id
                }}
            }}
        }}
    }}
}}"#
    )
}

fn friendly_table(operation: &str, report_code: &str, fight_id: i64, data_type: &str) -> String {
    format!(
        r#"query {operation} {{
    reportData {{
        report(code: "{report_code}") {{
            table(fightIDs: [{fight_id}], dataType: {data_type}, hostilityType: Friendlies)
        }}
    }}
}}"#
    )
}

/// Damage-done table of one fight.
pub fn damage_table(report_code: &str, fight_id: i64) -> String {
    friendly_table("DamageTable", report_code, fight_id, "DamageDone")
}

/// Healing table of one fight.
pub fn healing_table(report_code: &str, fight_id: i64) -> String {
    friendly_table("HealingTable", report_code, fight_id, "Healing")
}

/// Deaths table of one fight (one entry per death event).
pub fn deaths_table(report_code: &str, fight_id: i64) -> String {
    friendly_table("DeathsTable", report_code, fight_id, "Deaths")
}

/// Absolute start of a report in epoch milliseconds.
pub fn report_start(report_code: &str) -> String {
    format!(
        r#"query ReportStart {{
    reportData {{
        report(code: "{report_code}") {{
            startTime
        }}
    }}
}}"#
    )
}

/// Start offset of one fight relative to its report start.
pub fn fight_start(report_code: &str, fight_id: i64) -> String {
    format!(
        r#"query FightStart {{
    reportData {{
        report(code: "{report_code}") {{
            fights(fightIDs: [{fight_id}]) {{
                id
                startTime
            }}
        }}
    }}
}}"#
    )
}

/// Most recent reports uploaded by one user.
pub fn uploader_reports(user_id: &str, limit: u32) -> String {
    format!(
        r#"query UploaderReports {{
    reportData {{
        reports(userID: {user_id}, limit: {limit}) {{
            data {{
                code
                title
                startTime
            }}
        }}
    }}
}}"#
    )
}
