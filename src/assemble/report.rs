//! Report-level assembly: roster, report start and fight list, then every
//! five-player fight in API order.

use anyhow::{Context, Result};
use log::{debug, info};

use crate::api::GraphQlTransport;
use crate::assemble::fight::{assemble_fight, FightWarnings};
use crate::fetch::ReportFacets;
use crate::models::{Actor, CharacterFightRecord, Fight, ReportCode, StagedReport};

/// Records of one report plus what was seen while building them.
#[derive(Debug)]
pub struct ReportAssembly {
    pub code: ReportCode,
    pub records: Vec<CharacterFightRecord>,
    /// Fights returned by the fight list
    pub fights_listed: usize,
    /// Fights that passed the group-size filter and were assembled
    pub fights_assembled: usize,
    pub warnings: FightWarnings,
}

impl ReportAssembly {
    pub fn into_staged(self) -> StagedReport {
        StagedReport {
            report_code: self.code,
            data: self.records,
        }
    }
}

/// Keeps five-player fights, preserving order.
pub fn dungeon_fights(fights: Vec<Fight>) -> Vec<Fight> {
    fights.into_iter().filter(Fight::is_dungeon_run).collect()
}

fn fight_roster(roster: &[Actor], fight: &Fight) -> Vec<Actor> {
    let participants = fight.participants();
    roster
        .iter()
        .filter(|actor| participants.contains(&actor.id))
        .cloned()
        .collect()
}

/// Builds every record of one report.
///
/// Any facet failure fails the whole report; no partial result is returned.
pub async fn assemble_report<T: GraphQlTransport>(
    transport: &T,
    code: &ReportCode,
) -> Result<ReportAssembly> {
    let facets = ReportFacets::new(transport, code);

    let roster = facets.roster().await.context("Failed to fetch roster")?;
    let report_start = facets
        .report_start_secs()
        .await
        .context("Failed to fetch report start")?;
    let listed = facets
        .fights()
        .await
        .context("Failed to fetch fight list")?;
    let fights_listed = listed.len();
    let fights = dungeon_fights(listed);
    debug!(
        "{}: {} of {} fights are five-player runs, {} players in roster",
        code,
        fights.len(),
        fights_listed,
        roster.len()
    );

    let mut records = Vec::new();
    let mut warnings = FightWarnings::default();
    let total = fights.len();
    for (index, fight) in fights.iter().enumerate() {
        let assembly = assemble_fight(
            &facets,
            fight,
            &fights,
            fight_roster(&roster, fight),
            report_start,
        )
        .await
        .with_context(|| format!("Failed to assemble fight {}", fight.id))?;
        records.extend(assembly.records);
        warnings += assembly.warnings;
        info!("Done with fight {} of {} ({})", index + 1, total, code);
    }

    Ok(ReportAssembly {
        code: code.clone(),
        records,
        fights_listed,
        fights_assembled: total,
        warnings,
    })
}
