//! Per-fight join.
//!
//! Roster, damage, healing and death facets of one fight are merged into one
//! `CharacterFightRecord` per actor:
//!
//! 1. damage and healing are inner-joined (actors on only one side are dropped
//!    and counted as incomplete),
//! 2. death events are counted per actor and outer-joined onto the roster with
//!    a zero fill,
//! 3. the result of (2) is outer-joined with (1), so roster actors without
//!    damage/healing still get a row with empty metrics.
//!
//! Facet entries are matched to roster actors by report-local actor id when the
//! entry carries one, otherwise by a unique name; names are kept for display.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::ops::AddAssign;

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, warn};

use crate::api::GraphQlTransport;
use crate::config::NO_DUNGEON_NAME;
use crate::fetch::ReportFacets;
use crate::models::{
    Actor, CharacterFightRecord, DamageEntry, DeathEntry, Fight, HealingEntry, ReportCode,
};

/// Data-quality counters of one or more assembled fights.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FightWarnings {
    /// Actors present in only one of the damage and healing tables
    pub incomplete_actors: usize,
    /// Actors with death entries that match no roster actor
    pub unmatched_deaths: usize,
    /// Fights whose dungeon name fell back to the sentinel
    pub missing_dungeon_names: usize,
}

impl AddAssign for FightWarnings {
    fn add_assign(&mut self, other: Self) {
        self.incomplete_actors += other.incomplete_actors;
        self.unmatched_deaths += other.unmatched_deaths;
        self.missing_dungeon_names += other.missing_dungeon_names;
    }
}

/// Fetched facets and metadata of one fight, ready to be joined.
#[derive(Debug, Clone)]
pub struct FightInputs {
    pub fight_id: i64,
    pub dungeon_name: Option<String>,
    pub keystone_level: Option<i64>,
    pub start_time: DateTime<Utc>,
    /// Roster restricted to the fight's participants
    pub roster: Vec<Actor>,
    pub damage: Vec<DamageEntry>,
    pub healing: Vec<HealingEntry>,
    pub deaths: Vec<DeathEntry>,
}

#[derive(Debug)]
pub struct FightAssembly {
    pub records: Vec<CharacterFightRecord>,
    pub warnings: FightWarnings,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum ActorKey {
    Actor(i64),
    Name(String),
}

struct RosterIndex<'a> {
    by_id: HashMap<i64, &'a Actor>,
    by_name: HashMap<&'a str, Vec<i64>>,
}

impl<'a> RosterIndex<'a> {
    fn new(roster: &'a [Actor]) -> Self {
        let mut by_id = HashMap::new();
        let mut by_name: HashMap<&str, Vec<i64>> = HashMap::new();
        for actor in roster {
            by_id.insert(actor.id, actor);
            by_name.entry(actor.name.as_str()).or_default().push(actor.id);
        }
        Self { by_id, by_name }
    }

    fn resolve(&self, id: Option<i64>, name: &str) -> ActorKey {
        if let Some(id) = id.filter(|id| self.by_id.contains_key(id)) {
            return ActorKey::Actor(id);
        }
        match self.by_name.get(name).map(Vec::as_slice) {
            Some([id]) => ActorKey::Actor(*id),
            _ => ActorKey::Name(name.to_string()),
        }
    }
}

struct Metrics<'a> {
    name: &'a str,
    class: Option<&'a str>,
    item_level: Option<f64>,
    damage_done: f64,
    healing_done: f64,
}

struct BaseRow<'a> {
    name: &'a str,
    game_id: Option<i64>,
    actor_id: Option<i64>,
    deaths: u32,
}

/// Absolute fight start: whole-second report start plus the millisecond fight offset.
pub fn fight_start_time(report_start_secs: i64, offset_ms: f64) -> Option<DateTime<Utc>> {
    let report_start = DateTime::from_timestamp(report_start_secs, 0)?;
    report_start.checked_add_signed(TimeDelta::try_milliseconds(offset_ms.round() as i64)?)
}

/// Dungeon name of `fight_id` in the enumerated fight list, if any.
pub fn dungeon_name(fights: &[Fight], fight_id: i64) -> Option<String> {
    fights
        .iter()
        .find(|fight| fight.id == fight_id)
        .and_then(Fight::zone_name)
        .map(str::to_string)
}

/// Joins the facets of one fight into per-actor records.
pub fn join_fight(code: &ReportCode, inputs: &FightInputs) -> FightAssembly {
    let mut warnings = FightWarnings::default();
    let index = RosterIndex::new(&inputs.roster);

    // damage ∩ healing
    let healing_by_key: HashMap<ActorKey, f64> = inputs
        .healing
        .iter()
        .map(|entry| (index.resolve(entry.id, &entry.name), entry.total))
        .collect();
    let mut metrics: BTreeMap<ActorKey, Metrics> = BTreeMap::new();
    for entry in &inputs.damage {
        let key = index.resolve(entry.id, &entry.name);
        match healing_by_key.get(&key) {
            Some(healing) => {
                metrics.insert(
                    key,
                    Metrics {
                        name: &entry.name,
                        class: entry.class.as_deref(),
                        item_level: entry.item_level,
                        damage_done: entry.total,
                        healing_done: *healing,
                    },
                );
            }
            None => warnings.incomplete_actors += 1,
        }
    }
    let damage_keys: HashSet<ActorKey> = inputs
        .damage
        .iter()
        .map(|entry| index.resolve(entry.id, &entry.name))
        .collect();
    warnings.incomplete_actors += healing_by_key
        .keys()
        .filter(|key| !damage_keys.contains(*key))
        .count();

    // deaths per actor
    let mut death_counts: BTreeMap<ActorKey, (&str, u32)> = BTreeMap::new();
    for death in &inputs.deaths {
        let key = match (death.id, death.name.as_deref()) {
            (None, None) => continue,
            (id, name) => index.resolve(id, name.unwrap_or_default()),
        };
        let display = match &key {
            ActorKey::Actor(id) => index.by_id.get(id).map(|actor| actor.name.as_str()),
            ActorKey::Name(_) => None,
        }
        .or(death.name.as_deref())
        .unwrap_or_default();
        death_counts.entry(key).or_insert((display, 0)).1 += 1;
    }

    // roster ⟗ deaths, missing counts are zero
    let mut base: BTreeMap<ActorKey, BaseRow> = BTreeMap::new();
    for actor in &inputs.roster {
        let key = ActorKey::Actor(actor.id);
        let deaths = death_counts.remove(&key).map_or(0, |(_, count)| count);
        base.insert(
            key,
            BaseRow {
                name: &actor.name,
                game_id: Some(actor.game_id),
                actor_id: Some(actor.id),
                deaths,
            },
        );
    }
    warnings.unmatched_deaths = death_counts.len();
    for (key, (name, deaths)) in death_counts {
        base.insert(
            key,
            BaseRow {
                name,
                game_id: None,
                actor_id: None,
                deaths,
            },
        );
    }

    let dungeon_name = inputs.dungeon_name.clone().unwrap_or_else(|| {
        warnings.missing_dungeon_names += 1;
        NO_DUNGEON_NAME.to_string()
    });

    // (roster ⟗ deaths) ⟗ (damage ∩ healing)
    let keys: BTreeSet<&ActorKey> = base.keys().chain(metrics.keys()).collect();
    let mut records: Vec<CharacterFightRecord> = keys
        .into_iter()
        .map(|key| {
            let row = base.get(key);
            let metric = metrics.get(key);
            CharacterFightRecord {
                report_code: code.clone(),
                fight_id: inputs.fight_id,
                dungeon_name: dungeon_name.clone(),
                keystone_level: inputs.keystone_level,
                start_time: inputs.start_time,
                name: row
                    .map(|r| r.name)
                    .or(metric.map(|m| m.name))
                    .unwrap_or_default()
                    .to_string(),
                game_id: row.and_then(|r| r.game_id),
                actor_id: row.and_then(|r| r.actor_id),
                class: metric.and_then(|m| m.class).map(str::to_string),
                item_level: metric.and_then(|m| m.item_level),
                damage_done: metric.map(|m| m.damage_done),
                healing_done: metric.map(|m| m.healing_done),
                deaths: row.map(|r| r.deaths),
            }
        })
        .collect();
    records.sort_by(|a, b| a.name.cmp(&b.name).then(a.actor_id.cmp(&b.actor_id)));

    if warnings.incomplete_actors > 0 {
        warn!(
            "{} fight {}: {} actor(s) missing from damage or healing were dropped from the metrics",
            code, inputs.fight_id, warnings.incomplete_actors
        );
    }
    if warnings.unmatched_deaths > 0 {
        debug!(
            "{} fight {}: {} death entries matched no roster actor",
            code, inputs.fight_id, warnings.unmatched_deaths
        );
    }

    FightAssembly { records, warnings }
}

/// Fetches the facets of one fight and joins them.
///
/// `fights` is the report's enumerated dungeon fight list (used for the dungeon
/// name); `roster` is already restricted to the fight's participants.
pub async fn assemble_fight<T: GraphQlTransport>(
    facets: &ReportFacets<'_, T>,
    fight: &Fight,
    fights: &[Fight],
    roster: Vec<Actor>,
    report_start_secs: i64,
) -> Result<FightAssembly> {
    let offset_ms = facets
        .fight_start_offset_ms(fight.id)
        .await
        .context("Failed to fetch fight start")?;
    let start_time = fight_start_time(report_start_secs, offset_ms).with_context(|| {
        format!(
            "Fight start out of range (report start {}s, offset {}ms)",
            report_start_secs, offset_ms
        )
    })?;

    let damage = facets
        .damage(fight.id)
        .await
        .context("Failed to fetch damage table")?;
    let healing = facets
        .healing(fight.id)
        .await
        .context("Failed to fetch healing table")?;
    let deaths = facets
        .deaths(fight.id)
        .await
        .context("Failed to fetch deaths table")?;

    let inputs = FightInputs {
        fight_id: fight.id,
        dungeon_name: dungeon_name(fights, fight.id),
        keystone_level: fight.keystone_level,
        start_time,
        roster,
        damage,
        healing,
        deaths,
    };
    Ok(join_fight(facets.code(), &inputs))
}
