//! Record assembly from fetched facets.

pub mod fight;
pub mod report;

pub use fight::{
    assemble_fight, fight_start_time, join_fight, FightAssembly, FightInputs, FightWarnings,
};
pub use report::{assemble_report, dungeon_fights, ReportAssembly};
