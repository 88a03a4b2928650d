//! Card catalog harvester: walks the wiki gallery pages, extracts every card, and
//! writes the cards plus a deduplicated skill table as two delimited files.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod fetch;
pub mod harvest;
pub mod output;
pub mod pacing;
pub mod parser;
pub mod pattern;
pub mod registry;

pub use config::Settings;
pub use dispatch::{Batch, Dispatcher, SlotFailure};
pub use error::{ConfigError, FetchError, HarvestError};
pub use fetch::{HttpSource, Source};
pub use harvest::{Harvester, RunSummary};
pub use output::DatasetWriter;
pub use parser::card::Card;
pub use parser::PageParser;
pub use registry::{Skill, SkillKind, SkillRegistry};
