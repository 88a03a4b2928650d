use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use csv::WriterBuilder;
use serde::Serialize;
use tracing::info;

use crate::dispatch::Batch;
use crate::error::HarvestError;
use crate::parser::card::Card;
use crate::registry::Skill;

#[derive(Serialize)]
struct CardRow<'a> {
    card_id: &'a str,
    name: &'a str,
    attribute: &'a str,
    rarity: i64,
    cost: i64,
    race: &'a str,
    series: &'a str,
    max_exp: i64,
    max_hp: i64,
    max_attack: i64,
    max_recovery: i64,
    total_stats: i64,
    wiki_link: &'a str,
    preview_link: &'a str,
    active_skill_id: &'a str,
    leader_skill_id: &'a str,
}

impl<'a> From<&'a Card> for CardRow<'a> {
    fn from(c: &'a Card) -> Self {
        let skill_id = |s: &'a Option<Arc<Skill>>| s.as_deref().map_or("", |s| s.id.as_str());
        CardRow {
            card_id: &c.id,
            name: &c.name,
            attribute: &c.attribute,
            rarity: c.rarity,
            cost: c.cost,
            race: &c.race,
            series: &c.series,
            max_exp: c.max_exp,
            max_hp: c.max_hp,
            max_attack: c.max_attack,
            max_recovery: c.max_recovery,
            total_stats: c.total_stats,
            wiki_link: &c.wiki_link,
            preview_link: c.preview_link.as_deref().unwrap_or(""),
            active_skill_id: skill_id(&c.active_skill),
            leader_skill_id: skill_id(&c.leader_skill),
        }
    }
}

#[derive(Serialize)]
struct SkillRow<'a> {
    skill_id: &'a str,
    name: &'a str,
    base_cooldown: i64,
    max_cooldown: i64,
    effect: &'a str,
    kind: u8,
}

impl<'a> From<&'a Skill> for SkillRow<'a> {
    fn from(s: &'a Skill) -> Self {
        SkillRow {
            skill_id: &s.id,
            name: &s.name,
            base_cooldown: s.details.base_cooldown,
            max_cooldown: s.details.max_cooldown,
            effect: &s.details.effect,
            kind: s.kind.tag(),
        }
    }
}

/// The two linked datasets: cards, streamed page by page, and skills, written once.
pub struct DatasetWriter<W: Write> {
    cards: csv::Writer<W>,
    skills: csv::Writer<W>,
    card_rows: usize,
}

impl DatasetWriter<File> {
    pub fn create(
        cards: &Path,
        skills: &Path,
        delimiter: u8,
        headers: bool,
    ) -> Result<Self, HarvestError> {
        let open = |path: &Path| {
            File::create(path).map_err(|source| HarvestError::Create {
                path: path.to_path_buf(),
                source,
            })
        };
        Ok(Self::new(open(cards)?, open(skills)?, delimiter, headers))
    }
}

impl<W: Write> DatasetWriter<W> {
    pub fn new(cards: W, skills: W, delimiter: u8, headers: bool) -> Self {
        let builder = |w| {
            WriterBuilder::new()
                .delimiter(delimiter)
                .has_headers(headers)
                .from_writer(w)
        };
        DatasetWriter {
            cards: builder(cards),
            skills: builder(skills),
            card_rows: 0,
        }
    }

    /// Append the present cards of a batch and flush, so an interrupted run keeps
    /// every completed page.
    pub fn write_batch(&mut self, batch: &Batch) -> Result<usize, HarvestError> {
        self.write_cards(batch.cards())
    }

    pub fn write_cards<'a>(
        &mut self,
        cards: impl IntoIterator<Item = &'a Card>,
    ) -> Result<usize, HarvestError> {
        let mut written = 0;
        for card in cards {
            self.cards.serialize(CardRow::from(card))?;
            written += 1;
        }
        self.cards.flush()?;
        self.card_rows += written;
        Ok(written)
    }

    /// Write the registry snapshot. Called once, after the last page.
    pub fn write_skills(&mut self, skills: &[Arc<Skill>]) -> Result<usize, HarvestError> {
        for skill in skills {
            self.skills.serialize(SkillRow::from(skill.as_ref()))?;
        }
        self.skills.flush()?;
        info!(cards = self.card_rows, skills = skills.len(), "datasets written");
        Ok(skills.len())
    }

    pub fn card_rows(&self) -> usize {
        self.card_rows
    }

    pub fn into_inner(self) -> Result<(W, W), HarvestError> {
        let cards = self
            .cards
            .into_inner()
            .map_err(|e| HarvestError::Io(e.into_error()))?;
        let skills = self
            .skills
            .into_inner()
            .map_err(|e| HarvestError::Io(e.into_error()))?;
        Ok((cards, skills))
    }
}
