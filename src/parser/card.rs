use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::schema::{Field, Fields};
use crate::registry::{Skill, SkillDetails, SkillKind, SkillRegistry};

#[derive(Debug, Clone, Serialize)]
pub struct Card {
    pub id: String,
    pub name: String,
    pub attribute: String,
    pub rarity: i64,
    pub cost: i64,
    pub race: String,
    pub series: String,
    pub max_exp: i64,
    pub max_hp: i64,
    pub max_attack: i64,
    pub max_recovery: i64,
    pub total_stats: i64,
    pub active_skill: Option<Arc<Skill>>,
    pub leader_skill: Option<Arc<Skill>>,
    pub wiki_link: String,
    pub preview_link: Option<String>,
}

/// Build a card from its field values, resolving both skill blocks through `registry`.
pub fn build(fields: &Fields, url: &str, registry: &SkillRegistry) -> Card {
    let active_skill = register(
        registry,
        SkillKind::Active,
        &fields.text(Field::ActiveName),
        || SkillDetails {
            base_cooldown: fields.number(Field::ActiveBaseCooldown),
            max_cooldown: fields.number(Field::ActiveMaxCooldown),
            effect: fields.text(Field::ActiveEffect),
        },
    );
    let leader_skill = register(
        registry,
        SkillKind::Leader,
        &fields.text(Field::LeaderName),
        || SkillDetails {
            effect: fields.text(Field::LeaderEffect),
            ..SkillDetails::default()
        },
    );

    Card {
        id: fields.text(Field::Id),
        name: fields.text(Field::Name),
        attribute: fields.text(Field::Attribute),
        rarity: fields.number(Field::Rarity),
        cost: fields.number(Field::Cost),
        race: fields.text(Field::Race),
        series: fields.text(Field::Series),
        max_exp: fields.number(Field::MaxExp),
        max_hp: fields.number(Field::MaxHp),
        max_attack: fields.number(Field::MaxAttack),
        max_recovery: fields.number(Field::MaxRecovery),
        total_stats: fields.number(Field::TotalStats),
        active_skill,
        leader_skill,
        wiki_link: url.to_string(),
        preview_link: fields.image(Field::Preview),
    }
}

/// A card without a skill block (empty name) gets no link rather than a placeholder skill.
fn register<F>(registry: &SkillRegistry, kind: SkillKind, name: &str, init: F) -> Option<Arc<Skill>>
where
    F: FnOnce() -> SkillDetails,
{
    if name.is_empty() {
        return None;
    }
    let registration = registry.get_or_create_with(name, kind, init);
    if registration.created {
        debug!(skill = name, ?kind, id = %registration.skill.id, "new skill");
    }
    Some(registration.skill)
}
