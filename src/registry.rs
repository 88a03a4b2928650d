//! Process-wide store of canonical skills.
//!
//! Every skill name seen during a run maps to exactly one [`Skill`]. Cards hold
//! `Arc<Skill>` clones; the registry owns the canonical copy and is snapshotted
//! once at the end of the run for the skills dataset.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SkillKind {
    /// Triggerable skill with cooldowns.
    Active,
    /// Passive leader skill.
    Leader,
}

impl SkillKind {
    /// Numeric tag used in the skills dataset.
    pub fn tag(self) -> u8 {
        match self {
            SkillKind::Active => 1,
            SkillKind::Leader => 2,
        }
    }
}

/// Descriptive fields, fixed by whichever extraction creates the entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkillDetails {
    pub base_cooldown: i64,
    pub max_cooldown: i64,
    pub effect: String,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Skill {
    pub id: String,
    pub kind: SkillKind,
    pub name: String,
    #[serde(flatten)]
    pub details: SkillDetails,
}

pub struct Registration {
    pub skill: Arc<Skill>,
    /// True when this call created the entry.
    pub created: bool,
}

#[derive(Default)]
struct Inner {
    by_key: HashMap<(SkillKind, String), Arc<Skill>>,
    order: Vec<Arc<Skill>>,
}

#[derive(Default)]
pub struct SkillRegistry {
    inner: Mutex<Inner>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical skill for `(name, kind)`, creating an entry with empty details if unseen.
    pub fn get_or_create(&self, name: &str, kind: SkillKind) -> Arc<Skill> {
        self.get_or_create_with(name, kind, SkillDetails::default).skill
    }

    /// Canonical skill for `(name, kind)`.
    ///
    /// `init` runs only when the entry is new, inside the same critical section as the
    /// lookup and the insert, so the first caller's details win and nobody can observe a
    /// partially populated skill.
    pub fn get_or_create_with<F>(&self, name: &str, kind: SkillKind, init: F) -> Registration
    where
        F: FnOnce() -> SkillDetails,
    {
        let mut inner = self.lock();
        if let Some(skill) = inner.by_key.get(&(kind, name.to_string())) {
            return Registration {
                skill: Arc::clone(skill),
                created: false,
            };
        }

        let details = match kind {
            SkillKind::Active => init(),
            // cooldowns only mean something for active skills
            SkillKind::Leader => SkillDetails {
                base_cooldown: 0,
                max_cooldown: 0,
                ..init()
            },
        };
        let skill = Arc::new(Skill {
            id: Uuid::new_v4().to_string(),
            kind,
            name: name.to_string(),
            details,
        });
        inner
            .by_key
            .insert((kind, name.to_string()), Arc::clone(&skill));
        inner.order.push(Arc::clone(&skill));
        Registration {
            skill,
            created: true,
        }
    }

    /// All canonical skills in creation order.
    pub fn snapshot(&self) -> Vec<Arc<Skill>> {
        self.lock().order.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // init() may panic under the lock; the maps are only touched after it returns
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
