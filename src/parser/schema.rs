//! Position-to-field mapping for card detail pages.
//!
//! A detail page is read as a flat sequence of table cells. The meaning of each cell
//! depends only on its position, so the whole mapping lives in [`CARD_SCHEMA`] and the
//! extraction code never indexes cells directly.

use std::collections::HashMap;

use super::cells::Cell;
use super::text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Preview,
    Name,
    Attribute,
    Id,
    Rarity,
    Cost,
    Race,
    Series,
    MaxExp,
    MaxHp,
    MaxAttack,
    MaxRecovery,
    TotalStats,
    ActiveName,
    ActiveBaseCooldown,
    ActiveMaxCooldown,
    ActiveEffect,
    LeaderName,
    LeaderEffect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `data-src` of the cell's image.
    Image,
    /// Text with line breaks removed.
    Line,
    /// Text with markup, whitespace and the given prefix removed.
    Compact { drop: &'static str },
    /// Integer after removing markup, whitespace and the given noise.
    Integer { noise: &'static [&'static str] },
    /// `a+b+c` summed.
    StatSum,
    /// Free text with markup and line breaks removed.
    Prose,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub position: usize,
    pub field: Field,
    pub kind: FieldKind,
}

const fn spec(position: usize, field: Field, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        position,
        field,
        kind,
    }
}

const PLAIN: FieldKind = FieldKind::Compact { drop: "" };
const NUMBER: FieldKind = FieldKind::Integer { noise: &[] };

pub const CARD_SCHEMA: &[FieldSpec] = &[
    spec(0, Field::Preview, FieldKind::Image),
    spec(1, Field::Name, FieldKind::Line),
    spec(2, Field::Attribute, PLAIN),
    spec(3, Field::Id, FieldKind::Compact { drop: "No." }),
    spec(4, Field::Rarity, FieldKind::Integer { noise: &["★"] }),
    spec(5, Field::Cost, NUMBER),
    spec(6, Field::Race, PLAIN),
    spec(7, Field::Series, PLAIN),
    spec(10, Field::MaxExp, FieldKind::Integer { noise: &[","] }),
    spec(18, Field::MaxHp, FieldKind::StatSum),
    spec(19, Field::MaxAttack, FieldKind::StatSum),
    spec(20, Field::MaxRecovery, FieldKind::StatSum),
    spec(21, Field::TotalStats, FieldKind::StatSum),
    spec(25, Field::ActiveName, FieldKind::Prose),
    spec(26, Field::ActiveBaseCooldown, NUMBER),
    spec(27, Field::ActiveMaxCooldown, NUMBER),
    spec(28, Field::ActiveEffect, FieldKind::Prose),
    spec(30, Field::LeaderName, FieldKind::Prose),
    spec(31, Field::LeaderEffect, FieldKind::Prose),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Number(i64),
    Image(Option<String>),
}

/// Typed field values read from one document. Missing fields read as empty or zero.
#[derive(Debug, Default)]
pub struct Fields {
    values: HashMap<Field, Value>,
}

impl Fields {
    pub fn text(&self, field: Field) -> String {
        match self.values.get(&field) {
            Some(Value::Text(t)) => t.clone(),
            _ => String::new(),
        }
    }

    pub fn number(&self, field: Field) -> i64 {
        match self.values.get(&field) {
            Some(Value::Number(n)) => *n,
            _ => 0,
        }
    }

    pub fn image(&self, field: Field) -> Option<String> {
        match self.values.get(&field) {
            Some(Value::Image(i)) => i.clone(),
            _ => None,
        }
    }
}

/// Apply `schema` to a cell sequence. Cells past the end of the document read as empty.
pub fn read_fields(schema: &[FieldSpec], cells: &[Cell]) -> Fields {
    let empty = Cell::default();
    let values = schema
        .iter()
        .map(|spec| {
            let cell = cells.get(spec.position).unwrap_or(&empty);
            (spec.field, read_value(spec.kind, cell))
        })
        .collect();
    Fields { values }
}

fn read_value(kind: FieldKind, cell: &Cell) -> Value {
    match kind {
        FieldKind::Image => Value::Image(cell.image.clone().filter(|s| !s.is_empty())),
        FieldKind::Line => Value::Text(text::remove_line_breaks(&cell.text).trim().to_string()),
        FieldKind::Compact { drop } => {
            let compacted = text::compact(&cell.text);
            Value::Text(if drop.is_empty() {
                compacted
            } else {
                compacted.replace(drop, "")
            })
        }
        FieldKind::Integer { noise } => Value::Number(text::parse_int(&cell.text, noise)),
        FieldKind::StatSum => Value::Number(text::sum_stats(&cell.text)),
        FieldKind::Prose => Value::Text(text::prose(&cell.text)),
    }
}
