pub mod card;
pub mod cells;
pub mod index;
pub mod schema;
pub mod text;

use reqwest::Url;
use scraper::Selector;

use crate::config::Settings;
use crate::error::ConfigError;
use crate::registry::SkillRegistry;
use card::Card;
use schema::{FieldSpec, CARD_SCHEMA};

/// Compiled selectors plus the field schema: everything needed to turn fetched HTML into
/// locators and cards.
#[derive(Debug)]
pub struct PageParser {
    index_link: Selector,
    detail_cell: Selector,
    base: Url,
    page_size: usize,
    schema: &'static [FieldSpec],
}

impl PageParser {
    pub fn new(
        index_link: &str,
        detail_cell: &str,
        base_url: &str,
        page_size: usize,
    ) -> Result<Self, ConfigError> {
        Ok(PageParser {
            index_link: selector(index_link)?,
            detail_cell: selector(detail_cell)?,
            base: Url::parse(base_url).map_err(|e| ConfigError::BaseUrl {
                url: base_url.to_string(),
                reason: e.to_string(),
            })?,
            page_size,
            schema: CARD_SCHEMA,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        Self::new(
            &settings.selectors.index_link,
            &settings.selectors.detail_cell,
            &settings.base_url,
            settings.page_size,
        )
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Detail page locators of an index page.
    pub fn locators(&self, html: &str) -> Vec<String> {
        index::scan_index(html, &self.index_link, &self.base, self.page_size)
    }

    /// HTML → cells → fields → card.
    pub fn card(&self, html: &str, url: &str, registry: &SkillRegistry) -> Card {
        let cells = cells::split_cells(html, &self.detail_cell);
        let fields = schema::read_fields(self.schema, &cells);
        card::build(&fields, url, registry)
    }
}

fn selector(s: &str) -> Result<Selector, ConfigError> {
    Selector::parse(s).map_err(|e| ConfigError::Selector {
        selector: s.to_string(),
        reason: e.to_string(),
    })
}

// ── Tests ──
