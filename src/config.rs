use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{ConfigError, MAX_PACING_SECS};
use crate::pattern::PageTemplate;

const DEFAULT_CONFIG_FILE: &str = "harvest.toml";
const ENV_PREFIX: &str = "TOS";

/// Runtime settings: defaults, then `harvest.toml` (or `--config`), then `TOS_*` env vars.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Site root that relative gallery links are resolved against.
    pub base_url: String,
    pub patterns: Vec<PatternSettings>,
    /// Width of the numeric window each index page covers.
    pub window: usize,
    /// Maximum number of detail locators taken from one index page.
    pub page_size: usize,
    /// Upper bound on concurrent detail fetches; defaults to `page_size`.
    pub max_in_flight: Option<usize>,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    pub pacing: PacingSettings,
    pub on_index_error: IndexFailurePolicy,
    pub selectors: SelectorSettings,
    pub output: OutputSettings,
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PatternSettings {
    pub template: String,
    #[serde(default)]
    pub start: usize,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingMode {
    /// Sleep for the delay after every page completes.
    FixedDelay,
    /// Keep page starts at least the delay apart.
    MinInterval,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingSettings {
    pub mode: PacingMode,
    pub delay_secs: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexFailurePolicy {
    /// Stop the run, naming the page that could not be fetched.
    #[default]
    Abort,
    /// Log and move on to the next page.
    Skip,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorSettings {
    pub index_link: String,
    pub detail_cell: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub cards: PathBuf,
    pub skills: PathBuf,
    pub delimiter: String,
    pub write_headers: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let gallery = |template: &str, count: usize| PatternSettings {
            template: format!("http://towerofsaviors.wikia.com/wiki/{}", template),
            start: 0,
            count,
        };
        Settings {
            base_url: "http://towerofsaviors.wikia.com".to_string(),
            patterns: vec![
                gallery("Gallery_P{lo:02}-P{hi:02}", 1),
                gallery("Gallery_S{lo:02}-S{hi:02}", 4),
                gallery("Gallery_V{lo:02}-V{hi:02}", 1),
                gallery("Gallery_M{lo:02}-M{hi:02}", 1),
                gallery("Gallery_{lo:03}-{hi:03}", 36),
            ],
            window: 50,
            page_size: 50,
            max_in_flight: None,
            fetch_timeout_secs: 30,
            user_agent: concat!("tos_harvester/", env!("CARGO_PKG_VERSION")).to_string(),
            pacing: PacingSettings::default(),
            on_index_error: IndexFailurePolicy::Abort,
            selectors: SelectorSettings::default(),
            output: OutputSettings::default(),
            log_file: None,
        }
    }
}

impl Default for PacingSettings {
    fn default() -> Self {
        PacingSettings {
            mode: PacingMode::FixedDelay,
            delay_secs: 10.0,
        }
    }
}

impl Default for SelectorSettings {
    fn default() -> Self {
        SelectorSettings {
            index_link: "table.shadow td[style='font-size: 1.2em'] b a".to_string(),
            detail_cell: "article table.shadow td".to_string(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            cards: PathBuf::from("parsed.csv"),
            skills: PathBuf::from("parsed_skills.csv"),
            delimiter: "$".to_string(),
            write_headers: false,
        }
    }
}

impl Settings {
    /// Load layered settings. An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Settings, ConfigError> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.patterns.is_empty() {
            return Err(ConfigError::NoPatterns);
        }
        if self.window == 0 {
            return Err(ConfigError::Zero("window"));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Zero("page_size"));
        }
        if self.max_in_flight == Some(0) {
            return Err(ConfigError::Zero("max_in_flight"));
        }
        self.delimiter()?;
        reqwest::Url::parse(&self.base_url).map_err(|e| ConfigError::BaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        for selector in [&self.selectors.index_link, &self.selectors.detail_cell] {
            scraper::Selector::parse(selector).map_err(|e| ConfigError::Selector {
                selector: selector.clone(),
                reason: e.to_string(),
            })?;
        }
        if !(0.0..=MAX_PACING_SECS).contains(&self.pacing.delay_secs) {
            return Err(ConfigError::PacingDelay(self.pacing.delay_secs));
        }
        for pattern in &self.patterns {
            PageTemplate::parse(&pattern.template)?;
            // the last window's upper bound must fit in usize
            let last_hi = pattern
                .start
                .checked_add(pattern.count)
                .and_then(|end| end.checked_mul(self.window));
            if last_hi.is_none() {
                return Err(ConfigError::PageRange {
                    template: pattern.template.clone(),
                    start: pattern.start,
                    count: pattern.count,
                });
            }
        }
        Ok(())
    }

    /// The output delimiter as a single byte.
    pub fn delimiter(&self) -> Result<u8, ConfigError> {
        match self.output.delimiter.as_bytes() {
            [b] if b.is_ascii() && *b != b',' && *b != b'\n' && *b != b'"' => Ok(*b),
            _ => Err(ConfigError::Delimiter(self.output.delimiter.clone())),
        }
    }

    pub fn in_flight_limit(&self) -> usize {
        self.max_in_flight.unwrap_or(self.page_size)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
