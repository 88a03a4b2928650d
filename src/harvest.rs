use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::config::{IndexFailurePolicy, Settings};
use crate::dispatch::{Batch, Dispatcher};
use crate::error::{ConfigError, HarvestError};
use crate::fetch::Source;
use crate::output::DatasetWriter;
use crate::pacing::Pacer;
use crate::parser::PageParser;
use crate::pattern::{page_windows, PageTemplate, PageWindow};
use crate::registry::SkillRegistry;

/// Harvest stats returned after completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub pages: usize,
    pub skipped_pages: usize,
    pub rows: usize,
    pub failed_records: usize,
    pub duplicate_ids: usize,
    pub skills: usize,
    pub elapsed: Duration,
}

struct PlannedPattern {
    template: PageTemplate,
    start: usize,
    count: usize,
}

/// Walks every gallery page of every pattern, one page at a time.
pub struct Harvester<S: Source> {
    dispatcher: Dispatcher<S>,
    registry: Arc<SkillRegistry>,
    patterns: Vec<PlannedPattern>,
    window: usize,
    pacer: Pacer,
    on_index_error: IndexFailurePolicy,
    seen_ids: HashSet<String>,
    show_progress: bool,
}

impl<S: Source> Harvester<S> {
    pub fn new(source: Arc<S>, settings: &Settings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let patterns = settings
            .patterns
            .iter()
            .map(|p| {
                Ok(PlannedPattern {
                    template: PageTemplate::parse(&p.template)?,
                    start: p.start,
                    count: p.count,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        let registry = Arc::new(SkillRegistry::new());
        let dispatcher = Dispatcher::new(
            source,
            Arc::new(PageParser::from_settings(settings)?),
            Arc::clone(&registry),
            settings.in_flight_limit(),
        );

        Ok(Harvester {
            dispatcher,
            registry,
            patterns,
            window: settings.window,
            pacer: Pacer::from_settings(&settings.pacing),
            on_index_error: settings.on_index_error,
            seen_ids: HashSet::new(),
            show_progress: false,
        })
    }

    /// Draw a progress bar per gallery page.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn registry(&self) -> &Arc<SkillRegistry> {
        &self.registry
    }

    /// Every index page the run visits, in order.
    pub fn plan(&self) -> Vec<PageWindow> {
        self.patterns
            .iter()
            .flat_map(|p| page_windows(&p.template, self.window, p.start, p.count))
            .collect()
    }

    /// Detail page locators listed on one index page.
    pub async fn scan(&self, url: &str) -> Result<Vec<String>, HarvestError> {
        let html = self
            .dispatcher
            .source()
            .fetch(url)
            .await
            .map_err(|source| HarvestError::IndexPage {
                url: url.to_string(),
                source,
            })?;
        let locators = self.dispatcher.parser().locators(&html);
        if locators.is_empty() {
            warn!(url, "index page lists no cards");
        }
        Ok(locators)
    }

    /// Scan one index page and extract all of its cards.
    pub async fn harvest_page(&self, url: &str) -> Result<Batch, HarvestError> {
        let locators = self.scan(url).await?;
        let progress = self.page_progress(url, locators.len());
        let batch = self.dispatcher.dispatch(locators, &progress).await;
        progress.finish_and_clear();
        Ok(batch)
    }

    /// Harvest every planned page into `writer`, then write the skill registry.
    ///
    /// With [`IndexFailurePolicy::Abort`] an unreachable index page ends the run with an
    /// error; rows and skills gathered so far are still flushed.
    pub async fn run<W: Write>(
        &mut self,
        writer: &mut DatasetWriter<W>,
    ) -> Result<RunSummary, HarvestError> {
        let started = Instant::now();
        let mut summary = RunSummary::default();
        let plan = self.plan();
        info!(
            pages = plan.len(),
            started_at = %chrono::Local::now().to_rfc3339(),
            "harvest started"
        );

        for window in plan {
            self.pacer.page_started().await;
            info!(url = %window.url, lo = window.lo, hi = window.hi, "processing index page");

            match self.harvest_page(&window.url).await {
                Ok(batch) => {
                    summary.duplicate_ids += self.note_duplicates(&batch);
                    let written = writer.write_batch(&batch)?;
                    summary.pages += 1;
                    summary.rows += written;
                    summary.failed_records += batch.failures().len();
                    info!(
                        url = %window.url,
                        cards = written,
                        failed = batch.failures().len(),
                        skills = self.registry.len(),
                        "page done"
                    );
                }
                Err(e) if self.on_index_error == IndexFailurePolicy::Skip => {
                    warn!(error = %e, "skipping index page");
                    summary.skipped_pages += 1;
                }
                Err(e) => {
                    writer.write_skills(&self.registry.snapshot())?;
                    return Err(e);
                }
            }
            self.pacer.page_finished();
        }

        summary.skills = writer.write_skills(&self.registry.snapshot())?;
        summary.elapsed = started.elapsed();
        info!(
            pages = summary.pages,
            skipped = summary.skipped_pages,
            rows = summary.rows,
            failed = summary.failed_records,
            skills = summary.skills,
            finished_at = %chrono::Local::now().to_rfc3339(),
            "harvest finished"
        );
        Ok(summary)
    }

    fn note_duplicates(&mut self, batch: &Batch) -> usize {
        let mut duplicates = 0;
        for card in batch.cards().filter(|c| !c.id.is_empty()) {
            if !self.seen_ids.insert(card.id.clone()) {
                warn!(id = %card.id, url = %card.wiki_link, "card id already harvested");
                duplicates += 1;
            }
        }
        duplicates
    }

    fn page_progress(&self, url: &str, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        pb.set_message(url.rsplit('/').next().unwrap_or(url).to_string());
        pb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PacingMode, PatternSettings};
    use crate::dispatch::tests::{card_page, MemorySource};

    fn index_html(hrefs: &[&str]) -> String {
        let cells: String = hrefs
            .iter()
            .map(|h| format!(r#"<td style="font-size: 1.2em"><b><a href="{}">c</a></b></td>"#, h))
            .collect();
        format!(r#"<table class="shadow"><tr>{}</tr></table>"#, cells)
    }

    fn settings(patterns: &[(&str, usize)]) -> Settings {
        let mut s = Settings::default();
        s.base_url = "mem://wiki".into();
        s.patterns = patterns
            .iter()
            .map(|(t, count)| PatternSettings {
                template: t.to_string(),
                start: 0,
                count: *count,
            })
            .collect();
        s.pacing.mode = PacingMode::FixedDelay;
        s.pacing.delay_secs = 0.0;
        s
    }

    fn rows(bytes: &[u8]) -> Vec<Vec<String>> {
        csv::ReaderBuilder::new()
            .delimiter(b'$')
            .from_reader(bytes)
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[tokio::test]
    async fn plan_follows_pattern_order() {
        let s = settings(&[("mem://wiki/P{lo:02}-{hi:02}", 1), ("mem://wiki/G{lo:03}-{hi:03}", 2)]);
        let h = Harvester::new(Arc::new(MemorySource::default()), &s).unwrap();
        let urls: Vec<_> = h.plan().into_iter().map(|w| w.url).collect();
        assert_eq!(urls, ["mem://wiki/P01-50", "mem://wiki/G001-050", "mem://wiki/G051-100"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn rows_follow_page_order() {
        let source = MemorySource::default()
            .page("mem://wiki/A1-50", 0, index_html(&["/c/1", "/c/2"]))
            .page("mem://wiki/B1-50", 0, index_html(&["/c/3"]))
            .page("mem://wiki/c/1", 30, card_page("1", "Burst", "Aura"))
            .page("mem://wiki/c/2", 1, card_page("2", "Burst", "Aura"))
            .page("mem://wiki/c/3", 0, card_page("3", "Blast", "Aura"));
        let s = settings(&[("mem://wiki/A{lo}-{hi}", 1), ("mem://wiki/B{lo}-{hi}", 1)]);
        let mut h = Harvester::new(Arc::new(source), &s).unwrap();
        let mut w = DatasetWriter::new(Vec::new(), Vec::new(), b'$', true);

        let summary = h.run(&mut w).await.unwrap();
        assert_eq!(summary.pages, 2);
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.skills, 3);
        assert_eq!(summary.failed_records, 0);

        let (cards, skills) = w.into_inner().unwrap();
        let cards = rows(&cards);
        let ids: Vec<_> = cards.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
        assert_eq!(cards[0][14], cards[1][14]);
        assert_ne!(cards[0][14], cards[2][14]);
        assert_eq!(rows(&skills).len(), 3);
    }

    #[tokio::test]
    async fn unreachable_index_aborts_with_locator() {
        let source = MemorySource::default()
            .page("mem://wiki/A1-50", 0, index_html(&["/c/1"]))
            .page("mem://wiki/c/1", 0, card_page("1", "Burst", "Aura"));
        let s = settings(&[("mem://wiki/A{lo}-{hi}", 2)]);
        let mut h = Harvester::new(Arc::new(source), &s).unwrap();
        let mut w = DatasetWriter::new(Vec::new(), Vec::new(), b'$', true);

        let err = h.run(&mut w).await.unwrap_err();
        match err {
            HarvestError::IndexPage { url, .. } => assert_eq!(url, "mem://wiki/A51-100"),
            other => panic!("unexpected error: {}", other),
        }
        let (cards, skills) = w.into_inner().unwrap();
        assert_eq!(rows(&cards).len(), 1);
        assert_eq!(rows(&skills).len(), 2);
    }

    #[tokio::test]
    async fn skip_policy_continues() {
        let source = MemorySource::default()
            .page("mem://wiki/A51-100", 0, index_html(&["/c/1"]))
            .page("mem://wiki/c/1", 0, card_page("1", "Burst", "Aura"));
        let mut s = settings(&[("mem://wiki/A{lo}-{hi}", 2)]);
        s.on_index_error = IndexFailurePolicy::Skip;
        let mut h = Harvester::new(Arc::new(source), &s).unwrap();
        let mut w = DatasetWriter::new(Vec::new(), Vec::new(), b'$', true);

        let summary = h.run(&mut w).await.unwrap();
        assert_eq!(summary.skipped_pages, 1);
        assert_eq!(summary.pages, 1);
        assert_eq!(summary.rows, 1);
    }

    #[tokio::test]
    async fn duplicate_ids_are_counted() {
        let source = MemorySource::default()
            .page("mem://wiki/A1-50", 0, index_html(&["/c/1", "/c/1b"]))
            .page("mem://wiki/c/1", 0, card_page("7", "Burst", "Aura"))
            .page("mem://wiki/c/1b", 0, card_page("7", "Burst", "Aura"));
        let s = settings(&[("mem://wiki/A{lo}-{hi}", 1)]);
        let mut h = Harvester::new(Arc::new(source), &s).unwrap();
        let mut w = DatasetWriter::new(Vec::new(), Vec::new(), b'$', true);

        let summary = h.run(&mut w).await.unwrap();
        assert_eq!(summary.duplicate_ids, 1);
        assert_eq!(summary.rows, 2);
    }
}
