use std::sync::Arc;

use indicatif::ProgressBar;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::fetch::Source;
use crate::parser::card::Card;
use crate::parser::PageParser;
use crate::registry::SkillRegistry;

/// A detail page whose card could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotFailure {
    pub position: usize,
    pub url: String,
    pub reason: String,
}

/// Cards of one index page, one slot per discovered locator, in discovery order.
#[derive(Debug, Default)]
pub struct Batch {
    slots: Vec<Option<Card>>,
    failures: Vec<SlotFailure>,
}

impl Batch {
    fn with_slots(len: usize) -> Self {
        Batch {
            slots: (0..len).map(|_| None).collect(),
            failures: Vec::new(),
        }
    }

    pub fn slots(&self) -> &[Option<Card>] {
        &self.slots
    }

    /// Present cards, still in slot order.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.slots.iter().flatten()
    }

    pub fn failures(&self) -> &[SlotFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Fans a page's locators out to one task each and reassembles the results by position.
pub struct Dispatcher<S: Source> {
    source: Arc<S>,
    parser: Arc<PageParser>,
    registry: Arc<SkillRegistry>,
    permits: Arc<Semaphore>,
}

impl<S: Source> Dispatcher<S> {
    pub fn new(
        source: Arc<S>,
        parser: Arc<PageParser>,
        registry: Arc<SkillRegistry>,
        max_in_flight: usize,
    ) -> Self {
        Dispatcher {
            source,
            parser,
            registry,
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn parser(&self) -> &Arc<PageParser> {
        &self.parser
    }

    /// Fetch and extract every locator concurrently. Returns once every worker has
    /// finished; a failed worker leaves only its own slot empty.
    pub async fn dispatch(&self, locators: Vec<String>, progress: &ProgressBar) -> Batch {
        let mut handles = Vec::with_capacity(locators.len());
        for (position, url) in locators.into_iter().enumerate() {
            let source = Arc::clone(&self.source);
            let parser = Arc::clone(&self.parser);
            let registry = Arc::clone(&self.registry);
            let permits = Arc::clone(&self.permits);
            let progress = progress.clone();
            let task_url = url.clone();

            let handle = tokio::spawn(async move {
                let _permit = permits.acquire().await;
                debug!(position, url = %task_url, "worker started");
                let result = source
                    .fetch(&task_url)
                    .await
                    .map(|html| parser.card(&html, &task_url, &registry));
                progress.inc(1);
                result
            });
            handles.push((url, handle));
        }

        let mut batch = Batch::with_slots(handles.len());
        for (position, (url, handle)) in handles.into_iter().enumerate() {
            let reason = match handle.await {
                Ok(Ok(card)) => {
                    batch.slots[position] = Some(card);
                    continue;
                }
                Ok(Err(e)) => describe(&e),
                Err(e) => format!("worker aborted: {}", e),
            };
            warn!(position, url = %url, reason = %reason, "card skipped");
            batch.failures.push(SlotFailure {
                position,
                url,
                reason,
            });
        }
        batch
    }
}

fn describe(e: &FetchError) -> String {
    match e {
        FetchError::Transport { source, .. } => format!("transport error: {}", source),
        FetchError::Status { status, .. } => format!("HTTP {}", status),
    }
}
