//! Windowed pagination shared by the offset-based fetchers.
//!
//! Pages are requested in windows: every page of a window runs as its own
//! tokio task, windows run one after another. Results are joined in page order,
//! so each task writes exactly one slot and no lock is involved.
//!
//! A fetch stops at the first failed, empty, short or all-duplicate page, when
//! the page cap is reached, or when the wall-clock budget runs out. Running out
//! of budget is not an error: whatever was collected is returned.

use std::{
    future::Future,
    time::{Duration, Instant},
};

use tokio::{task::JoinHandle, time::timeout};
use tracing::{debug, info, warn};

use crate::{
    config::PagingConfig,
    error::{PipelineError, PipelineResult},
    track::{Track, TrackList, TrackListBuilder, Validation},
    types::Service,
};

pub type PageOutcome = PipelineResult<Vec<Track>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub index: usize,
    pub offset: usize,
    pub size: usize,
}

enum Flow {
    Continue,
    Stop,
}

struct Collector {
    builder: TrackListBuilder,
    page_size: usize,
    error: Option<PipelineError>,
}

impl Collector {
    fn new(page_size: usize) -> Self {
        Self {
            builder: TrackListBuilder::new(Validation::ArtistAndTitle),
            page_size,
            error: None,
        }
    }

    // Keeps the first error, unless a later one says the list is private.
    fn note_error(&mut self, error: PipelineError) {
        let replace = match &self.error {
            None => true,
            Some(previous) => !previous.is_privacy() && error.is_privacy(),
        };
        if replace {
            self.error = Some(error);
        }
    }

    fn absorb(&mut self, outcomes: Vec<PageOutcome>) -> Flow {
        for outcome in outcomes {
            let tracks = match outcome {
                Ok(tracks) => tracks,
                Err(e) => {
                    self.note_error(e);
                    return Flow::Stop;
                }
            };

            let received = tracks.len();
            if received == 0 {
                return Flow::Stop;
            }
            let added = self.builder.extend(tracks);
            if added == 0 || received < self.page_size {
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    fn finish(self) -> PipelineResult<TrackList> {
        match self.error {
            Some(error) if self.builder.is_empty() => Err(error),
            _ => Ok(self.builder.finish()),
        }
    }
}

fn window_is_empty(outcomes: &[PageOutcome]) -> bool {
    outcomes.iter().all(|o| match o {
        Ok(tracks) => tracks.is_empty(),
        Err(_) => true,
    })
}

/// Time left of `budget` since `started`; `None` once it has run out.
pub(crate) fn remaining_budget(budget: Duration, started: Instant) -> Option<Duration> {
    budget
        .checked_sub(started.elapsed())
        .filter(|left| !left.is_zero())
}

/// Runs one window. Returns the outcomes of the pages that finished, in page
/// order, and whether the budget ran out while waiting.
async fn run_window<F, Fut>(
    service: Service,
    fetch_page: &F,
    pages: &[Page],
    remaining: Duration,
) -> (Vec<PageOutcome>, bool)
where
    F: Fn(Page) -> Fut,
    Fut: Future<Output = PageOutcome> + Send + 'static,
{
    let mut handles: Vec<JoinHandle<PageOutcome>> =
        pages.iter().map(|page| tokio::spawn(fetch_page(*page))).collect();
    let mut outcomes = Vec::with_capacity(handles.len());

    let joined = timeout(remaining, async {
        for handle in handles.iter_mut() {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(PipelineError::unavailable(
                    service,
                    format!("page task failed: {e}"),
                )),
            };
            outcomes.push(outcome);
        }
    })
    .await;

    let timed_out = joined.is_err();
    if timed_out {
        for handle in &handles {
            handle.abort();
        }
    }
    (outcomes, timed_out)
}

async fn collect<P, PF, S, SF>(
    service: Service,
    cfg: &PagingConfig,
    primary: &P,
    secondary: Option<&S>,
) -> PipelineResult<TrackList>
where
    P: Fn(Page) -> PF,
    PF: Future<Output = PageOutcome> + Send + 'static,
    S: Fn(Page) -> SF,
    SF: Future<Output = PageOutcome> + Send + 'static,
{
    let started = Instant::now();
    let page_size = cfg.page_size.max(1);
    let mut collector = Collector::new(page_size);
    let mut on_secondary = false;

    let pages: Vec<Page> = (0..cfg.max_pages)
        .map(|index| Page {
            index,
            offset: index * page_size,
            size: page_size,
        })
        .collect();

    for (window_no, window) in pages.chunks(cfg.window.max(1)).enumerate() {
        let Some(remaining) = remaining_budget(cfg.budget, started) else {
            warn!(%service, window = window_no, "paging.budget.exhausted");
            break;
        };
        debug!(%service, window = window_no, pages = window.len(), on_secondary, "paging.window");

        let (mut outcomes, mut timed_out) = match secondary {
            Some(fallback) if on_secondary => run_window(service, fallback, window, remaining).await,
            _ => run_window(service, primary, window, remaining).await,
        };

        if !timed_out && !on_secondary && window_is_empty(&outcomes) {
            if let (Some(fallback), Some(remaining)) = (secondary, remaining_budget(cfg.budget, started)) {
                debug!(%service, window = window_no, "paging.window.fallback");
                let (retried, retry_timed_out) =
                    run_window(service, fallback, window, remaining).await;

                if window_is_empty(&retried) {
                    for outcome in outcomes {
                        if let Err(e) = outcome {
                            collector.note_error(e);
                        }
                    }
                } else {
                    on_secondary = true;
                }
                outcomes = retried;
                timed_out = retry_timed_out;
            }
        }

        let flow = collector.absorb(outcomes);
        if timed_out {
            warn!(%service, window = window_no, "paging.budget.exhausted");
            break;
        }
        if let Flow::Stop = flow {
            break;
        }
    }

    let result = collector.finish();
    match &result {
        Ok(list) => info!(
            %service,
            tracks = list.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "paging.done"
        ),
        Err(e) => warn!(%service, error = %e, "paging.failed"),
    }
    result
}

/// Collects pages from a single endpoint.
pub async fn collect_pages<P, PF>(
    service: Service,
    cfg: &PagingConfig,
    primary: P,
) -> PipelineResult<TrackList>
where
    P: Fn(Page) -> PF,
    PF: Future<Output = PageOutcome> + Send + 'static,
{
    collect(service, cfg, &primary, None::<&P>).await
}

/// Collects pages from `primary`, retrying a window that came back empty
/// against `secondary`. Once `secondary` delivers, later windows use it
/// directly.
pub async fn collect_pages_with_fallback<P, PF, S, SF>(
    service: Service,
    cfg: &PagingConfig,
    primary: P,
    secondary: S,
) -> PipelineResult<TrackList>
where
    P: Fn(Page) -> PF,
    PF: Future<Output = PageOutcome> + Send + 'static,
    S: Fn(Page) -> SF,
    SF: Future<Output = PageOutcome> + Send + 'static,
{
    collect(service, cfg, &primary, Some(&secondary)).await
}
