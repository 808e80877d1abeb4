//! Controller behind the "add link" form.
//!
//! Every edit of the URL bumps a generation counter. Extraction is scheduled
//! on its own thread after a debounce delay and reports back over a channel,
//! tagged with the generation it was started for. Results whose generation
//! is no longer current are dropped, so a slow response for an old input can
//! never overwrite the preview of the current one.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        mpsc, Arc,
    },
    time::{Duration, Instant},
};

use serde::Serialize;

use crate::{
    links::LinkCreate,
    metadata::{
        classify::looks_like_url, normalize_url, ExtractionResult, Extractor, Phase,
    },
};

#[derive(Debug)]
pub enum PreviewEvent {
    Quick {
        generation: u64,
        result: ExtractionResult,
    },
    Full {
        generation: u64,
        result: ExtractionResult,
    },
}

impl PreviewEvent {
    fn generation(&self) -> u64 {
        match self {
            PreviewEvent::Quick { generation, .. } | PreviewEvent::Full { generation, .. } => {
                *generation
            }
        }
    }
}

/// Editable form fields plus extraction status.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreviewState {
    pub url: String,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub loading: bool,
    pub auto_extracted: bool,
    pub error: Option<String>,
    pub phase: Phase,
    pub generation: u64,

    #[serde(skip)]
    quick: Option<ExtractionResult>,
}

pub struct PreviewSession {
    extractor: Arc<Extractor>,
    debounce: Duration,

    generation: Arc<AtomicU64>,
    /// Generation of the most recently scheduled extraction
    scheduled: Option<u64>,

    events_tx: mpsc::Sender<PreviewEvent>,
    events_rx: mpsc::Receiver<PreviewEvent>,

    state: PreviewState,
}

impl PreviewSession {
    pub fn new(extractor: Arc<Extractor>, debounce: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            extractor,
            debounce,
            generation: Arc::new(AtomicU64::new(0)),
            scheduled: None,
            events_tx,
            events_rx,
            state: PreviewState::default(),
        }
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    fn bump(&mut self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.generation = generation;
        self.state.phase = Phase::Idle;
        self.state.quick = None;
        self.state.loading = false;
        self.scheduled = None;
        generation
    }

    /// The URL field changed. Returns the new generation.
    pub fn input(&mut self, raw: &str) -> u64 {
        self.state.url = raw.to_string();
        self.state.auto_extracted = false;
        let generation = self.bump();

        if raw.trim().is_empty() || !looks_like_url(raw) {
            log::debug!("generation {generation}: input not a url yet, nothing scheduled");
            return generation;
        }

        self.schedule(generation, self.debounce);
        generation
    }

    /// Extract again for the current input, right away.
    pub fn refresh(&mut self) -> Option<u64> {
        if self.state.url.trim().is_empty() {
            return None;
        }

        let generation = self.bump();
        self.schedule(generation, Duration::ZERO);
        Some(generation)
    }

    /// The URL field lost focus. Only extracts when nothing has been
    /// extracted for this input and nothing is running.
    pub fn blur(&mut self) -> Option<u64> {
        self.poll();
        if self.state.auto_extracted || self.state.loading {
            return None;
        }
        self.refresh()
    }

    fn schedule(&mut self, generation: u64, delay: Duration) {
        self.scheduled = Some(generation);

        let url = normalize_url(&self.state.url);
        let extractor = self.extractor.clone();
        let current = self.generation.clone();
        let events_tx = self.events_tx.clone();

        std::thread::spawn(move || {
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }

            let is_current = || current.load(Ordering::SeqCst) == generation;
            if !is_current() {
                log::debug!("generation {generation}: superseded before start");
                return;
            }

            let quick = extractor.quick(&url);
            if events_tx
                .send(PreviewEvent::Quick {
                    generation,
                    result: quick,
                })
                .is_err()
            {
                return;
            }

            if !is_current() {
                log::debug!("generation {generation}: superseded after quick phase");
                return;
            }

            let full = extractor.full(&url);
            let _ = events_tx.send(PreviewEvent::Full {
                generation,
                result: full,
            });
        });
    }

    /// Apply one event. Events from an older generation are dropped.
    pub fn apply(&mut self, event: PreviewEvent) {
        let generation = event.generation();
        if generation != self.state.generation {
            log::debug!(
                "dropping stale result of generation {generation}, current is {}",
                self.state.generation
            );
            return;
        }

        let state = &mut self.state;
        match event {
            PreviewEvent::Quick { result, .. } => {
                state.title = result.title.clone().unwrap_or_default();
                state.thumbnail = result.thumbnail.clone().unwrap_or_default();
                state.loading = true;
                state.error = None;
                state.phase = Phase::QuickReturned;
                state.quick = Some(result);
            }
            PreviewEvent::Full { result, .. } => {
                let has_error = result.has_error();
                let quick = state.quick.take().unwrap_or_default();
                state.title = result.title.or(quick.title).unwrap_or_default();
                state.description = result.description.unwrap_or_default();
                state.thumbnail = result.thumbnail.or(quick.thumbnail).unwrap_or_default();
                state.error = if has_error { result.error } else { None };
                state.loading = false;
                state.auto_extracted = true;
                state.phase = Phase::Settled;
            }
        }
    }

    /// Apply everything that arrived so far without blocking.
    pub fn poll(&mut self) -> &PreviewState {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
        }
        &self.state
    }

    fn wait_for(&mut self, phase: Phase, timeout: Duration) -> &PreviewState {
        let deadline = Instant::now() + timeout;
        self.poll();

        while self.scheduled == Some(self.state.generation) && self.state.phase < phase {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                log::debug!("generation {}: gave up waiting for {phase:?}", self.state.generation);
                break;
            }
            match self.events_rx.recv_timeout(remaining) {
                Ok(event) => self.apply(event),
                Err(_) => break,
            }
        }

        &self.state
    }

    /// Block until the quick result of the current generation is in.
    pub fn wait_quick(&mut self, timeout: Duration) -> &PreviewState {
        self.wait_for(Phase::QuickReturned, timeout)
    }

    /// Block until the current generation settled or `timeout` elapsed.
    /// Returns immediately when nothing is scheduled.
    pub fn wait_settled(&mut self, timeout: Duration) -> &PreviewState {
        self.wait_for(Phase::Settled, timeout)
    }

    pub fn set_title(&mut self, title: &str) {
        self.state.title = title.to_string();
    }

    pub fn set_description(&mut self, description: &str) {
        self.state.description = description.to_string();
    }

    pub fn set_thumbnail(&mut self, thumbnail: &str) {
        self.state.thumbnail = thumbnail.to_string();
        self.state.auto_extracted = false;
    }

    pub fn can_submit(&self) -> bool {
        !self.state.url.trim().is_empty() && !self.state.loading
    }

    pub fn submission(&self) -> Option<LinkCreate> {
        if !self.can_submit() {
            return None;
        }

        let state = &self.state;
        Some(LinkCreate {
            url: normalize_url(&state.url),
            title: Some(state.title.clone()),
            description: Some(state.description.clone()),
            thumbnail: Some(state.thumbnail.clone()),
        })
    }

    /// Clear the form. Anything still in flight becomes stale.
    pub fn reset(&mut self) {
        self.bump();
        let generation = self.state.generation;
        self.state = PreviewState {
            generation,
            ..Default::default()
        };
    }
}
