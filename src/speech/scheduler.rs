//! Serial speech playback scheduler
//!
//! The host engine can only vocalize one utterance at a time; overlapping
//! submissions come out garbled or get dropped. Every playback request in the
//! application therefore goes through a single [`SpeechScheduler`], which owns
//! the pending queue and the single active slot.
//!
//! Transitions:
//!
//! | state  | input                    | effect                                    |
//! |--------|--------------------------|-------------------------------------------|
//! | Idle   | enqueue                  | queue, then advance (→ Active)            |
//! | Active | enqueue                  | queue only                                |
//! | Active | `Started`                | `on_speaking`                             |
//! | Active | `Completed` / `Failed`   | feedback, → Idle, advance after settling  |
//! | Idle   | settle timer, queue > 0  | advance (→ Active)                        |
//!
//! The scheduler is synchronous and never reads the clock itself: callers
//! pass `now` in, which keeps every transition a discrete step.

use super::control::ControlHandle;
use super::engine::{EngineReport, SpeechEngine, Utterance, UtteranceEvent, UtteranceSink};
use super::request::{RequestId, RequestKind, SpeechRequest};
use super::voice::{select_german_voice, VoiceInfo, VoiceProfile};
use crate::integration::config::SpeechConfig;
use crate::utils::perf::TimingTracker;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Whether an utterance currently occupies the active slot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Active,
}

/// Observable scheduler transitions, in the order they happened
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpeechEvent {
    /// A request took the active slot and was handed to the engine
    Activated {
        request_id: RequestId,
        text: String,
        kind: RequestKind,
    },

    /// The active request finished playing
    Completed { request_id: RequestId },

    /// The active request failed and was discarded
    Failed { request_id: RequestId, reason: String },
}

/// Counters and timings collected while playing
#[derive(Clone, Debug, Default)]
pub struct SchedulerStats {
    pub completed: u64,
    pub failed: u64,

    /// Time between enqueue and activation
    pub queue_wait: TimingTracker,

    /// Time between activation and the terminal event
    pub utterance_time: TimingTracker,
}

#[derive(Debug)]
struct ActiveRequest {
    request: SpeechRequest,
    activated_at: Instant,
}

#[derive(Debug)]
enum TimerAction {
    Advance,
    FlashEnd(ControlHandle),
    RevertGlyph(ControlHandle),
    Watchdog(RequestId),
    RetryVoices,
}

#[derive(Debug)]
struct Timer {
    deadline: Instant,
    action: TimerAction,
}

enum Outcome {
    Completed,
    Failed(String),
}

pub struct SpeechScheduler {
    config: SpeechConfig,
    engine: Arc<dyn SpeechEngine>,
    queue: VecDeque<SpeechRequest>,
    active: Option<ActiveRequest>,
    timers: Vec<Timer>,
    voice: Option<VoiceInfo>,
    report_tx: Sender<EngineReport>,
    report_rx: Receiver<EngineReport>,
    events: Vec<SpeechEvent>,
    stats: SchedulerStats,
}

impl SpeechScheduler {
    /// Create an idle scheduler with an empty queue
    pub fn new(config: SpeechConfig, engine: Arc<dyn SpeechEngine>) -> Self {
        let (report_tx, report_rx) = unbounded();
        let mut scheduler = Self {
            config,
            engine,
            queue: VecDeque::new(),
            active: None,
            timers: Vec::new(),
            voice: None,
            report_tx,
            report_rx,
            events: Vec::new(),
            stats: SchedulerStats::default(),
        };
        scheduler.refresh_voices();
        scheduler
    }

    /// Re-read the host's voice list and pick a German voice
    pub fn refresh_voices(&mut self) {
        let voices = self.engine.voices();
        self.voice = select_german_voice(&voices).cloned();
        match &self.voice {
            Some(voice) => info!("German voice loaded: {}", voice.name),
            None => info!("No German voice found, using {}", self.config.language),
        }
    }

    /// Look for a German voice once more after `voice_retry_delay`
    ///
    /// Some hosts publish their voice list a moment after startup. Does
    /// nothing if a voice is already loaded.
    pub fn schedule_voice_retry(&mut self, now: Instant) {
        if self.voice.is_none() {
            self.schedule(now + self.config.voice_retry_delay, TimerAction::RetryVoices);
        }
    }

    pub fn state(&self) -> SchedulerState {
        if self.active.is_some() {
            SchedulerState::Active
        } else {
            SchedulerState::Idle
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Texts waiting for the active slot, head first
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(|r| r.text.as_str())
    }

    pub fn active_request(&self) -> Option<&SpeechRequest> {
        self.active.as_ref().map(|a| &a.request)
    }

    pub fn voice(&self) -> Option<&VoiceInfo> {
        self.voice.as_ref()
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    /// Receiver for engine reports, for callers that block on it
    pub fn report_receiver(&self) -> Receiver<EngineReport> {
        self.report_rx.clone()
    }

    /// Take the transitions recorded since the last call
    pub fn take_events(&mut self) -> Vec<SpeechEvent> {
        std::mem::take(&mut self.events)
    }

    /// Queue a word at the tail. Empty text is ignored.
    pub fn enqueue_word(&mut self, text: &str, origin: ControlHandle, now: Instant) -> Option<RequestId> {
        if text.is_empty() {
            return None;
        }
        Some(self.enqueue(SpeechRequest::word(text, origin, now), now))
    }

    /// Queue a sentence at the head, ahead of any waiting words. Empty text is ignored.
    ///
    /// An active request is never interrupted.
    pub fn enqueue_sentence(&mut self, text: &str, origin: ControlHandle, now: Instant) -> Option<RequestId> {
        if text.is_empty() {
            return None;
        }
        Some(self.enqueue(SpeechRequest::sentence(text, origin, now), now))
    }

    fn enqueue(&mut self, request: SpeechRequest, now: Instant) -> RequestId {
        let id = request.id;
        if request.is_priority() {
            self.queue.push_front(request);
        } else {
            self.queue.push_back(request);
        }
        self.advance(now);
        id
    }

    /// Activate the head of the queue if the slot is free
    ///
    /// Returns whether a request was activated. No-op while active or when
    /// the queue is empty.
    pub fn advance(&mut self, now: Instant) -> bool {
        if self.active.is_some() {
            return false;
        }
        let Some(request) = self.queue.pop_front() else {
            return false;
        };

        self.stats
            .queue_wait
            .record(now.saturating_duration_since(request.queued_at));

        debug!("Activating {:?} request {}: {}", request.kind, request.id, request.text);

        request.origin.with(|control| control.on_start());
        if request.origin.is_live() {
            self.schedule(
                now + self.config.flash_duration,
                TimerAction::FlashEnd(request.origin.clone()),
            );
        }
        if let Some(timeout) = self.config.utterance_timeout {
            self.schedule(now + timeout, TimerAction::Watchdog(request.id));
        }

        let utterance = self.utterance_for(&request);
        let sink = UtteranceSink::new(request.id, self.report_tx.clone());
        self.events.push(SpeechEvent::Activated {
            request_id: request.id,
            text: request.text.clone(),
            kind: request.kind,
        });
        self.active = Some(ActiveRequest {
            request,
            activated_at: now,
        });

        if let Err(e) = self.engine.speak(utterance, sink) {
            self.finish(Outcome::Failed(e.to_string()), now);
        }
        true
    }

    /// Apply one engine report
    ///
    /// Reports for anything other than the active request are stale and ignored.
    pub fn handle_report(&mut self, report: EngineReport, now: Instant) {
        let is_active = self
            .active
            .as_ref()
            .is_some_and(|a| a.request.id == report.request_id);
        if !is_active {
            debug!("Ignoring stale {:?} for {}", report.event, report.request_id);
            return;
        }

        match report.event {
            UtteranceEvent::Started => {
                if let Some(active) = &self.active {
                    active.request.origin.with(|control| control.on_speaking());
                }
            }
            UtteranceEvent::Completed => self.finish(Outcome::Completed, now),
            UtteranceEvent::Failed(reason) => self.finish(Outcome::Failed(reason), now),
        }
    }

    /// Apply every engine report received so far
    pub fn process_reports(&mut self, now: Instant) -> usize {
        let mut handled = 0;
        while let Ok(report) = self.report_rx.try_recv() {
            self.handle_report(report, now);
            handled += 1;
        }
        handled
    }

    /// Run every timer whose deadline is at or before `now`, earliest first
    ///
    /// Each timer runs at its own deadline, so timers it schedules that also
    /// fall before `now` run in the same call.
    pub fn fire_due_timers(&mut self, now: Instant) -> usize {
        let mut fired = 0;
        while let Some(index) = self.next_due(now) {
            let timer = self.timers.remove(index);
            self.run_timer(timer.action, timer.deadline);
            fired += 1;
        }
        fired
    }

    /// Apply pending reports, then run due timers
    pub fn pump(&mut self, now: Instant) {
        self.process_reports(now);
        self.fire_due_timers(now);
    }

    /// Earliest pending timer deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(|t| t.deadline).min()
    }

    fn next_due(&self, now: Instant) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= now)
            .min_by_key(|(index, t)| (t.deadline, *index))
            .map(|(index, _)| index)
    }

    fn schedule(&mut self, deadline: Instant, action: TimerAction) {
        self.timers.push(Timer { deadline, action });
    }

    fn run_timer(&mut self, action: TimerAction, now: Instant) {
        match action {
            TimerAction::Advance => {
                self.advance(now);
            }
            TimerAction::FlashEnd(origin) => origin.with(|control| control.on_flash_end()),
            TimerAction::RevertGlyph(origin) => origin.with(|control| control.on_ready()),
            TimerAction::Watchdog(request_id) => {
                let is_active = self
                    .active
                    .as_ref()
                    .is_some_and(|a| a.request.id == request_id);
                if is_active {
                    self.finish(Outcome::Failed("timed out".into()), now);
                }
            }
            TimerAction::RetryVoices => {
                if self.voice.is_none() {
                    self.refresh_voices();
                }
            }
        }
    }

    fn finish(&mut self, outcome: Outcome, now: Instant) {
        let Some(active) = self.active.take() else {
            return;
        };
        let request = active.request;
        self.stats
            .utterance_time
            .record(now.saturating_duration_since(active.activated_at));
        self.timers
            .retain(|t| !matches!(t.action, TimerAction::Watchdog(id) if id == request.id));

        match outcome {
            Outcome::Completed => {
                debug!("Finished request {}", request.id);
                self.stats.completed += 1;
                request.origin.with(|control| control.on_end());
                self.events.push(SpeechEvent::Completed {
                    request_id: request.id,
                });
            }
            Outcome::Failed(reason) => {
                warn!("Speech synthesis error for '{}': {}", request.text, reason);
                self.stats.failed += 1;
                request.origin.with(|control| control.on_error());
                if request.origin.is_live() {
                    self.schedule(
                        now + self.config.error_glyph_duration,
                        TimerAction::RevertGlyph(request.origin.clone()),
                    );
                }
                self.events.push(SpeechEvent::Failed {
                    request_id: request.id,
                    reason,
                });
            }
        }

        self.schedule(now + self.config.settle_delay, TimerAction::Advance);
    }

    fn utterance_for(&self, request: &SpeechRequest) -> Utterance {
        let (lang, voice) = match &self.voice {
            Some(voice) => (voice.lang.clone(), Some(voice.name.clone())),
            None => (self.config.language.clone(), None),
        };
        Utterance {
            request_id: request.id,
            text: request.text.clone(),
            lang,
            voice,
            profile: VoiceProfile::for_kind(request.kind),
        }
    }
}

/// Time until `deadline`, zero if it already passed
pub(crate) fn until(deadline: Instant, now: Instant) -> Duration {
    deadline.saturating_duration_since(now)
}
