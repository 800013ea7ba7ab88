//! Speech worker with channel-based communication
//!
//! One worker thread owns the [`SpeechScheduler`]. Enqueue commands from any
//! number of [`SpeechHandle`]s and progress reports from the host engine are
//! multiplexed onto that thread, so every scheduler transition runs as a
//! single uninterrupted turn.

use super::control::ControlHandle;
use super::engine::SpeechEngine;
use super::scheduler::{until, SchedulerState, SpeechEvent, SpeechScheduler};
use crate::integration::config::SpeechConfig;
use crate::{Result, VokabelError};
use crossbeam_channel::{after, bounded, never, select, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Command sent to the speech worker
#[derive(Clone, Debug)]
pub enum SpeechCommand {
    /// Queue a single word at the tail
    SpeakWord { text: String, origin: ControlHandle },

    /// Queue a sentence at the head
    SpeakSentence { text: String, origin: ControlHandle },

    /// The host reported that its voice list changed
    RefreshVoices,

    /// Shutdown the worker
    Shutdown,
}

/// Snapshot of the scheduler published after every worker turn
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SchedulerStatus {
    pub active: bool,
    pub queue_len: usize,
    pub completed: u64,
    pub failed: u64,
    pub average_wait: Duration,
}

impl SchedulerStatus {
    fn capture(scheduler: &SpeechScheduler) -> Self {
        let stats = scheduler.stats();
        Self {
            active: scheduler.state() == SchedulerState::Active,
            queue_len: scheduler.queue_len(),
            completed: stats.completed,
            failed: stats.failed,
            average_wait: stats.queue_wait.average(),
        }
    }

    /// Requests that reached a terminal state
    pub fn finished(&self) -> u64 {
        self.completed + self.failed
    }

    pub fn is_idle(&self) -> bool {
        !self.active && self.queue_len == 0
    }
}

/// Cloneable entry point used by click handlers
///
/// All calls are fire-and-forget: playback failures are absorbed by the
/// scheduler. Only a dead worker is reported.
#[derive(Clone)]
pub struct SpeechHandle {
    command_tx: Sender<SpeechCommand>,
    status: Arc<Mutex<SchedulerStatus>>,
}

impl SpeechHandle {
    /// Queue a word for playback
    pub fn speak_word(&self, text: &str, origin: ControlHandle) -> Result<()> {
        self.send(SpeechCommand::SpeakWord {
            text: text.to_string(),
            origin,
        })
    }

    /// Queue a sentence for playback ahead of waiting words
    pub fn speak_sentence(&self, text: &str, origin: ControlHandle) -> Result<()> {
        self.send(SpeechCommand::SpeakSentence {
            text: text.to_string(),
            origin,
        })
    }

    /// Re-select the German voice
    pub fn refresh_voices(&self) -> Result<()> {
        self.send(SpeechCommand::RefreshVoices)
    }

    /// Ask the worker to stop
    pub fn shutdown(&self) -> Result<()> {
        self.send(SpeechCommand::Shutdown)
    }

    /// Latest scheduler snapshot
    pub fn status(&self) -> SchedulerStatus {
        self.status.lock().clone()
    }

    fn send(&self, cmd: SpeechCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|e| VokabelError::ChannelError(format!("Failed to send command: {}", e)))
    }
}

/// Speech pipeline owning the channels into and out of the worker
pub struct SpeechPipeline {
    /// Configuration
    config: SpeechConfig,

    /// Command sender
    command_tx: Sender<SpeechCommand>,

    /// Command receiver (for worker)
    command_rx: Receiver<SpeechCommand>,

    /// Event sender (for worker)
    event_tx: Sender<SpeechEvent>,

    /// Event receiver
    event_rx: Receiver<SpeechEvent>,

    status: Arc<Mutex<SchedulerStatus>>,
}

impl SpeechPipeline {
    /// Create a new speech pipeline
    pub fn new(config: SpeechConfig) -> Self {
        let (command_tx, command_rx) = bounded(config.queue_size.max(1));
        let (event_tx, event_rx) = bounded(config.queue_size.max(1));

        Self {
            config,
            command_tx,
            command_rx,
            event_tx,
            event_rx,
            status: Arc::new(Mutex::new(SchedulerStatus::default())),
        }
    }

    /// Get a handle for queueing playback
    pub fn handle(&self) -> SpeechHandle {
        SpeechHandle {
            command_tx: self.command_tx.clone(),
            status: Arc::clone(&self.status),
        }
    }

    /// Get a receiver for scheduler events
    ///
    /// Events are dropped rather than blocking the worker when nobody reads them.
    pub fn event_receiver(&self) -> Receiver<SpeechEvent> {
        self.event_rx.clone()
    }

    /// Start the worker thread driving `engine`
    ///
    /// The worker stops on [`SpeechCommand::Shutdown`] or once every handle
    /// has been dropped.
    pub fn start_worker(self, engine: Arc<dyn SpeechEngine>) -> Result<thread::JoinHandle<()>> {
        self.config.validate()?;

        let Self {
            config,
            command_rx,
            event_tx,
            status,
            ..
        } = self;

        let handle = thread::Builder::new()
            .name("speech-scheduler".into())
            .spawn(move || {
                info!("Speech worker starting");

                let mut scheduler = SpeechScheduler::new(config, engine);
                scheduler.schedule_voice_retry(Instant::now());
                let reports = scheduler.report_receiver();

                loop {
                    let timer = match scheduler.next_deadline() {
                        Some(deadline) => after(until(deadline, Instant::now())),
                        None => never(),
                    };

                    let running = select! {
                        recv(command_rx) -> cmd => match cmd {
                            Ok(SpeechCommand::SpeakWord { text, origin }) => {
                                scheduler.enqueue_word(&text, origin, Instant::now());
                                true
                            }
                            Ok(SpeechCommand::SpeakSentence { text, origin }) => {
                                scheduler.enqueue_sentence(&text, origin, Instant::now());
                                true
                            }
                            Ok(SpeechCommand::RefreshVoices) => {
                                scheduler.refresh_voices();
                                true
                            }
                            Ok(SpeechCommand::Shutdown) => {
                                info!("Speech worker shutting down");
                                false
                            }
                            Err(_) => {
                                debug!("All speech handles dropped");
                                false
                            }
                        },
                        recv(reports) -> report => match report {
                            Ok(report) => {
                                scheduler.handle_report(report, Instant::now());
                                true
                            }
                            Err(e) => {
                                error!("Engine report channel error: {}", e);
                                false
                            }
                        },
                        recv(timer) -> _ => true,
                    };
                    if !running {
                        break;
                    }

                    scheduler.fire_due_timers(Instant::now());

                    *status.lock() = SchedulerStatus::capture(&scheduler);
                    for event in scheduler.take_events() {
                        match event_tx.try_send(event) {
                            Ok(()) => {}
                            Err(TrySendError::Full(event)) => {
                                debug!("Event channel full, dropping {:?}", event);
                            }
                            Err(TrySendError::Disconnected(_)) => {}
                        }
                    }
                }

                info!("Speech worker stopped");
            })
            .map_err(|e| VokabelError::ChannelError(format!("Failed to spawn speech worker: {}", e)))?;

        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::engine::SimulatedEngine;

    #[test]
    fn test_pipeline_creation() {
        let pipeline = SpeechPipeline::new(SpeechConfig::default());
        let handle = pipeline.handle();
        let _event_rx = pipeline.event_receiver();

        assert_eq!(handle.status(), SchedulerStatus::default());
        assert!(handle.status().is_idle());
    }

    #[test]
    fn test_invalid_config_refuses_to_start() {
        let pipeline = SpeechPipeline::new(SpeechConfig::default().with_language(""));
        let result = pipeline.start_worker(Arc::new(SimulatedEngine::default()));
        assert!(matches!(result, Err(VokabelError::ConfigError(_))));
    }

    #[test]
    fn test_send_after_worker_exit_fails() {
        let pipeline = SpeechPipeline::new(SpeechConfig::default());
        let handle = pipeline.handle();
        let worker = pipeline
            .start_worker(Arc::new(SimulatedEngine::default()))
            .unwrap();

        handle.shutdown().unwrap();
        worker.join().unwrap();

        let result = handle.speak_word("Haus", ControlHandle::none());
        assert!(matches!(result, Err(VokabelError::ChannelError(_))));
    }

    #[test]
    fn test_worker_exits_when_handles_dropped() {
        let pipeline = SpeechPipeline::new(SpeechConfig::default());
        let handle = pipeline.handle();
        let worker = pipeline
            .start_worker(Arc::new(SimulatedEngine::default()))
            .unwrap();

        drop(handle);
        worker.join().unwrap();
    }

    #[test]
    fn test_status_helpers() {
        let status = SchedulerStatus {
            active: false,
            queue_len: 0,
            completed: 3,
            failed: 1,
            average_wait: Duration::ZERO,
        };
        assert_eq!(status.finished(), 4);
        assert!(status.is_idle());
    }
}
