use anyhow::Result;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vokabel::integration::{AudioButtons, ClickOutcome, SpeechConfig};
use vokabel::speech::{AudioButton, SimulatedEngine, SpeechPipeline};

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vokabel=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Vokabel pronunciation demo");

    let mut items: Vec<String> = std::env::args().skip(1).collect();
    if items.is_empty() {
        items = vec![
            "Haus".into(),
            "Baum".into(),
            "Der Baum ist grün.".into(),
            "Tisch".into(),
        ];
    }

    let config = SpeechConfig::default();
    let pipeline = SpeechPipeline::new(config.clone());
    let speech = pipeline.handle();
    let worker = pipeline.start_worker(Arc::new(SimulatedEngine::default()))?;
    let buttons = AudioButtons::new(Some(speech.clone()), config);

    // Anything ending like a sentence goes through the sentence button
    let mut queued = 0;
    let mut controls = Vec::new();
    for item in &items {
        let button = AudioButton::new();
        let outcome = if item.ends_with(['.', '!', '?']) {
            buttons.sentence_clicked(item, &button)?
        } else {
            buttons.word_clicked(item, &button)?
        };
        if outcome == ClickOutcome::Queued {
            queued += 1;
        }
        controls.push(button);
    }

    while speech.status().finished() < queued {
        buttons.tick(Instant::now());
        thread::sleep(Duration::from_millis(20));
    }

    let status = speech.status();
    info!(
        "Played {} item(s), {} failed, average wait {:?}",
        status.completed, status.failed, status.average_wait
    );
    info!("Listening progress: {}", buttons.counts_json()?);

    speech.shutdown()?;
    if worker.join().is_err() {
        anyhow::bail!("Speech worker panicked");
    }

    Ok(())
}
