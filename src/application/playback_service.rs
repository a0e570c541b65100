// Playback service - Streams the rendered frame of every step in a range
use crate::application::plot_controller::{PlotController, RenderRequest};
use crate::application::store::PlotState;
use serde::Serialize;
use std::time::Instant;
use tokio::sync::mpsc;

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaybackMessage {
    Frame(RenderRequest),
    Complete { frames: usize, duration_ms: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackRequest {
    pub from: u32,
    pub to: u32,
    pub time_average: u32,
}

#[derive(Clone)]
pub struct PlaybackService {
    max_steps: usize,
}

impl PlaybackService {
    pub fn new(max_steps: usize) -> Self {
        Self { max_steps }
    }

    /// Walk the plot's available steps in `[from, to]` and send each frame
    /// that differs from the previous one. `plot` is a snapshot, so the
    /// stream is unaffected by later store changes.
    pub fn stream(
        &self,
        item_id: String,
        plot: PlotState,
        request: PlaybackRequest,
    ) -> mpsc::Receiver<PlaybackMessage> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        let steps: Vec<u32> = plot
            .available_time_steps
            .iter()
            .copied()
            .filter(|step| (request.from..=request.to).contains(step))
            .take(self.max_steps)
            .collect();

        tracing::debug!(
            "Playback of {} over {} steps ({}..={}, average {})",
            item_id,
            steps.len(),
            request.from,
            request.to,
            request.time_average
        );

        tokio::spawn(async move {
            let start_time = Instant::now();
            let mut controller = PlotController::new(item_id);
            controller.set_time_average(request.time_average);

            let mut sent = 0;
            for step in steps {
                if let Some(frame) = controller.render_step(step, &plot, false) {
                    if tx.send(PlaybackMessage::Frame(frame)).await.is_err() {
                        tracing::debug!("Playback receiver dropped at step {}", step);
                        return;
                    }
                    sent += 1;
                }
            }

            let complete = PlaybackMessage::Complete {
                frames: sent,
                duration_ms: start_time.elapsed().as_millis() as u64,
            };
            let _ = tx.send(complete).await;
        });

        rx
    }
}
