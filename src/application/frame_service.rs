// Frame service - Use case for pulling plot time steps and frames
use crate::application::data_repository::{DataRepository, DataServiceResult, TimeStepIndex};
use crate::domain::frame::DataFrame;
use futures::future::join_all;
use std::sync::Arc;

#[derive(Clone)]
pub struct FrameService {
    repository: Arc<dyn DataRepository>,
}

impl FrameService {
    pub fn new(repository: Arc<dyn DataRepository>) -> Self {
        Self { repository }
    }

    pub async fn load_index(&self, item_id: &str) -> DataServiceResult<TimeStepIndex> {
        let index = self.repository.fetch_time_steps(item_id).await?;
        tracing::debug!("Plot {} has {} time steps", item_id, index.steps.len());
        Ok(index)
    }

    /// Fetch frames for `steps` concurrently. Failed steps are logged and
    /// left out; the plot falls back to older frames for them.
    pub async fn load_frames(&self, item_id: &str, steps: &[u32]) -> Vec<DataFrame> {
        let requests = steps
            .iter()
            .map(|&step| async move { (step, self.repository.fetch_frame(item_id, step).await) });

        let mut frames = Vec::with_capacity(steps.len());
        for (step, result) in join_all(requests).await {
            match result {
                Ok(mut frame) => {
                    frame.timestep = step;
                    frames.push(frame);
                }
                Err(e) => {
                    tracing::warn!("Error fetching plot {} step {}: {}", item_id, step, e);
                }
            }
        }
        frames
    }
}
