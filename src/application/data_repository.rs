// Repository trait for the data-management service
use crate::domain::frame::DataFrame;
use crate::domain::view::{NewView, User, View};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum DataServiceError {
    #[error("Request to data service failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Data service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode data service response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type DataServiceResult<T> = Result<T, DataServiceError>;

/// Time steps a plot variable has data for, and the simulation time of each.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TimeStepIndex {
    pub steps: Vec<u32>,
    #[serde(default)]
    pub times: Vec<f64>,
}

#[async_trait]
pub trait DataRepository: Send + Sync {
    /// The user the session token belongs to
    async fn current_user(&self) -> DataServiceResult<Option<User>>;

    /// Id of the single top-level data folder inside the named collection
    async fn find_root_folder(&self, collection: &str) -> DataServiceResult<String>;

    async fn fetch_time_steps(&self, item_id: &str) -> DataServiceResult<TimeStepIndex>;

    async fn fetch_frame(&self, item_id: &str, step: u32) -> DataServiceResult<DataFrame>;

    async fn list_views(&self) -> DataServiceResult<Vec<View>>;

    async fn create_view(&self, view: &NewView) -> DataServiceResult<View>;

    async fn set_view_public(&self, view_id: &str, public: bool) -> DataServiceResult<()>;

    async fn delete_view(&self, view_id: &str) -> DataServiceResult<()>;
}
