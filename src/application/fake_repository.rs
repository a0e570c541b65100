// In-memory data repository used by the service tests
use crate::application::data_repository::{
    DataRepository, DataServiceError, DataServiceResult, TimeStepIndex,
};
use crate::domain::frame::{DataFrame, Layout, Trace};
use crate::domain::view::{NewView, User, View};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeRepository {
    pub user: Option<User>,
    pub indexes: HashMap<String, TimeStepIndex>,
    pub frames: HashMap<(String, u32), DataFrame>,
    pub views: Mutex<Vec<View>>,
    pub failing_steps: HashSet<u32>,
    pub fail_views: bool,
}

pub fn frame(step: u32, y: Vec<f64>) -> DataFrame {
    let x = (0..y.len()).map(|i| i as f64).collect();
    DataFrame::new(step, vec![Trace::new(x, y)], Layout::default())
}

pub fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        login: id.to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
    }
}

pub fn view(id: &str, creator: &str, public: bool) -> View {
    View {
        id: id.to_string(),
        name: format!("view {}", id),
        creator_id: creator.to_string(),
        creator_first: "Test".to_string(),
        creator_last: "User".to_string(),
        created: Utc::now(),
        public,
        items: Default::default(),
        columns: 1,
        rows: 1,
        step: 1,
        run_id: None,
        simulation: None,
    }
}

impl FakeRepository {
    /// A plot whose frame at step `s` has y = [s, 2s].
    pub fn with_plot(mut self, item_id: &str, steps: &[u32]) -> Self {
        self.indexes.insert(
            item_id.to_string(),
            TimeStepIndex {
                steps: steps.to_vec(),
                times: steps.iter().map(|&s| s as f64 * 0.5).collect(),
            },
        );
        for &step in steps {
            self.frames.insert(
                (item_id.to_string(), step),
                frame(step, vec![step as f64, 2.0 * step as f64]),
            );
        }
        self
    }

    fn view_failure(&self) -> DataServiceResult<()> {
        if self.fail_views {
            return Err(DataServiceError::Status {
                status: 500,
                body: "boom".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DataRepository for FakeRepository {
    async fn current_user(&self) -> DataServiceResult<Option<User>> {
        Ok(self.user.clone())
    }

    async fn find_root_folder(&self, collection: &str) -> DataServiceResult<String> {
        Ok(format!("{}-root", collection))
    }

    async fn fetch_time_steps(&self, item_id: &str) -> DataServiceResult<TimeStepIndex> {
        self.indexes
            .get(item_id)
            .cloned()
            .ok_or_else(|| DataServiceError::NotFound(item_id.to_string()))
    }

    async fn fetch_frame(&self, item_id: &str, step: u32) -> DataServiceResult<DataFrame> {
        if self.failing_steps.contains(&step) {
            return Err(DataServiceError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        self.frames
            .get(&(item_id.to_string(), step))
            .cloned()
            .ok_or_else(|| DataServiceError::NotFound(format!("{}@{}", item_id, step)))
    }

    async fn list_views(&self) -> DataServiceResult<Vec<View>> {
        self.view_failure()?;
        Ok(self.views.lock().unwrap().clone())
    }

    async fn create_view(&self, new_view: &NewView) -> DataServiceResult<View> {
        self.view_failure()?;
        let mut views = self.views.lock().unwrap();
        let creator = self.user.as_ref().map(|u| u.id.as_str()).unwrap_or("");
        let mut created = view(&format!("v{}", views.len() + 1), creator, new_view.public);
        created.name = new_view.name.clone();
        created.items = new_view.items.clone();
        created.columns = new_view.columns;
        created.rows = new_view.rows;
        created.step = new_view.step;
        created.run_id = new_view.run_id.clone();
        created.simulation = new_view.simulation.clone();
        views.push(created.clone());
        Ok(created)
    }

    async fn set_view_public(&self, view_id: &str, public: bool) -> DataServiceResult<()> {
        self.view_failure()?;
        let mut views = self.views.lock().unwrap();
        let view = views
            .iter_mut()
            .find(|v| v.id == view_id)
            .ok_or_else(|| DataServiceError::NotFound(view_id.to_string()))?;
        view.public = public;
        Ok(())
    }

    async fn delete_view(&self, view_id: &str) -> DataServiceResult<()> {
        self.view_failure()?;
        self.views.lock().unwrap().retain(|v| v.id != view_id);
        Ok(())
    }
}
