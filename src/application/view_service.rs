// View service - Use case for saved dashboard views
//
// Failures on the data service are logged and the operation becomes a
// no-op; callers only learn whether it went through.
use crate::application::data_repository::DataRepository;
use crate::domain::view::{NewView, User, View};
use std::sync::Arc;

#[derive(Clone)]
pub struct ViewService {
    repository: Arc<dyn DataRepository>,
}

impl ViewService {
    pub fn new(repository: Arc<dyn DataRepository>) -> Self {
        Self { repository }
    }

    /// Public views plus the user's own, oldest first.
    pub async fn fetch_all_available(&self, user: Option<&User>) -> Vec<View> {
        match self.repository.list_views().await {
            Ok(views) => {
                let mut visible: Vec<View> = views
                    .into_iter()
                    .filter(|view| view.is_visible_to(user))
                    .collect();
                visible.sort_by_key(|view| view.created);
                visible
            }
            Err(e) => {
                tracing::error!("Error fetching views: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn save(&self, view: &NewView) -> Option<View> {
        match self.repository.create_view(view).await {
            Ok(saved) => {
                tracing::info!("Saved view {} ({})", saved.name, saved.id);
                Some(saved)
            }
            Err(e) => {
                tracing::error!("Error saving view {}: {}", view.name, e);
                None
            }
        }
    }

    /// Flip a view between public and private.
    pub async fn toggle_public(&self, view: &View) -> bool {
        match self.repository.set_view_public(&view.id, !view.public).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Error updating view {}: {}", view.id, e);
                false
            }
        }
    }

    pub async fn delete(&self, view_id: &str) -> bool {
        match self.repository.delete_view(view_id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Error deleting view {}: {}", view_id, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fake_repository::{user, view, FakeRepository};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    fn repo_with_views() -> FakeRepository {
        FakeRepository {
            user: Some(user("me")),
            views: Mutex::new(vec![
                view("mine-private", "me", false),
                view("theirs-private", "them", false),
                view("theirs-public", "them", true),
            ]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_only_visible_views_are_listed() {
        let service = ViewService::new(Arc::new(repo_with_views()));
        let me = user("me");

        let ids: Vec<String> = service
            .fetch_all_available(Some(&me))
            .await
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"mine-private".to_string()));
        assert!(ids.contains(&"theirs-public".to_string()));
    }

    #[tokio::test]
    async fn test_failures_are_no_ops() {
        let mut repo = repo_with_views();
        repo.fail_views = true;
        let service = ViewService::new(Arc::new(repo));
        let target = view("mine-private", "me", false);

        assert!(service.fetch_all_available(None).await.is_empty());
        assert!(!service.delete("mine-private").await);
        assert!(!service.toggle_public(&target).await);
        let new_view = NewView {
            name: "n".to_string(),
            items: BTreeMap::new(),
            columns: 1,
            rows: 1,
            step: 1,
            public: false,
            run_id: None,
            simulation: None,
        };
        assert!(service.save(&new_view).await.is_none());
    }

    #[tokio::test]
    async fn test_toggle_and_delete() {
        let repo = Arc::new(repo_with_views());
        let service = ViewService::new(repo.clone());
        let target = view("mine-private", "me", false);

        assert!(service.toggle_public(&target).await);
        assert!(repo.views.lock().unwrap()[0].public);

        assert!(service.delete("mine-private").await);
        assert_eq!(repo.views.lock().unwrap().len(), 2);
    }
}
