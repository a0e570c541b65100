// Girder repository implementation
use crate::application::data_repository::{
    DataRepository, DataServiceError, DataServiceResult, TimeStepIndex,
};
use crate::domain::frame::DataFrame;
use crate::domain::view::{NewView, User, View};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

const TOKEN_HEADER: &str = "Girder-Token";

#[derive(Debug, Clone)]
pub struct GirderRepository {
    client: reqwest::Client,
    api_root: String,
    data_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GirderResource {
    #[serde(rename = "_id")]
    id: String,
}

impl GirderRepository {
    pub fn new(api_root: String, data_url: String, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_root: api_root.trim_end_matches('/').to_string(),
            data_url: data_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_root, path)
    }

    fn data_path(&self, item_id: &str) -> String {
        format!(
            "{}/variables/{}/timesteps",
            self.data_url,
            urlencoding::encode(item_id)
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header(TOKEN_HEADER, token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> DataServiceResult<reqwest::Response> {
        let response = self
            .authorize(request)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DataServiceError::Status { status, body });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> DataServiceResult<T> {
        tracing::debug!("GET {}", url);
        let response = self.send(self.client.get(url)).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl DataRepository for GirderRepository {
    async fn current_user(&self) -> DataServiceResult<Option<User>> {
        // Girder answers null for anonymous sessions
        self.get_json(&self.api_url("/user/me")).await
    }

    async fn find_root_folder(&self, collection: &str) -> DataServiceResult<String> {
        let url = self.api_url(&format!(
            "/collection?text={}",
            urlencoding::encode(collection)
        ));
        let collections: Vec<GirderResource> = self.get_json(&url).await?;
        let collection_id = collections
            .into_iter()
            .next()
            .ok_or_else(|| DataServiceError::NotFound(format!("collection {}", collection)))?
            .id;

        // The collection holds a single folder with all simulation data
        let url = self.api_url(&format!(
            "/folder?parentType=collection&parentId={}",
            urlencoding::encode(&collection_id)
        ));
        let folders: Vec<GirderResource> = self.get_json(&url).await?;
        folders
            .into_iter()
            .next()
            .map(|folder| folder.id)
            .ok_or_else(|| DataServiceError::NotFound(format!("root folder of {}", collection)))
    }

    async fn fetch_time_steps(&self, item_id: &str) -> DataServiceResult<TimeStepIndex> {
        self.get_json(&self.data_path(item_id)).await
    }

    async fn fetch_frame(&self, item_id: &str, step: u32) -> DataServiceResult<DataFrame> {
        let url = format!("{}/{}/plot", self.data_path(item_id), step);
        self.get_json(&url).await
    }

    async fn list_views(&self) -> DataServiceResult<Vec<View>> {
        self.get_json(&self.api_url("/view?limit=0")).await
    }

    async fn create_view(&self, view: &NewView) -> DataServiceResult<View> {
        let items = serde_json::to_string(&view.items)?;
        let mut form = vec![
            ("name", view.name.clone()),
            ("items", items),
            ("columns", view.columns.to_string()),
            ("rows", view.rows.to_string()),
            ("step", view.step.to_string()),
            ("public", view.public.to_string()),
        ];
        if let Some(run_id) = &view.run_id {
            form.push(("runId", run_id.clone()));
        }
        if let Some(simulation) = &view.simulation {
            form.push(("simulation", simulation.clone()));
        }
        let response = self
            .send(self.client.post(self.api_url("/view")).form(&form))
            .await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn set_view_public(&self, view_id: &str, public: bool) -> DataServiceResult<()> {
        let url = self.api_url(&format!("/view/{}", urlencoding::encode(view_id)));
        let form = [("public", public.to_string())];
        self.send(self.client.put(url).form(&form)).await?;
        Ok(())
    }

    async fn delete_view(&self, view_id: &str) -> DataServiceResult<()> {
        let url = self.api_url(&format!("/view/{}", urlencoding::encode(view_id)));
        self.send(self.client.delete(url)).await?;
        Ok(())
    }
}
