// HTTP request handlers
use crate::application::playback_service::PlaybackRequest;
use crate::application::plot_controller::RenderRequest;
use crate::application::session::DashboardSession;
use crate::domain::view::View;
use crate::domain::zoom::RelayoutEvent;
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Deserialize)]
pub struct TimeStepBody {
    pub step: u32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct TimeStepResponse {
    pub current_time_step: u32,
    pub gallery_paused: bool,
}

#[derive(Deserialize)]
pub struct MinTimeStepBody {
    pub min: u32,
}

#[derive(Deserialize)]
pub struct VisibleBody {
    pub visible: bool,
}

#[derive(Deserialize)]
pub struct LayoutBody {
    pub columns: u32,
    pub rows: u32,
}

#[derive(Deserialize)]
pub struct RunBody {
    pub run_id: Option<String>,
    pub simulation: Option<String>,
}

#[derive(Deserialize)]
pub struct CellBody {
    pub item_id: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct FrameQuery {
    pub force: Option<bool>,
}

#[derive(Deserialize)]
pub struct AverageBody {
    pub time_average: u32,
}

#[derive(Deserialize, Default)]
pub struct LoadPlotBody {
    /// Steps to fetch; all available steps when absent
    pub steps: Option<Vec<u32>>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct LoadPlotResponse {
    pub available_time_steps: Vec<u32>,
    pub loaded_time_steps: Vec<u32>,
}

#[derive(Deserialize)]
pub struct ClickBody {
    /// Clicked x position in milliseconds
    pub x: f64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct ClickResponse {
    pub selected_time_step: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct DoubleClickResponse {
    pub zoom_reset: bool,
}

#[derive(Deserialize)]
pub struct RangeBody {
    pub range: Option<[f64; 2]>,
}

#[derive(Deserialize, Default)]
pub struct PlaybackQuery {
    pub from: Option<u32>,
    pub to: Option<u32>,
    pub average: Option<u32>,
}

#[derive(Deserialize)]
pub struct SaveViewBody {
    pub name: String,
    #[serde(default)]
    pub public: bool,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct ViewUpdateResponse {
    pub updated: bool,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Snapshot of UI and view state
pub async fn get_state(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.session.lock().await.snapshot();
    into_response(json_response(&snapshot, accepts_brotli(&headers)).await)
}

pub async fn set_time_step(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TimeStepBody>,
) -> Json<TimeStepResponse> {
    let mut session = state.session.lock().await;
    session.store_mut().set_time_step(body.step);
    Json(time_step_response(&session))
}

pub async fn step_forward(State(state): State<Arc<AppState>>) -> Json<TimeStepResponse> {
    let mut session = state.session.lock().await;
    session.store_mut().step_forward();
    Json(time_step_response(&session))
}

pub async fn step_back(State(state): State<Arc<AppState>>) -> Json<TimeStepResponse> {
    let mut session = state.session.lock().await;
    session.store_mut().step_back();
    Json(time_step_response(&session))
}

fn time_step_response(session: &DashboardSession) -> TimeStepResponse {
    TimeStepResponse {
        current_time_step: session.store().view().current_time_step,
        gallery_paused: session.store().ui().gallery_paused,
    }
}

/// Flip one of the dashboard-wide UI switches
pub async fn toggle_ui(Path(toggle): Path<String>, State(state): State<Arc<AppState>>) -> StatusCode {
    let mut session = state.session.lock().await;
    let store = session.store_mut();
    match toggle.as_str() {
        "play-pause" => store.toggle_play_pause(),
        "zoom-sync" => store.toggle_zoom_sync(),
        "time-step-selector" => store.toggle_time_step_selector(),
        _ => return StatusCode::NOT_FOUND,
    }
    StatusCode::NO_CONTENT
}

pub async fn set_dialog(
    Path(dialog): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<VisibleBody>,
) -> StatusCode {
    let mut session = state.session.lock().await;
    let store = session.store_mut();
    match dialog.as_str() {
        "load" => store.set_load_dialog_visible(body.visible),
        "save" => store.set_save_dialog_visible(body.visible),
        "auto-save" => store.set_auto_save_dialog(body.visible),
        _ => return StatusCode::NOT_FOUND,
    }
    StatusCode::NO_CONTENT
}

pub async fn set_min_time_step(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MinTimeStepBody>,
) -> Json<TimeStepResponse> {
    let mut session = state.session.lock().await;
    session.store_mut().min_time_step_changed(body.min);
    Json(time_step_response(&session))
}

pub async fn set_layout(State(state): State<Arc<AppState>>, Json(body): Json<LayoutBody>) -> StatusCode {
    state
        .session
        .lock()
        .await
        .store_mut()
        .set_layout(body.columns, body.rows);
    StatusCode::NO_CONTENT
}

pub async fn set_run(State(state): State<Arc<AppState>>, Json(body): Json<RunBody>) -> StatusCode {
    state
        .session
        .lock()
        .await
        .store_mut()
        .set_run(body.run_id, body.simulation);
    StatusCode::NO_CONTENT
}

/// Assign a plot to a grid cell, or clear the cell
pub async fn set_cell(
    Path(cell): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CellBody>,
) -> StatusCode {
    state.session.lock().await.assign_cell(&cell, body.item_id);
    StatusCode::NO_CONTENT
}

pub async fn remove_plot(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> StatusCode {
    let mut session = state.session.lock().await;
    if session.store().plot(&id).is_none() {
        return StatusCode::NOT_FOUND;
    }
    session.remove_plot(&id);
    StatusCode::NO_CONTENT
}

pub async fn update_details(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(details): Json<serde_json::Map<String, serde_json::Value>>,
) -> StatusCode {
    state
        .session
        .lock()
        .await
        .store_mut()
        .plot_details_updated(&id, details);
    StatusCode::NO_CONTENT
}

/// Fetch a plot's time steps and frames from the data service
pub async fn load_plot(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    body: Option<Json<LoadPlotBody>>,
) -> Response {
    let index = match state.frame_service.load_index(&id).await {
        Ok(index) => index,
        Err(e) => {
            tracing::error!("Error fetching time steps for {}: {}", id, e);
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };

    let steps = body
        .and_then(|Json(body)| body.steps)
        .unwrap_or_else(|| index.steps.clone());
    let frames = state.frame_service.load_frames(&id, &steps).await;

    let mut session = state.session.lock().await;
    let store = session.store_mut();
    store.set_available_time_steps(&id, index.steps);
    store.set_times(&id, index.times);
    store.insert_frames(&id, frames);

    let plot = store.plot(&id);
    Json(LoadPlotResponse {
        available_time_steps: plot
            .map(|p| p.available_time_steps.clone())
            .unwrap_or_default(),
        loaded_time_steps: plot.map(|p| p.loaded_steps()).unwrap_or_default(),
    })
    .into_response()
}

/// The frame the plot should show now; 204 when nothing changed
pub async fn get_frame(
    Path(id): Path<String>,
    Query(query): Query<FrameQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let request = state
        .session
        .lock()
        .await
        .react(&id, query.force.unwrap_or(false));
    render_response(request, &headers).await
}

pub async fn set_average(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(body): Json<AverageBody>,
) -> Response {
    let request = {
        let mut session = state.session.lock().await;
        session.set_time_average(&id, body.time_average);
        session.react(&id, false)
    };
    render_response(request, &headers).await
}

pub async fn relayout(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(event): Json<RelayoutEvent>,
) -> Response {
    let request = state.session.lock().await.relayout(&id, &event);
    render_response(request, &headers).await
}

pub async fn click(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ClickBody>,
) -> Json<ClickResponse> {
    let selected_time_step = state.session.lock().await.click(&id, body.x);
    Json(ClickResponse { selected_time_step })
}

pub async fn double_click(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Json<DoubleClickResponse> {
    let zoom_reset = state.session.lock().await.double_click(&id);
    Json(DoubleClickResponse { zoom_reset })
}

pub async fn toggle_plot(
    Path((id, preference)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> StatusCode {
    let mut session = state.session.lock().await;
    match preference.as_str() {
        "log-scaling" => session.store_mut().toggle_log_scaling(&id),
        "legend" => session.store_mut().toggle_legend_visibility(&id),
        _ => return StatusCode::NOT_FOUND,
    }
    StatusCode::NO_CONTENT
}

pub async fn set_range(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<RangeBody>,
) -> StatusCode {
    state
        .session
        .lock()
        .await
        .store_mut()
        .set_global_range(&id, body.range);
    StatusCode::NO_CONTENT
}

/// Stream the frames of a range of steps (progressive playback)
pub async fn playback(
    Path(id): Path<String>,
    Query(query): Query<PlaybackQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let (plot, request) = {
        let session = state.session.lock().await;
        let Some(plot) = session.store().plot(&id).cloned() else {
            return StatusCode::NOT_FOUND.into_response();
        };
        let view = session.store().view();
        let request = PlaybackRequest {
            from: query.from.unwrap_or(view.current_time_step),
            to: query.to.unwrap_or(view.max_time_step),
            time_average: query.average.unwrap_or_else(|| session.time_average(&id)),
        };
        (plot, request)
    };

    let rx = state.playback_service.stream(id, plot, request);
    stream_from_receiver(rx, accepts_brotli(&headers))
        .await
        .into_response()
}

/// List views visible to the current user
pub async fn list_views(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let views = refresh_views(&state).await;
    into_response(json_response(&views, accepts_brotli(&headers)).await)
}

/// Save the current grid as a named view
pub async fn save_view(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SaveViewBody>,
) -> Json<Option<View>> {
    let new_view = {
        let mut session = state.session.lock().await;
        session.store_mut().set_gallery_paused(true);
        session.new_view(body.name, body.public)
    };

    let saved = state.view_service.save(&new_view).await;
    if let Some(view) = &saved {
        state
            .session
            .lock()
            .await
            .store_mut()
            .set_last_saved(Some(view.name.clone()));
        refresh_views(&state).await;
    }
    Json(saved)
}

pub async fn toggle_view_public(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(view) = find_view(&state, &id).await else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let updated = state.view_service.toggle_public(&view).await;
    if updated {
        refresh_views(&state).await;
    }
    Json(ViewUpdateResponse { updated }).into_response()
}

pub async fn delete_view(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> Json<ViewUpdateResponse> {
    let updated = state.view_service.delete(&id).await;
    if updated {
        refresh_views(&state).await;
    }
    Json(ViewUpdateResponse { updated })
}

/// Apply a saved view to the dashboard
pub async fn load_view(Path(id): Path<String>, State(state): State<Arc<AppState>>) -> StatusCode {
    let Some(view) = find_view(&state, &id).await else {
        return StatusCode::NOT_FOUND;
    };
    let mut session = state.session.lock().await;
    let store = session.store_mut();
    store.apply_view(&view);
    store.set_load_dialog_visible(false);
    tracing::info!("Loaded view {} ({})", view.name, view.id);
    StatusCode::NO_CONTENT
}

/// Refetch the visible views and publish them to the store
async fn refresh_views(state: &AppState) -> Vec<View> {
    let user = state.session.lock().await.user().cloned();
    let views = state.view_service.fetch_all_available(user.as_ref()).await;

    let mut session = state.session.lock().await;
    let store = session.store_mut();
    store.set_views(views.clone());
    store.views_modified();
    views
}

/// Look a view up in the last fetched list, refetching once if missing
async fn find_view(state: &AppState, id: &str) -> Option<View> {
    let cached = {
        let session = state.session.lock().await;
        session
            .store()
            .view()
            .views
            .iter()
            .find(|v| v.id == id)
            .cloned()
    };
    match cached {
        Some(view) => Some(view),
        None => refresh_views(state).await.into_iter().find(|v| v.id == id),
    }
}

async fn render_response(request: Option<RenderRequest>, headers: &HeaderMap) -> Response {
    match request {
        Some(request) => into_response(json_response(&request, accepts_brotli(headers)).await),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

fn into_response(result: Result<Response, StatusCode>) -> Response {
    match result {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
