// Route table for the dashboard API
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::*;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/state", get(get_state))
        .route("/timestep", post(set_time_step))
        .route("/timestep/forward", post(step_forward))
        .route("/timestep/back", post(step_back))
        .route("/timestep/min", put(set_min_time_step))
        .route("/ui/:toggle", post(toggle_ui))
        .route("/ui/dialogs/:dialog", put(set_dialog))
        .route("/layout", put(set_layout))
        .route("/run", put(set_run))
        .route("/cells/:cell", put(set_cell))
        .route("/plots/:id", delete(remove_plot))
        .route("/plots/:id/details", post(update_details))
        .route("/plots/:id/load", post(load_plot))
        .route("/plots/:id/frame", get(get_frame))
        .route("/plots/:id/average", post(set_average))
        .route("/plots/:id/relayout", post(relayout))
        .route("/plots/:id/click", post(click))
        .route("/plots/:id/doubleclick", post(double_click))
        .route("/plots/:id/toggle/:preference", post(toggle_plot))
        .route("/plots/:id/range", put(set_range))
        .route("/plots/:id/playback", get(playback))
        .route("/views", get(list_views).post(save_view))
        .route("/views/:id/public", put(toggle_view_public))
        .route("/views/:id", delete(delete_view))
        .route("/views/:id/load", post(load_view))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
