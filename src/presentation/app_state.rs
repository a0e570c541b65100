// Application state for HTTP handlers
use crate::application::frame_service::FrameService;
use crate::application::playback_service::PlaybackService;
use crate::application::session::DashboardSession;
use crate::application::view_service::ViewService;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    /// The single writer of dashboard state
    pub session: Arc<Mutex<DashboardSession>>,
    pub frame_service: FrameService,
    pub view_service: ViewService,
    pub playback_service: PlaybackService,
}
