// Application layer - Use cases and dashboard state
pub mod data_repository;
pub mod frame_service;
pub mod playback_service;
pub mod plot_controller;
pub mod session;
pub mod store;
pub mod view_service;

#[cfg(test)]
pub mod fake_repository;
