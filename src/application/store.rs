// Dashboard store - explicit state container with synchronous observers
use crate::domain::frame::{DataFrame, LoadedFrames};
use crate::domain::view::View;
use crate::domain::zoom::ZoomRange;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiState {
    pub auto_save_dialog: bool,
    pub gallery_paused: bool,
    pub show_load_dialog: bool,
    pub show_save_dialog: bool,
    pub time_step_selection: bool,
    pub zoom_sync: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            auto_save_dialog: false,
            gallery_paused: true,
            show_load_dialog: false,
            show_save_dialog: false,
            time_step_selection: false,
            zoom_sync: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub current_time_step: u32,
    pub min_time_step: u32,
    pub max_time_step: u32,
    pub columns: u32,
    pub rows: u32,
    /// Grid cell -> plot item id
    pub items: BTreeMap<String, String>,
    pub run_id: Option<String>,
    pub simulation: Option<String>,
    pub num_ready: u64,
    pub loaded_from_view: bool,
    pub initial_load: bool,
    pub last_saved: Option<String>,
    pub views: Vec<View>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            current_time_step: 1,
            min_time_step: 1,
            max_time_step: 0,
            columns: 1,
            rows: 1,
            items: BTreeMap::new(),
            run_id: None,
            simulation: None,
            num_ready: 0,
            loaded_from_view: false,
            initial_load: true,
            last_saved: None,
            views: Vec::new(),
        }
    }
}

/// Everything the dashboard keeps for a single plot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlotState {
    pub available_time_steps: Vec<u32>,
    #[serde(skip)]
    pub loaded: LoadedFrames,
    pub times: Vec<f64>,
    pub x_axis: Option<String>,
    pub zoom: Option<ZoomRange>,
    pub log_scaling: bool,
    pub legend_visibility: bool,
    pub global_range: Option<[f64; 2]>,
    pub details: Map<String, Value>,
}

impl PlotState {
    pub fn loaded_steps(&self) -> Vec<u32> {
        self.loaded.keys().copied().collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    TimeStepChanged(u32),
    GalleryPausedChanged(bool),
    ZoomSyncChanged(bool),
    TimeStepSelectorChanged(bool),
    LayoutChanged { columns: u32, rows: u32 },
    PlotTimeStepsChanged { item_id: String },
    PlotFramesLoaded { item_id: String },
    PlotZoomChanged { item_id: String },
    PlotLogScalingChanged { item_id: String },
    PlotLegendChanged { item_id: String },
    PlotRangeChanged { item_id: String },
    ViewsModified,
    ViewApplied { view_id: String },
}

impl StoreEvent {
    /// Display preference changes force a redraw of the named plot even
    /// when its time step did not move.
    pub fn display_preference_of(&self) -> Option<&str> {
        match self {
            StoreEvent::PlotZoomChanged { item_id }
            | StoreEvent::PlotLogScalingChanged { item_id }
            | StoreEvent::PlotLegendChanged { item_id }
            | StoreEvent::PlotRangeChanged { item_id } => Some(item_id),
            _ => None,
        }
    }

    /// The plot whose time steps or loaded frames changed.
    pub fn frames_changed_of(&self) -> Option<&str> {
        match self {
            StoreEvent::PlotTimeStepsChanged { item_id }
            | StoreEvent::PlotFramesLoaded { item_id } => Some(item_id),
            _ => None,
        }
    }
}

pub type Subscriber = Box<dyn Fn(&StoreEvent) + Send + Sync>;

#[derive(Default)]
pub struct DashboardStore {
    ui: UiState,
    view: ViewState,
    plots: HashMap<String, PlotState>,
    subscribers: Vec<Subscriber>,
}

impl DashboardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. Events are delivered synchronously, in
    /// subscription order, after the state change is applied.
    pub fn subscribe(&mut self, subscriber: Subscriber) {
        self.subscribers.push(subscriber);
    }

    fn emit(&self, event: StoreEvent) {
        for subscriber in &self.subscribers {
            subscriber(&event);
        }
    }

    // --- accessors ---

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn plot(&self, item_id: &str) -> Option<&PlotState> {
        self.plots.get(item_id)
    }

    pub fn plot_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.plots.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn plot_mut(&mut self, item_id: &str) -> &mut PlotState {
        self.plots.entry(item_id.to_string()).or_default()
    }

    // --- UI state ---

    pub fn set_gallery_paused(&mut self, paused: bool) {
        if self.ui.gallery_paused != paused {
            self.ui.gallery_paused = paused;
            self.emit(StoreEvent::GalleryPausedChanged(paused));
        }
    }

    pub fn toggle_play_pause(&mut self) {
        self.set_gallery_paused(!self.ui.gallery_paused);
    }

    pub fn toggle_zoom_sync(&mut self) {
        self.ui.zoom_sync = !self.ui.zoom_sync;
        self.emit(StoreEvent::ZoomSyncChanged(self.ui.zoom_sync));
    }

    pub fn toggle_time_step_selector(&mut self) {
        self.ui.time_step_selection = !self.ui.time_step_selection;
        self.emit(StoreEvent::TimeStepSelectorChanged(self.ui.time_step_selection));
    }

    pub fn set_load_dialog_visible(&mut self, visible: bool) {
        self.ui.show_load_dialog = visible;
    }

    pub fn set_save_dialog_visible(&mut self, visible: bool) {
        self.ui.show_save_dialog = visible;
    }

    pub fn set_auto_save_dialog(&mut self, visible: bool) {
        self.ui.auto_save_dialog = visible;
    }

    // --- view state ---

    pub fn set_time_step(&mut self, step: u32) {
        if self.view.current_time_step != step {
            self.view.current_time_step = step;
            self.emit(StoreEvent::TimeStepChanged(step));
        }
    }

    /// Raise the minimum, pulling the current step up with it.
    pub fn min_time_step_changed(&mut self, min: u32) {
        self.view.min_time_step = min;
        let step = self.view.current_time_step.max(min);
        self.set_time_step(step);
    }

    /// Advance one step. Running past the maximum pauses autoplay.
    pub fn step_forward(&mut self) -> u32 {
        match self.view.current_time_step.checked_add(1) {
            Some(next) if next <= self.view.max_time_step => self.set_time_step(next),
            _ => self.set_gallery_paused(true),
        }
        self.view.current_time_step
    }

    pub fn step_back(&mut self) -> u32 {
        let prev = self
            .view
            .current_time_step
            .saturating_sub(1)
            .max(self.view.min_time_step);
        self.set_time_step(prev);
        self.view.current_time_step
    }

    pub fn set_layout(&mut self, columns: u32, rows: u32) {
        let columns = columns.max(1);
        let rows = rows.max(1);
        if (self.view.columns, self.view.rows) != (columns, rows) {
            self.view.columns = columns;
            self.view.rows = rows;
            self.emit(StoreEvent::LayoutChanged { columns, rows });
        }
    }

    pub fn set_item(&mut self, cell: &str, item_id: Option<String>) {
        match item_id {
            Some(id) => self.view.items.insert(cell.to_string(), id),
            None => self.view.items.remove(cell),
        };
    }

    pub fn set_run(&mut self, run_id: Option<String>, simulation: Option<String>) {
        self.view.run_id = run_id;
        self.view.simulation = simulation;
    }

    pub fn increment_ready(&mut self) {
        self.view.num_ready += 1;
    }

    pub fn set_initial_load(&mut self, initial: bool) {
        self.view.initial_load = initial;
    }

    pub fn set_last_saved(&mut self, name: Option<String>) {
        self.view.last_saved = name;
    }

    pub fn set_views(&mut self, views: Vec<View>) {
        self.view.views = views;
    }

    /// Views were created, deleted or changed on the data service.
    pub fn views_modified(&mut self) {
        self.emit(StoreEvent::ViewsModified);
    }

    /// Replace the grid and time step with those of a saved view.
    pub fn apply_view(&mut self, view: &View) {
        self.view.items = view.items.clone();
        self.view.loaded_from_view = true;
        self.view.initial_load = false;
        self.set_run(view.run_id.clone(), view.simulation.clone());
        self.set_layout(view.columns, view.rows);
        self.set_time_step(view.step.max(self.view.min_time_step));
        self.emit(StoreEvent::ViewApplied {
            view_id: view.id.clone(),
        });
    }

    // --- per-plot state ---

    /// Stores the steps sorted and de-duplicated.
    pub fn set_available_time_steps(&mut self, item_id: &str, mut steps: Vec<u32>) {
        steps.sort_unstable();
        steps.dedup();
        if let Some(&last) = steps.last() {
            if last > self.view.max_time_step {
                self.view.max_time_step = last;
            }
        }
        self.plot_mut(item_id).available_time_steps = steps;
        self.emit(StoreEvent::PlotTimeStepsChanged {
            item_id: item_id.to_string(),
        });
    }

    pub fn set_times(&mut self, item_id: &str, times: Vec<f64>) {
        self.plot_mut(item_id).times = times;
    }

    pub fn insert_frames(&mut self, item_id: &str, frames: impl IntoIterator<Item = DataFrame>) {
        let plot = self.plot_mut(item_id);
        let before = plot.loaded.len();
        for frame in frames {
            plot.loaded.insert(frame.timestep, frame);
        }
        tracing::debug!(
            "Plot {} holds {} frames ({} before)",
            item_id,
            plot.loaded.len(),
            before
        );
        self.emit(StoreEvent::PlotFramesLoaded {
            item_id: item_id.to_string(),
        });
    }

    pub fn set_x_axis(&mut self, item_id: &str, title: String) {
        self.plot_mut(item_id).x_axis = Some(title);
    }

    /// Set or clear a plot's zoom. With zoom sync on, every plot sharing
    /// the same x-axis follows.
    pub fn update_plot_zoom(&mut self, item_id: &str, zoom: Option<ZoomRange>) {
        let mut targets = vec![item_id.to_string()];
        if self.ui.zoom_sync {
            if let Some(axis) = self.plot(item_id).and_then(|p| p.x_axis.clone()) {
                targets.extend(
                    self.plots
                        .iter()
                        .filter(|(id, p)| id.as_str() != item_id && p.x_axis.as_ref() == Some(&axis))
                        .map(|(id, _)| id.clone()),
                );
            }
        }

        for target in targets {
            let plot = self.plot_mut(&target);
            if plot.zoom != zoom {
                plot.zoom = zoom;
                self.emit(StoreEvent::PlotZoomChanged { item_id: target });
            }
        }
    }

    pub fn toggle_log_scaling(&mut self, item_id: &str) {
        let plot = self.plot_mut(item_id);
        plot.log_scaling = !plot.log_scaling;
        self.emit(StoreEvent::PlotLogScalingChanged {
            item_id: item_id.to_string(),
        });
    }

    pub fn toggle_legend_visibility(&mut self, item_id: &str) {
        let plot = self.plot_mut(item_id);
        plot.legend_visibility = !plot.legend_visibility;
        self.emit(StoreEvent::PlotLegendChanged {
            item_id: item_id.to_string(),
        });
    }

    pub fn set_global_range(&mut self, item_id: &str, range: Option<[f64; 2]>) {
        let plot = self.plot_mut(item_id);
        if plot.global_range != range {
            plot.global_range = range;
            self.emit(StoreEvent::PlotRangeChanged {
                item_id: item_id.to_string(),
            });
        }
    }

    /// Merge new detail entries into the plot's existing details.
    pub fn plot_details_updated(&mut self, item_id: &str, details: Map<String, Value>) {
        self.plot_mut(item_id).details.extend(details);
    }

    pub fn remove_plot(&mut self, item_id: &str) -> Option<PlotState> {
        self.plots.remove(item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::{Layout, Trace};
    use std::sync::{Arc, Mutex};

    fn recording_store() -> (DashboardStore, Arc<Mutex<Vec<StoreEvent>>>) {
        let mut store = DashboardStore::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        store.subscribe(Box::new(move |event| sink.lock().unwrap().push(event.clone())));
        (store, events)
    }

    fn zoom(x: f64) -> ZoomRange {
        ZoomRange {
            x_axis: [0.0, x],
            y_axis: [0.0, 1.0],
        }
    }

    #[test]
    fn test_defaults() {
        let store = DashboardStore::new();
        assert_eq!(store.view().current_time_step, 1);
        assert!(store.ui().gallery_paused);
        assert!(store.ui().zoom_sync);
        assert!(!store.ui().time_step_selection);
    }

    #[test]
    fn test_observers_run_in_subscription_order() {
        let mut store = DashboardStore::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second"] {
            let order = order.clone();
            store.subscribe(Box::new(move |_| order.lock().unwrap().push(tag)));
        }

        store.set_time_step(4);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_unchanged_time_step_is_silent() {
        let (mut store, events) = recording_store();
        store.set_time_step(1);
        assert!(events.lock().unwrap().is_empty());

        store.set_time_step(2);
        assert_eq!(*events.lock().unwrap(), vec![StoreEvent::TimeStepChanged(2)]);
    }

    #[test]
    fn test_step_forward_at_u32_max_pauses() {
        let mut store = DashboardStore::new();
        store.set_available_time_steps("psi", vec![1, 2]);
        store.set_gallery_paused(false);
        store.set_time_step(u32::MAX);

        assert_eq!(store.step_forward(), u32::MAX);
        assert!(store.ui().gallery_paused);
    }

    #[test]
    fn test_min_time_step_raises_current() {
        let mut store = DashboardStore::new();
        store.set_time_step(3);
        store.min_time_step_changed(5);
        assert_eq!(store.view().current_time_step, 5);

        store.min_time_step_changed(2);
        assert_eq!(store.view().current_time_step, 5);
        assert_eq!(store.view().min_time_step, 2);
    }

    #[test]
    fn test_available_time_steps_are_normalised() {
        let mut store = DashboardStore::new();
        store.set_available_time_steps("psi", vec![5, 1, 3, 3]);

        assert_eq!(store.plot("psi").unwrap().available_time_steps, vec![1, 3, 5]);
        assert_eq!(store.view().max_time_step, 5);
    }

    #[test]
    fn test_step_forward_pauses_at_end() {
        let mut store = DashboardStore::new();
        store.set_available_time_steps("psi", vec![1, 2]);
        store.set_gallery_paused(false);

        assert_eq!(store.step_forward(), 2);
        assert!(!store.ui().gallery_paused);
        assert_eq!(store.step_forward(), 2);
        assert!(store.ui().gallery_paused);
        assert_eq!(store.step_back(), 1);
        assert_eq!(store.step_back(), 1);
    }

    #[test]
    fn test_zoom_sync_follows_shared_x_axis() {
        let (mut store, events) = recording_store();
        store.set_x_axis("a", "Time (s)".to_string());
        store.set_x_axis("b", "Time (s)".to_string());
        store.set_x_axis("c", "Radius".to_string());

        store.update_plot_zoom("a", Some(zoom(2.0)));

        assert_eq!(store.plot("b").unwrap().zoom, Some(zoom(2.0)));
        assert_eq!(store.plot("c").unwrap().zoom, None);
        assert_eq!(events.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_zoom_without_sync_is_local() {
        let mut store = DashboardStore::new();
        store.toggle_zoom_sync();
        store.set_x_axis("a", "Time (s)".to_string());
        store.set_x_axis("b", "Time (s)".to_string());

        store.update_plot_zoom("a", Some(zoom(2.0)));
        assert_eq!(store.plot("b").unwrap().zoom, None);
    }

    #[test]
    fn test_display_preference_events() {
        let (mut store, events) = recording_store();
        store.toggle_log_scaling("a");
        store.toggle_legend_visibility("a");
        store.set_global_range("a", Some([0.0, 1.0]));
        store.set_global_range("a", Some([0.0, 1.0]));

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.display_preference_of() == Some("a")));
        assert!(store.plot("a").unwrap().log_scaling);
    }

    #[test]
    fn test_insert_frames_keyed_by_timestep() {
        let mut store = DashboardStore::new();
        let frames = (1..=3).map(|step| {
            DataFrame::new(step, vec![Trace::new(vec![0.0], vec![step as f64])], Layout::default())
        });
        store.insert_frames("psi", frames);

        assert_eq!(store.plot("psi").unwrap().loaded_steps(), vec![1, 2, 3]);
    }

    #[test]
    fn test_plot_details_merge() {
        let mut store = DashboardStore::new();
        let first = serde_json::json!({"units": "m", "shape": [2]});
        let second = serde_json::json!({"shape": [4]});
        store.plot_details_updated("psi", first.as_object().unwrap().clone());
        store.plot_details_updated("psi", second.as_object().unwrap().clone());

        let details = &store.plot("psi").unwrap().details;
        assert_eq!(details["units"], "m");
        assert_eq!(details["shape"], serde_json::json!([4]));
    }

    #[test]
    fn test_apply_view() {
        let (mut store, events) = recording_store();
        let view: View = serde_json::from_value(serde_json::json!({
            "_id": "v1",
            "name": "run A",
            "created": "2023-05-01T10:00:00Z",
            "items": {"0": "psi"},
            "columns": 3,
            "rows": 2,
            "step": 12
        }))
        .unwrap();

        store.apply_view(&view);

        assert_eq!(store.view().current_time_step, 12);
        assert_eq!((store.view().columns, store.view().rows), (3, 2));
        assert!(store.view().loaded_from_view);
        assert_eq!(
            events.lock().unwrap().last(),
            Some(&StoreEvent::ViewApplied {
                view_id: "v1".to_string()
            })
        );
    }
}
