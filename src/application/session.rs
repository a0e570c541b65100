// Dashboard session - owns the store and one controller per plot
use crate::application::plot_controller::{PlotController, RenderRequest};
use crate::application::store::{DashboardStore, StoreEvent, UiState, ViewState};
use crate::domain::view::{NewView, User};
use crate::domain::zoom::RelayoutEvent;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub root_folder: Option<String>,
    pub ui: UiState,
    pub view: ViewState,
    pub plots: Vec<String>,
}

pub struct DashboardSession {
    store: DashboardStore,
    controllers: HashMap<String, PlotController>,
    events: mpsc::UnboundedReceiver<StoreEvent>,
    user: Option<User>,
    root_folder: Option<String>,
}

impl DashboardSession {
    pub fn new(user: Option<User>, root_folder: Option<String>) -> Self {
        let mut store = DashboardStore::new();
        let (tx, events) = mpsc::unbounded_channel();
        store.subscribe(Box::new(move |event: &StoreEvent| {
            let _ = tx.send(event.clone());
        }));

        Self {
            store,
            controllers: HashMap::new(),
            events,
            user,
            root_folder,
        }
    }

    pub fn store(&self) -> &DashboardStore {
        &self.store
    }

    /// Mutations made here reach the plot controllers on the next
    /// session operation.
    pub fn store_mut(&mut self) -> &mut DashboardStore {
        &mut self.store
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            user: self.user.clone(),
            root_folder: self.root_folder.clone(),
            ui: self.store.ui().clone(),
            view: self.store.view().clone(),
            plots: self.store.plot_ids(),
        }
    }

    /// Deliver queued store events to every controller.
    fn pump(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            for controller in self.controllers.values_mut() {
                controller.observe(&event);
            }
        }
    }

    /// Deliver pending events, then hand out the plot's controller
    /// together with the store it acts on.
    fn parts(&mut self, item_id: &str) -> (&mut PlotController, &mut DashboardStore) {
        self.pump();
        let controller = self
            .controllers
            .entry(item_id.to_string())
            .or_insert_with(|| PlotController::new(item_id));
        (controller, &mut self.store)
    }

    pub fn react(&mut self, item_id: &str, force: bool) -> Option<RenderRequest> {
        let (controller, store) = self.parts(item_id);
        controller.react(store, force)
    }

    pub fn set_time_average(&mut self, item_id: &str, time_average: u32) {
        self.parts(item_id).0.set_time_average(time_average);
    }

    pub fn time_average(&self, item_id: &str) -> u32 {
        self.controllers
            .get(item_id)
            .map(|c| c.time_average())
            .unwrap_or(0)
    }

    /// Apply a relayout event and redraw when it changed the zoom.
    pub fn relayout(&mut self, item_id: &str, event: &RelayoutEvent) -> Option<RenderRequest> {
        let (controller, store) = self.parts(item_id);
        if !controller.on_relayout(store, event) {
            return None;
        }
        self.react(item_id, false)
    }

    pub fn click(&mut self, item_id: &str, x_ms: f64) -> Option<u32> {
        let (controller, store) = self.parts(item_id);
        controller.on_click(store, x_ms)
    }

    pub fn double_click(&mut self, item_id: &str) -> bool {
        let (controller, store) = self.parts(item_id);
        controller.on_double_click(store)
    }

    /// Point a grid cell at another plot. The cell's controller follows
    /// the new plot with its averaging window and redraws on the next react.
    pub fn assign_cell(&mut self, cell: &str, item_id: Option<String>) {
        self.pump();
        let previous = self.store.view().items.get(cell).cloned();
        if let (Some(previous), Some(next)) = (previous, item_id.as_ref()) {
            let shared = self
                .store
                .view()
                .items
                .iter()
                .any(|(other, id)| other != cell && *id == previous);
            if previous != *next && !shared && !self.controllers.contains_key(next) {
                if let Some(mut controller) = self.controllers.remove(&previous) {
                    controller.set_item_id(next.clone());
                    self.controllers
                        .insert(controller.item_id().to_string(), controller);
                }
            }
        }
        self.store.set_item(cell, item_id);
        self.store.set_initial_load(false);
    }

    pub fn remove_plot(&mut self, item_id: &str) {
        self.controllers.remove(item_id);
        self.store.remove_plot(item_id);
    }

    /// Describe the current grid as a view to save.
    pub fn new_view(&self, name: String, public: bool) -> NewView {
        let view = self.store.view();
        NewView {
            name,
            items: view.items.clone(),
            columns: view.columns,
            rows: view.rows,
            step: view.current_time_step,
            public,
            run_id: view.run_id.clone(),
            simulation: view.simulation.clone(),
        }
    }
}
