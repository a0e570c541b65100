// Plot controller - decides what each plot renders and turns chart
// interaction events into store updates
use crate::application::store::{DashboardStore, PlotState, StoreEvent};
use crate::domain::frame::{AxisScale, DataFrame, PlotType};
use crate::domain::selection::{closest_time_index, is_time_axis};
use crate::domain::timestep::resolve_frame;
use crate::domain::zoom::{parse_zoom_values, range_text, RelayoutEvent};
use serde::Serialize;

/// A frame ready to hand to the chart renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderRequest {
    pub item_id: String,
    pub frame: DataFrame,
    pub range_text: String,
    pub annotation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PlotController {
    item_id: String,
    time_average: u32,
    last_rendered: Option<u32>,
    selected_time: Option<f64>,
    range_text: String,
    /// A display preference changed since the last render
    dirty: bool,
}

impl PlotController {
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            time_average: 0,
            last_rendered: None,
            selected_time: None,
            range_text: String::new(),
            dirty: false,
        }
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn time_average(&self) -> u32 {
        self.time_average
    }

    /// Point the controller at another plot. The next react always renders.
    pub fn set_item_id(&mut self, item_id: impl Into<String>) {
        let item_id = item_id.into();
        if item_id != self.item_id {
            self.item_id = item_id;
            self.last_rendered = None;
            self.range_text.clear();
        }
    }

    pub fn set_time_average(&mut self, time_average: u32) {
        if time_average != self.time_average {
            self.time_average = time_average;
            self.last_rendered = None;
        }
    }

    /// Note a store change. Display preference changes of this plot are
    /// remembered so the next react redraws.
    pub fn observe(&mut self, event: &StoreEvent) {
        let item_id = Some(self.item_id.as_str());
        if event.display_preference_of() == item_id {
            self.dirty = true;
        }
        // An averaged frame carries the requested step whatever it summed,
        // so frames arriving inside the window must force the redraw.
        if self.time_average > 0 && event.frames_changed_of() == item_id {
            self.dirty = true;
        }
    }

    fn needs_render(&self, timestep: u32, need_rerender: bool) -> bool {
        need_rerender || self.last_rendered != Some(timestep)
    }

    /// Resolve and prepare the frame for `step`, or `None` when nothing
    /// new needs to reach the renderer.
    pub fn render_step(
        &mut self,
        step: u32,
        plot: &PlotState,
        need_rerender: bool,
    ) -> Option<RenderRequest> {
        let resolved = resolve_frame(
            step,
            self.time_average,
            &plot.available_time_steps,
            &plot.loaded,
        )?;

        if resolved.frame.plot_type != PlotType::Plotly {
            tracing::debug!("Plot {} step {} is not a chart frame", self.item_id, step);
            return None;
        }
        if !self.needs_render(resolved.frame.timestep, need_rerender) {
            return None;
        }

        let annotation = resolved.annotation;
        let mut frame = resolved.frame.into_owned();
        self.last_rendered = Some(frame.timestep);
        self.range_text = apply_display_preferences(&mut frame, plot);

        tracing::debug!(
            "Rendering plot {} at step {} (frame {})",
            self.item_id,
            step,
            frame.timestep
        );

        Some(RenderRequest {
            item_id: self.item_id.clone(),
            frame,
            range_text: self.range_text.clone(),
            annotation,
        })
    }

    /// Render the plot at the store's current time step.
    pub fn react(&mut self, store: &mut DashboardStore, need_rerender: bool) -> Option<RenderRequest> {
        let need_rerender = need_rerender || self.dirty;
        let step = store.view().current_time_step;

        let request = store
            .plot(&self.item_id)
            .and_then(|plot| self.render_step(step, plot, need_rerender));

        if let Some(request) = &request {
            self.dirty = false;
            let has_axis = store
                .plot(&self.item_id)
                .is_some_and(|plot| plot.x_axis.is_some());
            if !has_axis {
                store.set_x_axis(&self.item_id, request.frame.x_axis_title().to_string());
            }
        }

        store.increment_ready();
        request
    }

    /// Drag-zoom on the chart. Writes the zoom to the store and reports
    /// whether the event carried a zoom at all; the zoom change event makes
    /// the next react redraw.
    pub fn on_relayout(&mut self, store: &mut DashboardStore, event: &RelayoutEvent) -> bool {
        if !event.has_ranges() {
            return false;
        }

        let global_range = store.plot(&self.item_id).and_then(|plot| plot.global_range);
        let zoom = parse_zoom_values(event, global_range);
        store.update_plot_zoom(&self.item_id, zoom);
        true
    }

    /// Click on a point. In time-step selector mode on a time axis this
    /// moves the dashboard to the clicked time and pauses autoplay.
    pub fn on_click(&mut self, store: &mut DashboardStore, x_ms: f64) -> Option<u32> {
        if !store.ui().time_step_selection || !self.on_time_axis(store) {
            return None;
        }
        if self.selected_time == Some(x_ms) {
            return None;
        }
        self.selected_time = Some(x_ms);

        let plot = store.plot(&self.item_id)?;
        let index = closest_time_index(x_ms, &plot.times)?;
        let step = *plot.available_time_steps.get(index)?;

        tracing::debug!("Plot {} selected time step {}", self.item_id, step);
        store.set_time_step(step);
        store.set_gallery_paused(true);
        Some(step)
    }

    /// Double-click resets the zoom, except while picking time steps on a
    /// time axis. Returns whether the zoom was reset.
    pub fn on_double_click(&mut self, store: &mut DashboardStore) -> bool {
        if store.ui().time_step_selection && self.on_time_axis(store) {
            return false;
        }
        self.range_text.clear();
        store.update_plot_zoom(&self.item_id, None);
        true
    }

    fn on_time_axis(&self, store: &DashboardStore) -> bool {
        store
            .plot(&self.item_id)
            .and_then(|plot| plot.x_axis.as_deref())
            .is_some_and(is_time_axis)
    }
}

/// Apply a plot's scaling, legend, zoom and global range to a frame's
/// layout. Returns the range annotation (empty unless zoomed).
pub fn apply_display_preferences(frame: &mut DataFrame, plot: &PlotState) -> String {
    let scale = if plot.log_scaling {
        AxisScale::Log
    } else {
        AxisScale::Linear
    };
    let layout = &mut frame.layout;
    layout.xaxis.scale = scale;
    layout.yaxis.scale = scale;
    layout.yaxis.autorange = true;
    layout.showlegend = plot.legend_visibility;

    if let Some(zoom) = plot.zoom {
        layout.xaxis.range = Some(zoom.x_axis);
        layout.yaxis.range = Some(zoom.y_axis);
        layout.yaxis.autorange = false;
    }
    if let Some(range) = plot.global_range {
        layout.yaxis.range = Some(range);
        layout.yaxis.autorange = false;
    }

    match plot.zoom {
        Some(_) => frame
            .data
            .first()
            .and_then(|trace| range_text(trace, plot.global_range))
            .unwrap_or_default(),
        None => String::new(),
    }
}
