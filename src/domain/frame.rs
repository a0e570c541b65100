// Data frame domain model - one rendered unit at one simulation time step
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Frames currently held in memory for one plot, keyed by time step.
pub type LoadedFrames = BTreeMap<u32, DataFrame>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotType {
    /// Rendered through the chart library
    #[default]
    Plotly,
    /// Anything else (e.g. unstructured meshes)
    Mesh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisScale {
    #[default]
    Linear,
    Log,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisTitle {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    #[serde(default)]
    pub title: AxisTitle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,
    #[serde(default = "default_autorange")]
    pub autorange: bool,
    #[serde(rename = "type", default)]
    pub scale: AxisScale,
    /// Chart attributes passed through untouched
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

fn default_autorange() -> bool {
    true
}

impl Default for Axis {
    fn default() -> Self {
        Self {
            title: AxisTitle::default(),
            range: None,
            autorange: true,
            scale: AxisScale::Linear,
            attributes: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub xaxis: Axis,
    #[serde(default)]
    pub yaxis: Axis,
    #[serde(default)]
    pub showlegend: bool,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// One series of a frame. All traces of a frame share the x-domain.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default)]
    pub x: Vec<f64>,
    #[serde(default)]
    pub y: Vec<f64>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Trace {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        Self {
            x,
            y,
            attributes: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFrame {
    pub timestep: u32,
    #[serde(rename = "type", default)]
    pub plot_type: PlotType,
    #[serde(default)]
    pub data: Vec<Trace>,
    #[serde(default)]
    pub layout: Layout,
}

impl DataFrame {
    pub fn new(timestep: u32, data: Vec<Trace>, layout: Layout) -> Self {
        Self {
            timestep,
            plot_type: PlotType::Plotly,
            data,
            layout,
        }
    }

    pub fn x_axis_title(&self) -> &str {
        &self.layout.xaxis.title.text
    }
}
