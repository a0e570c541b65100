// Zoom ranges and the range annotation shown on zoomed plots
use super::frame::Trace;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomRange {
    pub x_axis: [f64; 2],
    pub y_axis: [f64; 2],
}

/// Relayout event as emitted by the chart library.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayoutEvent {
    #[serde(rename = "xaxis.range[0]")]
    pub x0: Option<f64>,
    #[serde(rename = "xaxis.range[1]")]
    pub x1: Option<f64>,
    #[serde(rename = "yaxis.range[0]")]
    pub y0: Option<f64>,
    #[serde(rename = "yaxis.range[1]")]
    pub y1: Option<f64>,
    #[serde(rename = "xaxis.autorange", default)]
    pub x_autorange: bool,
    #[serde(rename = "yaxis.autorange", default)]
    pub y_autorange: bool,
}

impl RelayoutEvent {
    /// Both axes carry both bounds. Anything else is a pan/resize or a
    /// partial notification that leaves the zoom alone.
    pub fn has_ranges(&self) -> bool {
        self.x0.is_some() && self.x1.is_some() && self.y0.is_some() && self.y1.is_some()
    }
}

/// Zoom range described by a relayout event. A fixed global y range
/// replaces the dragged y interval. `None` means autorange.
pub fn parse_zoom_values(event: &RelayoutEvent, global_y: Option<[f64; 2]>) -> Option<ZoomRange> {
    if event.x_autorange || event.y_autorange {
        return None;
    }

    let x_axis = [event.x0?, event.x1?];
    let y_axis = match global_y {
        Some(range) => range,
        None => [event.y0?, event.y1?],
    };
    Some(ZoomRange { x_axis, y_axis })
}

/// "xRange: [x0, x1] yRange: [y0, y1]" for the first trace of a zoomed plot.
pub fn range_text(trace: &Trace, global_y: Option<[f64; 2]>) -> Option<String> {
    let x0 = *trace.x.first()?;
    let x1 = *trace.x.last()?;
    let [y0, y1] = match global_y {
        Some(range) => range,
        None => {
            let min = trace.y.iter().copied().fold(f64::INFINITY, f64::min);
            let max = trace.y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            [min, max]
        }
    };

    Some(format!(
        "xRange: [{}, {}] yRange: [{}, {}]",
        to_precision(x0, 4),
        to_precision(x1, 4),
        to_precision(y0, 4),
        to_precision(y1, 4)
    ))
}

/// Format with `precision` significant digits, switching to exponent
/// notation for very small or large magnitudes (as Number.toPrecision does).
pub fn to_precision(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return match value {
            v if v.is_nan() => "NaN".to_string(),
            v if v > 0.0 => "Infinity".to_string(),
            _ => "-Infinity".to_string(),
        };
    }
    let precision = precision.max(1);

    // Rounded exponent form tells us the exponent after rounding
    let scientific = format!("{:.*e}", precision - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if exponent < -6 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{}", mantissa, sign, exponent.abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        format!("{:.*}", decimals, value)
    }
}
