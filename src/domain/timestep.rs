// Time-step resolution and window averaging
use super::frame::{DataFrame, LoadedFrames};
use std::borrow::Cow;

/// The frame to display for a requested time step.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFrame<'a> {
    /// Borrowed when an existing frame is shown as-is, owned when averaged
    pub frame: Cow<'a, DataFrame>,
    /// Set only when the frame is a window average
    pub annotation: Option<String>,
}

/// Resolve the frame shown for `requested` given the available and loaded
/// time steps of a plot.
///
/// `available` must be strictly increasing. With `time_average == 0` the
/// exact frame is returned, falling back to the most recent loaded step at
/// or before `requested`. With a window, every loaded step in
/// `[requested, requested + time_average]` is averaged into a new frame.
pub fn resolve_frame<'a>(
    requested: u32,
    time_average: u32,
    available: &[u32],
    loaded: &'a LoadedFrames,
) -> Option<ResolvedFrame<'a>> {
    if available.is_empty() {
        return None;
    }

    if time_average > 0 {
        if let Some(averaged) = average_window(requested, time_average, available, loaded) {
            let end = window_end(requested, time_average, available);
            return Some(ResolvedFrame {
                frame: Cow::Owned(averaged),
                annotation: Some(averaging_annotation(requested, end)),
            });
        }
        tracing::debug!(
            "No loaded frames in averaging window {}+{}, showing nearest frame",
            requested,
            time_average
        );
    }

    nearest_frame(requested, available, loaded).map(|frame| ResolvedFrame {
        frame: Cow::Borrowed(frame),
        annotation: None,
    })
}

/// Exact frame for `requested`, or the loaded frame of the greatest
/// available step before it. Steps preceding the first available step
/// clamp to the first one.
pub fn nearest_frame<'a>(
    requested: u32,
    available: &[u32],
    loaded: &'a LoadedFrames,
) -> Option<&'a DataFrame> {
    if let Some(frame) = loaded.get(&requested) {
        return Some(frame);
    }
    if loaded.is_empty() {
        return None;
    }

    let upto = available.partition_point(|&step| step <= requested);
    if upto == 0 {
        return available.first().and_then(|step| loaded.get(step));
    }

    available[..upto]
        .iter()
        .rev()
        .find_map(|step| loaded.get(step))
}

/// Last time step covered by an averaging window.
pub fn window_end(requested: u32, time_average: u32, available: &[u32]) -> u32 {
    let last_available = available.iter().copied().max().unwrap_or(requested);
    requested.saturating_add(time_average).min(last_available)
}

pub fn averaging_annotation(start: u32, end: u32) -> String {
    format!("Averaging Over Time Steps {} - {}", start, end)
}

/// Running per-series sum across frames, index-aligned on y.
#[derive(Debug, Default)]
struct SeriesSum {
    values: Vec<f64>,
    count: usize,
}

impl SeriesSum {
    fn add(&mut self, y: &[f64]) {
        for (idx, value) in y.iter().enumerate() {
            match self.values.get_mut(idx) {
                Some(sum) => *sum += value,
                None => self.values.push(*value),
            }
        }
        self.count += 1;
    }

    fn mean(self) -> Vec<f64> {
        let count = self.count.max(1) as f64;
        self.values.into_iter().map(|sum| sum / count).collect()
    }
}

/// Average every loaded frame in the window. `None` when no step in the
/// window has a loaded frame.
fn average_window(
    requested: u32,
    time_average: u32,
    available: &[u32],
    loaded: &LoadedFrames,
) -> Option<DataFrame> {
    let last = requested.saturating_add(time_average);
    let frames: Vec<&DataFrame> = available
        .iter()
        .filter(|step| (requested..=last).contains(*step))
        .filter_map(|step| loaded.get(step))
        .collect();

    let template = frames.last()?;

    let mut sums: Vec<SeriesSum> = Vec::new();
    for frame in &frames {
        for (idx, trace) in frame.data.iter().enumerate() {
            if sums.len() <= idx {
                sums.resize_with(idx + 1, SeriesSum::default);
            }
            sums[idx].add(&trace.y);
        }
    }

    tracing::debug!(
        "Averaged {} frames over time steps {}..={}",
        frames.len(),
        requested,
        last
    );

    let mut averaged = (*template).clone();
    averaged.timestep = requested;
    for (trace, sum) in averaged.data.iter_mut().zip(sums) {
        trace.y = sum.mean();
    }
    Some(averaged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::{Layout, Trace};

    fn frame(step: u32, y: Vec<f64>) -> DataFrame {
        let x = (0..y.len()).map(|i| i as f64).collect();
        DataFrame::new(step, vec![Trace::new(x, y)], Layout::default())
    }

    fn loaded(frames: Vec<DataFrame>) -> LoadedFrames {
        frames.into_iter().map(|f| (f.timestep, f)).collect()
    }

    #[test]
    fn test_exact_step_is_returned_unchanged() {
        let frames = loaded(vec![frame(1, vec![1.0, 2.0]), frame(2, vec![3.0, 4.0])]);
        let resolved = resolve_frame(2, 0, &[1, 2], &frames).unwrap();

        assert!(matches!(resolved.frame, Cow::Borrowed(_)));
        assert_eq!(*resolved.frame, frames[&2]);
        assert_eq!(resolved.annotation, None);
    }

    #[test]
    fn test_falls_back_to_nearest_prior_loaded_step() {
        let frames = loaded(vec![frame(1, vec![1.0, 2.0, 3.0]), frame(3, vec![4.0, 5.0, 6.0])]);
        let resolved = resolve_frame(4, 0, &[1, 2, 3, 5], &frames).unwrap();

        assert_eq!(resolved.frame.timestep, 3);
        assert_eq!(resolved.frame.data[0].y, vec![4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_fallback_skips_unloaded_available_steps() {
        let frames = loaded(vec![frame(1, vec![1.0])]);
        let resolved = resolve_frame(3, 0, &[1, 2, 3], &frames).unwrap();
        assert_eq!(resolved.frame.timestep, 1);
    }

    #[test]
    fn test_step_beyond_last_available_uses_last_loaded() {
        let frames = loaded(vec![frame(2, vec![1.0]), frame(5, vec![2.0])]);
        let resolved = resolve_frame(40, 0, &[2, 5], &frames).unwrap();
        assert_eq!(resolved.frame.timestep, 5);
    }

    #[test]
    fn test_step_before_first_available_clamps_to_first() {
        let frames = loaded(vec![frame(3, vec![1.0])]);
        let resolved = resolve_frame(1, 0, &[3, 4], &frames).unwrap();
        assert_eq!(resolved.frame.timestep, 3);

        let frames = loaded(vec![frame(4, vec![1.0])]);
        assert!(resolve_frame(1, 0, &[3, 4], &frames).is_none());
    }

    #[test]
    fn test_empty_available_resolves_nothing() {
        let frames = loaded(vec![frame(1, vec![1.0])]);
        assert!(resolve_frame(1, 0, &[], &frames).is_none());
        assert!(resolve_frame(1, 3, &[], &frames).is_none());
    }

    #[test]
    fn test_nothing_loaded_resolves_nothing() {
        assert!(resolve_frame(2, 0, &[1, 2, 3], &LoadedFrames::new()).is_none());
    }

    #[test]
    fn test_window_average_is_pointwise_mean() {
        let frames = loaded(vec![
            frame(1, vec![2.0, 10.0]),
            frame(2, vec![4.0, 20.0]),
            frame(3, vec![6.0, 30.0]),
        ]);
        let resolved = resolve_frame(1, 2, &[1, 2, 3], &frames).unwrap();

        assert_eq!(resolved.frame.data[0].y, vec![4.0, 20.0]);
        assert_eq!(resolved.frame.timestep, 1);
        assert_eq!(
            resolved.annotation.as_deref(),
            Some("Averaging Over Time Steps 1 - 3")
        );
        // Stored frames are left untouched
        assert_eq!(frames[&3].data[0].y, vec![6.0, 30.0]);
    }

    #[test]
    fn test_window_end_clamps_to_last_available() {
        let frames = loaded(vec![frame(4, vec![1.0]), frame(5, vec![3.0])]);
        let resolved = resolve_frame(4, 10, &[1, 4, 5], &frames).unwrap();

        assert_eq!(resolved.frame.data[0].y, vec![2.0]);
        assert_eq!(
            resolved.annotation.as_deref(),
            Some("Averaging Over Time Steps 4 - 5")
        );
    }

    #[test]
    fn test_window_only_counts_loaded_steps() {
        let frames = loaded(vec![frame(1, vec![1.0]), frame(3, vec![5.0])]);
        let resolved = resolve_frame(1, 2, &[1, 2, 3], &frames).unwrap();
        assert_eq!(resolved.frame.data[0].y, vec![3.0]);
    }

    #[test]
    fn test_window_averages_each_series_independently() {
        let two_series = |step: u32, a: f64, b: f64| {
            DataFrame::new(
                step,
                vec![Trace::new(vec![0.0], vec![a]), Trace::new(vec![0.0], vec![b])],
                Layout::default(),
            )
        };
        let frames = loaded(vec![two_series(1, 1.0, 100.0), two_series(2, 3.0, 300.0)]);
        let resolved = resolve_frame(1, 1, &[1, 2], &frames).unwrap();

        assert_eq!(resolved.frame.data[0].y, vec![2.0]);
        assert_eq!(resolved.frame.data[1].y, vec![200.0]);
    }

    #[test]
    fn test_single_step_window_matches_unaveraged() {
        let frames = loaded(vec![frame(5, vec![1.5, 2.5]), frame(9, vec![7.0, 7.0])]);
        let plain = resolve_frame(5, 0, &[5, 9], &frames).unwrap();
        let windowed = resolve_frame(5, 3, &[5, 9], &frames).unwrap();

        assert_eq!(*plain.frame, *windowed.frame);
    }

    #[test]
    fn test_empty_window_falls_back_to_nearest_frame() {
        let frames = loaded(vec![frame(1, vec![8.0])]);
        let resolved = resolve_frame(3, 1, &[1, 3, 4], &frames).unwrap();

        assert_eq!(resolved.frame.timestep, 1);
        assert_eq!(resolved.frame.data[0].y, vec![8.0]);
        assert_eq!(resolved.annotation, None);
    }
}
