// Picking a time step from a click on a time-series plot

/// Clicked x positions arrive in milliseconds, times are stored in seconds.
pub const MS_TO_SECONDS: f64 = 0.001;

/// True when the x-axis title names a time axis ("Time (s)", "time", ...).
pub fn is_time_axis(x_axis_title: &str) -> bool {
    x_axis_title
        .split(' ')
        .next()
        .map(|word| word.eq_ignore_ascii_case("time"))
        .unwrap_or(false)
}

/// Index of the closest time at or before the clicked position.
pub fn closest_time_index(clicked_ms: f64, times: &[f64]) -> Option<usize> {
    let picked = clicked_ms * MS_TO_SECONDS;

    let mut closest: Option<f64> = None;
    for &time in times {
        let diff = picked - time;
        let best = closest.map(|c| picked - c).unwrap_or(f64::INFINITY);
        if diff >= 0.0 && diff < best {
            closest = Some(time);
        }
    }

    let closest = closest?;
    times.iter().position(|&time| time == closest)
}
