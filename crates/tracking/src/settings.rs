use std::{env, str::FromStr, time::Duration};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSettings {
    /// Number of ticks it takes to get from 0% to 100%.
    pub total_steps: u32,
    pub step_interval: Duration,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            total_steps: 100,
            step_interval: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSettings {
    pub max_per_day: u32,
    /// Period of the elapsed time tick. Every tick counts as one second.
    pub tick: Duration,
    /// The call is ended on the tick that reaches this many seconds.
    pub max_duration_secs: u32,
}

impl Default for CallSettings {
    fn default() -> Self {
        Self {
            max_per_day: 3,
            tick: Duration::from_secs(1),
            max_duration_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackingSettings {
    pub progress: ProgressSettings,
    pub call: CallSettings,
}

impl TrackingSettings {
    /// Defaults, overridden by whichever of `TRACKING_MAX_CALLS_PER_DAY`,
    /// `TRACKING_PROGRESS_STEPS`, `TRACKING_PROGRESS_INTERVAL_MS`,
    /// `TRACKING_CALL_TICK_MS` and `TRACKING_CALL_LIMIT_SECS` are set.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Some(max_per_day) = parse_env("TRACKING_MAX_CALLS_PER_DAY") {
            settings.call.max_per_day = max_per_day;
        }
        if let Some(total_steps) = parse_env::<u32>("TRACKING_PROGRESS_STEPS") {
            settings.progress.total_steps = total_steps.max(1);
        }
        if let Some(millis) = parse_env::<u64>("TRACKING_PROGRESS_INTERVAL_MS") {
            settings.progress.step_interval = Duration::from_millis(millis.max(1));
        }
        if let Some(millis) = parse_env::<u64>("TRACKING_CALL_TICK_MS") {
            settings.call.tick = Duration::from_millis(millis.max(1));
        }
        if let Some(secs) = parse_env::<u32>("TRACKING_CALL_LIMIT_SECS") {
            settings.call.max_duration_secs = secs.max(1);
        }
        settings
    }
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("ignoring {}={:?}, not a valid number", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_demo_behavior() {
        let settings = TrackingSettings::default();
        assert_eq!(settings.call.max_per_day, 3);
        assert_eq!(settings.call.max_duration_secs, 30);
        assert_eq!(settings.progress.total_steps, 100);
        assert_eq!(settings.progress.step_interval, Duration::from_millis(200));
    }

    #[test]
    fn env_overrides_and_ignores_garbage() {
        env::set_var("TRACKING_MAX_CALLS_PER_DAY", "5");
        env::set_var("TRACKING_PROGRESS_INTERVAL_MS", "fast");
        let settings = TrackingSettings::from_env();
        env::remove_var("TRACKING_MAX_CALLS_PER_DAY");
        env::remove_var("TRACKING_PROGRESS_INTERVAL_MS");

        assert_eq!(settings.call.max_per_day, 5);
        assert_eq!(settings.progress.step_interval, Duration::from_millis(200));
    }
}
