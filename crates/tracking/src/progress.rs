use actors::timer::TimerHandle;

use crate::{
    scheduler::{Scheduler, Tick},
    settings::ProgressSettings,
};

/// Maps a progress percentage onto one of `waypoint_count` waypoints:
/// `floor(percent / 100 * (waypoint_count - 1))`, clamped to a valid index.
pub fn waypoint_index(percent: u8, waypoint_count: usize) -> usize {
    if waypoint_count == 0 {
        return 0;
    }
    let last = waypoint_count - 1;
    let index = usize::from(percent.min(100)) * last / 100;
    index.min(last)
}

/// Simulated shipment progress, counting from 0% up to 100% one tick at a
/// time. Reaching 100% is terminal until the clock is reset.
#[derive(Debug)]
pub struct ProgressClock {
    settings: ProgressSettings,
    ticks: u32,
    generation: u64,
    timer: Option<TimerHandle>,
}

impl ProgressClock {
    pub fn new(settings: ProgressSettings) -> Self {
        Self {
            settings: ProgressSettings {
                total_steps: settings.total_steps.max(1),
                ..settings
            },
            ticks: 0,
            generation: 0,
            timer: None,
        }
    }

    /// Starts advancing. A running timer is replaced, never duplicated. Does
    /// nothing once 100% is reached.
    pub fn start(&mut self, scheduler: &dyn Scheduler) {
        self.stop();
        if self.is_complete() {
            return;
        }
        self.timer = Some(scheduler.every(
            self.settings.step_interval,
            Tick::Progress {
                generation: self.generation,
            },
        ));
    }

    pub fn stop(&mut self) {
        // ticks of the old timer that are still in flight no longer match
        self.generation += 1;
        self.timer = None;
    }

    /// Back to 0%. Generations keep counting, so ticks armed before the
    /// reset stay stale.
    pub fn reset(&mut self) {
        self.stop();
        self.ticks = 0;
    }

    /// Advances by one step if `generation` belongs to the running timer.
    /// Returns whether the progress changed.
    pub fn on_tick(&mut self, generation: u64) -> bool {
        if self.timer.is_none() || generation != self.generation {
            log::debug!("dropping stale progress tick {}", generation);
            return false;
        }
        self.ticks += 1;
        if self.is_complete() {
            self.stop();
        }
        true
    }

    pub fn current(&self) -> u8 {
        let percent = u64::from(self.ticks) * 100 / u64::from(self.settings.total_steps);
        percent.min(100) as u8
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.ticks >= self.settings.total_steps
    }

    pub fn waypoint_index(&self, waypoint_count: usize) -> usize {
        waypoint_index(self.current(), waypoint_count)
    }
}
