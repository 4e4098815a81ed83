use std::time::Duration;

use actors::timer::TimerHandle;

/// A periodic wake-up. The generation ties a tick to the timer that produced
/// it, so ticks from a timer that has since been replaced can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Progress { generation: u64 },
    Call { generation: u64 },
}

/// Arms periodic timers. Whoever implements this delivers `tick` once per
/// `period` until the returned handle is cancelled or dropped.
pub trait Scheduler: Send + Sync {
    fn every(&self, period: Duration, tick: Tick) -> TimerHandle;
}
