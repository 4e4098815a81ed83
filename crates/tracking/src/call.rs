use std::sync::Arc;

use actors::timer::TimerHandle;
use model::{call::CallState, notification::Notification, subject::Subject};
use utility::id::Id;

use crate::{
    quota::QuotaStore,
    scheduler::{Scheduler, Tick},
    settings::CallSettings,
};

/// Formats seconds as `m:ss`, e.g. 65 seconds become `1:05`.
pub fn format_elapsed(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// What a call tick did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTick {
    /// The tick belonged to no running call.
    Ignored,
    Counted,
    /// The tick reached the duration limit and ended the call.
    Ended(Notification),
}

/// Driver call state machine of one subject:
/// `Idle -> AwaitingConfirmation -> Active -> Idle`.
///
/// Commands that do not fit the current state are ignored.
pub struct CallSession {
    subject: Id<Subject>,
    quota: Arc<dyn QuotaStore>,
    settings: CallSettings,
    state: CallState,
    elapsed_seconds: u32,
    recording: bool,
    quota_remaining: Option<u32>,
    generation: u64,
    timer: Option<TimerHandle>,
}

impl CallSession {
    pub fn new(subject: Id<Subject>, quota: Arc<dyn QuotaStore>, settings: CallSettings) -> Self {
        Self {
            subject,
            quota,
            settings,
            state: CallState::Idle,
            elapsed_seconds: 0,
            recording: false,
            quota_remaining: None,
            generation: 0,
            timer: None,
        }
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    pub fn elapsed(&self) -> String {
        format_elapsed(self.elapsed_seconds)
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Last known number of calls left today, `None` until the store has
    /// been read successfully.
    pub fn quota_remaining(&self) -> Option<u32> {
        self.quota_remaining
    }

    /// Reads the quota without using any of it.
    pub async fn refresh_quota(&mut self) -> Option<u32> {
        match self
            .quota
            .get_remaining(&self.subject, self.settings.max_per_day)
            .await
        {
            Ok(remaining) => {
                self.quota_remaining = Some(remaining);
                Some(remaining)
            }
            Err(why) => {
                log::error!("could not read call quota of {}: {}", self.subject, why);
                None
            }
        }
    }

    pub async fn request_call(&mut self) -> Option<Notification> {
        if self.state != CallState::Idle {
            self.ignore("request a call");
            return None;
        }
        match self.refresh_quota().await {
            Some(0) => {
                log::info!("{} has no calls left today", self.subject);
                Some(Notification::quota_exhausted())
            }
            Some(_) => {
                self.state = CallState::AwaitingConfirmation;
                None
            }
            None => None,
        }
    }

    pub async fn confirm_call(&mut self, scheduler: &dyn Scheduler) -> Option<Notification> {
        if self.state != CallState::AwaitingConfirmation {
            self.ignore("confirm a call");
            return None;
        }
        match self
            .quota
            .consume(&self.subject, self.settings.max_per_day)
            .await
        {
            Ok(remaining) => self.quota_remaining = Some(remaining),
            // the call goes through anyway, the store keeps its last value
            Err(why) => {
                log::error!("could not persist call of {}: {}", self.subject, why)
            }
        }

        self.stop_timer();
        self.state = CallState::Active;
        self.elapsed_seconds = 0;
        self.recording = false;
        self.timer = Some(scheduler.every(
            self.settings.tick,
            Tick::Call {
                generation: self.generation,
            },
        ));
        log::info!("call with driver of {} connected", self.subject);
        Some(Notification::call_connected())
    }

    /// Backs out of the confirmation step. No quota is used.
    pub fn cancel_confirmation(&mut self) -> bool {
        if self.state != CallState::AwaitingConfirmation {
            self.ignore("cancel a confirmation");
            return false;
        }
        self.state = CallState::Idle;
        true
    }

    pub fn end_call(&mut self) -> Option<Notification> {
        if self.state != CallState::Active {
            self.ignore("end a call");
            return None;
        }
        self.stop_timer();
        self.state = CallState::Idle;
        self.elapsed_seconds = 0;
        self.recording = false;
        log::info!("call with driver of {} ended", self.subject);
        Some(Notification::call_ended())
    }

    pub fn toggle_recording(&mut self) -> Option<Notification> {
        if self.state != CallState::Active {
            self.ignore("toggle recording");
            return None;
        }
        self.recording = !self.recording;
        if self.recording {
            Some(Notification::recording_started())
        } else {
            Some(Notification::recording_stopped())
        }
    }

    /// Counts one second of an active call. The call ends on the tick that
    /// reaches the duration limit.
    pub fn on_tick(&mut self, generation: u64) -> CallTick {
        if self.state != CallState::Active
            || self.timer.is_none()
            || generation != self.generation
        {
            log::debug!("dropping stale call tick {}", generation);
            return CallTick::Ignored;
        }
        self.elapsed_seconds += 1;
        if self.elapsed_seconds >= self.settings.max_duration_secs {
            log::info!(
                "call of {} reached the {}s limit",
                self.subject,
                self.settings.max_duration_secs
            );
            return match self.end_call() {
                Some(notification) => CallTick::Ended(notification),
                None => CallTick::Counted,
            };
        }
        CallTick::Counted
    }

    /// Starts over as an idle session of `subject`. Generations keep
    /// counting, so ticks armed before the reset stay stale.
    pub fn reset(&mut self, subject: Id<Subject>) {
        self.stop_timer();
        self.subject = subject;
        self.state = CallState::Idle;
        self.elapsed_seconds = 0;
        self.recording = false;
        self.quota_remaining = None;
    }

    fn stop_timer(&mut self) {
        self.generation += 1;
        self.timer = None;
    }

    fn ignore(&self, command: &str) {
        log::debug!(
            "cannot {} for {} while {:?}, ignoring",
            command,
            self.subject,
            self.state
        );
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::atomic::Ordering, time::Duration};

    use chrono::NaiveDate;
    use model::notification::NotificationEvent;

    use super::*;
    use crate::{
        quota::{testing::FlakyBackend, FixedCalendar, KeyValueQuotaStore},
        scheduler::testing::ManualScheduler,
    };

    fn store() -> Arc<dyn QuotaStore> {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        Arc::new(KeyValueQuotaStore::in_memory(FixedCalendar::new(today)))
    }

    fn session(quota: Arc<dyn QuotaStore>) -> CallSession {
        CallSession::new(Id::new("ORD-1024".to_owned()), quota, CallSettings::default())
    }

    fn call_generation(scheduler: &ManualScheduler) -> u64 {
        match scheduler.live().as_slice() {
            [(_, Tick::Call { generation })] => *generation,
            other => panic!("expected one live call timer, got {:?}", other),
        }
    }

    async fn connect(call: &mut CallSession, scheduler: &ManualScheduler) -> u64 {
        assert_eq!(call.request_call().await, None);
        assert_eq!(call.state(), CallState::AwaitingConfirmation);
        let notification = call.confirm_call(scheduler).await.unwrap();
        assert_eq!(notification.event, NotificationEvent::CallConnected);
        call_generation(scheduler)
    }

    #[test]
    fn formats_minutes_and_padded_seconds() {
        assert_eq!(format_elapsed(0), "0:00");
        assert_eq!(format_elapsed(9), "0:09");
        assert_eq!(format_elapsed(65), "1:05");
        assert_eq!(format_elapsed(600), "10:00");
    }

    #[tokio::test]
    async fn full_lifecycle() {
        let scheduler = ManualScheduler::default();
        let mut call = session(store());
        assert_eq!(call.state(), CallState::Idle);

        let generation = connect(&mut call, &scheduler).await;
        assert_eq!(call.state(), CallState::Active);
        assert_eq!(call.quota_remaining(), Some(2));
        assert_eq!(
            scheduler.live(),
            vec![(Duration::from_secs(1), Tick::Call { generation })]
        );

        assert_eq!(call.on_tick(generation), CallTick::Counted);
        assert_eq!(call.elapsed_seconds(), 1);

        let ended = call.end_call().unwrap();
        assert_eq!(ended.event, NotificationEvent::CallEnded);
        assert_eq!(call.state(), CallState::Idle);
        assert_eq!(call.elapsed_seconds(), 0);
        assert!(scheduler.live().is_empty());
        assert_eq!(call.on_tick(generation), CallTick::Ignored);
    }

    #[tokio::test]
    async fn ticks_from_before_a_reset_are_ignored() {
        let scheduler = ManualScheduler::default();
        let mut call = session(store());
        let old = connect(&mut call, &scheduler).await;
        call.end_call();

        call.reset(Id::new("TRK001".to_owned()));
        assert_eq!(call.state(), CallState::Idle);
        assert_eq!(call.quota_remaining(), None);

        let new = connect(&mut call, &scheduler).await;
        assert_ne!(old, new);
        assert_eq!(call.on_tick(old), CallTick::Ignored);
        assert_eq!(call.elapsed_seconds(), 0);
        assert_eq!(call.on_tick(new), CallTick::Counted);
        assert_eq!(call.elapsed_seconds(), 1);
    }

    #[tokio::test]
    async fn third_call_is_the_last_one() {
        let scheduler = ManualScheduler::default();
        let mut call = session(store());
        for expected_left in [2, 1, 0] {
            connect(&mut call, &scheduler).await;
            assert_eq!(call.quota_remaining(), Some(expected_left));
            call.end_call();
        }

        let notification = call.request_call().await.unwrap();
        assert_eq!(notification.event, NotificationEvent::QuotaExhausted);
        assert_eq!(call.state(), CallState::Idle);
        assert_eq!(call.quota_remaining(), Some(0));
    }

    #[tokio::test]
    async fn cancel_does_not_use_quota() {
        let quota = store();
        let mut call = session(quota.clone());
        for _ in 0..5 {
            call.request_call().await;
            assert!(call.cancel_confirmation());
            assert_eq!(call.state(), CallState::Idle);
        }
        let subject = Id::new("ORD-1024".to_owned());
        assert_eq!(quota.get_remaining(&subject, 3).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn ends_itself_after_thirty_seconds() {
        let scheduler = ManualScheduler::default();
        let mut call = session(store());
        let generation = connect(&mut call, &scheduler).await;

        for second in 1..30 {
            assert_eq!(call.on_tick(generation), CallTick::Counted);
            assert_eq!(call.elapsed_seconds(), second);
        }
        match call.on_tick(generation) {
            CallTick::Ended(notification) => {
                assert_eq!(notification.event, NotificationEvent::CallEnded)
            }
            other => panic!("expected the call to end, got {:?}", other),
        }
        assert_eq!(call.state(), CallState::Idle);
        assert_eq!(call.elapsed_seconds(), 0);
        assert!(scheduler.live().is_empty());
    }

    #[tokio::test]
    async fn shows_elapsed_time_of_long_calls() {
        let scheduler = ManualScheduler::default();
        let mut call = CallSession::new(
            Id::new("TRK-001".to_owned()),
            store(),
            CallSettings {
                max_duration_secs: 120,
                ..CallSettings::default()
            },
        );
        let generation = connect(&mut call, &scheduler).await;
        for _ in 0..65 {
            call.on_tick(generation);
        }
        assert_eq!(call.elapsed(), "1:05");
    }

    #[tokio::test]
    async fn elapsed_restarts_with_every_call() {
        let scheduler = ManualScheduler::default();
        let mut call = session(store());
        let first = connect(&mut call, &scheduler).await;
        call.on_tick(first);
        call.on_tick(first);
        call.end_call();

        let second = connect(&mut call, &scheduler).await;
        assert_eq!(call.elapsed_seconds(), 0);
        // late tick of the first call
        assert_eq!(call.on_tick(first), CallTick::Ignored);
        assert_eq!(call.on_tick(second), CallTick::Counted);
        assert_eq!(call.elapsed_seconds(), 1);
    }

    #[tokio::test]
    async fn commands_out_of_order_are_ignored() {
        let scheduler = ManualScheduler::default();
        let mut call = session(store());

        assert_eq!(call.confirm_call(&scheduler).await, None);
        assert!(!call.cancel_confirmation());
        assert_eq!(call.end_call(), None);
        assert_eq!(call.toggle_recording(), None);
        assert_eq!(call.state(), CallState::Idle);

        call.request_call().await;
        assert_eq!(call.request_call().await, None);
        assert_eq!(call.end_call(), None);
        assert_eq!(call.state(), CallState::AwaitingConfirmation);

        call.confirm_call(&scheduler).await;
        assert_eq!(call.request_call().await, None);
        assert!(!call.cancel_confirmation());
        assert_eq!(call.state(), CallState::Active);
        assert!(scheduler.live().len() == 1);
    }

    #[tokio::test]
    async fn recording_only_while_active() {
        let scheduler = ManualScheduler::default();
        let mut call = session(store());
        connect(&mut call, &scheduler).await;

        let started = call.toggle_recording().unwrap();
        assert_eq!(started.event, NotificationEvent::RecordingStarted);
        assert!(call.is_recording());
        let stopped = call.toggle_recording().unwrap();
        assert_eq!(stopped.event, NotificationEvent::RecordingStopped);

        call.toggle_recording();
        call.end_call();
        assert!(!call.is_recording());
    }

    #[tokio::test]
    async fn failed_consume_still_connects() {
        let scheduler = ManualScheduler::default();
        let backend = FlakyBackend::default();
        let failing = backend.failing.clone();
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let quota: Arc<dyn QuotaStore> =
            Arc::new(KeyValueQuotaStore::new(backend, FixedCalendar::new(today)));
        let mut call = session(quota.clone());

        call.request_call().await;
        assert_eq!(call.quota_remaining(), Some(3));
        failing.store(true, Ordering::SeqCst);
        assert!(call.confirm_call(&scheduler).await.is_some());
        assert_eq!(call.state(), CallState::Active);
        assert_eq!(call.quota_remaining(), Some(3));

        failing.store(false, Ordering::SeqCst);
        let subject = Id::new("ORD-1024".to_owned());
        assert_eq!(quota.get_remaining(&subject, 3).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn unreadable_quota_keeps_session_idle() {
        let backend = FlakyBackend::default();
        backend.failing.store(true, Ordering::SeqCst);
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let mut call = session(Arc::new(KeyValueQuotaStore::new(
            backend,
            FixedCalendar::new(today),
        )));

        // the first read has to persist a fresh record, which fails
        assert_eq!(call.request_call().await, None);
        assert_eq!(call.state(), CallState::Idle);
        assert_eq!(call.quota_remaining(), None);
    }
}
