//! Tracking of one subject as an actor.
//!
//! Commands from the user and ticks from the timers all go through the
//! controller's mailbox, so they are applied one at a time. After each of
//! them the current `TrackingSnapshot` is published on a watch channel.

use std::{any::Any, sync::Arc, time::Duration};

use actors::{
    actor::{Actor, SupervisionStrategy},
    actor_ref::{ActorRef, WeakActorRef},
    handler::{Handler, Message},
    timer::{self, TimerHandle},
};
use async_trait::async_trait;
use model::{
    call::CallState, notification::Notification, route::Route, snapshot::TrackingSnapshot,
    subject::Subject,
};
use tokio::sync::{broadcast, watch};

use crate::{
    call::{format_elapsed, CallSession, CallTick},
    error::TrackingResult,
    progress::ProgressClock,
    quota::QuotaStore,
    scheduler::{Scheduler, Tick},
    settings::TrackingSettings,
};

const NOTIFICATION_BUFFER: usize = 16;

struct Session {
    subject: Subject,
    route: Route,
    clock: ProgressClock,
    call: CallSession,
    open: bool,
}

/// Delivers timer ticks to the controller's own mailbox.
struct ActorScheduler(WeakActorRef<TrackingController>);

impl Scheduler for ActorScheduler {
    fn every(&self, period: Duration, tick: Tick) -> TimerHandle {
        timer::interval(self.0.clone(), period, move || TimerFired(tick))
    }
}

pub struct TrackingController {
    quota: Arc<dyn QuotaStore>,
    settings: TrackingSettings,
    scheduler: Option<ActorScheduler>,
    session: Option<Session>,
    snapshots: Arc<watch::Sender<TrackingSnapshot>>,
    notifications: broadcast::Sender<Notification>,
}

impl TrackingController {
    fn new(
        quota: Arc<dyn QuotaStore>,
        settings: TrackingSettings,
        snapshots: Arc<watch::Sender<TrackingSnapshot>>,
        notifications: broadcast::Sender<Notification>,
    ) -> Self {
        Self {
            quota,
            settings,
            scheduler: None,
            session: None,
            snapshots,
            notifications,
        }
    }

    fn closed_snapshot() -> TrackingSnapshot {
        TrackingSnapshot {
            elapsed: format_elapsed(0),
            ..Default::default()
        }
    }

    fn snapshot(&self) -> TrackingSnapshot {
        let Some(session) = &self.session else {
            return Self::closed_snapshot();
        };
        let percent = session.clock.current();
        let index = session.clock.waypoint_index(session.route.len());
        TrackingSnapshot {
            subject: Some(session.subject.clone()),
            is_open: session.open,
            percent,
            progress_running: session.clock.is_running(),
            waypoint_index: Some(index),
            current_waypoint: session.route.get(index).cloned(),
            next_waypoint: session.route.get(index + 1).cloned(),
            distance_remaining_km: Some(session.route.remaining_distance_km(index)),
            reached_milestones: session.route.reached_milestones(percent),
            call_state: session.call.state(),
            elapsed_seconds: session.call.elapsed_seconds(),
            elapsed: session.call.elapsed(),
            recording: session.call.is_recording(),
            quota_remaining: session.call.quota_remaining(),
        }
    }

    /// Pushes the current snapshot to subscribers if it differs from the
    /// last one, and returns it.
    fn publish(&self) -> TrackingSnapshot {
        let snapshot = self.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot.clone();
                true
            }
        });
        snapshot
    }

    fn notify(&self, notification: Option<Notification>) {
        if let Some(notification) = notification {
            if self.notifications.send(notification).is_err() {
                log::debug!("no one is listening for notifications");
            }
        }
    }

    /// The open session, if any. Commands on a closed session are ignored.
    fn open_session(&mut self, command: &str) -> Option<&mut Session> {
        match self.session.as_mut() {
            Some(session) if session.open => Some(session),
            _ => {
                log::debug!("no open tracking session to {}, ignoring", command);
                None
            }
        }
    }

    fn close_session(&mut self) {
        let Some(session) = self.open_session("close") else {
            return;
        };
        session.clock.stop();
        let notification = match session.call.state() {
            CallState::Active => session.call.end_call(),
            CallState::AwaitingConfirmation => {
                session.call.cancel_confirmation();
                None
            }
            CallState::Idle => None,
        };
        session.open = false;
        log::info!("closed tracking of {}", session.subject.id);
        self.notify(notification);
    }
}

impl Actor for TrackingController {
    fn started(&mut self, myself: WeakActorRef<Self>) {
        self.scheduler = Some(ActorScheduler(myself));
        self.publish();
    }

    fn on_fail(&mut self, error: Box<dyn Any + Send>) -> SupervisionStrategy {
        log::error!("tracking controller failed, starting over: {:?}", error);
        SupervisionStrategy::Restart
    }
}

pub struct Open {
    pub subject: Subject,
    pub route: Route,
}

impl Message for Open {
    type Response = TrackingSnapshot;
}

pub struct Close;

impl Message for Close {
    type Response = TrackingSnapshot;
}

pub struct GetSnapshot;

impl Message for GetSnapshot {
    type Response = TrackingSnapshot;
}

pub struct RequestCall;

impl Message for RequestCall {
    type Response = TrackingSnapshot;
}

pub struct ConfirmCall;

impl Message for ConfirmCall {
    type Response = TrackingSnapshot;
}

pub struct CancelConfirmation;

impl Message for CancelConfirmation {
    type Response = TrackingSnapshot;
}

pub struct EndCall;

impl Message for EndCall {
    type Response = TrackingSnapshot;
}

pub struct ToggleRecording;

impl Message for ToggleRecording {
    type Response = TrackingSnapshot;
}

pub struct TimerFired(Tick);

impl Message for TimerFired {
    type Response = ();
}

#[async_trait]
impl Handler<Open> for TrackingController {
    async fn handle(&mut self, message: Open) -> TrackingSnapshot {
        self.close_session();

        let Open { subject, route } = message;
        let mut session = match self.session.take() {
            // reused so that ticks of the previous session stay stale
            Some(mut previous) => {
                previous.clock.reset();
                previous.call.reset(subject.id.clone());
                Session {
                    subject,
                    route,
                    open: true,
                    ..previous
                }
            }
            None => Session {
                clock: ProgressClock::new(self.settings.progress.clone()),
                call: CallSession::new(
                    subject.id.clone(),
                    self.quota.clone(),
                    self.settings.call.clone(),
                ),
                subject,
                route,
                open: true,
            },
        };
        session.call.refresh_quota().await;
        match &self.scheduler {
            Some(scheduler) => session.clock.start(scheduler),
            None => log::error!("tracking controller has no scheduler, progress stays at 0"),
        }
        log::info!(
            "tracking {} from {} to {}",
            session.subject.id,
            session.route.origin().name,
            session.route.destination().name
        );

        self.session = Some(session);
        self.publish()
    }
}

#[async_trait]
impl Handler<Close> for TrackingController {
    async fn handle(&mut self, _: Close) -> TrackingSnapshot {
        self.close_session();
        self.publish()
    }
}

#[async_trait]
impl Handler<GetSnapshot> for TrackingController {
    async fn handle(&mut self, _: GetSnapshot) -> TrackingSnapshot {
        self.snapshot()
    }
}

#[async_trait]
impl Handler<RequestCall> for TrackingController {
    async fn handle(&mut self, _: RequestCall) -> TrackingSnapshot {
        if let Some(session) = self.open_session("request a call") {
            let notification = session.call.request_call().await;
            self.notify(notification);
        }
        self.publish()
    }
}

#[async_trait]
impl Handler<ConfirmCall> for TrackingController {
    async fn handle(&mut self, _: ConfirmCall) -> TrackingSnapshot {
        let notification = match (self.session.as_mut(), self.scheduler.as_ref()) {
            (Some(session), Some(scheduler)) if session.open => {
                session.call.confirm_call(scheduler).await
            }
            _ => {
                log::debug!("no open tracking session to confirm a call, ignoring");
                None
            }
        };
        self.notify(notification);
        self.publish()
    }
}

#[async_trait]
impl Handler<CancelConfirmation> for TrackingController {
    async fn handle(&mut self, _: CancelConfirmation) -> TrackingSnapshot {
        if let Some(session) = self.open_session("cancel a confirmation") {
            session.call.cancel_confirmation();
        }
        self.publish()
    }
}

#[async_trait]
impl Handler<EndCall> for TrackingController {
    async fn handle(&mut self, _: EndCall) -> TrackingSnapshot {
        if let Some(session) = self.open_session("end a call") {
            let notification = session.call.end_call();
            self.notify(notification);
        }
        self.publish()
    }
}

#[async_trait]
impl Handler<ToggleRecording> for TrackingController {
    async fn handle(&mut self, _: ToggleRecording) -> TrackingSnapshot {
        if let Some(session) = self.open_session("toggle recording") {
            let notification = session.call.toggle_recording();
            self.notify(notification);
        }
        self.publish()
    }
}

#[async_trait]
impl Handler<TimerFired> for TrackingController {
    async fn handle(&mut self, message: TimerFired) {
        let Some(session) = self.session.as_mut().filter(|session| session.open) else {
            return;
        };
        match message.0 {
            Tick::Progress { generation } => {
                session.clock.on_tick(generation);
            }
            Tick::Call { generation } => {
                if let CallTick::Ended(notification) = session.call.on_tick(generation) {
                    self.notify(Some(notification));
                }
            }
        }
        self.publish();
    }
}

/// Cloneable access to a running tracking controller.
#[derive(Clone)]
pub struct TrackingHandle {
    actor: ActorRef<TrackingController>,
    snapshots: watch::Receiver<TrackingSnapshot>,
    notifications: broadcast::Sender<Notification>,
}

/// Starts a tracking controller. It runs until the last handle is dropped.
pub fn spawn(quota: Arc<dyn QuotaStore>, settings: TrackingSettings) -> TrackingHandle {
    let (snapshots_tx, snapshots) = watch::channel(TrackingController::closed_snapshot());
    let snapshots_tx = Arc::new(snapshots_tx);
    let (notifications, _) = broadcast::channel(NOTIFICATION_BUFFER);

    let controller_notifications = notifications.clone();
    let actor = actors::run(move || {
        TrackingController::new(
            quota.clone(),
            settings.clone(),
            snapshots_tx.clone(),
            controller_notifications.clone(),
        )
    });

    TrackingHandle {
        actor,
        snapshots,
        notifications,
    }
}

impl TrackingHandle {
    /// Starts tracking `subject` along `route`. An already open session is
    /// closed first.
    pub async fn open(&self, subject: Subject, route: Route) -> TrackingResult<TrackingSnapshot> {
        Ok(self.actor.ask(Open { subject, route }).await?)
    }

    /// Stops all timers, ending an active call. The last snapshot stays
    /// readable.
    pub async fn close(&self) -> TrackingResult<TrackingSnapshot> {
        Ok(self.actor.ask(Close).await?)
    }

    pub async fn snapshot(&self) -> TrackingResult<TrackingSnapshot> {
        Ok(self.actor.ask(GetSnapshot).await?)
    }

    pub async fn request_call(&self) -> TrackingResult<TrackingSnapshot> {
        Ok(self.actor.ask(RequestCall).await?)
    }

    pub async fn confirm_call(&self) -> TrackingResult<TrackingSnapshot> {
        Ok(self.actor.ask(ConfirmCall).await?)
    }

    pub async fn cancel_confirmation(&self) -> TrackingResult<TrackingSnapshot> {
        Ok(self.actor.ask(CancelConfirmation).await?)
    }

    pub async fn end_call(&self) -> TrackingResult<TrackingSnapshot> {
        Ok(self.actor.ask(EndCall).await?)
    }

    pub async fn toggle_recording(&self) -> TrackingResult<TrackingSnapshot> {
        Ok(self.actor.ask(ToggleRecording).await?)
    }

    /// Receives every snapshot change from now on.
    pub fn snapshots(&self) -> watch::Receiver<TrackingSnapshot> {
        self.snapshots.clone()
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }
}
