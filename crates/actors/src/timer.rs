use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    actor_ref::WeakActorRef,
    handler::{Handler, Message},
};

/// Owns a running timer. The timer is cancelled when the handle is dropped.
#[derive(Debug)]
pub struct TimerHandle {
    token: CancellationToken,
}

impl TimerHandle {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Sends a message produced by `message` to `actor` every `period`, starting
/// one period from now. Missed ticks are caught up, so the actor sees exactly
/// one message per elapsed period.
///
/// The timer ends when the returned handle is dropped or the actor stops.
/// A message that was already queued when the timer got cancelled is still
/// delivered, receivers have to tell stale ticks apart themselves.
pub fn interval<A, M, F>(actor: WeakActorRef<A>, period: Duration, mut message: F) -> TimerHandle
where
    A: Handler<M>,
    M: Message,
    F: FnMut() -> M + Send + 'static,
{
    let token = CancellationToken::new();
    let cancelled = token.clone();

    tokio::spawn(async move {
        let mut ticks = time::interval_at(Instant::now() + period, period);
        loop {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => break,
                _ = ticks.tick() => {
                    let Some(actor) = actor.upgrade() else {
                        break;
                    };
                    if actor.tell(message()).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    TimerHandle::new(token)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{actor::Actor, run};

    struct Beacon {
        pings: u32,
        timer: Option<TimerHandle>,
    }

    impl Actor for Beacon {}

    struct Start(WeakActorRef<Beacon>);

    impl Message for Start {
        type Response = ();
    }

    struct Ping;

    impl Message for Ping {
        type Response = ();
    }

    struct Stop;

    impl Message for Stop {
        type Response = ();
    }

    struct Count;

    impl Message for Count {
        type Response = u32;
    }

    #[async_trait]
    impl Handler<Start> for Beacon {
        async fn handle(&mut self, message: Start) {
            self.timer = Some(interval(message.0, Duration::from_millis(100), || Ping));
        }
    }

    #[async_trait]
    impl Handler<Ping> for Beacon {
        async fn handle(&mut self, _: Ping) {
            self.pings += 1;
        }
    }

    #[async_trait]
    impl Handler<Stop> for Beacon {
        async fn handle(&mut self, _: Stop) {
            self.timer = None;
        }
    }

    #[async_trait]
    impl Handler<Count> for Beacon {
        async fn handle(&mut self, _: Count) -> u32 {
            self.pings
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period_until_dropped() {
        let beacon = run(|| Beacon {
            pings: 0,
            timer: None,
        });
        beacon.tell(Start(beacon.downgrade())).await.unwrap();

        time::sleep(Duration::from_millis(550)).await;
        assert_eq!(beacon.ask(Count).await.unwrap(), 5);

        beacon.tell(Stop).await.unwrap();
        time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(beacon.ask(Count).await.unwrap(), 5);
    }

    #[test]
    fn dropping_the_handle_cancels() {
        let token = CancellationToken::new();
        let handle = TimerHandle::new(token.clone());
        assert!(!token.is_cancelled());
        drop(handle);
        assert!(token.is_cancelled());
    }
}
