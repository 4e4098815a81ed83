use std::panic::AssertUnwindSafe;

use actor::{Actor, SupervisionStrategy};
use actor_ref::ActorRef;
use futures::FutureExt;
use mailbox::mailbox;

pub mod actor;
pub mod actor_ref;
pub mod handler;
pub mod mailbox;
pub mod timer;

const MAILBOX_SIZE: usize = 32;

/// Creates and runs an actor. If the actor panics, it is either restared, resumed
/// or stoped acording to the behavior specified by `Actor::on_fail()`.
///
/// Messages are handled strictly one after another. The actor stops once the
/// last `ActorRef` is dropped.
pub fn run<A, F>(actor_factory: F) -> ActorRef<A>
where
    A: Actor,
    F: 'static + Send + Fn() -> A,
{
    let (tx, mut rx) = mailbox(MAILBOX_SIZE);
    let actor_ref = ActorRef::new(tx);
    let weak_ref = actor_ref.downgrade();

    let mut actor = actor_factory();
    actor.started(weak_ref.clone());

    // run actor
    tokio::spawn(async move {
        while let Some(mut message) = rx.recv().await {
            // handle message
            let result = AssertUnwindSafe(message.handle(&mut actor))
                .catch_unwind()
                .await;
            // handler paniced?
            if let Err(why) = result {
                log::error!("actor paniced: {:?}", why);
                match actor.on_fail(why) {
                    SupervisionStrategy::Restart => {
                        actor = actor_factory();
                        actor.started(weak_ref.clone());
                    }
                    SupervisionStrategy::Resume => {}
                    SupervisionStrategy::Stop => {
                        break;
                    }
                };
            }
        }
        log::debug!("actor stopped");
    });

    actor_ref
}
