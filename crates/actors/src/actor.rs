use core::fmt;
use std::{any::Any, error::Error};

use tokio::sync::oneshot;

use crate::actor_ref::WeakActorRef;

#[derive(Debug, Clone)]
pub enum SupervisionStrategy {
    Restart,
    Resume,
    Stop,
}

pub trait Actor: Send + Sync + Sized + 'static {
    /// Called once before the first message is handled, and again after every
    /// restart. `myself` does not keep the actor alive, it is meant for timers
    /// and other tasks that post messages back to the actor.
    #[allow(unused_variables)]
    fn started(&mut self, myself: WeakActorRef<Self>) {}

    /// Called when a handler on the actor panics. The return value represents the
    /// supervision strategy used to handle the panic.
    /// NOTE: If this method panics, the actor can not recover from the panic.
    #[allow(unused_variables)]
    fn on_fail(&mut self, error: Box<dyn Any + Send>) -> SupervisionStrategy {
        SupervisionStrategy::Restart
    }
}

#[derive(Debug)]
pub enum ActorError {
    /// The actor stopped and its mailbox no longer accepts messages.
    MailboxClosed,
    /// The actor dropped the message without answering, usually because the
    /// handler panicked.
    NoResponse(oneshot::error::RecvError),
}

impl fmt::Display for ActorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MailboxClosed => write!(f, "actor mailbox is closed"),
            Self::NoResponse(why) => write!(f, "actor did not respond: {}", why),
        }
    }
}

impl Error for ActorError {}
