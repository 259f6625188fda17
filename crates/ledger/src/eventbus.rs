// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::events::Event;
use actix::prelude::*;
use std::collections::VecDeque;
use std::marker::PhantomData;
use tokio::sync::oneshot;
use tracing::{debug, info};

/// Subscribing with this event type receives every event.
pub const ALL_EVENTS: &str = "*";

#[derive(Clone, Debug, PartialEq, Eq)]
enum Route {
    All,
    Named(String),
}

impl Route {
    fn parse(event_type: String) -> Self {
        if event_type == ALL_EVENTS {
            Route::All
        } else {
            Route::Named(event_type)
        }
    }

    fn matches(&self, event_type: &str) -> bool {
        match self {
            Route::All => true,
            Route::Named(name) => name == event_type,
        }
    }
}

/// Delivers committed ledger events to subscribers.
///
/// Subscriptions are kept in the order they were made and every event is handed to matching
/// subscribers in that order. A subscriber that registered before another one therefore always
/// has an event in its mailbox by the time the later one receives it.
pub struct EventBus<E: Event> {
    subscriptions: Vec<(Route, Recipient<E>)>,
}

impl<E: Event> Actor for EventBus<E> {
    type Context = Context<Self>;
}

impl<E: Event> EventBus<E> {
    pub fn new() -> Self {
        Self {
            subscriptions: Vec::new(),
        }
    }

    /// Start a collector that records everything published on `bus`.
    pub fn history(bus: &Addr<EventBus<E>>) -> Addr<HistoryCollector<E>> {
        let collector = HistoryCollector::<E>::new().start();
        bus.do_send(Subscribe::new(ALL_EVENTS, collector.clone().recipient()));
        collector
    }
}

impl<E: Event> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> Handler<E> for EventBus<E> {
    type Result = ();

    fn handle(&mut self, event: E, _: &mut Context<Self>) {
        let event_type = event.event_type();
        let mut delivered = 0usize;
        for (route, recipient) in &self.subscriptions {
            if route.matches(&event_type) {
                recipient.do_send(event.clone());
                delivered += 1;
            }
        }
        info!(event = %event, delivered, "ledger event");
    }
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Subscribe<E: Event> {
    pub event_type: String,
    pub listener: Recipient<E>,
}

impl<E: Event> Subscribe<E> {
    pub fn new(event_type: impl Into<String>, listener: Recipient<E>) -> Self {
        Self {
            event_type: event_type.into(),
            listener,
        }
    }
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Unsubscribe<E: Event> {
    pub event_type: String,
    pub listener: Recipient<E>,
}

impl<E: Event> Unsubscribe<E> {
    pub fn new(event_type: impl Into<String>, listener: Recipient<E>) -> Self {
        Self {
            event_type: event_type.into(),
            listener,
        }
    }
}

impl<E: Event> Handler<Subscribe<E>> for EventBus<E> {
    type Result = ();

    fn handle(&mut self, msg: Subscribe<E>, _: &mut Context<Self>) {
        debug!(event_type = %msg.event_type, "subscribed");
        self.subscriptions
            .push((Route::parse(msg.event_type), msg.listener));
    }
}

impl<E: Event> Handler<Unsubscribe<E>> for EventBus<E> {
    type Result = ();

    fn handle(&mut self, msg: Unsubscribe<E>, _: &mut Context<Self>) {
        let route = Route::parse(msg.event_type);
        self.subscriptions
            .retain(|(r, recipient)| !(r == &route && recipient == &msg.listener));
    }
}

/// Snapshot of the events a [`HistoryCollector`] currently buffers.
#[derive(Message)]
#[rtype(result = "Vec<E>")]
pub struct GetEvents<E: Event>(PhantomData<E>);

impl<E: Event> GetEvents<E> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E: Event> Default for GetEvents<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove and return the next `amount` events, waiting until that many have arrived.
///
/// Concurrent takes are served in the order they reach the collector. Fails if the collector
/// stops before enough events arrive.
#[derive(Message)]
#[rtype(result = "anyhow::Result<Vec<E>>")]
pub struct TakeEvents<E: Event> {
    amount: usize,
    _event: PhantomData<E>,
}

impl<E: Event> TakeEvents<E> {
    pub fn new(amount: usize) -> Self {
        Self {
            amount,
            _event: PhantomData,
        }
    }
}

struct Waiter<E> {
    amount: usize,
    reply: oneshot::Sender<Vec<E>>,
}

/// Records events it receives so tests and tools can inspect or wait for them.
pub struct HistoryCollector<E: Event> {
    buffer: VecDeque<E>,
    waiters: VecDeque<Waiter<E>>,
}

impl<E: Event> HistoryCollector<E> {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::new(),
            waiters: VecDeque::new(),
        }
    }

    fn wake_waiters(&mut self) {
        while let Some(amount) = self.waiters.front().map(|w| w.amount) {
            if self.buffer.len() < amount {
                return;
            }
            if let Some(waiter) = self.waiters.pop_front() {
                let events = self.buffer.drain(..amount).collect();
                // the caller may have stopped waiting
                let _ = waiter.reply.send(events);
            }
        }
    }
}

impl<E: Event> Default for HistoryCollector<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> Actor for HistoryCollector<E> {
    type Context = Context<Self>;
}

impl<E: Event> Handler<E> for HistoryCollector<E> {
    type Result = ();

    fn handle(&mut self, event: E, _: &mut Context<Self>) {
        self.buffer.push_back(event);
        self.wake_waiters();
    }
}

impl<E: Event> Handler<GetEvents<E>> for HistoryCollector<E> {
    type Result = Vec<E>;

    fn handle(&mut self, _: GetEvents<E>, _: &mut Context<Self>) -> Vec<E> {
        self.buffer.iter().cloned().collect()
    }
}

impl<E: Event> Handler<TakeEvents<E>> for HistoryCollector<E> {
    type Result = ResponseFuture<anyhow::Result<Vec<E>>>;

    fn handle(&mut self, msg: TakeEvents<E>, _: &mut Context<Self>) -> Self::Result {
        let amount = msg.amount;
        if self.waiters.is_empty() && self.buffer.len() >= amount {
            let events: Vec<E> = self.buffer.drain(..amount).collect();
            return Box::pin(async move { Ok(events) });
        }

        debug!(
            wanted = amount,
            buffered = self.buffer.len(),
            queued = self.waiters.len(),
            "waiting for more events"
        );
        let (reply, rx) = oneshot::channel();
        self.waiters.push_back(Waiter { amount, reply });
        Box::pin(async move {
            rx.await.map_err(|_| {
                anyhow::anyhow!("history collector stopped before {amount} events arrived")
            })
        })
    }
}
