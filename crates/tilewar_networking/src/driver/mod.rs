//! # Session Driver
//!
//! Runs a [`ClientSession`] on one task.
//!
//! ```text
//!  transport ──frames──►┐
//!  input ─────intents──►┤
//!  effects ─────due────►├──► select (biased) ──► ClientSession
//!  interval ────ticks──►┘                           │
//!                                                   └──frames──► transport
//! ```
//!
//! Frames win over intents, intents over due effects, and effects over
//! ticks. Each one runs to completion before the next is taken, so a
//! message that arrives before a tick is always visible to that tick.
//! Deferred effects wake the loop at their own deadline instead of waiting
//! for the next frame tick.

use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::client::{ClientSession, Intent};

/// Why the driver stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The transport closed the inbound channel.
    InboundClosed,
    /// The transport dropped the outbound receiver.
    OutboundClosed,
}

/// Channel ends used by the transport and the input layer.
#[derive(Debug)]
pub struct DriverHandle {
    /// Frames received from the server.
    pub inbound: mpsc::Sender<Vec<u8>>,
    /// Input intents.
    pub intents: mpsc::Sender<Intent>,
    /// Frames to send to the server.
    pub outbound: mpsc::Receiver<Vec<u8>>,
}

/// Owns a session and feeds it from channels.
#[derive(Debug)]
pub struct SessionDriver {
    session: ClientSession,
    inbound: mpsc::Receiver<Vec<u8>>,
    intents: mpsc::Receiver<Intent>,
    outbound: mpsc::Sender<Vec<u8>>,
}

impl SessionDriver {
    /// Creates a driver and the matching channel ends.
    #[must_use]
    pub fn new(session: ClientSession, capacity: usize) -> (Self, DriverHandle) {
        let (inbound_tx, inbound_rx) = mpsc::channel(capacity);
        let (intent_tx, intent_rx) = mpsc::channel(capacity);
        let (outbound_tx, outbound_rx) = mpsc::channel(capacity);

        let driver = Self {
            session,
            inbound: inbound_rx,
            intents: intent_rx,
            outbound: outbound_tx,
        };
        let handle = DriverHandle {
            inbound: inbound_tx,
            intents: intent_tx,
            outbound: outbound_rx,
        };
        (driver, handle)
    }

    /// Runs until the transport goes away, then hands the session back.
    pub async fn run(mut self) -> (ClientSession, StopReason) {
        let mut interval = time::interval(self.session.config().frame_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut intents_open = true;

        let reason = loop {
            let wake = self.session.next_effect_due().map(Instant::from_std);

            tokio::select! {
                biased;

                frame = self.inbound.recv() => {
                    let Some(frame) = frame else {
                        break StopReason::InboundClosed;
                    };
                    if let Err(err) = self.session.handle_frame(&frame, Instant::now().into_std()) {
                        debug!(%err, "frame rejected");
                    }
                }
                intent = self.intents.recv(), if intents_open => {
                    let Some(intent) = intent else {
                        debug!("input closed");
                        intents_open = false;
                        continue;
                    };
                    if !self.send_intent(intent).await {
                        break StopReason::OutboundClosed;
                    }
                }
                () = time::sleep_until(wake.unwrap_or_else(Instant::now)), if wake.is_some() => {
                    let fired = self.session.fire_due(Instant::now().into_std());
                    debug!(fired, "deferred effects fired");
                }
                now = interval.tick() => {
                    self.session.tick(now.into_std());
                }
            }
        };

        info!(?reason, "session driver stopped");
        (self.session, reason)
    }

    /// Encodes an intent and forwards the frame. Returns false if the
    /// outbound receiver is gone.
    async fn send_intent(&mut self, intent: Intent) -> bool {
        let frame = match self.session.apply_intent(intent, Instant::now().into_std()) {
            Ok(Some(frame)) => frame,
            Ok(None) | Err(_) => return true,
        };
        if self.outbound.send(frame).await.is_err() {
            warn!("outbound channel closed");
            return false;
        }
        true
    }
}
