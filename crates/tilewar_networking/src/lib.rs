//! # Tilewar Networking - Client Core
//!
//! Binary room protocol and the client-side state machine of a top-down
//! team painting arena.
//!
//! ## Architecture
//!
//! - **Protocol**: one-byte type code plus a fixed little-endian layout per
//!   message type, one message per transport frame
//! - **Weapons**: aim/update/release sub-messages routed to per-player
//!   weapons keyed by user id
//! - **Schedule**: cancellable one-shot effects (grenade splash and its
//!   display timeout)
//! - **Prediction**: local movement with tile collision between snapshots
//! - **Targeting**: pointer to range-limited, map-clamped aim point
//! - **Authority**: every snapshot replaces local state wholesale
//!
//! ## Data Flow
//!
//! ```text
//! SERVER                           CLIENT
//!   |                                 |
//!   |--- state / map / shot --------->| decode -> ClientSession
//!   |--- weapon pressed/released ---->| WeaponSet -> DeferredQueue
//!   |                                 | tick: effects, prediction
//!   |<-- move / shoot / weapon up ----| Intent -> Targeting -> encode
//!   |                                 |
//! ```
//!
//! The client never decides outcomes. It predicts, and yields to the next
//! snapshot.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tilewar_networking::{ClientConfig, ClientSession, SessionDriver};
//!
//! let session = ClientSession::new(ClientConfig::load("tilewar.toml")?);
//! let (driver, handle) = SessionDriver::new(session, 64);
//! // hand `handle.inbound`/`handle.outbound` to the socket task
//! let (session, reason) = driver.run().await;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod prediction;
pub mod protocol;
pub mod schedule;
pub mod targeting;
pub mod weapon;

// Re-exports for convenience
pub use client::{ClientSession, Intent, SessionEvent};
pub use config::{AimConfig, ClientConfig, GrenadeConfig, ViewportConfig};
pub use driver::{DriverHandle, SessionDriver, StopReason};
pub use error::{ConfigError, ProtocolError, ProtocolResult};
pub use prediction::{step_player, PredictionEngine};
pub use protocol::{
    decode, encode, Message, MessageDeserializer, MessageSerializer, MessageType, MoveDirection,
    SystemKind, WeaponFrame,
};
pub use schedule::{DeferredEffect, DeferredQueue, DueEffect, EffectId};
pub use targeting::{project_into_map, AimGesture, MapBounds, TargetInfo, Targeting, Viewport};
pub use weapon::{AimLine, Grenade, GrenadeState, Release, Trigger, Weapon, WeaponKind, WeaponSet};
