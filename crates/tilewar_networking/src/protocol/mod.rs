//! # Wire Protocol
//!
//! Binary messages exchanged with the room server, one message per frame.
//!
//! ## Frame Structure
//!
//! ```text
//! ┌──────────┬──────────────────────────────────────────────┐
//! │ type (1) │ payload (layout fixed per type)              │
//! └──────────┴──────────────────────────────────────────────┘
//! ```
//!
//! All integers and floats are little-endian. Strings are UTF-8, either
//! prefixed by a u8 byte length, padded to a fixed width, or running to the
//! end of the frame.
//!
//! ## Direction
//!
//! Each type flows one way. Encoding a server message or receiving a client
//! message is an error; an unknown type code decodes to nothing.

mod message;
mod serialization;

pub use message::{Flow, Message, MessageType, MoveDirection, SystemKind, WeaponFrame};
pub use serialization::{decode, encode, MessageDeserializer, MessageSerializer};
