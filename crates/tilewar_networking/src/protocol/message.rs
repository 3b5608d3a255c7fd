//! # Message Definitions
//!
//! All message types of the room protocol.
//!
//! Every message has exactly one direction. The client encodes
//! [`Flow::ClientToServer`] messages and decodes [`Flow::ServerToClient`]
//! messages; anything else is a programming error.

use tilewar_shared::{GameState, Tile, TileMap};

use crate::weapon::WeaponKind;

/// Which side of the connection produces a message type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Server -> Client.
    ServerToClient,
    /// Client -> Server.
    ClientToServer,
}

/// Type code in byte 0 of every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Server -> Client: Connection accepted, carries the local identity.
    Connect = 0,
    /// Client -> Server: Create a room.
    Host = 1,
    /// Server -> Client: Room created.
    Hosted = 2,
    /// Client -> Server: Join a room by code.
    Join = 3,
    /// Server -> Client: Room joined.
    Joined = 4,
    /// Client -> Server: Leave the room.
    Leave = 5,
    /// Server -> Client: Room left.
    Left = 6,
    /// Client -> Server: Host starts the match.
    Start = 7,
    /// Server -> Client: Match started.
    Started = 8,
    /// Client -> Server: Switch team.
    Team = 9,
    /// Server -> Client: Team switched.
    Teamed = 10,
    /// Client -> Server: Direction pressed or released.
    Move = 11,
    /// Server -> Client: Movement acknowledged.
    Moved = 12,
    /// Client -> Server: Paint the current cell.
    Shoot = 13,
    /// Server -> Client: One tile changed.
    Shot = 14,
    /// Client -> Server: Chat line.
    Chat = 15,
    /// Server -> Client: Chat line from a player.
    Chatted = 16,
    /// Server -> Client: Full map.
    Map = 17,
    /// Server -> Client: Full game state snapshot.
    State = 18,
    /// Server -> Client: System notice.
    System = 19,
    /// Server -> Client: Error notice.
    Error = 20,
    /// Client -> Server: Weapon trigger pressed.
    WeaponDown = 21,
    /// Client -> Server: Weapon aim changed.
    WeaponUpdate = 22,
    /// Client -> Server: Weapon trigger released.
    WeaponUp = 23,
    /// Server -> Client: A player pressed their weapon.
    WeaponPressed = 24,
    /// Server -> Client: A player changed their aim.
    WeaponUpdated = 25,
    /// Server -> Client: A player released their weapon.
    WeaponReleased = 26,
}

impl MessageType {
    /// Number of defined type codes. Codes at or above this are unknown.
    pub const COUNT: u8 = 27;

    /// Converts a type code into a message type.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Connect,
            1 => Self::Host,
            2 => Self::Hosted,
            3 => Self::Join,
            4 => Self::Joined,
            5 => Self::Leave,
            6 => Self::Left,
            7 => Self::Start,
            8 => Self::Started,
            9 => Self::Team,
            10 => Self::Teamed,
            11 => Self::Move,
            12 => Self::Moved,
            13 => Self::Shoot,
            14 => Self::Shot,
            15 => Self::Chat,
            16 => Self::Chatted,
            17 => Self::Map,
            18 => Self::State,
            19 => Self::System,
            20 => Self::Error,
            21 => Self::WeaponDown,
            22 => Self::WeaponUpdate,
            23 => Self::WeaponUp,
            24 => Self::WeaponPressed,
            25 => Self::WeaponUpdated,
            26 => Self::WeaponReleased,
            _ => return None,
        })
    }

    /// Type code.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Direction this type travels in.
    #[must_use]
    pub const fn flow(self) -> Flow {
        match self {
            Self::Host
            | Self::Join
            | Self::Leave
            | Self::Start
            | Self::Team
            | Self::Move
            | Self::Shoot
            | Self::Chat
            | Self::WeaponDown
            | Self::WeaponUpdate
            | Self::WeaponUp => Flow::ClientToServer,
            Self::Connect
            | Self::Hosted
            | Self::Joined
            | Self::Left
            | Self::Started
            | Self::Teamed
            | Self::Moved
            | Self::Shot
            | Self::Chatted
            | Self::Map
            | Self::State
            | Self::System
            | Self::Error
            | Self::WeaponPressed
            | Self::WeaponUpdated
            | Self::WeaponReleased => Flow::ServerToClient,
        }
    }

    /// Returns true if the client may encode this type.
    #[inline]
    #[must_use]
    pub const fn is_sendable(self) -> bool {
        matches!(self.flow(), Flow::ClientToServer)
    }

    /// Returns true if the client may decode this type.
    #[inline]
    #[must_use]
    pub const fn is_receivable(self) -> bool {
        matches!(self.flow(), Flow::ServerToClient)
    }
}

/// Direction carried by a move message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveDirection {
    /// Towards y = 0.
    Up,
    /// Towards y = height.
    Down,
    /// Towards x = 0.
    Left,
    /// Towards x = width.
    Right,
}

impl MoveDirection {
    /// Move flag: Up.
    pub const FLAG_UP: u8 = 1 << 0;
    /// Move flag: Down.
    pub const FLAG_DOWN: u8 = 1 << 1;
    /// Move flag: Left.
    pub const FLAG_LEFT: u8 = 1 << 2;
    /// Move flag: Right.
    pub const FLAG_RIGHT: u8 = 1 << 3;
    /// Move flag: key pressed (unset means released).
    pub const FLAG_START: u8 = 1 << 4;

    /// Flag bit of this direction.
    #[must_use]
    pub const fn flag(self) -> u8 {
        match self {
            Self::Up => Self::FLAG_UP,
            Self::Down => Self::FLAG_DOWN,
            Self::Left => Self::FLAG_LEFT,
            Self::Right => Self::FLAG_RIGHT,
        }
    }
}

/// Subtype of a system message. Closed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SystemKind {
    /// Informational notice.
    Info = 0,
}

impl SystemKind {
    /// Converts a wire byte into a subtype.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Info),
            _ => None,
        }
    }
}

/// Routing header of a weapon message from the server.
///
/// The codec only splits off the header; the body belongs to the weapon
/// kind and is interpreted by [`crate::weapon`].
///
/// ```text
/// ┌──────┬──────┬───────────┬──────────────────────────┐
/// │ type │ kind │ player id │ body (len u8 + payload)  │
/// │  1B  │  1B  │  i16 LE   │ rest of frame            │
/// └──────┴──────┴───────────┴──────────────────────────┘
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeaponFrame {
    /// Weapon kind id.
    pub kind: u8,
    /// Acting player.
    pub player_id: i16,
    /// Everything after the player id.
    pub body: Vec<u8>,
}

/// A decoded or to-be-encoded message.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    /// Local identity assigned by the server.
    Connected {
        /// User id.
        id: i16,
        /// Display name.
        username: String,
    },
    /// Request a new room.
    Host,
    /// Room created.
    Hosted {
        /// Room code.
        room: String,
    },
    /// Request to join a room.
    Join {
        /// Room code, at most 4 bytes.
        room: String,
    },
    /// Room joined.
    Joined {
        /// Room code.
        room: String,
    },
    /// Request to leave the room.
    Leave,
    /// Room left.
    Left,
    /// Request to start the match.
    Start,
    /// Match started.
    Started,
    /// Request to switch team.
    Team,
    /// Team switched.
    Teamed,
    /// Direction key pressed or released.
    Move {
        /// Direction.
        direction: MoveDirection,
        /// True on press, false on release.
        start: bool,
    },
    /// Movement acknowledged.
    Moved,
    /// Paint request.
    Shoot,
    /// One tile changed.
    Shot {
        /// Cell x.
        x: i32,
        /// Cell y.
        y: i32,
        /// New tile.
        tile: Tile,
    },
    /// Outgoing chat line.
    Chat {
        /// Text, at most 255 bytes.
        message: String,
    },
    /// Incoming chat line.
    Chatted {
        /// Sender user id.
        from: i16,
        /// Text.
        message: String,
    },
    /// Full map.
    Map(TileMap),
    /// Full snapshot.
    State(GameState),
    /// System notice.
    System {
        /// Subtype.
        kind: SystemKind,
        /// Text.
        message: String,
    },
    /// Error notice.
    Error {
        /// Text.
        message: String,
    },
    /// Local weapon pressed.
    WeaponDown {
        /// Weapon kind.
        kind: WeaponKind,
        /// Aim angle in radians.
        angle: f64,
    },
    /// Local weapon aim changed.
    WeaponUpdate {
        /// Weapon kind.
        kind: WeaponKind,
        /// Aim angle in radians.
        angle: f64,
    },
    /// Local weapon released at a map position.
    WeaponUp {
        /// Weapon kind.
        kind: WeaponKind,
        /// Target x in cells.
        x: f64,
        /// Target y in cells.
        y: f64,
    },
    /// Remote weapon pressed.
    WeaponPressed(WeaponFrame),
    /// Remote weapon aim changed.
    WeaponUpdated(WeaponFrame),
    /// Remote weapon released.
    WeaponReleased(WeaponFrame),
}

impl Message {
    /// Returns the message type.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::Connected { .. } => MessageType::Connect,
            Self::Host => MessageType::Host,
            Self::Hosted { .. } => MessageType::Hosted,
            Self::Join { .. } => MessageType::Join,
            Self::Joined { .. } => MessageType::Joined,
            Self::Leave => MessageType::Leave,
            Self::Left => MessageType::Left,
            Self::Start => MessageType::Start,
            Self::Started => MessageType::Started,
            Self::Team => MessageType::Team,
            Self::Teamed => MessageType::Teamed,
            Self::Move { .. } => MessageType::Move,
            Self::Moved => MessageType::Moved,
            Self::Shoot => MessageType::Shoot,
            Self::Shot { .. } => MessageType::Shot,
            Self::Chat { .. } => MessageType::Chat,
            Self::Chatted { .. } => MessageType::Chatted,
            Self::Map(_) => MessageType::Map,
            Self::State(_) => MessageType::State,
            Self::System { .. } => MessageType::System,
            Self::Error { .. } => MessageType::Error,
            Self::WeaponDown { .. } => MessageType::WeaponDown,
            Self::WeaponUpdate { .. } => MessageType::WeaponUpdate,
            Self::WeaponUp { .. } => MessageType::WeaponUp,
            Self::WeaponPressed(_) => MessageType::WeaponPressed,
            Self::WeaponUpdated(_) => MessageType::WeaponUpdated,
            Self::WeaponReleased(_) => MessageType::WeaponReleased,
        }
    }
}
