//! # Message Serialization
//!
//! Little-endian byte codec for every message in [`super::Message`].
//!
//! ## Design
//!
//! - Every read is bounds checked and fails with [`ProtocolError::Truncated`]
//! - Strings are UTF-8 and limited by their byte length on the wire
//! - The serializer keeps its buffer between messages so the input path
//!   does not reallocate

use tilewar_shared::{
    GamePhase, GameState, MatchState, Player, Tile, TileMap, User, MAX_SHORT_STRING_LEN,
    ROOM_CODE_LEN,
};
use tracing::debug;

use super::message::{Message, MessageType, MoveDirection, SystemKind, WeaponFrame};
use crate::error::{ProtocolError, ProtocolResult};

/// Writes messages into a reusable byte buffer.
#[derive(Debug, Default)]
pub struct MessageSerializer {
    buffer: Vec<u8>,
}

impl MessageSerializer {
    /// Creates an empty serializer.
    #[must_use]
    pub const fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Clears the buffer for reuse.
    #[inline]
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Number of bytes written.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if nothing has been written.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Written bytes.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Takes the written bytes, leaving the serializer empty.
    #[must_use]
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    /// Writes a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    /// Writes a boolean as one byte (1 or 0).
    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.buffer.push(u8::from(value));
    }

    /// Writes an i16 in little-endian format.
    #[inline]
    pub fn write_i16(&mut self, value: i16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an i32 in little-endian format.
    #[inline]
    pub fn write_i32(&mut self, value: i32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an f64 in little-endian format.
    #[inline]
    pub fn write_f64(&mut self, value: f64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Writes a string prefixed by its byte length as a u8.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::FieldTooLong`] if the string exceeds 255 bytes.
    pub fn write_short_string(&mut self, field: &'static str, value: &str) -> ProtocolResult<()> {
        let len = u8::try_from(value.len()).map_err(|_| ProtocolError::FieldTooLong {
            field,
            max: MAX_SHORT_STRING_LEN,
            actual: value.len(),
        })?;
        self.write_u8(len);
        self.write_bytes(value.as_bytes());
        Ok(())
    }

    /// Writes a string into a fixed-width field, padded with NUL bytes.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::FieldTooLong`] if the string exceeds `width` bytes.
    pub fn write_fixed_string(
        &mut self,
        field: &'static str,
        value: &str,
        width: usize,
    ) -> ProtocolResult<()> {
        if value.len() > width {
            return Err(ProtocolError::FieldTooLong {
                field,
                max: width,
                actual: value.len(),
            });
        }
        self.write_bytes(value.as_bytes());
        self.buffer.resize(self.buffer.len() + width - value.len(), 0);
        Ok(())
    }

    /// Serializes a client-to-server message, replacing the buffer contents.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::NotSendable`] for server-to-client messages, or
    /// [`ProtocolError::FieldTooLong`] for oversized strings.
    pub fn serialize(&mut self, message: &Message) -> ProtocolResult<&[u8]> {
        self.reset();
        let ty = message.message_type();
        if !ty.is_sendable() {
            return Err(ProtocolError::NotSendable(ty));
        }
        self.write_u8(ty.code());

        match message {
            Message::Host | Message::Leave | Message::Start | Message::Team | Message::Shoot => {}
            Message::Join { room } => self.write_fixed_string("room", room, ROOM_CODE_LEN)?,
            Message::Move { direction, start } => {
                let mut flags = direction.flag();
                if *start {
                    flags |= MoveDirection::FLAG_START;
                }
                self.write_u8(flags);
            }
            Message::Chat { message } => self.write_short_string("message", message)?,
            Message::WeaponDown { kind, angle } | Message::WeaponUpdate { kind, angle } => {
                self.write_u8(kind.id());
                self.write_f64(*angle);
            }
            Message::WeaponUp { kind, x, y } => {
                self.write_u8(kind.id());
                self.write_f64(*x);
                self.write_f64(*y);
            }
            _ => return Err(ProtocolError::NotSendable(ty)),
        }

        Ok(self.as_slice())
    }
}

/// Reads messages from a received frame.
#[derive(Debug)]
pub struct MessageDeserializer<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> MessageDeserializer<'a> {
    /// Creates a deserializer over one frame.
    #[must_use]
    pub const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    /// Number of unread bytes.
    #[inline]
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Reads `len` raw bytes.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Truncated`] if fewer bytes remain.
    pub fn read_bytes(&mut self, len: usize) -> ProtocolResult<&'a [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(ProtocolError::truncated(len, remaining));
        }
        let bytes = &self.buffer[self.position..self.position + len];
        self.position += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> ProtocolResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Reads every unread byte.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = &self.buffer[self.position.min(self.buffer.len())..];
        self.position = self.buffer.len();
        rest
    }

    /// Reads a single byte.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Truncated`] at the end of the frame.
    #[inline]
    pub fn read_u8(&mut self) -> ProtocolResult<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Reads a one-byte boolean. Any non-zero byte is true.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Truncated`] at the end of the frame.
    #[inline]
    pub fn read_bool(&mut self) -> ProtocolResult<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Reads an i16 in little-endian format.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Truncated`] if fewer than 2 bytes remain.
    #[inline]
    pub fn read_i16(&mut self) -> ProtocolResult<i16> {
        self.read_array().map(i16::from_le_bytes)
    }

    /// Reads an i32 in little-endian format.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Truncated`] if fewer than 4 bytes remain.
    #[inline]
    pub fn read_i32(&mut self) -> ProtocolResult<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Reads an f64 in little-endian format.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Truncated`] if fewer than 8 bytes remain.
    #[inline]
    pub fn read_f64(&mut self) -> ProtocolResult<f64> {
        self.read_array().map(f64::from_le_bytes)
    }

    /// Reads a u8 length followed by that many bytes of UTF-8.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Truncated`] or [`ProtocolError::InvalidUtf8`].
    pub fn read_short_string(&mut self, field: &'static str) -> ProtocolResult<String> {
        let len = usize::from(self.read_u8()?);
        let bytes = self.read_bytes(len)?;
        utf8(field, bytes)
    }

    /// Reads a fixed-width string and strips its NUL padding.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::Truncated`] or [`ProtocolError::InvalidUtf8`].
    pub fn read_fixed_string(&mut self, field: &'static str, width: usize) -> ProtocolResult<String> {
        let bytes = self.read_bytes(width)?;
        let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        utf8(field, &bytes[..end])
    }

    /// Reads the rest of the frame as UTF-8.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::InvalidUtf8`].
    pub fn read_rest_string(&mut self, field: &'static str) -> ProtocolResult<String> {
        let bytes = self.read_rest();
        utf8(field, bytes)
    }

    /// Deserializes one server-to-client message.
    ///
    /// Returns `Ok(None)` for type codes this client does not know, so newer
    /// servers can add messages without breaking older clients.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::NotReceivable`] for client-to-server codes, or any
    /// layout error of the message body.
    pub fn deserialize(&mut self) -> ProtocolResult<Option<Message>> {
        let code = self.read_u8()?;
        let Some(ty) = MessageType::from_u8(code) else {
            debug!(code, "ignoring unknown message type");
            return Ok(None);
        };
        if !ty.is_receivable() {
            return Err(ProtocolError::NotReceivable(ty));
        }

        let message = match ty {
            MessageType::Connect => Message::Connected {
                id: self.read_i16()?,
                username: self.read_rest_string("username")?,
            },
            MessageType::Hosted => Message::Hosted {
                room: self.read_rest_string("room")?,
            },
            MessageType::Joined => Message::Joined {
                room: self.read_fixed_string("room", ROOM_CODE_LEN)?,
            },
            MessageType::Left => Message::Left,
            MessageType::Started => Message::Started,
            MessageType::Teamed => Message::Teamed,
            MessageType::Moved => Message::Moved,
            MessageType::Shot => {
                let x = self.read_i32()?;
                let y = self.read_i32()?;
                let tile = self.read_tile()?;
                Message::Shot { x, y, tile }
            }
            MessageType::Chatted => Message::Chatted {
                from: self.read_i16()?,
                message: self.read_short_string("message")?,
            },
            MessageType::Map => Message::Map(self.read_map()?),
            MessageType::State => Message::State(self.read_state()?),
            MessageType::System => {
                let subtype = self.read_u8()?;
                let kind = SystemKind::from_u8(subtype)
                    .ok_or(ProtocolError::UnknownSystemSubtype(subtype))?;
                Message::System {
                    kind,
                    message: self.read_short_string("message")?,
                }
            }
            MessageType::Error => Message::Error {
                message: self.read_short_string("message")?,
            },
            MessageType::WeaponPressed => Message::WeaponPressed(self.read_weapon_frame()?),
            MessageType::WeaponUpdated => Message::WeaponUpdated(self.read_weapon_frame()?),
            MessageType::WeaponReleased => Message::WeaponReleased(self.read_weapon_frame()?),
            _ => return Err(ProtocolError::NotReceivable(ty)),
        };

        Ok(Some(message))
    }

    fn read_tile(&mut self) -> ProtocolResult<Tile> {
        let byte = self.read_u8()?;
        Tile::from_u8(byte).ok_or(ProtocolError::InvalidTile(byte))
    }

    fn read_map(&mut self) -> ProtocolResult<TileMap> {
        let width = self.read_i32()?;
        let height = self.read_i32()?;
        let invalid = || ProtocolError::InvalidMapSize { width, height };

        let w = usize::try_from(width).map_err(|_| invalid())?;
        let h = usize::try_from(height).map_err(|_| invalid())?;
        let count = w.checked_mul(h).ok_or_else(invalid)?;

        let tiles = self
            .read_bytes(count)?
            .iter()
            .map(|&b| Tile::from_u8(b).ok_or(ProtocolError::InvalidTile(b)))
            .collect::<ProtocolResult<Vec<_>>>()?;

        TileMap::from_tiles(w, h, tiles).ok_or_else(invalid)
    }

    fn read_state(&mut self) -> ProtocolResult<GameState> {
        let host = self.read_i16()?;
        let room = self.read_fixed_string("room", ROOM_CODE_LEN)?;
        let started = self.read_bool()?;
        let started_at = Some(self.read_i32()?).filter(|&t| t > 0);

        let team_a_color = self.read_i32()?;
        let team_b_color = self.read_i32()?;
        let score_a = self.read_i32()?;
        let score_b = self.read_i32()?;
        let phase_byte = self.read_u8()?;
        let phase = GamePhase::from_u8(phase_byte).ok_or(ProtocolError::UnknownPhase(phase_byte))?;

        let count = usize::from(self.read_u8()?);
        let mut players = Vec::with_capacity(count);
        for _ in 0..count {
            players.push(self.read_player()?);
        }

        Ok(GameState {
            host,
            room,
            started,
            started_at,
            match_state: MatchState {
                team_a_color,
                team_b_color,
                score_a,
                score_b,
                phase,
            },
            players,
        })
    }

    fn read_player(&mut self) -> ProtocolResult<Player> {
        let id = self.read_i16()?;
        let team = self.read_u8()?;
        let x = self.read_f64()?;
        let y = self.read_f64()?;
        let vx = self.read_i32()?;
        let vy = self.read_i32()?;
        let weapon_kind = self.read_u8()?;
        let username = self.read_short_string("username")?;

        Ok(Player {
            user: User { id, username },
            team,
            x,
            y,
            vx,
            vy,
            weapon_kind,
        })
    }

    fn read_weapon_frame(&mut self) -> ProtocolResult<WeaponFrame> {
        let kind = self.read_u8()?;
        let player_id = self.read_i16()?;
        Ok(WeaponFrame {
            kind,
            player_id,
            body: self.read_rest().to_vec(),
        })
    }
}

fn utf8(field: &'static str, bytes: &[u8]) -> ProtocolResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| ProtocolError::InvalidUtf8 { field })
}

/// Encodes a client-to-server message into a fresh frame.
///
/// # Errors
///
/// See [`MessageSerializer::serialize`].
pub fn encode(message: &Message) -> ProtocolResult<Vec<u8>> {
    let mut serializer = MessageSerializer::new();
    serializer.serialize(message)?;
    Ok(serializer.take())
}

/// Decodes one server-to-client frame.
///
/// # Errors
///
/// See [`MessageDeserializer::deserialize`].
pub fn decode(frame: &[u8]) -> ProtocolResult<Option<Message>> {
    MessageDeserializer::new(frame).deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weapon::WeaponKind;

    #[test]
    fn test_encode_single_byte_messages() {
        assert_eq!(encode(&Message::Host).unwrap(), vec![MessageType::Host.code()]);
        assert_eq!(encode(&Message::Shoot).unwrap(), vec![MessageType::Shoot.code()]);
        assert_eq!(encode(&Message::Team).unwrap(), vec![MessageType::Team.code()]);
    }

    #[test]
    fn test_encode_move_release() {
        let frame = encode(&Message::Move {
            direction: MoveDirection::Left,
            start: false,
        })
        .unwrap();

        assert_eq!(frame, vec![MessageType::Move.code(), 0b0000_0100]);
    }

    #[test]
    fn test_encode_join_pads_room() {
        let frame = encode(&Message::Join { room: "AB".into() }).unwrap();
        assert_eq!(frame, vec![MessageType::Join.code(), b'A', b'B', 0, 0]);
    }

    #[test]
    fn test_encode_weapon_sizes() {
        let down = encode(&Message::WeaponDown {
            kind: WeaponKind::Grenade,
            angle: 1.5,
        })
        .unwrap();
        assert_eq!(down.len(), 10);
        assert_eq!(&down[2..], &1.5f64.to_le_bytes());

        let up = encode(&Message::WeaponUp {
            kind: WeaponKind::Grenade,
            x: 3.0,
            y: 4.0,
        })
        .unwrap();
        assert_eq!(up.len(), 18);
        assert_eq!(up[1], WeaponKind::Grenade.id());
    }

    #[test]
    fn test_encode_rejects_receivable() {
        let err = encode(&Message::Started).unwrap_err();
        assert_eq!(err, ProtocolError::NotSendable(MessageType::Started));
    }

    #[test]
    fn test_decode_rejects_sendable() {
        let err = decode(&[MessageType::Chat.code(), 0]).unwrap_err();
        assert_eq!(err, ProtocolError::NotReceivable(MessageType::Chat));
    }

    #[test]
    fn test_decode_unknown_code_is_ignored() {
        assert_eq!(decode(&[MessageType::COUNT]).unwrap(), None);
        assert_eq!(decode(&[255, 1, 2, 3]).unwrap(), None);
    }

    #[test]
    fn test_decode_empty_frame() {
        assert_eq!(decode(&[]).unwrap_err(), ProtocolError::truncated(1, 0));
    }

    #[test]
    fn test_decode_connect() {
        let mut s = MessageSerializer::new();
        s.write_u8(MessageType::Connect.code());
        s.write_i16(-3);
        s.write_bytes(b"alice");

        let msg = decode(s.as_slice()).unwrap().unwrap();
        assert_eq!(
            msg,
            Message::Connected {
                id: -3,
                username: "alice".into()
            }
        );
    }

    #[test]
    fn test_decode_joined_strips_padding() {
        let frame = [MessageType::Joined.code(), b'X', b'Y', 0, 0];
        let msg = decode(&frame).unwrap().unwrap();
        assert_eq!(msg, Message::Joined { room: "XY".into() });
    }

    #[test]
    fn test_decode_shot() {
        let mut s = MessageSerializer::new();
        s.write_u8(MessageType::Shot.code());
        s.write_i32(7);
        s.write_i32(2);
        s.write_u8(Tile::TeamB.as_u8());

        let msg = decode(s.as_slice()).unwrap().unwrap();
        assert_eq!(
            msg,
            Message::Shot {
                x: 7,
                y: 2,
                tile: Tile::TeamB
            }
        );
    }

    #[test]
    fn test_decode_map() {
        let mut s = MessageSerializer::new();
        s.write_u8(MessageType::Map.code());
        s.write_i32(3);
        s.write_i32(2);
        s.write_bytes(&[0, 1, 2, 3, 0, 0]);

        let Some(Message::Map(map)) = decode(s.as_slice()).unwrap() else {
            panic!("expected map");
        };
        assert_eq!(map.width(), 3);
        assert_eq!(map.height(), 2);
        assert_eq!(map.get(2, 0), Tile::TeamB);
        assert_eq!(map.get(0, 1), Tile::Wall);
    }

    #[test]
    fn test_decode_map_errors() {
        let mut s = MessageSerializer::new();
        s.write_u8(MessageType::Map.code());
        s.write_i32(-1);
        s.write_i32(2);
        assert_eq!(
            decode(s.as_slice()).unwrap_err(),
            ProtocolError::InvalidMapSize { width: -1, height: 2 }
        );

        s.reset();
        s.write_u8(MessageType::Map.code());
        s.write_i32(2);
        s.write_i32(1);
        s.write_bytes(&[0, 9]);
        assert_eq!(decode(s.as_slice()).unwrap_err(), ProtocolError::InvalidTile(9));

        s.reset();
        s.write_u8(MessageType::Map.code());
        s.write_i32(2);
        s.write_i32(2);
        s.write_bytes(&[0, 0]);
        assert_eq!(decode(s.as_slice()).unwrap_err(), ProtocolError::truncated(4, 2));
    }

    #[test]
    fn test_decode_system_subtype() {
        let ok = [MessageType::System.code(), 0, 2, b'h', b'i'];
        assert_eq!(
            decode(&ok).unwrap().unwrap(),
            Message::System {
                kind: SystemKind::Info,
                message: "hi".into()
            }
        );

        let bad = [MessageType::System.code(), 4, 0];
        assert_eq!(decode(&bad).unwrap_err(), ProtocolError::UnknownSystemSubtype(4));
    }

    #[test]
    fn test_decode_chatted_truncated() {
        let frame = [MessageType::Chatted.code(), 1, 0, 5, b'a'];
        assert_eq!(decode(&frame).unwrap_err(), ProtocolError::truncated(5, 1));
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let frame = [MessageType::Error.code(), 2, 0xC3, 0x28];
        assert_eq!(
            decode(&frame).unwrap_err(),
            ProtocolError::InvalidUtf8 { field: "message" }
        );
    }

    #[test]
    fn test_decode_weapon_frame_header() {
        let mut s = MessageSerializer::new();
        s.write_u8(MessageType::WeaponUpdated.code());
        s.write_u8(0);
        s.write_i16(12);
        s.write_u8(8);
        s.write_f64(0.25);

        let Some(Message::WeaponUpdated(frame)) = decode(s.as_slice()).unwrap() else {
            panic!("expected weapon frame");
        };
        assert_eq!(frame.kind, 0);
        assert_eq!(frame.player_id, 12);
        assert_eq!(frame.body.len(), 9);
        assert_eq!(frame.body[0], 8);
    }

    #[test]
    fn test_serializer_reuse() {
        let mut s = MessageSerializer::new();
        s.serialize(&Message::Chat { message: "hello".into() }).unwrap();
        assert_eq!(s.len(), 7);

        s.serialize(&Message::Leave).unwrap();
        assert_eq!(s.as_slice(), &[MessageType::Leave.code()]);
    }
}
