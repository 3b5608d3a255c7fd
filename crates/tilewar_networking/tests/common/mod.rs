//! Server-side frame builders shared by the integration tests.
//!
//! The client never encodes these messages, so the tests assemble them from
//! the serializer primitives the way a server would.

#![allow(dead_code)]

use tilewar_networking::{MessageSerializer, MessageType};
use tilewar_shared::{GameState, TileMap, ROOM_CODE_LEN};

/// Frame carrying a full snapshot.
pub fn state_frame(state: &GameState) -> Vec<u8> {
    let mut s = MessageSerializer::new();
    s.write_u8(MessageType::State.code());
    s.write_i16(state.host);
    s.write_fixed_string("room", &state.room, ROOM_CODE_LEN).unwrap();
    s.write_bool(state.started);
    s.write_i32(state.started_at.unwrap_or(0));

    let m = &state.match_state;
    s.write_i32(m.team_a_color);
    s.write_i32(m.team_b_color);
    s.write_i32(m.score_a);
    s.write_i32(m.score_b);
    s.write_u8(m.phase as u8);

    s.write_u8(u8::try_from(state.players.len()).unwrap());
    for p in &state.players {
        s.write_i16(p.user.id);
        s.write_u8(p.team);
        s.write_f64(p.x);
        s.write_f64(p.y);
        s.write_i32(p.vx);
        s.write_i32(p.vy);
        s.write_u8(p.weapon_kind);
        s.write_short_string("username", &p.user.username).unwrap();
    }
    s.take()
}

/// Frame carrying a full map.
pub fn map_frame(map: &TileMap) -> Vec<u8> {
    let mut s = MessageSerializer::new();
    s.write_u8(MessageType::Map.code());
    s.write_i32(i32::try_from(map.width()).unwrap());
    s.write_i32(i32::try_from(map.height()).unwrap());
    for tile in map.tiles() {
        s.write_u8(tile.as_u8());
    }
    s.take()
}

/// Frame assigning the local identity.
pub fn connect_frame(id: i16, username: &str) -> Vec<u8> {
    let mut s = MessageSerializer::new();
    s.write_u8(MessageType::Connect.code());
    s.write_i16(id);
    s.write_bytes(username.as_bytes());
    s.take()
}

fn weapon_frame(ty: MessageType, player_id: i16, payload: &[f64]) -> Vec<u8> {
    let mut s = MessageSerializer::new();
    s.write_u8(ty.code());
    s.write_u8(0);
    s.write_i16(player_id);
    s.write_u8(u8::try_from(payload.len() * 8).unwrap());
    for value in payload {
        s.write_f64(*value);
    }
    s.take()
}

/// Remote grenade pressed.
pub fn weapon_pressed(player_id: i16, angle: f64) -> Vec<u8> {
    weapon_frame(MessageType::WeaponPressed, player_id, &[angle])
}

/// Remote grenade aim changed.
pub fn weapon_updated(player_id: i16, angle: f64) -> Vec<u8> {
    weapon_frame(MessageType::WeaponUpdated, player_id, &[angle])
}

/// Remote grenade released at a cell position.
pub fn weapon_released(player_id: i16, x: f64, y: f64) -> Vec<u8> {
    weapon_frame(MessageType::WeaponReleased, player_id, &[x, y])
}
