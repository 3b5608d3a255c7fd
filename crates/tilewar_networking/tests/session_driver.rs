//! # Driver Verification
//!
//! Runs the session driver on a paused tokio clock so frame ticks, deferred
//! effects and channel traffic interleave deterministically.
//!
//! Run with: cargo test --test session_driver

mod common;

use std::time::Duration;

use tilewar_networking::{
    ClientConfig, ClientSession, Intent, MessageType, MoveDirection, ProtocolError, SessionDriver,
    SessionEvent, StopReason,
};
use tilewar_shared::{GameState, Player, Tile, TileMap, User};

fn started_match() -> GameState {
    GameState {
        host: 1,
        room: "DRVR".into(),
        started: true,
        players: vec![
            Player {
                user: User {
                    id: 1,
                    username: "me".into(),
                },
                x: 1.0,
                y: 3.0,
                vx: 1,
                ..Default::default()
            },
            Player {
                user: User {
                    id: 2,
                    username: "them".into(),
                },
                team: 1,
                x: 30.0,
                y: 20.0,
                ..Default::default()
            },
        ],
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn verify_driver_predicts_and_sends() {
    let session = ClientSession::new(ClientConfig::default());
    let (driver, mut handle) = SessionDriver::new(session, 16);

    handle.inbound.send(common::connect_frame(1, "me")).await.unwrap();
    handle.inbound.send(common::map_frame(&TileMap::new(48, 27))).await.unwrap();
    handle.inbound.send(common::state_frame(&started_match())).await.unwrap();
    handle
        .intents
        .send(Intent::Move {
            direction: MoveDirection::Up,
            start: true,
        })
        .await
        .unwrap();

    let task = tokio::spawn(driver.run());

    let sent = handle.outbound.recv().await.unwrap();
    assert_eq!(sent, vec![MessageType::Move.code(), 0b0001_0001]);

    tokio::time::sleep(Duration::from_millis(200)).await;
    drop(handle.inbound);

    let (session, reason) = task.await.unwrap();
    assert_eq!(reason, StopReason::InboundClosed);

    let me = session.state().unwrap().player(1).unwrap();
    assert!(me.x > 1.0, "player did not move");
    assert!(me.x <= 3.0 + 1e-9, "moved faster than 10 cells per second");
    assert!((me.y - 3.0).abs() < f64::EPSILON);

    let them = session.state().unwrap().player(2).unwrap();
    assert!((them.x - 30.0).abs() < f64::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn verify_driver_fires_grenade_effects() {
    let session = ClientSession::new(ClientConfig::default());
    let (driver, handle) = SessionDriver::new(session, 16);

    handle.inbound.send(common::map_frame(&TileMap::new(48, 27))).await.unwrap();
    handle.inbound.send(common::state_frame(&started_match())).await.unwrap();
    handle
        .inbound
        .send(common::weapon_released(2, 10.5, 10.5))
        .await
        .unwrap();

    let task = tokio::spawn(driver.run());
    tokio::time::sleep(Duration::from_millis(700)).await;
    drop(handle);

    let (session, _) = task.await.unwrap();
    assert_eq!(session.map().unwrap().count(Tile::TeamB), 9);
    assert!(session.weapons().get(2).unwrap().is_idle());
    assert!(session.effects().is_empty());
}

#[tokio::test(start_paused = true)]
async fn verify_effects_do_not_wait_for_frame_tick() {
    let config = ClientConfig {
        frame_interval_ms: 1_000,
        ..Default::default()
    };
    let session = ClientSession::new(config);
    let (driver, handle) = SessionDriver::new(session, 16);

    handle.inbound.send(common::map_frame(&TileMap::new(48, 27))).await.unwrap();
    handle.inbound.send(common::state_frame(&started_match())).await.unwrap();
    handle
        .inbound
        .send(common::weapon_released(2, 10.5, 10.5))
        .await
        .unwrap();

    let task = tokio::spawn(driver.run());
    tokio::time::sleep(Duration::from_millis(150)).await;
    drop(handle);

    // Well before the second frame tick at +1 s.
    let (session, _) = task.await.unwrap();
    assert_eq!(session.map().unwrap().count(Tile::TeamB), 9);
    assert!(!session.weapons().get(2).unwrap().is_idle());
    assert_eq!(session.effects().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn verify_driver_survives_rejected_frame() {
    let session = ClientSession::new(ClientConfig::default());
    let (driver, handle) = SessionDriver::new(session, 16);

    handle.inbound.send(common::weapon_pressed(2, 0.5)).await.unwrap();
    handle.inbound.send(common::map_frame(&TileMap::new(48, 27))).await.unwrap();
    drop(handle);

    let (mut session, reason) = tokio::spawn(driver.run()).await.unwrap();
    assert_eq!(reason, StopReason::InboundClosed);
    assert!(session.map().is_some());
    assert_eq!(
        session.drain_events(),
        vec![SessionEvent::ProtocolError(ProtocolError::NoSnapshot)]
    );
}

#[tokio::test(start_paused = true)]
async fn verify_driver_stops_without_outbound() {
    let session = ClientSession::new(ClientConfig::default());
    let (driver, handle) = SessionDriver::new(session, 4);
    let task = tokio::spawn(driver.run());

    drop(handle.outbound);
    handle.intents.send(Intent::Host).await.unwrap();

    let (_, reason) = task.await.unwrap();
    assert_eq!(reason, StopReason::OutboundClosed);
}
