//! Performance benchmarks for critical game systems

use server::config::GameConfig;
use server::game::World;
use shared::{decode_packet, encode_packet, Packet, ARENA_HEIGHT, ARENA_WIDTH, MIN_PLAYER_SIZE};
use std::time::{Duration, Instant};

fn crowded_world(players: u64) -> World {
    let start = Instant::now();
    let mut world = World::new_at(
        GameConfig {
            seed: Some(1234),
            ..GameConfig::default()
        },
        start,
    );
    for id in 1..=players {
        world.add_player_at(id, format!("player{}", id), start);
    }
    world
}

/// Benchmarks the collision and decay pass with a crowded arena
#[test]
fn benchmark_physics_pass() {
    let mut world = crowded_world(50);
    let start = Instant::now();

    let iterations = 1_000;
    let begin = Instant::now();
    for i in 0..iterations {
        world.step_at(start + Duration::from_millis(i * 5));
    }
    let duration = begin.elapsed();

    println!(
        "Physics pass (50 players): {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
    for id in 1..=50 {
        let player = world.player(id).unwrap();
        assert!(player.size >= MIN_PLAYER_SIZE);
        assert!(player.position.x >= 0.0 && player.position.x <= ARENA_WIDTH);
        assert!(player.position.y >= 0.0 && player.position.y <= ARENA_HEIGHT);
    }
}

/// Benchmarks moving every player once per tick
#[test]
fn benchmark_movement() {
    let mut world = crowded_world(50);

    let iterations = 1_000;
    let begin = Instant::now();
    for i in 0..iterations {
        for id in 1..=50u64 {
            let target_x = (i as f32 * 7.0 + id as f32 * 13.0) % ARENA_WIDTH;
            let target_y = (i as f32 * 3.0 + id as f32 * 29.0) % ARENA_HEIGHT;
            world.move_player(id, target_x, target_y);
        }
    }
    let duration = begin.elapsed();

    println!(
        "Movement (50 players): {} ticks in {:?} ({:.2} μs/tick)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks snapshot production and its wire encoding
#[test]
fn benchmark_snapshot_encoding() {
    let world = crowded_world(50);
    let now = Instant::now();

    let iterations = 1_000;
    let begin = Instant::now();
    let mut bytes = 0;
    for _ in 0..iterations {
        let snapshot = world.snapshot_at(now);
        bytes = encode_packet(&Packet::StateUpdate(snapshot)).unwrap().len();
    }
    let duration = begin.elapsed();

    println!(
        "Snapshot encoding: {} iterations in {:?} ({:.2} μs/iter, {} bytes/frame)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64,
        bytes
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks decoding a full state frame
#[test]
fn benchmark_snapshot_decoding() {
    let world = crowded_world(50);
    let frame = encode_packet(&Packet::StateUpdate(world.snapshot())).unwrap();
    let payload = &frame[4..];

    let iterations = 1_000;
    let begin = Instant::now();
    for _ in 0..iterations {
        match decode_packet(payload).unwrap() {
            Packet::StateUpdate(snapshot) => assert_eq!(snapshot.players.len(), 50),
            other => panic!("Unexpected packet: {:?}", other),
        }
    }
    let duration = begin.elapsed();

    println!(
        "Snapshot decoding: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}
