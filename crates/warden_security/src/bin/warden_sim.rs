//! # Warden Simulation
//!
//! Drives scripted participants through the detection engine over a flat
//! world and prints what it caught:
//! - legitimate walkers with jittered speed
//! - a flyer that never comes down
//! - a swing spammer above the kick threshold
//!
//! Run with: cargo run --package warden_security --features sim --bin warden_sim [seconds]

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;
use warden_security::testing::{GridWorld, RecordingHost};
use warden_security::{CheckType, Engine, ManualClock, WardenConfig, WardenResult};
use warden_shared::{
    Location, Movement, ParticipantId, Vec3, MILLIS_PER_TICK, PERMISSION_VIOLATIONS,
};

const FLOOR_Y: f64 = 64.0;
const LEGIT_PLAYERS: u64 = 8;
const FLYER: ParticipantId = ParticipantId(100);
const SPAMMER: ParticipantId = ParticipantId(101);
const STAFF: ParticipantId = ParticipantId(900);

const CONFIG: &str = r#"
[kick]
delay-ticks = 10

[checks.swing-frequency]
kick-if-threshold-reached = true
"#;

fn main() -> WardenResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let seconds: u64 = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(10);

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         WARDEN - DETECTION ENGINE SIMULATION                     ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let host = Arc::new(RecordingHost::default());
    let clock = Arc::new(ManualClock::new(0));
    let engine = Engine::new(
        host.clone(),
        Arc::new(GridWorld::flat(63)),
        clock.clone(),
        WardenConfig::from_toml_str(CONFIG)?,
    )?;
    let tick_rate = u64::from(engine.context().config().engine.tick_rate);

    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ Legit participants: {LEGIT_PLAYERS:<45}│");
    let cheaters = format!("flyer {FLYER}, swing spammer {SPAMMER}");
    println!("│ Cheaters:           {cheaters:<45}│");
    let duration = format!("{seconds} s at {tick_rate} Hz");
    println!("│ Duration:           {duration:<45}│");
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    host.connect(STAFF);
    host.grant(STAFF, PERMISSION_VIOLATIONS);
    engine.on_join(STAFF, Location::at(Vec3::new(-8.5, FLOOR_Y, 0.5)));

    let legit: Vec<ParticipantId> = (1..=LEGIT_PLAYERS).map(ParticipantId).collect();
    let mut positions = Vec::new();
    for (index, participant) in legit.iter().chain([FLYER, SPAMMER].iter()).enumerate() {
        let lane = f64::from(u32::try_from(index).unwrap_or(0)) * 4.0;
        let spawn = Vec3::new(0.5, FLOOR_Y, lane + 0.5);
        host.connect(*participant);
        engine.on_join(*participant, Location::at(spawn));
        positions.push((*participant, spawn));
    }

    let mut rng = StdRng::seed_from_u64(0x5741_5244);
    let total_ticks = seconds * tick_rate;
    let mut cancelled = 0_u64;

    for _ in 0..total_ticks {
        clock.advance(MILLIS_PER_TICK);

        for (participant, position) in &mut positions {
            let from = *position;
            let to = if *participant == FLYER {
                from.offset(0.2, 0.3, 0.0)
            } else {
                from.offset(rng.gen_range(0.1..0.3), 0.0, 0.0)
            };
            *position = to;
            if engine.on_movement(*participant, &Movement::walk(from, to)) {
                cancelled += 1;
            }
        }

        let swings = rng.gen_range(5..8);
        for _ in 0..swings {
            if engine.on_swing(SPAMMER) {
                cancelled += 1;
            }
        }

        engine.tick();
    }

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                    SIMULATION RESULTS                            ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    for participant in legit.iter().chain([FLYER, SPAMMER].iter()) {
        let levels: Vec<String> = CheckType::ALL
            .into_iter()
            .filter_map(|check| {
                let level = engine.level(*participant, check);
                (level > 0).then(|| format!("{check}={level}"))
            })
            .collect();
        let summary = if levels.is_empty() {
            "clean".to_owned()
        } else {
            levels.join(", ")
        };
        println!("  {:<6} {summary}", participant.to_string());
    }
    println!();
    println!("  Cancelled actions:    {cancelled}");
    println!("  Staff notifications:  {}", host.messages_for(STAFF).len());
    for (participant, reason) in host.kicks() {
        println!("  KICK  {:<6} {reason}", participant.to_string());
    }
    for ban in host.bans() {
        println!("  BAN   {:<6} {}", ban.participant.to_string(), ban.reason);
    }

    let false_positives = legit
        .iter()
        .filter(|participant| {
            CheckType::ALL
                .into_iter()
                .any(|check| engine.level(**participant, check) > 0)
        })
        .count();
    println!();
    println!("  False positives:      {false_positives}");
    Ok(())
}
