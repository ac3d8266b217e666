//! # Movement State Aggregator
//!
//! Rolling per-participant movement facts, recomputed once per position
//! update. Every elapsed-time counter counts movement events, grows while its
//! condition holds and drops to zero the moment it stops holding.
//!
//! A session is seeded from its join location so position-based checks never
//! measure from the world origin.

use warden_shared::{Location, Movement, Vec3};

use crate::environment::Environment;

/// Derived movement state for one participant.
#[derive(Clone, Debug, PartialEq)]
pub struct MovementState {
    /// Ground flag the client reported with the latest update.
    pub claimed_on_ground: bool,
    /// Grounded at the latest position.
    pub on_ground: bool,
    /// Grounded now or on the previous update. Absorbs single airborne
    /// samples between grounded ones.
    pub was_on_ground: bool,
    /// Consecutive grounded updates.
    pub ground_time: u32,
    /// Last position at which the participant was grounded.
    pub ground_position: Option<Vec3>,

    /// Grounded on ice at the latest update.
    pub on_ice: bool,
    /// Consecutive updates on ice.
    pub ice_time: u32,
    /// Consecutive updates not on ice, airborne ones included. Saturated
    /// until the participant first touches ice.
    pub off_ice_time: u32,

    /// Host sprint flag at the latest update.
    pub sprinting: bool,
    /// Consecutive sprinting updates.
    pub sprint_time: u32,
    /// Host sneak flag at the latest update.
    pub sneaking: bool,
    /// Consecutive sneaking updates.
    pub sneak_time: u32,

    /// Absolute vertical displacement of the latest update.
    pub vertical: f64,
    /// Absolute vertical displacement of the update before.
    pub last_vertical: f64,
    /// Latest update moved up.
    pub ascending: bool,
    /// Consecutive ascending updates.
    pub ascend_time: u32,
    /// Latest update moved down.
    pub descending: bool,
    /// Consecutive descending updates.
    pub descend_time: u32,

    /// A climbable surface is at the latest position.
    pub has_climbable: bool,
    /// On a climbable surface and moving vertically.
    pub climbing: bool,

    /// In or on liquid at the latest position.
    pub in_liquid: bool,

    /// Position before the latest update.
    pub from: Vec3,
    /// Position after the latest update.
    pub to: Vec3,
    /// Look yaw at the latest update.
    pub yaw: f32,
    /// Look pitch at the latest update.
    pub pitch: f32,
    /// Clock reading of the latest update.
    pub last_update: u64,
}

impl Default for MovementState {
    fn default() -> Self {
        Self {
            claimed_on_ground: false,
            on_ground: false,
            was_on_ground: false,
            ground_time: 0,
            ground_position: None,
            on_ice: false,
            ice_time: 0,
            off_ice_time: u32::MAX,
            sprinting: false,
            sprint_time: 0,
            sneaking: false,
            sneak_time: 0,
            vertical: 0.0,
            last_vertical: 0.0,
            ascending: false,
            ascend_time: 0,
            descending: false,
            descend_time: 0,
            has_climbable: false,
            climbing: false,
            in_liquid: false,
            from: Vec3::default(),
            to: Vec3::default(),
            yaw: 0.0,
            pitch: 0.0,
            last_update: 0,
        }
    }
}

impl MovementState {
    /// State of a participant standing still at `location`.
    ///
    /// Environment flags are sampled; elapsed-time counters start empty.
    #[must_use]
    pub fn at_rest(env: &Environment<'_>, location: &Location, now: u64) -> Self {
        let position = location.position;
        let on_ground = env.is_grounded_at(position);
        let on_ice = on_ground && env.is_on_ice_at(position);
        Self {
            on_ground,
            was_on_ground: on_ground,
            ground_position: on_ground.then_some(position),
            on_ice,
            off_ice_time: if on_ice { 0 } else { u32::MAX },
            has_climbable: env.has_climbable_at(position),
            in_liquid: env.is_in_liquid_at(position),
            from: position,
            to: position,
            yaw: location.yaw,
            pitch: location.pitch,
            last_update: now,
            ..Self::default()
        }
    }

    /// Recomputes every derived field for one position update.
    ///
    /// Order matters: climbing depends on the ascend/descend flags computed
    /// earlier in the same pass.
    pub fn update(&mut self, env: &Environment<'_>, movement: &Movement, now: u64) {
        let Movement { from, to, .. } = *movement;

        // 1. ground, debounced
        let previous_on_ground = self.on_ground;
        self.on_ground = env.is_grounded_at(to);
        self.was_on_ground = self.on_ground || previous_on_ground;

        // 2. ground time and ice
        if self.on_ground {
            self.ground_time = self.ground_time.saturating_add(1);
            self.ground_position = Some(to);
            self.on_ice = env.is_on_ice_at(to);
        } else {
            self.ground_time = 0;
            self.on_ice = false;
        }
        self.ice_time = bump(self.ice_time, self.on_ice);
        self.off_ice_time = if self.on_ice {
            0
        } else {
            self.off_ice_time.saturating_add(1)
        };

        // 3. sprint / sneak from host flags
        self.sprinting = movement.sprinting;
        self.sprint_time = bump(self.sprint_time, movement.sprinting);
        self.sneaking = movement.sneaking;
        self.sneak_time = bump(self.sneak_time, movement.sneaking);

        // 4. vertical displacement
        self.last_vertical = self.vertical;
        self.vertical = (to.y - from.y).abs();
        self.ascending = to.y > from.y;
        self.descending = to.y < from.y;
        self.ascend_time = bump(self.ascend_time, self.ascending);
        self.descend_time = bump(self.descend_time, self.descending);

        // 5. climbing
        self.has_climbable = env.has_climbable_at(to);
        self.climbing = self.has_climbable && (self.ascending || self.descending);

        // 6. liquid
        self.in_liquid = env.is_in_liquid_at(to);

        self.claimed_on_ground = movement.claimed_on_ground;
        self.from = from;
        self.to = to;
        self.yaw = movement.yaw;
        self.pitch = movement.pitch;
        self.last_update = now;
    }

    /// Horizontal distance covered by the latest update.
    #[must_use]
    pub fn horizontal(&self) -> f64 {
        self.from.horizontal_distance(self.to)
    }
}

fn bump(counter: u32, holds: bool) -> u32 {
    if holds {
        counter.saturating_add(1)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::BlockInfo;
    use crate::testing::GridWorld;
    use warden_shared::BlockPos;

    const FLOOR: f64 = 64.0;

    fn step(state: &mut MovementState, world: &GridWorld, from: Vec3, to: Vec3) {
        state.update(&Environment::new(world), &Movement::walk(from, to), 0);
    }

    #[test]
    fn test_ground_time_counts_and_resets() {
        let world = GridWorld::flat(63);
        let mut state = MovementState::default();
        let mut pos = Vec3::new(0.5, FLOOR, 0.5);

        for _ in 0..5 {
            let next = pos.offset(0.1, 0.0, 0.0);
            step(&mut state, &world, pos, next);
            pos = next;
        }
        assert_eq!(state.ground_time, 5);
        assert!(state.on_ground);

        // One airborne update
        let up = pos.offset(0.0, 1.2, 0.0);
        step(&mut state, &world, pos, up);
        assert_eq!(state.ground_time, 0);
        assert!(!state.on_ground);
        assert!(state.was_on_ground, "single airborne sample is debounced");

        // A second airborne update clears the debounce
        let higher = up.offset(0.0, 0.3, 0.0);
        step(&mut state, &world, up, higher);
        assert!(!state.was_on_ground);
    }

    #[test]
    fn test_vertical_flags() {
        let world = GridWorld::empty();
        let mut state = MovementState::default();
        let a = Vec3::new(0.0, 70.0, 0.0);

        step(&mut state, &world, a, a.offset(0.0, 0.4, 0.0));
        assert!(state.ascending && !state.descending);
        assert_eq!(state.ascend_time, 1);
        assert!((state.vertical - 0.4).abs() < 1e-9);

        step(&mut state, &world, a.offset(0.0, 0.4, 0.0), a.offset(0.0, 0.1, 0.0));
        assert!(state.descending && !state.ascending);
        assert_eq!(state.ascend_time, 0);
        assert_eq!(state.descend_time, 1);
        assert!((state.last_vertical - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_climbing_requires_vertical_motion() {
        let mut world = GridWorld::flat(63);
        world.set(BlockPos::new(0, 64, 0), BlockInfo::CLIMBABLE);
        world.set(BlockPos::new(0, 65, 0), BlockInfo::CLIMBABLE);
        let mut state = MovementState::default();

        let base = Vec3::new(0.5, 64.5, 0.5);
        step(&mut state, &world, base, base);
        assert!(state.has_climbable);
        assert!(!state.climbing);

        step(&mut state, &world, base, base.offset(0.0, 0.2, 0.0));
        assert!(state.climbing);
    }

    #[test]
    fn test_ice_and_off_ice_counters() {
        let mut world = GridWorld::flat(63);
        world.set(BlockPos::new(0, 63, 0), BlockInfo::ICE);
        let mut state = MovementState::default();

        let on_ice = Vec3::new(0.5, FLOOR, 0.5);
        step(&mut state, &world, on_ice, on_ice);
        step(&mut state, &world, on_ice, on_ice);
        assert!(state.on_ice);
        assert_eq!(state.ice_time, 2);
        assert_eq!(state.off_ice_time, 0);

        let off_ice = Vec3::new(5.5, FLOOR, 5.5);
        step(&mut state, &world, on_ice, off_ice);
        assert!(!state.on_ice);
        assert_eq!(state.ice_time, 0);
        assert_eq!(state.off_ice_time, 1);
    }

    #[test]
    fn test_fresh_state_has_no_ice_allowance() {
        let state = MovementState::default();
        assert!(!state.on_ice);
        assert_eq!(state.off_ice_time, u32::MAX);
    }

    #[test]
    fn test_airborne_updates_leave_ice_behind() {
        let mut world = GridWorld::flat(63);
        world.set(BlockPos::new(0, 63, 0), BlockInfo::ICE);
        let mut state = MovementState::default();

        let on_ice = Vec3::new(0.5, FLOOR, 0.5);
        step(&mut state, &world, on_ice, on_ice);
        assert!(state.on_ice);

        let mut pos = on_ice.offset(0.0, 1.5, 0.0);
        step(&mut state, &world, on_ice, pos);
        assert!(!state.on_ice);
        assert_eq!(state.off_ice_time, 1);

        for _ in 0..20 {
            let next = pos.offset(0.6, 0.0, 0.0);
            step(&mut state, &world, pos, next);
            pos = next;
        }
        assert_eq!(state.off_ice_time, 21);
        assert_eq!(state.ice_time, 0);
    }

    #[test]
    fn test_at_rest_samples_join_location() {
        let world = GridWorld::flat(63);
        let spawn = Location::at(Vec3::new(3.5, FLOOR, 7.5)).looking(90.0, 10.0);
        let state = MovementState::at_rest(&Environment::new(&world), &spawn, 42);

        assert_eq!(state.to, spawn.position);
        assert_eq!(state.from, spawn.position);
        assert!(state.on_ground && state.was_on_ground);
        assert_eq!(state.ground_position, Some(spawn.position));
        assert_eq!(state.ground_time, 0);
        assert_eq!(state.off_ice_time, u32::MAX);
        assert!((state.yaw - 90.0).abs() < f32::EPSILON);
        assert_eq!(state.last_update, 42);
    }

    #[test]
    fn test_sprint_and_sneak_follow_host_flags() {
        let world = GridWorld::flat(63);
        let mut state = MovementState::default();
        let env = Environment::new(&world);
        let pos = Vec3::new(0.5, FLOOR, 0.5);

        let mut movement = Movement::walk(pos, pos);
        movement.sprinting = true;
        state.update(&env, &movement, 10);
        state.update(&env, &movement, 20);
        assert_eq!(state.sprint_time, 2);
        assert_eq!(state.last_update, 20);

        movement.sprinting = false;
        movement.sneaking = true;
        state.update(&env, &movement, 30);
        assert_eq!(state.sprint_time, 0);
        assert_eq!(state.sneak_time, 1);
    }

    #[test]
    fn test_liquid_flag() {
        let mut world = GridWorld::flat(63);
        world.set(BlockPos::new(3, 64, 3), BlockInfo::LIQUID);
        let mut state = MovementState::default();
        let pos = Vec3::new(3.5, 64.2, 3.5);
        step(&mut state, &world, pos, pos);
        assert!(state.in_liquid);
    }
}
