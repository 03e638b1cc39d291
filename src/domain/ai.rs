/// Enemy driving.
///
/// The simulation never decides where an enemy goes. Each tick it hands
/// every enemy hull to an `EnemyDriver`, after the collision passes and
/// before the movement update, so the driver sees this tick's blocked
/// status. Steering happens directly on the hull; firing comes back as
/// intent because the shell parameters belong to the caller.
///
/// `PatrolDriver` is the stock driver: a seeded PCG stream rolls a new
/// heading on a fixed cadence, or immediately when the hull is blocked,
/// with a bias toward rolling down-map. Same seed, same patrol.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::domain::entity::{Direction, Enemy};

/// Milliseconds between voluntary heading changes.
pub const TURN_EVERY_MS: u32 = 1400;
/// Milliseconds between trigger pulls.
pub const FIRE_EVERY_MS: u32 = 900;

pub trait EnemyDriver {
    /// Steer `enemy` for this tick. Returns true when the driver wants
    /// the cannon fired.
    fn drive(&mut self, enemy: &mut Enemy, dt: u32) -> bool;
}

pub struct PatrolDriver {
    rng: Pcg32,
}

impl PatrolDriver {
    pub fn new(seed: u64) -> Self {
        PatrolDriver {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    fn roll_heading(&mut self) -> Direction {
        match self.rng.random_range(0..6) {
            0 | 1 | 2 => Direction::Down,
            3 => Direction::Left,
            4 => Direction::Right,
            _ => Direction::Up,
        }
    }
}

impl EnemyDriver for PatrolDriver {
    fn drive(&mut self, enemy: &mut Enemy, dt: u32) -> bool {
        if enemy.tank.to_erase {
            return false;
        }
        enemy.turn_ms += dt;
        enemy.fire_ms += dt;

        // A fresh hull sits at speed zero until its first steer.
        if enemy.tank.stop || enemy.tank.speed <= 0.0 || enemy.turn_ms >= TURN_EVERY_MS {
            let dir = self.roll_heading();
            enemy.tank.steer(dir);
            enemy.turn_ms = 0;
        }

        if enemy.fire_ms >= FIRE_EVERY_MS {
            enemy.fire_ms = 0;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::TankKind;

    fn enemy() -> Enemy {
        Enemy::new(TankKind::TierA, 64, 64, 32, 32, 0.08)
    }

    #[test]
    fn fresh_hull_gets_steered_into_motion() {
        let mut d = PatrolDriver::new(7);
        let mut e = enemy();
        assert_eq!(e.tank.speed, 0.0);
        d.drive(&mut e, 16);
        assert_eq!(e.tank.speed, 0.08);
    }

    #[test]
    fn blocked_hull_rolls_a_new_heading_at_once() {
        let mut d = PatrolDriver::new(7);
        let mut e = enemy();
        d.drive(&mut e, 16);
        e.turn_ms = 500;
        e.tank.stop = true;
        d.drive(&mut e, 16);
        assert_eq!(e.turn_ms, 0, "turn timer restarts on the forced roll");
    }

    #[test]
    fn heading_holds_between_cadence_points() {
        let mut d = PatrolDriver::new(7);
        let mut e = enemy();
        d.drive(&mut e, 16);
        let dir = e.tank.dir;
        d.drive(&mut e, 16);
        assert_eq!(e.tank.dir, dir);
        assert_eq!(e.turn_ms, 16);
    }

    #[test]
    fn trigger_cadence() {
        let mut d = PatrolDriver::new(7);
        let mut e = enemy();
        assert!(!d.drive(&mut e, 16));
        assert!(d.drive(&mut e, FIRE_EVERY_MS));
        assert!(!d.drive(&mut e, 16), "timer restarted after the pull");
    }

    #[test]
    fn erased_hull_is_left_alone() {
        let mut d = PatrolDriver::new(7);
        let mut e = enemy();
        e.tank.destroy();
        assert!(!d.drive(&mut e, 5000));
        assert_eq!(e.turn_ms, 0);
        assert_eq!(e.tank.speed, 0.0);
    }

    #[test]
    fn same_seed_same_patrol() {
        let mut d1 = PatrolDriver::new(99);
        let mut d2 = PatrolDriver::new(99);
        let mut e1 = enemy();
        let mut e2 = enemy();
        for _ in 0..32 {
            d1.drive(&mut e1, TURN_EVERY_MS);
            d2.drive(&mut e2, TURN_EVERY_MS);
            assert_eq!(e1.tank.dir, e2.tank.dir);
        }
    }
}
