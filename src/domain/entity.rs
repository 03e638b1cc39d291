/// Tanks, bullets, and the eagle.
///
/// Movement units are map pixels. Positions are f32 so sub-pixel motion
/// accumulates across ticks; collision rectangles hold the truncated
/// integer footprint the scan math in physics.rs works on.

use crate::config::PlayerKeys;
use crate::domain::physics::Rect;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// Unit step in map coordinates (y grows downward).
    pub fn step(self) -> (f32, f32) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Right => (1.0, 0.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TankKind {
    Player1,
    Player2,
    TierA,
    TierB,
    TierC,
    TierD,
}

impl TankKind {
    pub fn is_player(self) -> bool {
        matches!(self, TankKind::Player1 | TankKind::Player2)
    }

    /// Hull toughness by tier. Kept as roster data; pair resolution is
    /// one-shot and does not consult it.
    #[allow(dead_code)]
    pub fn armor_tier(self) -> u8 {
        match self {
            TankKind::TierC => 2,
            TankKind::TierD => 4,
            _ => 1,
        }
    }

    /// Points awarded when a player bullet downs this hull.
    pub fn score_value(self) -> u32 {
        match self {
            TankKind::TierA => 100,
            TankKind::TierB => 200,
            TankKind::TierC => 300,
            TankKind::TierD => 400,
            _ => 0,
        }
    }
}

/// In-flight shell. Direction is locked at creation; `collided` excludes it
/// from further resolution within the tick, `to_erase` drops it at the
/// owning tank's next update.
#[derive(Clone, Debug)]
pub struct Bullet {
    pub pos_x: f32,
    pub pos_y: f32,
    pub dir: Direction,
    pub speed: f32,
    pub rect: Rect,
    pub collided: bool,
    pub increased_damage: bool,
    pub to_erase: bool,
}

impl Bullet {
    pub fn new(x: f32, y: f32, dir: Direction, speed: f32, w: i32, h: i32) -> Self {
        Bullet {
            pos_x: x,
            pos_y: y,
            dir,
            speed,
            rect: Rect::new(x as i32, y as i32, w, h),
            collided: false,
            increased_damage: false,
            to_erase: false,
        }
    }

    /// Advance along the locked direction and sync the rectangle.
    pub fn update(&mut self, dt: u32) {
        let (dx, dy) = self.dir.step();
        let dist = self.speed * dt as f32;
        self.pos_x += dx * dist;
        self.pos_y += dy * dist;
        self.rect.x = self.pos_x as i32;
        self.rect.y = self.pos_y as i32;
    }

    /// Consume the shell: no further resolution this tick, gone at the
    /// next prune.
    pub fn destroy(&mut self) {
        self.collided = true;
        self.to_erase = true;
    }
}

/// A hull on the field. `stop` and `on_ice` are per-tick statuses: the
/// collision passes derive them, `update` consumes and clears them.
#[derive(Clone, Debug)]
pub struct Tank {
    pub kind: TankKind,
    pub pos_x: f32,
    pub pos_y: f32,
    pub dir: Direction,
    pub speed: f32,
    pub default_speed: f32,
    pub rect: Rect,
    pub bullet: Option<Bullet>,
    pub damage_tier: u8,
    pub stop: bool,
    pub on_ice: bool,
    pub to_erase: bool,
}

impl Tank {
    pub fn new(kind: TankKind, x: i32, y: i32, w: i32, h: i32, default_speed: f32) -> Self {
        Tank {
            kind,
            pos_x: x as f32,
            pos_y: y as f32,
            dir: Direction::Up,
            speed: 0.0,
            default_speed,
            rect: Rect::new(x, y, w, h),
            bullet: None,
            damage_tier: 0,
            stop: false,
            on_ice: false,
            to_erase: false,
        }
    }

    /// Directional input: point the hull and reset to cruising speed.
    pub fn steer(&mut self, dir: Direction) {
        self.dir = dir;
        self.speed = self.default_speed;
    }

    /// Rectangle after advancing `speed × dt` along the current direction.
    pub fn projected_rect(&self, dt: u32) -> Rect {
        let (dx, dy) = self.dir.step();
        let dist = self.speed * dt as f32;
        Rect::new(
            (self.pos_x + dx * dist) as i32,
            (self.pos_y + dy * dist) as i32,
            self.rect.w,
            self.rect.h,
        )
    }

    /// Collision handler: flags the hull blocked when the overlap sits on
    /// the leading side for its current direction. Wide overlaps gate
    /// vertical motion, tall ones horizontal.
    pub fn collide(&mut self, overlap: Rect) {
        if overlap.w > overlap.h {
            if self.dir == Direction::Up && overlap.y <= self.rect.y
                || self.dir == Direction::Down && overlap.bottom() >= self.rect.bottom()
            {
                self.stop = true;
            }
        } else if self.dir == Direction::Left && overlap.x <= self.rect.x
            || self.dir == Direction::Right && overlap.right() >= self.rect.right()
        {
            self.stop = true;
        }
    }

    /// One simulation step. Erased hulls are inert; a blocked hull holds
    /// position. Consumes the blocked status, then runs the owned bullet's
    /// lifecycle (dropping it once flagged). Slide status is left for the
    /// next grid pass to re-derive, so it stays readable between ticks.
    pub fn update(&mut self, dt: u32) {
        if self.to_erase {
            return;
        }
        if !self.stop && self.speed > 0.0 {
            let (dx, dy) = self.dir.step();
            let dist = self.speed * dt as f32;
            self.pos_x += dx * dist;
            self.pos_y += dy * dist;
            self.rect.x = self.pos_x as i32;
            self.rect.y = self.pos_y as i32;
        }
        self.stop = false;
        if let Some(b) = &mut self.bullet {
            if b.to_erase {
                self.bullet = None;
            } else {
                b.update(dt);
            }
        }
    }

    /// Fire the cannon: one shell at the muzzle midpoint, only when none
    /// is in flight. Damage tier 3+ makes the shell pierce terrain.
    pub fn fire(&mut self, speed: f32, w: i32, h: i32) {
        if self.bullet.is_some() {
            return;
        }
        let (bx, by) = match self.dir {
            Direction::Up => (self.pos_x + (self.rect.w - w) as f32 / 2.0, self.pos_y),
            Direction::Down => (
                self.pos_x + (self.rect.w - w) as f32 / 2.0,
                self.pos_y + (self.rect.h - h) as f32,
            ),
            Direction::Left => (self.pos_x, self.pos_y + (self.rect.h - h) as f32 / 2.0),
            Direction::Right => (
                self.pos_x + (self.rect.w - w) as f32,
                self.pos_y + (self.rect.h - h) as f32 / 2.0,
            ),
        };
        let mut shell = Bullet::new(bx, by, self.dir, speed, w, h);
        shell.increased_damage = self.damage_tier >= 3;
        self.bullet = Some(shell);
    }

    /// Mark for removal at the next prune pass.
    pub fn destroy(&mut self) {
        self.to_erase = true;
    }
}

/// A player-controlled tank: key binding, spawn anchor, respawn stock.
#[derive(Clone, Debug)]
pub struct Player {
    pub tank: Tank,
    pub keys: PlayerKeys,
    pub spawn_x: i32,
    pub spawn_y: i32,
    pub respawns: u32,
}

impl Player {
    pub fn new(
        kind: TankKind,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        speed: f32,
        keys: PlayerKeys,
        respawns: u32,
    ) -> Self {
        Player {
            tank: Tank::new(kind, x, y, w, h, speed),
            keys,
            spawn_x: x,
            spawn_y: y,
            respawns,
        }
    }

    /// Back on the spawn point, idle, facing up, cannon cleared. Keeps the
    /// kind and the respawn stock.
    pub fn respawn(&mut self) {
        self.tank.pos_x = self.spawn_x as f32;
        self.tank.pos_y = self.spawn_y as f32;
        self.tank.rect.x = self.spawn_x;
        self.tank.rect.y = self.spawn_y;
        self.tank.dir = Direction::Up;
        self.tank.speed = 0.0;
        self.tank.stop = false;
        self.tank.on_ice = false;
        self.tank.bullet = None;
    }

    /// A hit consumes one respawn, or eliminates the player once the
    /// stock is empty.
    pub fn take_hit(&mut self) {
        if self.respawns > 0 {
            self.respawns -= 1;
            self.respawn();
        } else {
            self.tank.destroy();
        }
    }
}

/// An AI-driven tank: tier plus the decision timers the driver counts down.
#[derive(Clone, Debug)]
pub struct Enemy {
    pub tank: Tank,
    pub turn_ms: u32,
    pub fire_ms: u32,
}

impl Enemy {
    pub fn new(kind: TankKind, x: i32, y: i32, w: i32, h: i32, speed: f32) -> Self {
        Enemy {
            tank: Tank::new(kind, x, y, w, h, speed),
            turn_ms: 0,
            fire_ms: 0,
        }
    }
}

/// The defended base. One per session; its fall starts game-over.
#[derive(Clone, Debug)]
pub struct Eagle {
    pub rect: Rect,
    pub destroyed: bool,
}

impl Eagle {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Eagle {
            rect: Rect::new(x, y, w, h),
            destroyed: false,
        }
    }

    pub fn destroy(&mut self) {
        self.destroyed = true;
    }
}
