/// Session: the complete snapshot of a running game.
///
/// ## Phase machine
///
///   StageIntro → Playing → GameOver → Finished
///
/// `StageIntro` holds the simulation while the stage banner shows.
/// `GameOver` keeps simulating (hulls still roll and shoot) while the
/// banner scrolls up from the bottom edge; `Finished` is terminal and
/// the caller swaps in a fresh session.
///
/// Stages number 1 through `STAGE_COUNT` and wrap in both directions.
/// Moving to another stage rebuilds both rosters from the spawn tables;
/// only the score carries over.

use crate::config::GameConfig;
use crate::domain::entity::{Eagle, Enemy, Player, TankKind};
use crate::domain::tile::{Grid, Terrain};
use crate::sim::level;

pub const STAGE_COUNT: i32 = 35;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    StageIntro,
    Playing,
    GameOver,
    Finished,
}

pub struct Session {
    // ── Arena ──
    pub grid: Grid,
    pub bushes: Vec<Terrain>,
    pub eagle: Eagle,

    // ── Rosters ──
    pub players: Vec<Player>,
    pub enemies: Vec<Enemy>,

    // ── Meta ──
    pub phase: Phase,
    pub stage: u32,
    pub score: u32,
    /// Time spent on the stage banner so far.
    pub intro_ms: u32,
    /// Top edge of the scrolling game-over banner, in map pixels.
    pub game_over_y: f32,

    pub cfg: GameConfig,
}

impl Session {
    /// A fresh session: stage 1, empty score, banner timer at zero.
    pub fn new(cfg: GameConfig) -> Self {
        let mut session = Session {
            grid: Grid::empty(),
            bushes: Vec::new(),
            eagle: Eagle::new(0, 0, 0, 0),
            players: Vec::new(),
            enemies: Vec::new(),
            phase: Phase::StageIntro,
            stage: 0,
            score: 0,
            intro_ms: 0,
            game_over_y: 0.0,
            cfg,
        };
        session.next_stage();
        session
    }

    /// Advance to the following stage; 35 wraps to 1.
    pub fn next_stage(&mut self) {
        self.stage = wrap_stage(self.stage as i32 + 1);
        self.start_stage();
    }

    /// Debug rewind by two stages; 1 wraps back to 34, 2 to 35.
    pub fn back_two(&mut self) {
        self.stage = wrap_stage(self.stage as i32 - 2);
        self.start_stage();
    }

    /// Load the stage descriptor and rebuild the field. Both rosters are
    /// recreated from the spawn tables with a full respawn stock; the
    /// score is the only thing that survives a stage change.
    fn start_stage(&mut self) {
        let parsed = level::load(self.stage, &self.cfg);
        self.grid = parsed.grid;
        self.bushes = parsed.bushes;
        self.eagle = parsed.eagle;

        self.phase = Phase::StageIntro;
        self.intro_ms = 0;
        self.game_over_y = self.cfg.map.height as f32;

        let m = self.cfg.map;
        let tank_speed = self.cfg.speed.tank;
        let respawns = self.cfg.session.player_respawns;
        let keys = self.cfg.keys;
        let player_spawns = self.cfg.session.player_spawns.clone();
        let enemy_spawns = self.cfg.session.enemy_spawns.clone();

        self.players.clear();
        for (i, kind) in [TankKind::Player1, TankKind::Player2].into_iter().enumerate() {
            if let Some(&[x, y]) = player_spawns.get(i) {
                self.players.push(Player::new(
                    kind, x, y, m.tank_w, m.tank_h, tank_speed, keys[i], respawns,
                ));
            }
        }

        self.enemies.clear();
        for (i, kind) in [TankKind::TierA, TankKind::TierC, TankKind::TierB].into_iter().enumerate() {
            if let Some(&[x, y]) = enemy_spawns.get(i) {
                self.enemies
                    .push(Enemy::new(kind, x, y, m.tank_w, m.tank_h, tank_speed));
            }
        }
    }

    /// Drop one more enemy onto the field, outside the spawn rotation.
    pub fn spawn_enemy(&mut self, kind: TankKind, x: i32, y: i32) {
        let m = self.cfg.map;
        self.enemies
            .push(Enemy::new(kind, x, y, m.tank_w, m.tank_h, self.cfg.speed.tank));
    }
}

/// Map any offset onto the 1..=35 stage cycle.
fn wrap_stage(n: i32) -> u32 {
    ((n - 1).rem_euclid(STAGE_COUNT) + 1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cfg() -> GameConfig {
        let mut cfg = GameConfig::default();
        // point at nothing so every stage loads as an open map
        cfg.levels_dir = std::env::temp_dir().join("steelgrid-no-such-levels");
        cfg
    }

    #[test]
    fn fresh_session_opens_stage_one() {
        let s = Session::new(test_cfg());
        assert_eq!(s.stage, 1);
        assert_eq!(s.phase, Phase::StageIntro);
        assert_eq!(s.intro_ms, 0);
        assert_eq!(s.score, 0);
    }

    #[test]
    fn stage_rosters_are_rebuilt() {
        let s = Session::new(test_cfg());
        assert_eq!(s.players.len(), 2);
        assert_eq!(s.players[0].tank.kind, TankKind::Player1);
        assert_eq!(s.players[1].tank.kind, TankKind::Player2);
        assert_eq!(s.players[0].respawns, 3);

        let kinds: Vec<TankKind> = s.enemies.iter().map(|e| e.tank.kind).collect();
        assert_eq!(kinds, vec![TankKind::TierA, TankKind::TierC, TankKind::TierB]);
    }

    #[test]
    fn stages_wrap_forward() {
        let mut s = Session::new(test_cfg());
        for _ in 0..34 {
            s.next_stage();
        }
        assert_eq!(s.stage, 35);
        s.next_stage();
        assert_eq!(s.stage, 1);
    }

    #[test]
    fn rewind_wraps_backward() {
        let mut s = Session::new(test_cfg());
        s.back_two();
        assert_eq!(s.stage, 34);

        let mut s = Session::new(test_cfg());
        s.next_stage(); // stage 2
        s.back_two();
        assert_eq!(s.stage, 35);
    }

    #[test]
    fn score_survives_a_stage_change() {
        let mut s = Session::new(test_cfg());
        s.score = 700;
        s.players[0].respawns = 0;
        s.next_stage();
        assert_eq!(s.score, 700);
        // the respawn stock does not
        assert_eq!(s.players[0].respawns, 3);
    }

    #[test]
    fn banner_starts_at_the_bottom_edge() {
        let s = Session::new(test_cfg());
        assert_eq!(s.game_over_y, 416.0);
    }

    #[test]
    fn debug_spawn_joins_the_roster() {
        let mut s = Session::new(test_cfg());
        s.spawn_enemy(TankKind::TierD, 150, 1);
        assert_eq!(s.enemies.len(), 4);
        assert_eq!(s.enemies[3].tank.kind, TankKind::TierD);
        assert_eq!(s.enemies[3].tank.rect.x, 150);
    }
}
