/// The step function: advances a session by one fixed tick.
///
/// Processing order inside a simulating tick:
///   1. Hull blocking within each roster
///   2. Shells against terrain and the eagle (enemy shells first)
///   3. Player against enemy: hulls, player shells, shell trades
///   4. Enemy shells against players
///   5. Hulls against terrain and bounds (enemies first)
///   6. Enemy drivers
///   7. Movement updates
///   8. Prune, abandonment check, banner scroll
///
/// The passes run in both `Playing` and `GameOver`: the field stays live
/// while the banner scrolls. A tick longer than `MAX_TICK_MS` is
/// discarded whole so a stall cannot shove anything through a wall.

use crossterm::event::KeyCode;

use crate::domain::ai::EnemyDriver;
use crate::domain::entity::{Direction, TankKind};
use crate::domain::physics;
use super::event::GameEvent;
use super::session::{Phase, Session};

/// Longest tick the simulation will integrate, in milliseconds.
pub const MAX_TICK_MS: u32 = 40;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn update(session: &mut Session, dt: u32, driver: &mut dyn EnemyDriver) -> Vec<GameEvent> {
    if dt > MAX_TICK_MS {
        return vec![];
    }

    match session.phase {
        Phase::StageIntro => {
            let mut events = vec![];
            // Strictly greater: the banner holds for the full intro time.
            if session.intro_ms > session.cfg.session.stage_intro_ms {
                session.phase = Phase::Playing;
                events.push(GameEvent::StageStarted {
                    stage: session.stage,
                });
            }
            session.intro_ms += dt;
            events
        }
        Phase::Finished => vec![],
        Phase::Playing | Phase::GameOver => sim_tick(session, dt, driver),
    }
}

// ══════════════════════════════════════════════════════════════
// Simulation tick
// ══════════════════════════════════════════════════════════════

fn sim_tick(session: &mut Session, dt: u32, driver: &mut dyn EnemyDriver) -> Vec<GameEvent> {
    let mut events = Vec::new();
    let m = session.cfg.map;

    // ── 1. Hull blocking within each roster ──
    for i in 0..session.players.len() {
        let (head, tail) = session.players.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail {
            physics::tank_vs_tank(&mut a.tank, &mut b.tank, dt);
        }
    }
    for i in 0..session.enemies.len() {
        let (head, tail) = session.enemies.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail {
            physics::tank_vs_tank(&mut a.tank, &mut b.tank, dt);
        }
    }

    // ── 2. Shells against terrain and the eagle, enemy shells first ──
    let game_over = session.phase == Phase::GameOver;
    let mut eagle_fell = false;
    for enemy in &mut session.enemies {
        if let Some(shell) = &mut enemy.tank.bullet {
            eagle_fell |= physics::bullet_vs_grid(
                shell,
                &mut session.grid,
                &mut session.eagle,
                game_over,
                m.tile_w,
                m.tile_h,
                m.width,
                m.height,
            );
        }
    }
    for player in &mut session.players {
        if let Some(shell) = &mut player.tank.bullet {
            eagle_fell |= physics::bullet_vs_grid(
                shell,
                &mut session.grid,
                &mut session.eagle,
                game_over,
                m.tile_w,
                m.tile_h,
                m.width,
                m.height,
            );
        }
    }
    if eagle_fell {
        start_game_over(session, &mut events);
    }

    // ── 3. Player against enemy ──
    for player in &mut session.players {
        for enemy in &mut session.enemies {
            physics::tank_vs_tank(&mut player.tank, &mut enemy.tank, dt);

            if let Some(shell) = &mut player.tank.bullet {
                if physics::bullet_vs_tank(shell, &enemy.tank) {
                    enemy.tank.destroy();
                    let kind = enemy.tank.kind;
                    let points = kind.score_value();
                    session.score += points;
                    events.push(GameEvent::EnemyDestroyed { kind, points });
                }
            }
            if let (Some(ps), Some(es)) = (&mut player.tank.bullet, &mut enemy.tank.bullet) {
                physics::bullet_vs_bullet(ps, es);
            }
        }
    }

    // ── 4. Enemy shells against players ──
    for enemy in &mut session.enemies {
        for player in &mut session.players {
            if let Some(shell) = &mut enemy.tank.bullet {
                if physics::bullet_vs_tank(shell, &player.tank) {
                    player.take_hit();
                    events.push(if player.tank.to_erase {
                        GameEvent::PlayerEliminated
                    } else {
                        GameEvent::PlayerRespawned
                    });
                }
            }
        }
    }

    // ── 5. Hulls against terrain and bounds, enemies first ──
    for enemy in &mut session.enemies {
        physics::tank_vs_grid(
            &mut enemy.tank,
            &session.grid,
            &session.eagle,
            dt,
            m.tile_w,
            m.tile_h,
            m.width,
            m.height,
        );
    }
    for player in &mut session.players {
        physics::tank_vs_grid(
            &mut player.tank,
            &session.grid,
            &session.eagle,
            dt,
            m.tile_w,
            m.tile_h,
            m.width,
            m.height,
        );
    }

    // ── 6. Enemy drivers (they see this tick's blocked status) ──
    let shell_speed = session.cfg.speed.bullet;
    for enemy in &mut session.enemies {
        if driver.drive(enemy, dt) {
            enemy.tank.fire(shell_speed, m.bullet_w, m.bullet_h);
        }
    }

    // ── 7. Movement updates ──
    for enemy in &mut session.enemies {
        enemy.tank.update(dt);
    }
    for player in &mut session.players {
        player.tank.update(dt);
    }

    // ── 8. Prune, abandonment, banner scroll ──
    session.enemies.retain(|e| !e.tank.to_erase);
    session.players.retain(|p| !p.tank.to_erase);

    // An abandoned base is a lost base.
    if session.players.is_empty() && session.phase != Phase::GameOver {
        session.eagle.destroy();
        start_game_over(session, &mut events);
    }

    if session.phase == Phase::GameOver {
        if session.game_over_y < 10.0 {
            session.phase = Phase::Finished;
        } else {
            session.game_over_y -= session.cfg.speed.game_over_scroll * dt as f32;
        }
    }

    events
}

/// Flip into game-over: banner at the bottom edge, one `EagleFell`.
fn start_game_over(session: &mut Session, events: &mut Vec<GameEvent>) {
    session.phase = Phase::GameOver;
    session.game_over_y = session.cfg.map.height as f32;
    events.push(GameEvent::EagleFell);
}

// ══════════════════════════════════════════════════════════════
// Key handling
// ══════════════════════════════════════════════════════════════

/// Route one pressed key: player steering and fire by each player's own
/// binding, then the debug keys. Dead squad, dead input.
pub fn key_down(session: &mut Session, key: KeyCode) -> Option<GameEvent> {
    if session.players.is_empty() {
        return None;
    }

    let shell_speed = session.cfg.speed.bullet;
    let (bw, bh) = (session.cfg.map.bullet_w, session.cfg.map.bullet_h);
    for player in &mut session.players {
        let keys = player.keys;
        if key == keys.up {
            player.tank.steer(Direction::Up);
        } else if key == keys.down {
            player.tank.steer(Direction::Down);
        } else if key == keys.left {
            player.tank.steer(Direction::Left);
        } else if key == keys.right {
            player.tank.steer(Direction::Right);
        } else if key == keys.fire {
            player.tank.fire(shell_speed, bw, bh);
        }
    }

    match key {
        KeyCode::Char('r') => {
            // free recall for player one, stock untouched
            if let Some(p) = session.players.first_mut() {
                p.respawn();
            }
            None
        }
        KeyCode::Char('n') => {
            session.next_stage();
            Some(GameEvent::StageSwitched {
                stage: session.stage,
            })
        }
        KeyCode::Char('b') => {
            session.back_two();
            Some(GameEvent::StageSwitched {
                stage: session.stage,
            })
        }
        KeyCode::Char('1') => debug_spawn(session, TankKind::TierA, 1),
        KeyCode::Char('2') => debug_spawn(session, TankKind::TierB, 50),
        KeyCode::Char('3') => debug_spawn(session, TankKind::TierC, 100),
        KeyCode::Char('4') => debug_spawn(session, TankKind::TierD, 150),
        _ => None,
    }
}

fn debug_spawn(session: &mut Session, kind: TankKind, x: i32) -> Option<GameEvent> {
    session.spawn_enemy(kind, x, 1);
    Some(GameEvent::EnemySpawned { kind, x, y: 1 })
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::{Bullet, Eagle, Enemy};

    struct IdleDriver;

    impl EnemyDriver for IdleDriver {
        fn drive(&mut self, _enemy: &mut Enemy, _dt: u32) -> bool {
            false
        }
    }

    fn test_cfg() -> GameConfig {
        let mut cfg = GameConfig::default();
        cfg.levels_dir = std::env::temp_dir().join("steelgrid-no-such-levels");
        cfg
    }

    fn playing_session() -> Session {
        let mut s = Session::new(test_cfg());
        s.phase = Phase::Playing;
        s
    }

    #[test]
    fn long_tick_is_discarded_whole() {
        let mut s = Session::new(test_cfg());
        let events = update(&mut s, 41, &mut IdleDriver);
        assert!(events.is_empty());
        assert_eq!(s.intro_ms, 0);

        // 40 ms sits exactly on the limit and still counts
        update(&mut s, 40, &mut IdleDriver);
        assert_eq!(s.intro_ms, 40);
    }

    #[test]
    fn intro_holds_then_opens_play() {
        let mut s = Session::new(test_cfg());
        for _ in 0..51 {
            assert!(update(&mut s, 40, &mut IdleDriver).is_empty());
        }
        // 2040 ms accumulated; the check has only seen 2000 so far
        assert_eq!(s.phase, Phase::StageIntro);

        let events = update(&mut s, 40, &mut IdleDriver);
        assert_eq!(s.phase, Phase::Playing);
        assert!(matches!(events[0], GameEvent::StageStarted { stage: 1 }));
    }

    #[test]
    fn intro_freezes_the_field() {
        let mut s = Session::new(test_cfg());
        s.enemies[0].tank.steer(Direction::Right);
        let x0 = s.enemies[0].tank.rect.x;
        update(&mut s, 40, &mut IdleDriver);
        assert_eq!(s.enemies[0].tank.rect.x, x0);
    }

    #[test]
    fn players_steer_by_their_own_keys() {
        let mut s = playing_session();
        key_down(&mut s, KeyCode::Left);
        assert_eq!(s.players[0].tank.dir, Direction::Left);
        assert!(s.players[0].tank.speed > 0.0);
        // player two's hull never moved
        assert_eq!(s.players[1].tank.speed, 0.0);

        key_down(&mut s, KeyCode::Char('a'));
        assert_eq!(s.players[1].tank.dir, Direction::Left);
        assert!(s.players[1].tank.speed > 0.0);
    }

    #[test]
    fn fire_keys_raise_one_shell_each() {
        let mut s = playing_session();
        key_down(&mut s, KeyCode::Char(' '));
        assert!(s.players[0].tank.bullet.is_some());
        assert!(s.players[1].tank.bullet.is_none());

        key_down(&mut s, KeyCode::Char('f'));
        assert!(s.players[1].tank.bullet.is_some());
    }

    #[test]
    fn input_dies_with_the_squad() {
        let mut s = playing_session();
        s.players.clear();
        let stage = s.stage;
        assert!(key_down(&mut s, KeyCode::Char('n')).is_none());
        assert_eq!(s.stage, stage);
    }

    #[test]
    fn stage_keys_switch_stages() {
        let mut s = playing_session();
        let ev = key_down(&mut s, KeyCode::Char('n'));
        assert_eq!(s.stage, 2);
        assert!(matches!(ev, Some(GameEvent::StageSwitched { stage: 2 })));
        assert_eq!(s.phase, Phase::StageIntro);

        let ev = key_down(&mut s, KeyCode::Char('b'));
        assert_eq!(s.stage, 35);
        assert!(matches!(ev, Some(GameEvent::StageSwitched { stage: 35 })));
    }

    #[test]
    fn debug_keys_drop_enemies() {
        let mut s = playing_session();
        let ev = key_down(&mut s, KeyCode::Char('4'));
        assert_eq!(s.enemies.len(), 4);
        let e = s.enemies.last().unwrap();
        assert_eq!(e.tank.kind, TankKind::TierD);
        assert_eq!(e.tank.rect.x, 150);
        assert!(matches!(
            ev,
            Some(GameEvent::EnemySpawned {
                kind: TankKind::TierD,
                ..
            })
        ));
    }

    #[test]
    fn respawn_key_recalls_player_one() {
        let mut s = playing_session();
        s.players[0].tank.pos_x = 50.0;
        s.players[0].tank.rect.x = 50;
        key_down(&mut s, KeyCode::Char('r'));
        assert_eq!(s.players[0].tank.rect.x, 128);
        // free of charge
        assert_eq!(s.players[0].respawns, 3);
    }

    #[test]
    fn player_shell_downs_an_enemy_and_scores() {
        let mut s = playing_session();
        s.spawn_enemy(TankKind::TierA, 72, 50);
        s.players[0].tank.bullet = Some(Bullet::new(80.0, 60.0, Direction::Up, 0.23, 8, 8));

        let events = update(&mut s, 16, &mut IdleDriver);

        assert_eq!(s.score, 100);
        // the staged target is gone, the stock three remain
        assert_eq!(s.enemies.len(), 3);
        // the shell burned on the hull and the cannon is free again
        assert!(s.players[0].tank.bullet.is_none());
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::EnemyDestroyed {
                kind: TankKind::TierA,
                points: 100,
            }
        )));
    }

    #[test]
    fn enemy_shell_costs_a_respawn() {
        let mut s = playing_session();
        s.spawn_enemy(TankKind::TierB, 128, 356);
        let e = s.enemies.last_mut().unwrap();
        e.tank.steer(Direction::Down);
        e.tank.fire(0.23, 8, 8);

        let events = update(&mut s, 16, &mut IdleDriver);

        assert_eq!(s.players[0].respawns, 2);
        assert_eq!(s.players.len(), 2);
        assert!(events.iter().any(|e| matches!(e, GameEvent::PlayerRespawned)));
    }

    #[test]
    fn spent_stock_means_elimination() {
        let mut s = playing_session();
        s.players[0].respawns = 0;
        s.spawn_enemy(TankKind::TierB, 128, 356);
        let e = s.enemies.last_mut().unwrap();
        e.tank.steer(Direction::Down);
        e.tank.fire(0.23, 8, 8);

        let events = update(&mut s, 16, &mut IdleDriver);

        assert_eq!(s.players.len(), 1);
        assert_eq!(s.players[0].tank.kind, TankKind::Player2);
        assert!(events.iter().any(|e| matches!(e, GameEvent::PlayerEliminated)));
        // one player still fields, so no game over yet
        assert_eq!(s.phase, Phase::Playing);
    }

    #[test]
    fn felled_eagle_starts_the_banner() {
        let mut s = playing_session();
        s.eagle = Eagle::new(192, 384, 32, 32);
        s.players[0].tank.bullet = Some(Bullet::new(200.0, 390.0, Direction::Down, 0.23, 8, 8));

        let events = update(&mut s, 16, &mut IdleDriver);

        assert!(s.eagle.destroyed);
        assert_eq!(s.phase, Phase::GameOver);
        assert!(events.iter().any(|e| matches!(e, GameEvent::EagleFell)));
        // the banner has already started climbing
        assert!(s.game_over_y < 416.0);
    }

    #[test]
    fn a_wrecked_eagle_cannot_fall_twice() {
        let mut s = playing_session();
        s.eagle = Eagle::new(192, 384, 32, 32);
        s.eagle.destroyed = true;
        s.phase = Phase::GameOver;
        s.game_over_y = 300.0;
        s.players[0].tank.bullet = Some(Bullet::new(200.0, 390.0, Direction::Down, 0.23, 8, 8));

        let events = update(&mut s, 16, &mut IdleDriver);

        assert!(events.iter().all(|e| !matches!(e, GameEvent::EagleFell)));
        assert_eq!(s.phase, Phase::GameOver);
        // the banner keeps climbing regardless
        assert!(s.game_over_y < 300.0);
    }

    #[test]
    fn abandoned_base_is_wrecked() {
        let mut s = playing_session();
        s.eagle = Eagle::new(192, 384, 32, 32);
        s.players.clear();

        let events = update(&mut s, 16, &mut IdleDriver);

        assert!(s.eagle.destroyed);
        assert_eq!(s.phase, Phase::GameOver);
        assert!(events.iter().any(|e| matches!(e, GameEvent::EagleFell)));
    }

    #[test]
    fn field_stays_live_during_game_over() {
        let mut s = playing_session();
        s.players.clear();
        update(&mut s, 16, &mut IdleDriver);
        assert_eq!(s.phase, Phase::GameOver);

        s.enemies[0].tank.steer(Direction::Right);
        let x0 = s.enemies[0].tank.rect.x;
        update(&mut s, 16, &mut IdleDriver);
        assert!(s.enemies[0].tank.rect.x > x0);
    }

    #[test]
    fn banner_scrolls_up_to_the_finish() {
        let mut s = playing_session();
        s.players.clear();
        update(&mut s, 16, &mut IdleDriver);

        for _ in 0..1000 {
            if s.phase == Phase::Finished {
                break;
            }
            update(&mut s, 40, &mut IdleDriver);
        }
        assert_eq!(s.phase, Phase::Finished);

        // terminal: nothing moves any more
        s.enemies[0].tank.steer(Direction::Right);
        let x0 = s.enemies[0].tank.rect.x;
        assert!(update(&mut s, 16, &mut IdleDriver).is_empty());
        assert_eq!(s.enemies[0].tank.rect.x, x0);
    }

    #[test]
    fn boundary_holds_a_driving_hull() {
        let mut s = playing_session();
        // player one spawns flush with the bottom edge
        s.players[0].tank.steer(Direction::Down);
        for _ in 0..5 {
            update(&mut s, 16, &mut IdleDriver);
        }
        assert_eq!(s.players[0].tank.rect.y, 384);
        // still driving, just blocked
        assert!(s.players[0].tank.speed > 0.0);
    }
}
