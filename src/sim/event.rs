/// Events emitted during a simulation step.
/// The presentation layer consumes these for banners and flash messages.

use crate::domain::entity::TankKind;

#[derive(Clone, Debug)]
#[allow(dead_code)]
pub enum GameEvent {
    StageStarted { stage: u32 },
    StageSwitched { stage: u32 },
    EnemySpawned { kind: TankKind, x: i32, y: i32 },
    EnemyDestroyed { kind: TankKind, points: u32 },
    PlayerRespawned,
    PlayerEliminated,
    EagleFell,
}
