/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD, or a
/// shared data directory.
/// Falls back to sensible defaults if the file is missing or incomplete.
/// Every dimension is in map units; every speed is units per millisecond.

use crossterm::event::KeyCode;
use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub map: MapConfig,
    pub speed: SpeedConfig,
    pub session: SessionConfig,
    pub keys: [PlayerKeys; 2],
    pub levels_dir: PathBuf,
}

#[derive(Clone, Copy, Debug)]
pub struct MapConfig {
    pub tile_w: i32,
    pub tile_h: i32,
    pub width: i32,
    pub height: i32,
    pub tank_w: i32,
    pub tank_h: i32,
    pub bullet_w: i32,
    pub bullet_h: i32,
}

#[derive(Clone, Copy, Debug)]
pub struct SpeedConfig {
    pub tank: f32,
    pub bullet: f32,
    pub game_over_scroll: f32,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub stage_intro_ms: u32,
    pub player_respawns: u32,
    pub player_spawns: Vec<[i32; 2]>,
    pub enemy_spawns: Vec<[i32; 2]>,
}

/// Keyboard bindings for one player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerKeys {
    pub up: KeyCode,
    pub down: KeyCode,
    pub left: KeyCode,
    pub right: KeyCode,
    pub fire: KeyCode,
}

impl PlayerKeys {
    pub fn default_p1() -> Self {
        PlayerKeys {
            up: KeyCode::Up,
            down: KeyCode::Down,
            left: KeyCode::Left,
            right: KeyCode::Right,
            fire: KeyCode::Char(' '),
        }
    }

    pub fn default_p2() -> Self {
        PlayerKeys {
            up: KeyCode::Char('w'),
            down: KeyCode::Char('s'),
            left: KeyCode::Char('a'),
            right: KeyCode::Char('d'),
            fire: KeyCode::Char('f'),
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    map: TomlMap,
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    session: TomlSession,
    #[serde(default)]
    keys: TomlKeys,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlMap {
    #[serde(default = "default_tile_w")]
    tile_w: i32,
    #[serde(default = "default_tile_h")]
    tile_h: i32,
    #[serde(default = "default_map_w")]
    width: i32,
    #[serde(default = "default_map_h")]
    height: i32,
    #[serde(default = "default_tank_size")]
    tank_w: i32,
    #[serde(default = "default_tank_size")]
    tank_h: i32,
    #[serde(default = "default_bullet_size")]
    bullet_w: i32,
    #[serde(default = "default_bullet_size")]
    bullet_h: i32,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tank_speed")]
    tank: f32,
    #[serde(default = "default_bullet_speed")]
    bullet: f32,
    #[serde(default = "default_scroll_speed")]
    game_over_scroll: f32,
}

#[derive(Deserialize, Debug)]
struct TomlSession {
    #[serde(default = "default_intro_ms")]
    stage_intro_ms: u32,
    #[serde(default = "default_respawns")]
    player_respawns: u32,
    #[serde(default = "default_player_spawns")]
    player_spawns: Vec<[i32; 2]>,
    #[serde(default = "default_enemy_spawns")]
    enemy_spawns: Vec<[i32; 2]>,
}

#[derive(Deserialize, Debug, Default)]
struct TomlKeys {
    #[serde(default)]
    p1: TomlKeyMap,
    #[serde(default)]
    p2: TomlKeyMap,
}

/// Per-player key overrides; absent fields keep the built-in binding.
#[derive(Deserialize, Debug, Default)]
struct TomlKeyMap {
    up: Option<String>,
    down: Option<String>,
    left: Option<String>,
    right: Option<String>,
    fire: Option<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

// ── Defaults ──

fn default_tile_w() -> i32 { 16 }
fn default_tile_h() -> i32 { 16 }
fn default_map_w() -> i32 { 416 }       // 26 tiles
fn default_map_h() -> i32 { 416 }
fn default_tank_size() -> i32 { 32 }    // 2x2 tiles
fn default_bullet_size() -> i32 { 8 }

fn default_tank_speed() -> f32 { 0.08 }
fn default_bullet_speed() -> f32 { 0.23 }
fn default_scroll_speed() -> f32 { 0.13 }

fn default_intro_ms() -> u32 { 2000 }
fn default_respawns() -> u32 { 3 }
fn default_player_spawns() -> Vec<[i32; 2]> { vec![[128, 384], [256, 384]] }
fn default_enemy_spawns() -> Vec<[i32; 2]> { vec![[1, 1], [192, 1], [384, 1]] }

fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlMap {
    fn default() -> Self {
        TomlMap {
            tile_w: default_tile_w(),
            tile_h: default_tile_h(),
            width: default_map_w(),
            height: default_map_h(),
            tank_w: default_tank_size(),
            tank_h: default_tank_size(),
            bullet_w: default_bullet_size(),
            bullet_h: default_bullet_size(),
        }
    }
}

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tank: default_tank_speed(),
            bullet: default_bullet_speed(),
            game_over_scroll: default_scroll_speed(),
        }
    }
}

impl Default for TomlSession {
    fn default() -> Self {
        TomlSession {
            stage_intro_ms: default_intro_ms(),
            player_respawns: default_respawns(),
            player_spawns: default_player_spawns(),
            enemy_spawns: default_enemy_spawns(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: exe directory, working directory, then shared data dirs.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::from_toml(toml_cfg, &search_dirs)
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            map: MapConfig {
                tile_w: toml_cfg.map.tile_w,
                tile_h: toml_cfg.map.tile_h,
                width: toml_cfg.map.width,
                height: toml_cfg.map.height,
                tank_w: toml_cfg.map.tank_w,
                tank_h: toml_cfg.map.tank_h,
                bullet_w: toml_cfg.map.bullet_w,
                bullet_h: toml_cfg.map.bullet_h,
            },
            speed: SpeedConfig {
                tank: toml_cfg.speed.tank,
                bullet: toml_cfg.speed.bullet,
                game_over_scroll: toml_cfg.speed.game_over_scroll,
            },
            session: SessionConfig {
                stage_intro_ms: toml_cfg.session.stage_intro_ms,
                player_respawns: toml_cfg.session.player_respawns,
                player_spawns: toml_cfg.session.player_spawns,
                enemy_spawns: toml_cfg.session.enemy_spawns,
            },
            keys: [
                resolve_keys(PlayerKeys::default_p1(), &toml_cfg.keys.p1, "p1"),
                resolve_keys(PlayerKeys::default_p2(), &toml_cfg.keys.p2, "p2"),
            ],
            levels_dir,
        }
    }
}

impl Default for GameConfig {
    /// Built-in settings, as if no `config.toml` were present.
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), &[])
    }
}

/// Apply key-name overrides on top of a built-in binding set.
fn resolve_keys(mut keys: PlayerKeys, overrides: &TomlKeyMap, label: &str) -> PlayerKeys {
    let mut apply = |slot: &mut KeyCode, name: &Option<String>, field: &str| {
        if let Some(name) = name {
            match parse_key(name) {
                Some(code) => *slot = code,
                None => eprintln!("Warning: unknown key name {name:?} for keys.{label}.{field}"),
            }
        }
    };
    apply(&mut keys.up, &overrides.up, "up");
    apply(&mut keys.down, &overrides.down, "down");
    apply(&mut keys.left, &overrides.left, "left");
    apply(&mut keys.right, &overrides.right, "right");
    apply(&mut keys.fire, &overrides.fire, "fire");
    keys
}

/// Key names accepted in config.toml: arrow names, "space", "enter", or a
/// single character.
fn parse_key(name: &str) -> Option<KeyCode> {
    let lower = name.to_ascii_lowercase();
    match lower.as_str() {
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        "left" => Some(KeyCode::Left),
        "right" => Some(KeyCode::Right),
        "space" => Some(KeyCode::Char(' ')),
        "enter" => Some(KeyCode::Enter),
        _ => {
            let mut chars = lower.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Some(KeyCode::Char(c)),
                _ => None,
            }
        }
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a packaged binary still finds its data.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/steelgrid)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/steelgrid");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory (/usr/share/steelgrid)
    let sys = PathBuf::from("/usr/share/steelgrid");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    // 5. Fallback
    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}
