/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use config::GameConfig;
use domain::ai::PatrolDriver;
use sim::session::{Phase, Session};
use sim::step;
use ui::input::{self, InputEvent};
use ui::renderer::Renderer;

fn main() {
    let cfg = GameConfig::load();

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(cfg, &mut renderer);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result {
        Ok(score) => {
            println!();
            println!("Thanks for playing Steel Grid!");
            println!("Final Score: {score}");
        }
        Err(e) => eprintln!("Game error: {e}"),
    }
}

fn game_loop(cfg: GameConfig, renderer: &mut Renderer) -> Result<u32, Box<dyn std::error::Error>> {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(1);
    let mut driver = PatrolDriver::new(seed);
    let mut session = Session::new(cfg);

    let mut last_tick = Instant::now();

    // Frame pacing: measure over a 200 ms window, then nudge the sleep
    // toward the 60 FPS mark.
    let mut frame_delay_ms: u64 = 15;
    let mut window_start = Instant::now();
    let mut window_frames: u32 = 0;

    loop {
        let dt = last_tick.elapsed().as_millis() as u32;
        last_tick = Instant::now();

        for event in input::drain()? {
            match event {
                InputEvent::Quit => return Ok(session.score),
                InputEvent::Key(code) => {
                    if let Some(ev) = step::key_down(&mut session, code) {
                        renderer.note_events(&[ev]);
                    }
                }
            }
        }

        // A finished banner means a brand-new campaign.
        if session.phase == Phase::Finished {
            let cfg = session.cfg.clone();
            session = Session::new(cfg);
        }

        let events = step::update(&mut session, dt, &mut driver);
        renderer.note_events(&events);
        renderer.render(&session)?;

        window_frames += 1;
        if window_start.elapsed() >= Duration::from_millis(200) {
            let fps = window_frames * 5;
            if fps > 60 {
                frame_delay_ms += 1;
            } else {
                frame_delay_ms = frame_delay_ms.saturating_sub(1);
            }
            window_frames = 0;
            window_start = Instant::now();
        }
        std::thread::sleep(Duration::from_millis(frame_delay_ms));
    }
}
