//! PEAK-8: a 128x128 fantasy console running a precision platformer
//!
//! Palette-indexed software framebuffer, sprite and tile blitting, and a
//! fixed 30 Hz update/draw loop. The window only ever shows the finished
//! frame, scaled up with nearest filtering.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod asset;
mod audio;
mod clock;
mod config;
mod error;
mod game;
mod input;
mod rasterizer;
mod storage;
mod world;

use std::path::PathBuf;

use macroquad::prelude::*;

use asset::{AssetLoader, DirSource};
use audio::{AudioService, MusicCue, TracingAudio, ALL_CHANNELS};
use clock::{Frame, FrameClock, Presenter, Services, TimeSource};
use config::{ConsoleConfig, DEFAULT_CONFIG_FILE};
use game::{Game, GameOptions};
use input::{InputSource, InputState};
use rasterizer::{Framebuffer, HEIGHT, WIDTH};
use storage::{saved_level, FileStore, KeyValueStore, MemoryStore};

/// Config path: first CLI argument, else `peak8.ron` in the working directory.
fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

fn window_conf() -> Conf {
    let scale = ConsoleConfig::load(&config_path())
        .map(|c| c.window_scale)
        .unwrap_or(4)
        .max(1) as i32;
    Conf {
        window_title: format!("PEAK-8 v{}", VERSION),
        window_width: WIDTH as i32 * scale,
        window_height: HEIGHT as i32 * scale,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();
}

fn open_store(config: &ConsoleConfig) -> Box<dyn KeyValueStore> {
    let Some(path) = config.resolved_save_path() else {
        tracing::info!("no save location, progress is kept in memory");
        return Box::new(MemoryStore::new());
    };
    match FileStore::open(&path) {
        Ok(store) => {
            tracing::info!(path = %store.path().display(), "save store opened");
            Box::new(store)
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "save store unavailable, using memory"
            );
            Box::new(MemoryStore::new())
        }
    }
}

// ============================================================================
// Window
// ============================================================================

struct MacroquadTime;

impl TimeSource for MacroquadTime {
    fn now_ms(&self) -> f64 {
        get_time() * 1000.0
    }
}

/// Keeps the last presented frame and redraws it every window frame.
struct WindowPresenter {
    texture: Option<Texture2D>,
    status: Option<String>,
}

impl WindowPresenter {
    fn new() -> Self {
        Self {
            texture: None,
            status: None,
        }
    }

    fn show(&self) {
        clear_background(BLACK);
        if let Some(status) = &self.status {
            draw_text(status, 16.0, screen_height() / 2.0, 24.0, WHITE);
            return;
        }
        let Some(texture) = &self.texture else {
            return;
        };
        // Largest integer scale that fits, centered
        let scale = (screen_width() / WIDTH as f32)
            .min(screen_height() / HEIGHT as f32)
            .floor()
            .max(1.0);
        let (w, h) = (WIDTH as f32 * scale, HEIGHT as f32 * scale);
        draw_texture_ex(
            texture,
            ((screen_width() - w) / 2.0).floor(),
            ((screen_height() - h) / 2.0).floor(),
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(w, h)),
                ..Default::default()
            },
        );
    }
}

impl Presenter for WindowPresenter {
    fn present(&mut self, rgba: &[u8]) {
        let texture = Texture2D::from_rgba8(WIDTH as u16, HEIGHT as u16, rgba);
        texture.set_filter(FilterMode::Nearest);
        self.texture = Some(texture);
        self.status = None;
    }

    fn present_loading(&mut self, status: &str) {
        self.status = Some(status.to_string());
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    // Initialize crash logging FIRST (before any other code)
    #[cfg(not(target_arch = "wasm32"))]
    crashlog::setup!(crashlog::cargo_metadata!().capitalized(), false);

    let path = config_path();
    let loaded = ConsoleConfig::load(&path);
    let config = loaded.as_ref().cloned().unwrap_or_default();
    init_tracing(&config.log_filter);
    if let Err(e) = loaded {
        tracing::error!(path = %path.display(), error = %e, "invalid config");
        return;
    }
    tracing::info!(version = VERSION, assets = %config.asset_dir.display(), "=== PEAK-8 ===");

    let mut store = open_store(&config);
    let mut loader = AssetLoader::new(DirSource::new(&config.asset_dir));
    let mut game: Option<Game> = None;

    let mut clock = FrameClock::new(config.overrun_threshold_ms);
    let mut fb = Framebuffer::new();
    let mut input = InputState::new();
    tracing::info!(gamepad = input.has_gamepad(), "input ready");
    let mut audio = TracingAudio;
    let mut presenter = WindowPresenter::new();
    let time = MacroquadTime;

    loop {
        if clock.poll_due(time.now_ms()) {
            if game.is_none() {
                if let Some(bundle) = loader.poll() {
                    let options = GameOptions::from_config(&config, saved_level(store.as_ref()));
                    match Game::new(bundle, &options) {
                        Ok(g) => game = Some(g),
                        Err(e) => {
                            tracing::error!(error = %e, "failed to start session");
                            break;
                        }
                    }
                }
            }

            let buttons = input.poll();
            let status = loader.status();
            let frame = match game.as_mut() {
                Some(g) => Frame::Ready(g),
                None => Frame::Loading(&status),
            };
            let mut services = Services {
                audio: &mut audio,
                store: store.as_mut(),
            };
            let ticked = clock.tick(
                frame,
                buttons,
                &mut fb,
                &mut services,
                &mut presenter,
                &time,
            );
            if let Err(e) = ticked {
                tracing::error!(frame = clock.frame_count(), error = %e, "fatal frame error");
                break;
            }
        }

        presenter.show();
        next_frame().await;
    }

    audio.play_music(MusicCue::Stop, 0, ALL_CHANNELS);
}
