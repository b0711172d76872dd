//! Snake game binary

mod field;
mod fruit;
mod game;
mod grid;
mod snake;

use key_engine::prelude::*;

use crate::game::SnakeGame;

const SETTINGS_PATH: &str = "settings.toml";

fn main() -> EngineResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match Settings::load_from_file(SETTINGS_PATH) {
        Ok(settings) => settings,
        Err(e) => {
            log::info!("no settings file ({e}), using defaults");
            Settings::default()
        }
    };

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let mut game = SnakeGame::new(seed)?;
    Engine::run(settings, &mut game)?;
    log::info!("run finished with score {}", game.score());
    Ok(())
}
