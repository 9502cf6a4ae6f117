//! Script files on disk through the library, the player and the mock lamp.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use cube_core::{Color, RotationMapping, Vector};
use cube_driver_mock::{LampEvent, MockCube};
use cube_playback::{FinishReason, Player};
use rust_cube::{runner, CubeConfig, ScriptLibrary};

const SPINNER: &str = "\
# a bar turning around the center
ROW 2 cyan

ROW 2 cyan
ROTATE 45

COL 2 cyan
";

fn library_in(dir: &tempfile::TempDir, config: &mut CubeConfig) -> ScriptLibrary {
    fs::write(dir.path().join("spinner.txt"), SPINNER).unwrap();
    fs::write(dir.path().join("solid.txt"), "FILL #102030\n").unwrap();
    config.scripts.dir = dir.path().to_path_buf();
    ScriptLibrary::from_config(config)
}

#[test]
fn test_library_lists_and_compiles_scripts() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = CubeConfig::default();
    let library = library_in(&dir, &mut config);

    assert_eq!(library.list().unwrap(), vec!["solid", "spinner"]);

    let spinner = library.load("spinner").unwrap();
    assert_eq!(spinner.len(), 3);
    let cyan = Color::named("cyan").unwrap();
    for row in 0..5 {
        assert_eq!(spinner.frames()[2].get(Vector::new(row, 2)).unwrap(), cyan);
    }
}

#[test]
fn test_render_options_come_from_config() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("box.txt"), "RECT 3 3 1 1 red\n").unwrap();

    let mut config = CubeConfig::default();
    config.scripts.dir = dir.path().to_path_buf();
    assert!(ScriptLibrary::from_config(&config).load("box").unwrap().frames()[0].is_blank());

    config.render.rect_bounds = cube_core::RectBounds::Normalized;
    config.render.rotation = RotationMapping::Clipped;
    let filled = ScriptLibrary::from_config(&config).load("box").unwrap();
    let lit = filled.frames()[0]
        .colors()
        .iter()
        .filter(|c| !c.is_black())
        .count();
    assert_eq!(lit, 9);
}

#[tokio::test(start_paused = true)]
async fn test_run_plays_a_script_file_on_the_mock_lamp() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = CubeConfig::default();
    let library = library_in(&dir, &mut config);
    let script = Arc::new(library.load("spinner").unwrap());

    let lamp = Arc::new(MockCube::new());
    let player = Player::new(lamp.clone());
    let report = runner::play(
        &player,
        script.clone(),
        Duration::from_millis(200),
        Duration::from_millis(1100),
        std::future::pending(),
    )
    .await
    .unwrap();

    assert_eq!(report.reason, FinishReason::TimedOut);
    // renders at 0, 200, ..., 1000
    assert_eq!(report.frames_rendered, 6);

    let shown = lamp.matrices().unwrap();
    for (i, matrix) in shown.iter().enumerate() {
        assert_eq!(*matrix, script.frames()[i % 3]);
    }
    assert_eq!(lamp.commands().first(), Some(&LampEvent::PowerOn));
    assert_eq!(lamp.commands().last(), Some(&LampEvent::PowerOff));
}

#[tokio::test(start_paused = true)]
async fn test_static_script_holds_until_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = CubeConfig::default();
    let library = library_in(&dir, &mut config);

    let lamp = Arc::new(MockCube::new());
    let player = Player::new(lamp.clone());
    let report = runner::play(
        &player,
        Arc::new(library.load("solid").unwrap()),
        Duration::ZERO,
        Duration::ZERO,
        tokio::time::sleep(Duration::from_secs(60)),
    )
    .await
    .unwrap();

    assert_eq!(report.reason, FinishReason::Stopped);
    assert_eq!(report.frames_rendered, 1);
    let shown = lamp.matrices().unwrap();
    assert_eq!(shown.len(), 1);
    assert!(shown[0].colors().iter().all(|c| *c == Color::from_rgb(0x10, 0x20, 0x30)));
}
