//! End-to-end compilation of realistic scripts down to wire frames.

use cube_core::matrix::WIRE_LEN;
use cube_core::{compile, Color, CubeError, ErrorStage, Matrix, Vector};

const PULSE: &str = "\
# pulse: dot, disk, ring, fade
PIXEL 2 2 orange

CIRCLE 2 2 1 orange

RING 2 2 2 orange
// dimmed copy of the ring
RING 2 2 2 orange
DIM 0.5
";

#[test]
fn pulse_compiles_to_four_frames() {
    let script = compile("pulse", PULSE).unwrap();
    assert_eq!(script.len(), 4);

    let orange = Color::named("orange").unwrap();
    let lit = |m: &Matrix| m.colors().iter().filter(|c| !c.is_black()).count();

    assert_eq!(lit(&script.frames()[0]), 1);
    assert_eq!(lit(&script.frames()[1]), 5);
    assert_eq!(script.frames()[2].get(Vector::new(0, 2)).unwrap(), orange);
    assert_eq!(
        script.frames()[3].get(Vector::new(0, 2)).unwrap(),
        Color::from_rgb(127, 82, 0)
    );
}

#[test]
fn every_frame_serializes_to_a_full_wire_frame() {
    let script = compile("pulse", PULSE).unwrap();
    for frame in script.frames() {
        let wire = frame.to_wire_encoding();
        assert_eq!(wire.len(), WIRE_LEN);
        assert_eq!(&Matrix::from_wire_encoding(&wire).unwrap(), frame);
    }
}

#[test]
fn scroll_built_from_shifts() {
    let text = "COL 0 red\n\nCOL 0 red\nSHIFT RIGHT\n\nCOL 0 red\nSHIFT RIGHT\nSHIFT RIGHT\n";
    let script = compile("scroll", text).unwrap();
    for (index, frame) in script.frames().iter().enumerate() {
        for row in 0..5 {
            assert_eq!(frame.get(Vector::new(row, index)).unwrap(), Color::RED);
        }
    }
}

#[test]
fn parse_failures_are_compile_stage_errors() {
    let err = compile("broken", "FILL red\nPIXEL 9 9 red\n").unwrap_err();
    assert_eq!(err.stage(), ErrorStage::Compile);
    assert!(matches!(err, CubeError::Parse(ref p) if p.line == 2));
    assert!(err.to_string().contains("line 2"));
}
