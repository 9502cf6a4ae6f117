//! Animation script compiler.
//!
//! A script is plain text, one command per line:
//!
//! ```text
//! # a red dot that grows into a ring
//! PIXEL 2 2 red
//!
//! CIRCLE 2 2 1 #ff8800
//!
//! RING 2 2 2 ff0000
//! DIM 0.5
//! ```
//!
//! Commands paint onto an in-progress matrix that starts black. A blank line
//! following at least one command closes the current frame; leading and
//! repeated blank lines do nothing. Lines starting with `#` or `//` are
//! comments. Whatever is left at the end of the text becomes the last frame.
//!
//! | Command | Arguments |
//! |---|---|
//! | `FILL` | color |
//! | `CLEAR` | |
//! | `PIXEL` | x y color |
//! | `ROW` / `COL` | index color |
//! | `CIRCLE` / `RING` | x y radius color |
//! | `RECT` / `LINE` | x1 y1 x2 y2 color |
//! | `CROSS` | x y size color |
//! | `ROTATE` | degrees |
//! | `SHIFT` | UP / DOWN / LEFT / RIGHT |
//! | `DIM` | factor in 0..=1 |
//!
//! Colors are one of the named palette colors, `#RRGGBB`, or bare `RRGGBB`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::Color;
use crate::error::{CubeError, CubeResult, ParseError};
use crate::matrix::{Matrix, RotationMapping, Vector, SIDE};
use crate::raster::{self, Direction, RectBounds};

/// Behavior switches for the two primitives with ambiguous reference semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Mapping used by `ROTATE`.
    pub rotation: RotationMapping,
    /// Corner handling used by `RECT`.
    pub rect_bounds: RectBounds,
}

/// A compiled animation: a name and at least one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    name: String,
    frames: Vec<Matrix>,
}

impl Script {
    /// Name given at compile time, usually the file stem.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Frames in playback order. Never empty.
    pub fn frames(&self) -> &[Matrix] {
        &self.frames
    }

    /// Frame shown in static mode.
    pub fn first_frame(&self) -> &Matrix {
        // `compile` refuses to build a Script without frames.
        &self.frames[0]
    }

    /// Number of frames, at least one.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// One parsed script line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// `FILL color`
    Fill(Color),
    /// `CLEAR`
    Clear,
    /// `PIXEL x y color`
    Pixel {
        /// Column
        x: i32,
        /// Row
        y: i32,
        /// Paint color
        color: Color,
    },
    /// `ROW index color`
    Row {
        /// Row index
        row: i32,
        /// Paint color
        color: Color,
    },
    /// `COL index color`
    Col {
        /// Column index
        column: i32,
        /// Paint color
        color: Color,
    },
    /// `CIRCLE x y radius color`
    Circle {
        /// Center column
        x: i32,
        /// Center row
        y: i32,
        /// Inclusive radius in cells
        radius: i32,
        /// Paint color
        color: Color,
    },
    /// `RING x y radius color`
    Ring {
        /// Center column
        x: i32,
        /// Center row
        y: i32,
        /// Ring radius in cells
        radius: i32,
        /// Paint color
        color: Color,
    },
    /// `RECT x1 y1 x2 y2 color`
    Rect {
        /// First corner as (x, y)
        from: (i32, i32),
        /// Second corner as (x, y)
        to: (i32, i32),
        /// Paint color
        color: Color,
    },
    /// `LINE x1 y1 x2 y2 color`
    Line {
        /// Start point as (x, y)
        from: (i32, i32),
        /// End point as (x, y)
        to: (i32, i32),
        /// Paint color
        color: Color,
    },
    /// `CROSS x y size color`
    Cross {
        /// Center column
        x: i32,
        /// Center row
        y: i32,
        /// Arm length on each side of the center
        size: i32,
        /// Paint color
        color: Color,
    },
    /// `ROTATE degrees`
    Rotate(f64),
    /// `SHIFT direction`
    Shift(Direction),
    /// `DIM factor`
    Dim(f64),
}

impl Command {
    /// Parse a trimmed, non-blank, non-comment line.
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut tokens = line.split_whitespace();
        let keyword = tokens.next().unwrap_or_default().to_ascii_uppercase();
        let args: Vec<&str> = tokens.collect();

        let expect = |count: usize, usage: &str| -> Result<(), String> {
            if args.len() == count {
                Ok(())
            } else {
                Err(format!(
                    "{} expects {} ({} argument{}), got {}",
                    keyword,
                    usage,
                    count,
                    if count == 1 { "" } else { "s" },
                    args.len()
                ))
            }
        };

        let command = match keyword.as_str() {
            "FILL" => {
                expect(1, "color")?;
                Command::Fill(parse_color(args[0])?)
            }
            "CLEAR" => {
                expect(0, "nothing")?;
                Command::Clear
            }
            "PIXEL" => {
                expect(3, "x y color")?;
                let (x, y) = parse_point(args[0], args[1])?;
                Command::Pixel {
                    x,
                    y,
                    color: parse_color(args[2])?,
                }
            }
            "ROW" => {
                expect(2, "row color")?;
                Command::Row {
                    row: parse_coordinate(args[0], "row")?,
                    color: parse_color(args[1])?,
                }
            }
            "COL" => {
                expect(2, "column color")?;
                Command::Col {
                    column: parse_coordinate(args[0], "column")?,
                    color: parse_color(args[1])?,
                }
            }
            "CIRCLE" | "RING" => {
                expect(4, "x y radius color")?;
                let (x, y) = parse_point(args[0], args[1])?;
                let radius = parse_extent(args[2], "radius")?;
                let color = parse_color(args[3])?;
                if keyword == "CIRCLE" {
                    Command::Circle { x, y, radius, color }
                } else {
                    Command::Ring { x, y, radius, color }
                }
            }
            "RECT" | "LINE" => {
                expect(5, "x1 y1 x2 y2 color")?;
                let from = parse_point(args[0], args[1])?;
                let to = parse_point(args[2], args[3])?;
                let color = parse_color(args[4])?;
                if keyword == "RECT" {
                    Command::Rect { from, to, color }
                } else {
                    Command::Line { from, to, color }
                }
            }
            "CROSS" => {
                expect(4, "x y size color")?;
                let (x, y) = parse_point(args[0], args[1])?;
                Command::Cross {
                    x,
                    y,
                    size: parse_extent(args[2], "size")?,
                    color: parse_color(args[3])?,
                }
            }
            "ROTATE" => {
                expect(1, "degrees")?;
                let degrees: f64 = args[0]
                    .parse()
                    .ok()
                    .filter(|d: &f64| d.is_finite())
                    .ok_or_else(|| format!("invalid degrees: {}", args[0]))?;
                Command::Rotate(degrees)
            }
            "SHIFT" => {
                expect(1, "direction")?;
                Command::Shift(args[0].parse()?)
            }
            "DIM" => {
                expect(1, "factor")?;
                let factor: f64 = args[0]
                    .parse()
                    .ok()
                    .filter(|f: &f64| (0.0..=1.0).contains(f))
                    .ok_or_else(|| {
                        format!("invalid dim factor (must be 0.0-1.0): {}", args[0])
                    })?;
                Command::Dim(factor)
            }
            _ => return Err(format!("unknown command: {}", keyword)),
        };
        Ok(command)
    }

    /// Paint this command onto `matrix`.
    pub fn apply(&self, matrix: &mut Matrix, options: &CompileOptions) {
        match *self {
            Command::Fill(color) => matrix.replace_all(color),
            Command::Clear => matrix.replace_all(Color::BLACK),
            Command::Pixel { x, y, color } => raster::pixel(matrix, x, y, color),
            Command::Row { row, color } => raster::row(matrix, row, color),
            Command::Col { column, color } => raster::column(matrix, column, color),
            Command::Circle { x, y, radius, color } => raster::circle(matrix, x, y, radius, color),
            Command::Ring { x, y, radius, color } => raster::ring(matrix, x, y, radius, color),
            Command::Rect { from, to, color } => {
                raster::rect(matrix, from, to, options.rect_bounds, color)
            }
            Command::Line { from, to, color } => raster::line(matrix, from, to, color),
            Command::Cross { x, y, size, color } => raster::cross(matrix, x, y, size, color),
            Command::Rotate(degrees) => {
                *matrix = matrix.rotate_with(degrees, Vector::CENTER, options.rotation)
            }
            Command::Shift(direction) => *matrix = raster::shift(matrix, direction),
            Command::Dim(factor) => raster::dim(matrix, factor),
        }
    }
}

/// Resolve a color token: named color, `#RRGGBB`, or bare `RRGGBB`.
pub fn parse_color(token: &str) -> Result<Color, String> {
    if let Some(color) = Color::named(token) {
        return Ok(color);
    }
    let digits = match token.strip_prefix('#') {
        Some(digits) => digits,
        None => token,
    };
    if digits.len() != 6 {
        return Err(format!("invalid color: {}", token));
    }
    Color::from_hex(digits).map_err(|_| format!("invalid color: {}", token))
}

fn parse_coordinate(token: &str, what: &str) -> Result<i32, String> {
    token
        .parse::<i32>()
        .ok()
        .filter(|v| (0..SIDE as i32).contains(v))
        .ok_or_else(|| format!("invalid {} (must be 0-{}): {}", what, SIDE - 1, token))
}

fn parse_point(x: &str, y: &str) -> Result<(i32, i32), String> {
    Ok((parse_coordinate(x, "x coordinate")?, parse_coordinate(y, "y coordinate")?))
}

fn parse_extent(token: &str, what: &str) -> Result<i32, String> {
    token
        .parse::<i32>()
        .ok()
        .filter(|v| *v >= 0)
        .ok_or_else(|| format!("invalid {}: {}", what, token))
}

/// Compile with default options.
pub fn compile(name: &str, text: &str) -> CubeResult<Script> {
    compile_with(name, text, &CompileOptions::default())
}

/// Compile `text` into a [`Script`] called `name`.
pub fn compile_with(name: &str, text: &str, options: &CompileOptions) -> CubeResult<Script> {
    let mut frames = Vec::new();
    let mut current = Matrix::black();
    let mut has_content = false;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();

        if line.is_empty() {
            if has_content {
                frames.push(current);
                current = Matrix::black();
                has_content = false;
            }
            continue;
        }
        if line.starts_with('#') || line.starts_with("//") {
            continue;
        }

        let command = Command::parse(line).map_err(|reason| ParseError::new(index + 1, reason))?;
        command.apply(&mut current, options);
        has_content = true;
    }

    if has_content {
        frames.push(current);
    }
    if frames.is_empty() {
        return Err(CubeError::EmptyScript(name.to_string()));
    }

    debug!(script = %name, frames = frames.len(), "Compiled script");
    Ok(Script {
        name: name.to_string(),
        frames,
    })
}
