//! Shape primitives painted onto a [`Matrix`].
//!
//! Coordinates follow script order: `x` is the column and `y` the row.
//! Everything mutates in place except [`shift`], which returns a new matrix.
//! Cells that fall outside the grid are skipped, never an error.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::matrix::{Matrix, Vector, SIDE};

/// Ring membership tolerance around the radius.
pub const RING_TOLERANCE: f64 = 0.8;

/// How [`rect`] treats corners given in reverse order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RectBounds {
    /// Fill from the first corner to the second; reversed corners fill nothing.
    #[default]
    AsWritten,
    /// Order each axis with min/max before filling.
    Normalized,
}

/// Direction for [`shift`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Toward row 0.
    Up,
    /// Toward row 4.
    Down,
    /// Toward column 0.
    Left,
    /// Toward column 4.
    Right,
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "UP" => Ok(Direction::Up),
            "DOWN" => Ok(Direction::Down),
            "LEFT" => Ok(Direction::Left),
            "RIGHT" => Ok(Direction::Right),
            other => Err(format!("unknown direction: {}", other)),
        }
    }
}

fn cells() -> impl Iterator<Item = (i32, i32)> {
    Vector::all().map(|v| (v.column as i32, v.row as i32))
}

fn distance(x: i32, y: i32, cx: i32, cy: i32) -> f64 {
    f64::from((x - cx).pow(2) + (y - cy).pow(2)).sqrt()
}

/// Paint the single cell at column `x`, row `y`.
pub fn pixel(matrix: &mut Matrix, x: i32, y: i32, color: Color) {
    matrix.plot(y, x, color);
}

/// Paint all five cells of `row`.
pub fn row(matrix: &mut Matrix, row: i32, color: Color) {
    for x in 0..SIDE as i32 {
        matrix.plot(row, x, color);
    }
}

/// Paint all five cells of `column`.
pub fn column(matrix: &mut Matrix, column: i32, color: Color) {
    for y in 0..SIDE as i32 {
        matrix.plot(y, column, color);
    }
}

/// Fill the inclusive box between two corners, clipped to the grid.
pub fn rect(matrix: &mut Matrix, from: (i32, i32), to: (i32, i32), bounds: RectBounds, color: Color) {
    let ((x1, y1), (x2, y2)) = match bounds {
        RectBounds::AsWritten => (from, to),
        RectBounds::Normalized => (
            (from.0.min(to.0), from.1.min(to.1)),
            (from.0.max(to.0), from.1.max(to.1)),
        ),
    };
    for y in y1..=y2 {
        for x in x1..=x2 {
            matrix.plot(y, x, color);
        }
    }
}

/// Filled disk: every cell whose center lies within `radius`.
pub fn circle(matrix: &mut Matrix, cx: i32, cy: i32, radius: i32, color: Color) {
    for (x, y) in cells() {
        if distance(x, y, cx, cy) <= f64::from(radius) {
            matrix.plot(y, x, color);
        }
    }
}

/// Outline: every cell within [`RING_TOLERANCE`] of `radius`.
pub fn ring(matrix: &mut Matrix, cx: i32, cy: i32, radius: i32, color: Color) {
    for (x, y) in cells() {
        if (distance(x, y, cx, cy) - f64::from(radius)).abs() < RING_TOLERANCE {
            matrix.plot(y, x, color);
        }
    }
}

/// Bresenham line, both endpoints included.
pub fn line(matrix: &mut Matrix, from: (i32, i32), to: (i32, i32), color: Color) {
    let (mut x, mut y) = from;
    let (x2, y2) = to;
    let dx = (x2 - x).abs();
    let dy = (y2 - y).abs();
    let sx = if x < x2 { 1 } else { -1 };
    let sy = if y < y2 { 1 } else { -1 };
    let mut err = dx - dy;

    loop {
        matrix.plot(y, x, color);
        if x == x2 && y == y2 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }
}

/// Horizontal and vertical strokes of length `2 * size + 1` through the center.
pub fn cross(matrix: &mut Matrix, cx: i32, cy: i32, size: i32, color: Color) {
    for offset in -size..=size {
        matrix.plot(cy, cx + offset, color);
    }
    for offset in -size..=size {
        matrix.plot(cy + offset, cx, color);
    }
}

/// Move every cell one step toward `direction`; the vacated edge turns black.
pub fn shift(matrix: &Matrix, direction: Direction) -> Matrix {
    let (d_row, d_col): (i32, i32) = match direction {
        Direction::Up => (-1, 0),
        Direction::Down => (1, 0),
        Direction::Left => (0, -1),
        Direction::Right => (0, 1),
    };
    let mut shifted = Matrix::black();
    for (index, color) in matrix.colors().iter().enumerate() {
        let row = (index / SIDE) as i32;
        let col = (index % SIDE) as i32;
        shifted.plot(row + d_row, col + d_col, *color);
    }
    shifted
}

/// Scale every channel by `factor` (0..=1), truncating.
pub fn dim(matrix: &mut Matrix, factor: f64) {
    for color in matrix.colors_mut().iter_mut() {
        *color = color.scaled(factor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(matrix: &Matrix) -> Vec<(usize, usize)> {
        Vector::all()
            .filter(|v| !matrix.get(*v).unwrap().is_black())
            .map(|v| (v.row, v.column))
            .collect()
    }

    #[test]
    fn pixel_uses_x_as_column() {
        let mut matrix = Matrix::black();
        pixel(&mut matrix, 3, 1, Color::RED);
        assert_eq!(lit(&matrix), vec![(1, 3)]);
    }

    #[test]
    fn row_and_column_paint_five_cells() {
        let mut matrix = Matrix::black();
        row(&mut matrix, 2, Color::RED);
        assert_eq!(lit(&matrix), (0..5).map(|c| (2, c)).collect::<Vec<_>>());

        let mut matrix = Matrix::black();
        column(&mut matrix, 4, Color::RED);
        assert_eq!(lit(&matrix), (0..5).map(|r| (r, 4)).collect::<Vec<_>>());
    }

    #[test]
    fn circle_is_a_filled_disk() {
        let mut matrix = Matrix::black();
        circle(&mut matrix, 2, 2, 2, Color::RED);
        assert_eq!(matrix.get(Vector::new(2, 2)).unwrap(), Color::RED);
        assert_eq!(matrix.get(Vector::new(0, 2)).unwrap(), Color::RED);
        // (0, 0) sits 2.83 away from the center.
        assert_eq!(matrix.get(Vector::new(0, 0)).unwrap(), Color::BLACK);
        assert_eq!(lit(&matrix).len(), 13);
    }

    #[test]
    fn ring_leaves_the_center_dark() {
        let mut matrix = Matrix::black();
        ring(&mut matrix, 2, 2, 2, Color::RED);
        assert_eq!(matrix.get(Vector::new(2, 2)).unwrap(), Color::BLACK);
        assert_eq!(matrix.get(Vector::new(0, 2)).unwrap(), Color::RED);
        assert_eq!(matrix.get(Vector::new(1, 1)).unwrap(), Color::RED);
        // 2.83 - 2 = 0.83 is outside the tolerance.
        assert_eq!(matrix.get(Vector::new(0, 0)).unwrap(), Color::BLACK);
    }

    #[test]
    fn line_paints_the_diagonal_only() {
        let mut matrix = Matrix::black();
        line(&mut matrix, (0, 0), (4, 4), Color::RED);
        assert_eq!(lit(&matrix), vec![(0, 0), (1, 1), (2, 2), (3, 3), (4, 4)]);
    }

    #[test]
    fn line_includes_both_endpoints_when_reversed() {
        let mut matrix = Matrix::black();
        line(&mut matrix, (4, 1), (0, 1), Color::RED);
        assert_eq!(lit(&matrix), (0..5).map(|c| (1, c)).collect::<Vec<_>>());
    }

    #[test]
    fn rect_fills_inclusive_box() {
        let mut matrix = Matrix::black();
        rect(&mut matrix, (1, 1), (2, 3), RectBounds::AsWritten, Color::RED);
        assert_eq!(lit(&matrix), vec![(1, 1), (1, 2), (2, 1), (2, 2), (3, 1), (3, 2)]);
    }

    #[test]
    fn reversed_rect_depends_on_bounds_mode() {
        let mut matrix = Matrix::black();
        rect(&mut matrix, (3, 3), (1, 1), RectBounds::AsWritten, Color::RED);
        assert!(matrix.is_blank());

        rect(&mut matrix, (3, 3), (1, 1), RectBounds::Normalized, Color::RED);
        assert_eq!(lit(&matrix).len(), 9);
    }

    #[test]
    fn cross_clips_at_the_edges() {
        let mut matrix = Matrix::black();
        cross(&mut matrix, 0, 0, 2, Color::RED);
        assert_eq!(lit(&matrix), vec![(0, 0), (0, 1), (0, 2), (1, 0), (2, 0)]);
    }

    #[test]
    fn shift_up_moves_rows_and_clears_the_bottom() {
        let mut matrix = Matrix::black();
        for r in 0..5 {
            row(&mut matrix, r, Color::new(0x10 * (r as u32 + 1)).unwrap());
        }
        let shifted = shift(&matrix, Direction::Up);
        for r in 0..4 {
            assert_eq!(
                shifted.get(Vector::new(r, 0)).unwrap(),
                matrix.get(Vector::new(r + 1, 0)).unwrap()
            );
        }
        for c in 0..5 {
            assert_eq!(shifted.get(Vector::new(4, c)).unwrap(), Color::BLACK);
        }
    }

    #[test]
    fn shift_right_clears_the_left_column() {
        let mut matrix = Matrix::black();
        column(&mut matrix, 4, Color::RED);
        column(&mut matrix, 0, Color::WHITE);
        let shifted = shift(&matrix, Direction::Right);
        assert_eq!(lit(&shifted), (0..5).map(|r| (r, 1)).collect::<Vec<_>>());
    }

    #[test]
    fn direction_parses_case_insensitively() {
        assert_eq!("left".parse::<Direction>().unwrap(), Direction::Left);
        assert_eq!("DOWN".parse::<Direction>().unwrap(), Direction::Down);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn dim_truncates_each_channel() {
        let mut matrix = Matrix::make(Color::from_rgb(255, 129, 3));
        dim(&mut matrix, 0.5);
        assert!(matrix.colors().iter().all(|c| c.to_rgb() == (127, 64, 1)));
    }
}
