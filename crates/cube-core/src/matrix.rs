//! The 5x5 color grid of the lamp.
//!
//! Cells are addressed by [`Vector`] (row, column), both in `0..5`, and stored
//! row-major. Out-of-range access through the checked API is an error, never
//! a silent write into a neighbouring cell.

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{CubeError, CubeResult};

/// Side length of the matrix.
pub const SIDE: usize = 5;

/// Number of cells in the matrix.
pub const CELLS: usize = SIDE * SIDE;

/// Length of a serialized matrix: four wire characters per cell.
pub const WIRE_LEN: usize = CELLS * 4;

/// A (row, column) cell address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vector {
    /// 0 is the top row.
    pub row: usize,
    /// 0 is the left column.
    pub column: usize,
}

impl Vector {
    /// The middle cell, (2, 2).
    pub const CENTER: Vector = Vector { row: 2, column: 2 };

    /// Address without bounds checking; see [`Vector::index`].
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Both coordinates fall inside the grid.
    pub fn in_bounds(self) -> bool {
        self.row < SIDE && self.column < SIDE
    }

    /// Flat row-major index, or `OutOfBounds`.
    pub fn index(self) -> CubeResult<usize> {
        if !self.in_bounds() {
            return Err(CubeError::OutOfBounds {
                row: self.row,
                column: self.column,
            });
        }
        Ok(self.row * SIDE + self.column)
    }

    /// Every cell in row-major order.
    pub fn all() -> impl Iterator<Item = Vector> {
        (0..SIDE).flat_map(|row| (0..SIDE).map(move |column| Vector { row, column }))
    }
}

/// How [`Matrix::rotate_with`] maps source cells to destination cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMapping {
    /// Forward-map each source cell, round, then take the absolute value of
    /// each coordinate. Negative targets are mirrored back into the grid.
    /// Matches what existing lamp scripts were authored against.
    #[default]
    Mirrored,
    /// Inverse-map each destination cell and sample the nearest source cell;
    /// samples falling outside the grid become black.
    Clipped,
}

/// A 5x5 grid of colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Matrix {
    cells: [Color; CELLS],
}

impl Default for Matrix {
    fn default() -> Self {
        Self::black()
    }
}

impl Matrix {
    /// Every cell set to `fill`.
    pub fn make(fill: Color) -> Self {
        Self { cells: [fill; CELLS] }
    }

    /// All cells black.
    pub fn black() -> Self {
        Self::make(Color::BLACK)
    }

    /// Black except for the top-left cell.
    pub fn spot(color: Color) -> Self {
        let mut matrix = Self::black();
        matrix.cells[0] = color;
        matrix
    }

    /// Build from exactly 25 colors in row-major order.
    pub fn from_colors(colors: impl IntoIterator<Item = Color>) -> CubeResult<Self> {
        let colors: Vec<Color> = colors.into_iter().collect();
        let cells: [Color; CELLS] = colors.try_into().map_err(|rejected: Vec<Color>| {
            CubeError::invalid_frame(format!("a matrix needs {} cells, got {}", CELLS, rejected.len()))
        })?;
        Ok(Self { cells })
    }

    /// Color at `at`, or `OutOfBounds`.
    pub fn get(&self, at: Vector) -> CubeResult<Color> {
        Ok(self.cells[at.index()?])
    }

    /// Write `color` at `at`, or fail with `OutOfBounds`.
    pub fn set(&mut self, at: Vector, color: Color) -> CubeResult<()> {
        self.cells[at.index()?] = color;
        Ok(())
    }

    /// Write a cell given signed coordinates, skipping anything off-grid.
    /// Returns whether the cell was written.
    pub fn plot(&mut self, row: i32, column: i32, color: Color) -> bool {
        match (usize::try_from(row), usize::try_from(column)) {
            (Ok(row), Ok(column)) if row < SIDE && column < SIDE => {
                self.cells[row * SIDE + column] = color;
                true
            }
            _ => false,
        }
    }

    /// Set every cell to `color`.
    pub fn replace_all(&mut self, color: Color) {
        self.cells = [color; CELLS];
    }

    /// Cells in row-major order.
    pub fn colors(&self) -> &[Color; CELLS] {
        &self.cells
    }

    /// Mutable cells in row-major order.
    pub fn colors_mut(&mut self) -> &mut [Color; CELLS] {
        &mut self.cells
    }

    /// Every cell is black.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.is_black())
    }

    /// Concatenated packed colors, row-major. Always [`WIRE_LEN`] characters.
    pub fn to_wire_encoding(&self) -> String {
        self.cells.iter().map(|c| c.to_packed4()).collect()
    }

    /// Inverse of [`Matrix::to_wire_encoding`].
    pub fn from_wire_encoding(text: &str) -> CubeResult<Self> {
        if text.len() != WIRE_LEN || !text.is_ascii() {
            return Err(CubeError::invalid_frame(format!(
                "wire frame must be {} ASCII characters, got {}",
                WIRE_LEN,
                text.len()
            )));
        }
        let colors = (0..CELLS)
            .map(|i| Color::from_packed4(&text[i * 4..i * 4 + 4]))
            .collect::<CubeResult<Vec<_>>>()?;
        Self::from_colors(colors)
    }

    /// Rotate about the center cell using the default mapping.
    pub fn rotate(&self, degrees: f64) -> Matrix {
        self.rotate_with(degrees, Vector::CENTER, RotationMapping::Mirrored)
    }

    /// Rotate about `center`.
    ///
    /// With [`RotationMapping::Mirrored`] the mapping is lossy for angles that
    /// are not multiples of 90 degrees: some destinations stay black, and when
    /// several sources land on one destination the last in row-major order wins.
    pub fn rotate_with(&self, degrees: f64, center: Vector, mapping: RotationMapping) -> Matrix {
        match mapping {
            RotationMapping::Mirrored => self.rotate_mirrored(degrees, center),
            RotationMapping::Clipped => self.rotate_clipped(degrees, center),
        }
    }

    fn rotate_mirrored(&self, degrees: f64, center: Vector) -> Matrix {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let cx = center.column as f64;
        let cy = center.row as f64;
        let mut rotated = Matrix::black();

        for source in Vector::all() {
            let dx = source.column as f64 - cx;
            let dy = source.row as f64 - cy;
            let column = (cx + dx * cos - dy * sin).abs().round() as usize;
            let row = (cy + dx * sin + dy * cos).abs().round() as usize;
            let target = Vector::new(row, column);
            if target.in_bounds() {
                rotated.cells[row * SIDE + column] = self.cells[source.row * SIDE + source.column];
            }
        }
        rotated
    }

    fn rotate_clipped(&self, degrees: f64, center: Vector) -> Matrix {
        // Inverse rotation: for each destination, find where it came from.
        let (sin, cos) = (-degrees).to_radians().sin_cos();
        let cx = center.column as f64;
        let cy = center.row as f64;
        let mut rotated = Matrix::black();

        for target in Vector::all() {
            let dx = target.column as f64 - cx;
            let dy = target.row as f64 - cy;
            let column = (cx + dx * cos - dy * sin).round();
            let row = (cy + dx * sin + dy * cos).round();
            if (0.0..SIDE as f64).contains(&column) && (0.0..SIDE as f64).contains(&row) {
                rotated.cells[target.row * SIDE + target.column] =
                    self.cells[row as usize * SIDE + column as usize];
            }
        }
        rotated
    }
}

impl std::fmt::Display for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.cells.chunks(SIDE) {
            let line: Vec<String> = row.iter().map(|c| c.to_hex()).collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
