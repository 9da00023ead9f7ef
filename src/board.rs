//! Board geometry: camera-pixel → board-pixel → cell transforms.
//!
//! All coordinate arithmetic in the crate lives here; other modules deal in
//! `PixelPoint` and `Cell` only.

use serde::Serialize;

pub const BOARD_DIM: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PixelPoint {
    pub x: f32,
    pub y: f32,
}

impl PixelPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A board square. Row 0 is the top of the overlay (black's back rank),
/// col 0 the left edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Cell {
    pub row: u8,
    pub col: u8,
}

impl Cell {
    pub fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }
}

/// Scale a camera-space point into board-overlay space. Each axis scales
/// independently; aspect ratio is not preserved.
pub fn to_board_pixel(cam: PixelPoint, cam_size: (f32, f32), board_size: (f32, f32)) -> PixelPoint {
    PixelPoint {
        x: cam.x * (board_size.0 / cam_size.0),
        y: cam.y * (board_size.1 / cam_size.1),
    }
}

/// Map a board-space point to the square under it, or `None` when the point
/// falls outside the 8×8 grid on either axis.
pub fn to_cell(p: PixelPoint, square_size: f32) -> Option<Cell> {
    if p.x < 0.0 || p.y < 0.0 {
        return None;
    }
    let col = (p.x / square_size).floor() as i64;
    let row = (p.y / square_size).floor() as i64;
    if (0..BOARD_DIM as i64).contains(&row) && (0..BOARD_DIM as i64).contains(&col) {
        Some(Cell {
            row: row as u8,
            col: col as u8,
        })
    } else {
        None
    }
}

/// Geometric center of a square, in board space.
pub fn cell_center(cell: Cell, square_size: f32) -> PixelPoint {
    PixelPoint {
        x: cell.col as f32 * square_size + square_size / 2.0,
        y: cell.row as f32 * square_size + square_size / 2.0,
    }
}
