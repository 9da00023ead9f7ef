//! Draw primitives handed to the render-sink collaborator.
//!
//! The session loop composes one `Scene` per iteration; sinks only
//! serialize or drop it. Pixel-level compositing is someone else's job.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use crate::board::{BOARD_DIM, Cell, PixelPoint};
use crate::engine::Game;
use crate::selection::SelectionController;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCmd {
    Square { cell: Cell, dark: bool },
    Piece { cell: Cell, symbol: char },
    MoveHint { cell: Cell },
    CheckSquare { cell: Cell },
    DraggedPiece { symbol: char, at: PixelPoint },
    Status { text: String },
    Thinking,
}

#[derive(Debug, Clone, Serialize)]
pub struct Scene {
    pub board_size: f32,
    pub square_size: f32,
    pub cmds: Vec<DrawCmd>,
}

/// Status line matching the overlay's banner.
pub fn status_text(game: &Game, ai_enabled: bool) -> String {
    if game.is_checkmate() {
        let winner = if game.white_to_move() { "Black" } else { "White" };
        format!("Checkmate! {winner} wins!")
    } else if game.is_stalemate() {
        "Stalemate! Game is a draw.".to_string()
    } else if game.white_to_move() {
        format!("White to move{}", if ai_enabled { " (Human)" } else { "" })
    } else {
        format!("Black to move{}", if ai_enabled { " (AI)" } else { "" })
    }
}

/// Build the frame's draw list: squares, move hints for the current
/// selection, pieces (the dragged one drawn at the pinch instead of its
/// origin square), check highlight, status banner, thinking indicator.
pub fn compose(
    game: &Game,
    selection: &SelectionController,
    pinch_point: Option<PixelPoint>,
    square_size: f32,
    ai_enabled: bool,
    ai_thinking: bool,
) -> Scene {
    let mut cmds = Vec::with_capacity(96);

    for row in 0..BOARD_DIM {
        for col in 0..BOARD_DIM {
            cmds.push(DrawCmd::Square {
                cell: Cell::new(row, col),
                dark: (row + col) % 2 == 1,
            });
        }
    }

    for req in selection.legal_moves_from_selection(game) {
        cmds.push(DrawCmd::MoveHint { cell: req.to });
    }

    if game.in_check() {
        let side = game.side_to_move();
        if let Some(cell) = game.king_cell(side) {
            cmds.push(DrawCmd::CheckSquare { cell });
        }
    }

    let origin = selection.drag().origin;
    let grid = game.board();
    for (row, rank) in grid.iter().enumerate() {
        for (col, square) in rank.iter().enumerate() {
            let cell = Cell::new(row as u8, col as u8);
            if Some(cell) == origin {
                continue; // drawn at the pinch point instead
            }
            if let Some(symbol) = *square {
                cmds.push(DrawCmd::Piece { cell, symbol });
            }
        }
    }

    if let (Some(point), Some(symbol)) = (pinch_point, selection.drag().piece) {
        if let Some(at) = selection.drag_position(point) {
            cmds.push(DrawCmd::DraggedPiece { symbol, at });
        }
    }

    cmds.push(DrawCmd::Status {
        text: status_text(game, ai_enabled),
    });
    if ai_thinking {
        cmds.push(DrawCmd::Thinking);
    }

    Scene {
        board_size: square_size * BOARD_DIM as f32,
        square_size,
        cmds,
    }
}

pub trait RenderSink {
    fn present(&mut self, scene: &Scene) -> Result<()>;
}

/// Headless sink: accepts everything, draws nothing.
pub struct NullSink;

impl RenderSink for NullSink {
    fn present(&mut self, _scene: &Scene) -> Result<()> {
        Ok(())
    }
}

/// Streams one JSON line per scene to a compositor process or file.
pub struct JsonlSink<W: Write> {
    out: W,
}

impl<W: Write> JsonlSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> RenderSink for JsonlSink<W> {
    fn present(&mut self, scene: &Scene) -> Result<()> {
        serde_json::to_writer(&mut self.out, scene)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}
