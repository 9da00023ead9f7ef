//! Piece selection and drag state machine.
//!
//! Two states, Idle and Dragging, driven by the pinch edge events the
//! session loop synthesizes. `DragState` is owned and mutated here only.

use log::{debug, info};

use crate::board::{self, Cell, PixelPoint};
use crate::engine::{Game, MoveReq};

#[derive(Debug, Clone, Copy, Default)]
pub struct DragState {
    pub piece: Option<char>,
    pub origin: Option<Cell>,
    /// Pinch point minus the origin cell's center, so the dragged sprite
    /// tracks the fingers instead of snapping to the cell center.
    pub offset: (f32, f32),
    pub dragging: bool,
}

pub struct SelectionController {
    drag: DragState,
    square_size: f32,
}

impl SelectionController {
    pub fn new(square_size: f32) -> Self {
        Self {
            drag: DragState::default(),
            square_size,
        }
    }

    pub fn drag(&self) -> &DragState {
        &self.drag
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.dragging
    }

    /// Pinch closed: try to pick up whatever sits under the point.
    ///
    /// Selection is not gated by side-to-move — any occupied square can be
    /// picked up, and legality (including turn order) is settled entirely by
    /// the drag-end check. Off-board or empty squares leave us Idle.
    pub fn on_pinch_start(&mut self, point: PixelPoint, game: &Game) {
        let Some(cell) = board::to_cell(point, self.square_size) else {
            debug!("pinch started off the board at {point:?}");
            return;
        };
        let Some(piece) = game.piece_at(cell) else {
            debug!("pinch started on empty cell {cell:?}");
            return;
        };

        let center = board::cell_center(cell, self.square_size);
        self.drag = DragState {
            piece: Some(piece),
            origin: Some(cell),
            offset: (point.x - center.x, point.y - center.y),
            dragging: true,
        };
        debug!("picked up '{piece}' at {cell:?}");
    }

    /// Pinch held: nothing to record. The live sprite position is derived on
    /// demand via [`drag_position`](Self::drag_position).
    pub fn on_pinch_move(&mut self, _point: PixelPoint) {}

    /// Pinch released. Commits the move iff the target resolves to a cell
    /// and the origin→target pair is in the engine's legal set; every other
    /// outcome is a silent no-op. DragState resets unconditionally.
    pub fn on_pinch_end(&mut self, point: Option<PixelPoint>, game: &mut Game) {
        if let (true, Some(origin)) = (self.drag.dragging, self.drag.origin) {
            match point.and_then(|p| board::to_cell(p, self.square_size)) {
                Some(target) => {
                    let req = MoveReq {
                        from: origin,
                        to: target,
                    };
                    if game.commit(req) {
                        info!("played {origin:?} -> {target:?}");
                    } else {
                        debug!("illegal move attempt {origin:?} -> {target:?}");
                    }
                }
                None => debug!("drop outside the board, piece returned"),
            }
        }
        self.drag = DragState::default();
    }

    /// Legal moves out of the selected origin, for highlighting only.
    pub fn legal_moves_from_selection(&self, game: &Game) -> Vec<MoveReq> {
        match (self.drag.dragging, self.drag.origin) {
            (true, Some(origin)) => game
                .legal_moves()
                .into_iter()
                .filter(|m| m.from == origin)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Where to draw the dragged sprite for the current pinch point.
    pub fn drag_position(&self, point: PixelPoint) -> Option<PixelPoint> {
        if self.drag.dragging && self.drag.piece.is_some() {
            Some(PixelPoint::new(
                point.x - self.drag.offset.0,
                point.y - self.drag.offset.1,
            ))
        } else {
            None
        }
    }
}
