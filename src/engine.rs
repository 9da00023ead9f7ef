//! Facade over the shakmaty rules engine.
//!
//! The rest of the crate speaks cells and `MoveReq`s; everything
//! chess-rule-shaped (legality, check, mate) is delegated to shakmaty.
//! Row 0 = rank 8 so the grid reads top-down like the rendered overlay.

use shakmaty::{Chess, Color, File, Move, Position, Rank, Role, Square};

use crate::board::Cell;

/// An origin/target pair built at drag end (or by the opponent worker) and
/// resolved against the legal-move set before anything mutates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveReq {
    pub from: Cell,
    pub to: Cell,
}

fn to_square(cell: Cell) -> Square {
    Square::from_coords(File::new(cell.col as u32), Rank::new(7 - cell.row as u32))
}

fn to_board_cell(sq: Square) -> Cell {
    Cell {
        row: 7 - u32::from(sq.rank()) as u8,
        col: u32::from(sq.file()) as u8,
    }
}

/// Collapse a shakmaty move to its origin/target cells. Castling is exposed
/// by the king's two-square destination so a drag of the king matches it;
/// drops (never legal in standard chess) collapse to `None`.
fn req_of(m: &Move) -> Option<MoveReq> {
    match *m {
        Move::Castle { king, rook } => {
            let file = if rook.file() > king.file() { File::G } else { File::C };
            let to = Square::from_coords(file, king.rank());
            Some(MoveReq {
                from: to_board_cell(king),
                to: to_board_cell(to),
            })
        }
        _ => m.from().map(|from| MoveReq {
            from: to_board_cell(from),
            to: to_board_cell(m.to()),
        }),
    }
}

#[derive(Debug, Clone, Default)]
pub struct Game {
    pos: Chess,
}

impl Game {
    pub fn new() -> Self {
        Self::default()
    }

    /// Piece on a square as its ASCII symbol: uppercase white, lowercase
    /// black, `None` for empty.
    pub fn piece_at(&self, cell: Cell) -> Option<char> {
        self.pos.board().piece_at(to_square(cell)).map(|p| p.char())
    }

    /// The full 8×8 grid, row 0 first.
    pub fn board(&self) -> [[Option<char>; 8]; 8] {
        let mut grid = [[None; 8]; 8];
        for (row, rank) in grid.iter_mut().enumerate() {
            for (col, square) in rank.iter_mut().enumerate() {
                *square = self.piece_at(Cell::new(row as u8, col as u8));
            }
        }
        grid
    }

    pub fn side_to_move(&self) -> Color {
        self.pos.turn()
    }

    pub fn white_to_move(&self) -> bool {
        self.pos.turn() == Color::White
    }

    pub fn in_check(&self) -> bool {
        self.pos.is_check()
    }

    pub fn is_checkmate(&self) -> bool {
        self.pos.is_checkmate()
    }

    pub fn is_stalemate(&self) -> bool {
        self.pos.is_stalemate()
    }

    pub fn king_cell(&self, color: Color) -> Option<Cell> {
        self.pos.board().king_of(color).map(to_board_cell)
    }

    /// Legal moves as deduplicated origin/target pairs (the four promotion
    /// variants of one pawn push collapse to a single entry).
    pub fn legal_moves(&self) -> Vec<MoveReq> {
        let mut out: Vec<MoveReq> = Vec::new();
        for m in self.pos.legal_moves() {
            if let Some(req) = req_of(&m) {
                if !out.contains(&req) {
                    out.push(req);
                }
            }
        }
        out
    }

    /// Apply a request iff it matches a legal move. Promotions auto-queen.
    /// Returns false (board untouched) for anything illegal.
    pub fn commit(&mut self, req: MoveReq) -> bool {
        for m in self.pos.legal_moves() {
            if req_of(&m) == Some(req) {
                match m.promotion() {
                    None | Some(Role::Queen) => {
                        self.pos.play_unchecked(&m);
                        return true;
                    }
                    _ => {}
                }
            }
        }
        false
    }

    /// Read-only position clone for the opponent worker.
    pub fn snapshot(&self) -> Chess {
        self.pos.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(row: u8, col: u8) -> Cell {
        Cell::new(row, col)
    }

    #[test]
    fn grid_reads_top_down() {
        let game = Game::new();
        assert_eq!(game.piece_at(cell(0, 0)), Some('r'));
        assert_eq!(game.piece_at(cell(0, 4)), Some('k'));
        assert_eq!(game.piece_at(cell(7, 4)), Some('K'));
        assert_eq!(game.piece_at(cell(6, 0)), Some('P'));
        assert_eq!(game.piece_at(cell(4, 4)), None);
    }

    #[test]
    fn square_cell_round_trip() {
        for row in 0..8 {
            for col in 0..8 {
                let c = cell(row, col);
                assert_eq!(to_board_cell(to_square(c)), c);
            }
        }
    }

    #[test]
    fn starting_position_has_twenty_moves() {
        let game = Game::new();
        assert!(game.white_to_move());
        assert_eq!(game.legal_moves().len(), 20);
    }

    #[test]
    fn commit_applies_legal_moves_and_flips_the_turn() {
        let mut game = Game::new();
        // e2 → e4
        let req = MoveReq {
            from: cell(6, 4),
            to: cell(4, 4),
        };
        assert!(game.commit(req));
        assert_eq!(game.piece_at(cell(4, 4)), Some('P'));
        assert_eq!(game.piece_at(cell(6, 4)), None);
        assert!(!game.white_to_move());
    }

    #[test]
    fn commit_rejects_illegal_moves_without_mutating() {
        let mut game = Game::new();
        let before = game.board();
        // rook through its own pawn
        let req = MoveReq {
            from: cell(7, 0),
            to: cell(4, 0),
        };
        assert!(!game.commit(req));
        assert_eq!(game.board(), before);
        assert!(game.white_to_move());
    }

    #[test]
    fn fools_mate_is_reported() {
        let mut game = Game::new();
        for (from, to) in [
            ((6, 5), (5, 5)), // f3
            ((1, 4), (3, 4)), // e5
            ((6, 6), (4, 6)), // g4
            ((0, 3), (4, 7)), // Qh4#
        ] {
            assert!(game.commit(MoveReq {
                from: cell(from.0, from.1),
                to: cell(to.0, to.1),
            }));
        }
        assert!(game.is_checkmate());
        assert!(game.in_check());
        assert!(game.legal_moves().is_empty());
        assert_eq!(game.king_cell(Color::White), Some(cell(7, 4)));
    }

    #[test]
    fn promotion_collapses_to_a_single_request() {
        // White pawn on a7, kings tucked away; a8 holds promotion choices.
        use shakmaty::fen::Fen;
        use shakmaty::CastlingMode;
        let fen: Fen = "8/P6k/8/8/8/8/8/K7 w - - 0 1".parse().unwrap();
        let pos: Chess = fen.into_position(CastlingMode::Standard).unwrap();
        let mut game = Game { pos };
        let push = MoveReq {
            from: cell(1, 0),
            to: cell(0, 0),
        };
        let count = game
            .legal_moves()
            .iter()
            .filter(|m| **m == push)
            .count();
        assert_eq!(count, 1);
        assert!(game.commit(push));
        assert_eq!(game.piece_at(cell(0, 0)), Some('Q'));
    }
}
