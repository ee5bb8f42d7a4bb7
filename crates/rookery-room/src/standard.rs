//! Standard chess rules, backed by the `chess` crate's move generator.

use ::chess::{Board, BoardStatus, ChessMove, File, Piece, Rank};
use rookery_protocol::{Color, MoveSpec, Promotion, Square};

use crate::{Applied, IllegalMove, Outcome, Rules};

/// Orthodox chess from the standard starting position.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardChess;

impl Rules for StandardChess {
    type Position = Board;

    fn initial_position() -> Board {
        Board::default()
    }

    fn side_to_move(position: &Board) -> Color {
        from_engine_color(position.side_to_move())
    }

    fn apply(position: &Board, mv: &MoveSpec) -> Result<Applied<Board>, IllegalMove> {
        let from = to_engine_square(mv.from);
        let to = to_engine_square(mv.to);

        let piece = position
            .piece_on(from)
            .ok_or_else(|| IllegalMove::new(*mv, "no piece on origin square"))?;

        // The engine only accepts a promotion piece on an actual promotion.
        let mover = position.side_to_move();
        let promotion = (piece == Piece::Pawn && to.get_rank() == mover.to_their_backrank())
            .then(|| to_engine_piece(mv.promotion_or_default()));

        let chess_move = ChessMove::new(from, to, promotion);
        if !position.legal(chess_move) {
            return Err(IllegalMove::new(*mv, "not legal in this position"));
        }

        let next = position.make_move_new(chess_move);
        let outcome = match next.status() {
            BoardStatus::Ongoing => None,
            BoardStatus::Stalemate => Some(Outcome::Stalemate),
            BoardStatus::Checkmate => Some(Outcome::Checkmate {
                winner: from_engine_color(mover),
            }),
        };

        Ok(Applied {
            position: next,
            outcome,
        })
    }
}

fn to_engine_square(square: Square) -> ::chess::Square {
    ::chess::Square::make_square(
        Rank::from_index(square.rank_index()),
        File::from_index(square.file_index()),
    )
}

fn to_engine_piece(promotion: Promotion) -> Piece {
    match promotion {
        Promotion::Queen => Piece::Queen,
        Promotion::Rook => Piece::Rook,
        Promotion::Bishop => Piece::Bishop,
        Promotion::Knight => Piece::Knight,
    }
}

fn from_engine_color(color: ::chess::Color) -> Color {
    match color {
        ::chess::Color::White => Color::White,
        ::chess::Color::Black => Color::Black,
    }
}
