use crate::models::board::{Board, Disk, BOARD_SIZE};

/// Deepest lookahead used by the search levels.
pub const MAX_SEARCH_DEPTH: u8 = 6;

// Static square values, corners high and the squares next to them negative.
// Symmetric, so `[x][y]` and `[y][x]` agree.
const POSITION_WEIGHTS: [[i32; BOARD_SIZE]; BOARD_SIZE] = [
    [20, -3, 11, 8, 8, 11, -3, 20],
    [-3, -7, -4, 1, 1, -4, -7, -3],
    [11, -4, 2, 2, 2, 2, -4, 11],
    [8, 1, 2, -3, -3, 2, 1, 8],
    [8, 1, 2, -3, -3, 2, 1, 8],
    [11, -4, 2, 2, 2, 2, -4, 11],
    [-3, -7, -4, 1, 1, -4, -7, -3],
    [20, -3, 11, 8, 8, 11, -3, 20],
];

const WIN_SCORE: i32 = 100_000;

/// Picks moves for the AI seat of a solo game.
pub trait OpponentStrategy: Send + Sync {
    /// A move `Board::apply_move` accepts for `disk`, or `None` when `disk`
    /// has to pass.
    fn choose_move(&self, board: &Board, disk: Disk, difficulty: u8) -> Option<(usize, usize)>;
}

/// Difficulty levels:
/// - `0` plays the first legal move
/// - `1` maximises its disk count
/// - `2` maximises the positional weight of its disks
/// - `3` and up search that many plies (at most [`MAX_SEARCH_DEPTH`]) with alpha-beta
///
/// Ties always go to the earliest move in `Board::legal_moves` order.
#[derive(Clone, Default)]
pub struct OpponentService;

impl OpponentService {
    pub fn new() -> Self {
        OpponentService
    }
}

impl OpponentStrategy for OpponentService {
    fn choose_move(&self, board: &Board, disk: Disk, difficulty: u8) -> Option<(usize, usize)> {
        let moves = board.legal_moves(disk);
        match difficulty {
            0 => moves.first().copied(),
            1 => best_move(board, disk, &moves, |next| disk_count(next, disk)),
            2 => best_move(board, disk, &moves, |next| positional_score(next, disk)),
            depth => search(board, disk, &moves, depth.min(MAX_SEARCH_DEPTH)),
        }
    }
}

/// Highest scoring move after one ply; the first one wins ties.
fn best_move<F>(board: &Board, disk: Disk, moves: &[(usize, usize)], score: F) -> Option<(usize, usize)>
where
    F: Fn(&Board) -> i32,
{
    let mut best: Option<((usize, usize), i32)> = None;
    for &(x, y) in moves {
        let (next, _) = board.apply_move(x as i32, y as i32, disk);
        let value = score(&next);
        if best.map_or(true, |(_, best_value)| value > best_value) {
            best = Some(((x, y), value));
        }
    }
    best.map(|(cell, _)| cell)
}

fn search(board: &Board, disk: Disk, moves: &[(usize, usize)], depth: u8) -> Option<(usize, usize)> {
    if moves.len() == 1 {
        return moves.first().copied();
    }

    let mut alpha = i32::MIN;
    let mut best: Option<((usize, usize), i32)> = None;
    for &(x, y) in moves {
        let (next, _) = board.apply_move(x as i32, y as i32, disk);
        let value = alpha_beta(&next, disk.opponent(), disk, depth - 1, alpha, i32::MAX);
        if best.map_or(true, |(_, best_value)| value > best_value) {
            best = Some(((x, y), value));
            alpha = alpha.max(value);
        }
    }
    best.map(|(cell, _)| cell)
}

/// Minimax value of `board` for `me` with `to_move` on turn. A side without
/// moves passes and the other side moves again at the same depth.
fn alpha_beta(board: &Board, to_move: Disk, me: Disk, depth: u8, mut alpha: i32, mut beta: i32) -> i32 {
    if board.game_over() {
        return final_score(board, me);
    }
    if depth == 0 {
        return evaluate(board, me);
    }

    let moves = board.legal_moves(to_move);
    if moves.is_empty() {
        return alpha_beta(board, to_move.opponent(), me, depth, alpha, beta);
    }

    if to_move == me {
        let mut value = i32::MIN;
        for (x, y) in moves {
            let (next, _) = board.apply_move(x as i32, y as i32, to_move);
            value = value.max(alpha_beta(&next, to_move.opponent(), me, depth - 1, alpha, beta));
            alpha = alpha.max(value);
            if alpha >= beta {
                break;
            }
        }
        value
    } else {
        let mut value = i32::MAX;
        for (x, y) in moves {
            let (next, _) = board.apply_move(x as i32, y as i32, to_move);
            value = value.min(alpha_beta(&next, to_move.opponent(), me, depth - 1, alpha, beta));
            beta = beta.min(value);
            if alpha >= beta {
                break;
            }
        }
        value
    }
}

fn disk_count(board: &Board, disk: Disk) -> i32 {
    let (player1, player2) = board.keep_score();
    match disk {
        Disk::Player1 => player1 as i32,
        Disk::Player2 => player2 as i32,
    }
}

fn positional_score(board: &Board, disk: Disk) -> i32 {
    let mut total = 0;
    for (x, column) in POSITION_WEIGHTS.iter().enumerate() {
        for (y, weight) in column.iter().enumerate() {
            match board.get(x, y) {
                Some(cell) if cell == disk => total += weight,
                Some(_) => total -= weight,
                None => {}
            }
        }
    }
    total
}

/// Share of `ours` in `ours + theirs`, scaled to -100..=100.
fn normalized(ours: i32, theirs: i32) -> i32 {
    if ours + theirs == 0 {
        0
    } else {
        100 * (ours - theirs) / (ours + theirs)
    }
}

fn evaluate(board: &Board, me: Disk) -> i32 {
    let opponent = me.opponent();
    let mobility = normalized(
        board.legal_moves(me).len() as i32,
        board.legal_moves(opponent).len() as i32,
    );
    let parity = normalized(disk_count(board, me), disk_count(board, opponent));
    10 * positional_score(board, me) + mobility + parity
}

fn final_score(board: &Board, me: Disk) -> i32 {
    let margin = disk_count(board, me) - disk_count(board, me.opponent());
    match margin.signum() {
        1 => WIN_SCORE + margin,
        -1 => -WIN_SCORE + margin,
        _ => 0,
    }
}
