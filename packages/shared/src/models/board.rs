use std::fmt;

use serde::{Deserialize, Serialize};

pub const BOARD_SIZE: usize = 8;

const DIRECTIONS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// One of the two disk colors. `Player1` always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Disk {
    Player1,
    Player2,
}

impl Disk {
    pub fn opponent(self) -> Disk {
        match self {
            Disk::Player1 => Disk::Player2,
            Disk::Player2 => Disk::Player1,
        }
    }
}

impl From<Disk> for u8 {
    fn from(disk: Disk) -> Self {
        match disk {
            Disk::Player1 => 1,
            Disk::Player2 => 2,
        }
    }
}

impl TryFrom<u8> for Disk {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Disk::Player1),
            2 => Ok(Disk::Player2),
            other => Err(format!("invalid disk value {}", other)),
        }
    }
}

impl fmt::Display for Disk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", u8::from(*self))
    }
}

type Cells = [[Option<Disk>; BOARD_SIZE]; BOARD_SIZE];
type WireCells = [[u8; BOARD_SIZE]; BOARD_SIZE];

/// An 8x8 Othello board addressed as `(x, y)`.
///
/// On the wire the board is a column-major nested array (`board[x][y]`) of
/// `0` (empty), `1` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireCells", try_from = "WireCells")]
pub struct Board {
    cells: Cells,
}

impl Board {
    /// The canonical opening position.
    pub fn new() -> Self {
        Board::with_disks(&[(3, 3), (4, 4)], &[(3, 4), (4, 3)])
    }

    pub fn empty() -> Self {
        Board {
            cells: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Builds a board from explicit disk positions. Out of range positions are ignored.
    pub fn with_disks(player1: &[(usize, usize)], player2: &[(usize, usize)]) -> Self {
        let mut board = Board::empty();
        for (positions, disk) in [(player1, Disk::Player1), (player2, Disk::Player2)] {
            for &(x, y) in positions {
                if x < BOARD_SIZE && y < BOARD_SIZE {
                    board.cells[x][y] = Some(disk);
                }
            }
        }
        board
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Disk> {
        self.cells.get(x).and_then(|column| column.get(y)).copied().flatten()
    }

    /// Places `disk` at `(x, y)` and flips every flanked line.
    ///
    /// Returns the resulting board and whether the move was legal. An illegal
    /// move (occupied cell, nothing flanked, or out of range) leaves the board
    /// untouched.
    pub fn apply_move(&self, x: i32, y: i32, disk: Disk) -> (Board, bool) {
        let Some((cx, cy)) = in_bounds(x, y) else {
            return (*self, false);
        };
        if self.cells[cx][cy].is_some() {
            return (*self, false);
        }

        let mut next = *self;
        let mut changed = false;
        for (dx, dy) in DIRECTIONS {
            let run = self.flanked_run(x, y, dx, dy, disk);
            if run == 0 {
                continue;
            }
            changed = true;
            for step in 1..=run as i32 {
                // in range: the run was bounded by an on-board disk
                let fx = (x + dx * step) as usize;
                let fy = (y + dy * step) as usize;
                next.cells[fx][fy] = Some(disk);
            }
        }

        if !changed {
            return (*self, false);
        }
        next.cells[cx][cy] = Some(disk);
        (next, true)
    }

    pub fn is_legal_move(&self, x: i32, y: i32, disk: Disk) -> bool {
        match in_bounds(x, y) {
            Some((cx, cy)) if self.cells[cx][cy].is_none() => DIRECTIONS
                .iter()
                .any(|&(dx, dy)| self.flanked_run(x, y, dx, dy, disk) > 0),
            _ => false,
        }
    }

    /// Legal moves for `disk`, ordered by `x` then `y`.
    pub fn legal_moves(&self, disk: Disk) -> Vec<(usize, usize)> {
        let mut moves = Vec::new();
        for x in 0..BOARD_SIZE {
            for y in 0..BOARD_SIZE {
                if self.is_legal_move(x as i32, y as i32, disk) {
                    moves.push((x, y));
                }
            }
        }
        moves
    }

    pub fn has_legal_move(&self, disk: Disk) -> bool {
        (0..BOARD_SIZE).any(|x| {
            (0..BOARD_SIZE).any(|y| self.is_legal_move(x as i32, y as i32, disk))
        })
    }

    /// Disk counts as `(player 1, player 2)`.
    pub fn keep_score(&self) -> (usize, usize) {
        self.cells
            .iter()
            .flatten()
            .fold((0, 0), |(p1, p2), cell| match cell {
                Some(Disk::Player1) => (p1 + 1, p2),
                Some(Disk::Player2) => (p1, p2 + 1),
                None => (p1, p2),
            })
    }

    pub fn game_over(&self) -> bool {
        !self.has_legal_move(Disk::Player1) && !self.has_legal_move(Disk::Player2)
    }

    /// Length of the opposing run starting next to `(x, y)` in direction
    /// `(dx, dy)` that is closed by a `disk`; 0 when the line does not flank.
    fn flanked_run(&self, x: i32, y: i32, dx: i32, dy: i32, disk: Disk) -> usize {
        let opponent = disk.opponent();
        let mut run = 0;
        let (mut cx, mut cy) = (x + dx, y + dy);
        while let Some((bx, by)) = in_bounds(cx, cy) {
            match self.cells[bx][by] {
                Some(d) if d == opponent => run += 1,
                Some(_) => return run,
                None => return 0,
            }
            cx += dx;
            cy += dy;
        }
        0
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

fn in_bounds(x: i32, y: i32) -> Option<(usize, usize)> {
    let size = BOARD_SIZE as i32;
    if (0..size).contains(&x) && (0..size).contains(&y) {
        Some((x as usize, y as usize))
    } else {
        None
    }
}

impl From<Board> for WireCells {
    fn from(board: Board) -> Self {
        let mut wire = [[0u8; BOARD_SIZE]; BOARD_SIZE];
        for (x, column) in board.cells.iter().enumerate() {
            for (y, cell) in column.iter().enumerate() {
                wire[x][y] = cell.map(u8::from).unwrap_or(0);
            }
        }
        wire
    }
}

impl TryFrom<WireCells> for Board {
    type Error = String;

    fn try_from(wire: WireCells) -> Result<Self, Self::Error> {
        let mut board = Board::empty();
        for (x, column) in wire.iter().enumerate() {
            for (y, &value) in column.iter().enumerate() {
                board.cells[x][y] = match value {
                    0 => None,
                    other => Some(Disk::try_from(other)?),
                };
            }
        }
        Ok(board)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..BOARD_SIZE {
            writeln!(f)?;
            for x in 0..BOARD_SIZE {
                let ch = match self.cells[x][y] {
                    None => '_',
                    Some(Disk::Player1) => 'x',
                    Some(Disk::Player2) => 'o',
                };
                write!(f, "{}", ch)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn all_cells() -> impl Iterator<Item = (usize, usize)> {
        (0..BOARD_SIZE).flat_map(|x| (0..BOARD_SIZE).map(move |y| (x, y)))
    }

    #[test]
    fn test_opening_position() {
        let board = Board::new();

        assert_eq!(board.get(3, 3), Some(Disk::Player1));
        assert_eq!(board.get(4, 4), Some(Disk::Player1));
        assert_eq!(board.get(3, 4), Some(Disk::Player2));
        assert_eq!(board.get(4, 3), Some(Disk::Player2));
        assert_eq!(board.keep_score(), (2, 2));
        assert!(!board.game_over());
    }

    #[test]
    fn test_apply_move_flips_flanked_disk() {
        let board = Board::new();

        let (next, changed) = board.apply_move(2, 4, Disk::Player1);

        assert!(changed);
        let expected = Board::with_disks(&[(3, 3), (4, 4), (3, 4), (2, 4)], &[(4, 3)]);
        assert_eq!(next, expected, "got board:{}", next);
        assert_eq!(next.keep_score(), (4, 1));
    }

    #[test]
    fn test_apply_move_flips_multiple_directions() {
        let board = Board::with_disks(
            &[(4, 4), (0, 4)],
            &[(1, 1), (2, 2), (3, 3), (0, 1), (0, 2), (0, 3)],
        );

        let (next, changed) = board.apply_move(0, 0, Disk::Player1);

        assert!(changed);
        for (x, y) in [(1, 1), (2, 2), (3, 3), (0, 1), (0, 2), (0, 3)] {
            assert_eq!(next.get(x, y), Some(Disk::Player1), "cell ({}, {})", x, y);
        }
        assert_eq!(next.keep_score(), (9, 0));
    }

    #[rstest]
    #[case::occupied(3, 3)]
    #[case::no_flank(0, 0)]
    #[case::adjacent_without_bound(5, 5)]
    #[case::negative_x(-1, 4)]
    #[case::negative_y(2, -1)]
    #[case::past_edge(8, 4)]
    #[case::far_away(100, 100)]
    fn test_illegal_moves_leave_board_unchanged(#[case] x: i32, #[case] y: i32) {
        let board = Board::new();

        let (next, changed) = board.apply_move(x, y, Disk::Player1);

        assert!(!changed);
        assert_eq!(next, board);
        assert!(!board.is_legal_move(x, y, Disk::Player1));
    }

    #[test]
    fn test_legal_moves_are_ordered_by_x_then_y() {
        let board = Board::new();

        assert_eq!(
            board.legal_moves(Disk::Player1),
            vec![(2, 4), (3, 5), (4, 2), (5, 3)]
        );
        assert_eq!(
            board.legal_moves(Disk::Player2),
            vec![(2, 3), (3, 2), (4, 5), (5, 4)]
        );
    }

    #[test]
    fn test_game_over_on_full_board() {
        let all: Vec<(usize, usize)> = all_cells().collect();
        let board = Board::with_disks(&all, &[]);

        assert!(board.game_over());
        assert_eq!(board.keep_score(), (64, 0));
    }

    #[test]
    fn test_game_over_when_neither_side_can_move() {
        // lone disks of each color with no flanking lines anywhere
        let board = Board::with_disks(&[(0, 0)], &[(7, 7)]);

        assert!(board.game_over());
    }

    #[test]
    fn test_one_sided_position_is_not_over() {
        // player 1 can capture (1,0) from (2,0); player 2 has nothing to flank
        let board = Board::with_disks(&[(0, 0)], &[(1, 0)]);

        assert!(board.has_legal_move(Disk::Player1));
        assert!(!board.has_legal_move(Disk::Player2));
        assert!(!board.game_over());
    }

    #[test]
    fn test_wire_format_is_column_major() {
        let board = Board::with_disks(&[(1, 0)], &[(0, 2)]);

        let value = serde_json::to_value(board).unwrap();

        assert_eq!(value[1][0], 1);
        assert_eq!(value[0][2], 2);
        assert_eq!(value[0][1], 0);
        let decoded: Board = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, board);
    }

    #[test]
    fn test_wire_format_rejects_unknown_cell_values() {
        let mut wire = [[0u8; BOARD_SIZE]; BOARD_SIZE];
        wire[2][2] = 3;

        let result: Result<Board, _> = serde_json::from_value(serde_json::json!(wire));

        assert!(result.is_err());
    }

    #[test]
    fn test_display_renders_rows() {
        let rendered = Board::new().to_string();

        let rows: Vec<&str> = rendered.lines().skip(1).collect();
        assert_eq!(rows.len(), BOARD_SIZE);
        assert_eq!(rows[3], "___xo___");
        assert_eq!(rows[4], "___ox___");
    }

    /// Plays a sequence of move picks from the opening; each pick indexes
    /// into the current legal moves of whichever side is to move.
    fn play(picks: &[usize]) -> Vec<Board> {
        let mut boards = vec![Board::new()];
        let mut disk = Disk::Player1;
        for &pick in picks {
            let board = *boards.last().unwrap();
            let mut moves = board.legal_moves(disk);
            if moves.is_empty() {
                disk = disk.opponent();
                moves = board.legal_moves(disk);
                if moves.is_empty() {
                    break;
                }
            }
            let (x, y) = moves[pick % moves.len()];
            let (next, changed) = board.apply_move(x as i32, y as i32, disk);
            assert!(changed);
            boards.push(next);
            disk = disk.opponent();
        }
        boards
    }

    proptest! {
        #[test]
        fn prop_legal_move_only_changes_flanked_lines(
            picks in proptest::collection::vec(0usize..64, 0..30),
            disk_is_p1 in any::<bool>(),
        ) {
            let board = *play(&picks).last().unwrap();
            let disk = if disk_is_p1 { Disk::Player1 } else { Disk::Player2 };

            for (x, y) in board.legal_moves(disk) {
                let (next, changed) = board.apply_move(x as i32, y as i32, disk);
                prop_assert!(changed);
                prop_assert_eq!(next.get(x, y), Some(disk));

                for (cx, cy) in all_cells() {
                    let before = board.get(cx, cy);
                    let after = next.get(cx, cy);
                    if before == after || (cx, cy) == (x, y) {
                        continue;
                    }
                    // a changed cell was an opponent disk on a line from (x, y)
                    prop_assert_eq!(before, Some(disk.opponent()));
                    prop_assert_eq!(after, Some(disk));
                    let (dx, dy) = (cx as i32 - x as i32, cy as i32 - y as i32);
                    prop_assert!(dx == 0 || dy == 0 || dx.abs() == dy.abs());
                }
            }
        }

        #[test]
        fn prop_score_stays_in_bounds_and_never_shrinks(
            picks in proptest::collection::vec(0usize..64, 0..60),
        ) {
            let boards = play(&picks);
            let mut previous = 4;
            for board in boards {
                let (p1, p2) = board.keep_score();
                let total = p1 + p2;
                prop_assert!((4..=64).contains(&total));
                prop_assert!(total >= previous);
                previous = total;
            }
        }

        #[test]
        fn prop_illegal_moves_are_no_ops(
            picks in proptest::collection::vec(0usize..64, 0..30),
            x in -2i32..10,
            y in -2i32..10,
        ) {
            let board = *play(&picks).last().unwrap();
            for disk in [Disk::Player1, Disk::Player2] {
                if !board.is_legal_move(x, y, disk) {
                    let (next, changed) = board.apply_move(x, y, disk);
                    prop_assert!(!changed);
                    prop_assert_eq!(next, board);
                }
            }
        }
    }
}
