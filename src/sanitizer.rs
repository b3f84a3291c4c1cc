//! Fleet sanitizer: rebuilds a fleet purely from the geometry of an
//! untrusted grid submission.
//!
//! The submitted identifiers are only used to tell ships apart. Every run is
//! re-derived from adjacency, checked for straightness and against the
//! standard fleet, then renumbered `1..=5` by ascending submitted id. The
//! result is either a fully consistent [`Board`] or an error, never a
//! partial fleet.

use alloc::vec::Vec;

use crate::board::Board;
use crate::common::{Coord, FleetError};
use crate::config::{BOARD_SIZE, FLEET_LENGTHS};
use crate::ship::{Orientation, Ship};

/// A run of same-identifier cells extracted from the submission.
#[derive(Debug)]
struct Run {
    id: i64,
    cells: Vec<Coord>,
}

/// Validate `grid` and return the canonical board it describes.
pub fn sanitize_fleet<R: AsRef<[i64]>>(grid: &[R]) -> Result<Board, FleetError> {
    let cells = read_grid(grid)?;
    let mut visited = [[false; BOARD_SIZE]; BOARD_SIZE];
    let mut runs: Vec<Run> = Vec::new();

    for r in 0..BOARD_SIZE {
        for c in 0..BOARD_SIZE {
            let id = cells[r][c];
            if id == 0 || visited[r][c] {
                continue;
            }
            let run = extract_run(&cells, &mut visited, r, c);
            reject_branches(&cells, &run)?;
            if runs.iter().any(|other| other.id == id) {
                return Err(FleetError::DuplicateId { id });
            }
            runs.push(run);
        }
    }

    let mut lengths: Vec<usize> = runs.iter().map(|run| run.cells.len()).collect();
    lengths.sort_unstable_by(|a, b| b.cmp(a));
    if lengths.as_slice() != FLEET_LENGTHS.as_slice() {
        return Err(FleetError::BadLengths);
    }

    runs.sort_by_key(|run| run.id);
    let ships = runs
        .into_iter()
        .enumerate()
        .map(|(i, run)| Ship::new(i as u8 + 1, run.cells))
        .collect();
    Ok(Board::from_ships(ships))
}

fn read_grid<R: AsRef<[i64]>>(grid: &[R]) -> Result<[[i64; BOARD_SIZE]; BOARD_SIZE], FleetError> {
    if grid.len() != BOARD_SIZE {
        return Err(FleetError::BadShape);
    }
    let mut cells = [[0i64; BOARD_SIZE]; BOARD_SIZE];
    for (r, row) in grid.iter().enumerate() {
        let row = row.as_ref();
        if row.len() != BOARD_SIZE {
            return Err(FleetError::BadShape);
        }
        for (c, &value) in row.iter().enumerate() {
            if value < 0 {
                return Err(FleetError::NegativeCell { row: r, col: c });
            }
            cells[r][c] = value;
        }
    }
    Ok(cells)
}

/// Walk a single straight run starting at `(row, col)`, preferring the
/// horizontal direction when the right neighbour matches.
fn extract_run(
    cells: &[[i64; BOARD_SIZE]; BOARD_SIZE],
    visited: &mut [[bool; BOARD_SIZE]; BOARD_SIZE],
    row: usize,
    col: usize,
) -> Run {
    let id = cells[row][col];
    let direction = if col + 1 < BOARD_SIZE && cells[row][col + 1] == id {
        Some(Orientation::Horizontal)
    } else if row + 1 < BOARD_SIZE && cells[row + 1][col] == id {
        Some(Orientation::Vertical)
    } else {
        None
    };

    visited[row][col] = true;
    let mut run = Run {
        id,
        cells: Vec::from([(row, col)]),
    };
    let Some(direction) = direction else {
        return run;
    };
    let mut i = 1;
    loop {
        let (r, c) = direction.step(row, col, i);
        if r >= BOARD_SIZE || c >= BOARD_SIZE || cells[r][c] != id || visited[r][c] {
            break;
        }
        visited[r][c] = true;
        run.cells.push((r, c));
        i += 1;
    }
    run
}

/// Reject the run if any orthogonal neighbour shares its id without being
/// part of it. This catches L, T and bent shapes.
fn reject_branches(cells: &[[i64; BOARD_SIZE]; BOARD_SIZE], run: &Run) -> Result<(), FleetError> {
    for &(r, c) in &run.cells {
        for (nr, nc) in neighbours(r, c) {
            if cells[nr][nc] == run.id && !run.cells.contains(&(nr, nc)) {
                return Err(FleetError::Branch { id: run.id });
            }
        }
    }
    Ok(())
}

fn neighbours(r: usize, c: usize) -> impl Iterator<Item = Coord> {
    let up = r.checked_sub(1).map(|nr| (nr, c));
    let left = c.checked_sub(1).map(|nc| (r, nc));
    let down = (r + 1 < BOARD_SIZE).then_some((r + 1, c));
    let right = (c + 1 < BOARD_SIZE).then_some((r, c + 1));
    [up, down, left, right].into_iter().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn empty() -> Vec<Vec<i64>> {
        vec![vec![0; BOARD_SIZE]; BOARD_SIZE]
    }

    fn paint(grid: &mut [Vec<i64>], id: i64, cells: &[Coord]) {
        for &(r, c) in cells {
            grid[r][c] = id;
        }
    }

    fn canonical() -> Vec<Vec<i64>> {
        let mut grid = empty();
        paint(&mut grid, 1, &[(0, 0), (0, 1), (0, 2), (0, 3), (0, 4)]);
        paint(&mut grid, 2, &[(2, 0), (3, 0), (4, 0), (5, 0)]);
        paint(&mut grid, 3, &[(2, 5), (2, 6), (2, 7)]);
        paint(&mut grid, 4, &[(6, 9), (7, 9), (8, 9)]);
        paint(&mut grid, 5, &[(9, 0), (9, 1)]);
        grid
    }

    #[test]
    fn accepts_canonical_fleet() {
        let board = sanitize_fleet(&canonical()).unwrap();
        let ids: Vec<u8> = board.ships().iter().map(Ship::id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(board.cell(0, 4), 1);
        assert_eq!(board.cell(5, 0), 2);
        assert_eq!(board.cell(9, 1), 5);
    }

    #[test]
    fn renumbers_by_ascending_submitted_id() {
        let mut grid = canonical();
        for row in grid.iter_mut() {
            for cell in row.iter_mut() {
                *cell = match *cell {
                    1 => 90,
                    2 => 7,
                    3 => 40,
                    4 => 12,
                    5 => 3,
                    other => other,
                };
            }
        }
        let board = sanitize_fleet(&grid).unwrap();
        // 3 -> destroyer, 7 -> battleship, 12, 40, 90 -> carrier
        assert_eq!(board.cell(9, 0), 1);
        assert_eq!(board.cell(2, 0), 2);
        assert_eq!(board.cell(6, 9), 3);
        assert_eq!(board.cell(2, 5), 4);
        assert_eq!(board.cell(0, 0), 5);
        assert_eq!(board.ships()[4].length(), 5);
    }

    #[test]
    fn rejects_bad_shape_and_negatives() {
        let mut short = canonical();
        short.pop();
        assert_eq!(sanitize_fleet(&short).unwrap_err(), FleetError::BadShape);

        let mut ragged = canonical();
        ragged[3].push(0);
        assert_eq!(sanitize_fleet(&ragged).unwrap_err(), FleetError::BadShape);

        let mut negative = canonical();
        negative[8][5] = -1;
        assert_eq!(
            sanitize_fleet(&negative).unwrap_err(),
            FleetError::NegativeCell { row: 8, col: 5 }
        );
    }

    #[test]
    fn rejects_l_shape() {
        let mut grid = canonical();
        // bend the destroyer upward
        grid[8][0] = 5;
        assert!(matches!(
            sanitize_fleet(&grid),
            Err(FleetError::Branch { id: 5 })
        ));
    }

    #[test]
    fn rejects_t_shape() {
        let mut grid = canonical();
        grid[1][6] = 3;
        assert!(matches!(
            sanitize_fleet(&grid),
            Err(FleetError::Branch { id: 3 })
        ));
    }

    #[test]
    fn rejects_duplicate_ids_in_disjoint_runs() {
        let mut grid = canonical();
        paint(&mut grid, 0, &[(6, 9), (7, 9), (8, 9)]);
        paint(&mut grid, 3, &[(6, 5), (7, 5), (8, 5)]);
        assert_eq!(
            sanitize_fleet(&grid).unwrap_err(),
            FleetError::DuplicateId { id: 3 }
        );
    }

    #[test]
    fn rejects_wrong_lengths() {
        let mut grid = canonical();
        grid[0][5] = 1;
        assert_eq!(sanitize_fleet(&grid).unwrap_err(), FleetError::BadLengths);

        let mut single = canonical();
        single[9][1] = 0;
        assert_eq!(sanitize_fleet(&single).unwrap_err(), FleetError::BadLengths);

        assert_eq!(sanitize_fleet(&empty()).unwrap_err(), FleetError::BadLengths);
    }
}
