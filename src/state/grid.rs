//! Per-player letter grids.
//!
//! A grid is a square matrix of cells fixed at construction. Placing a
//! letter is the only mutation and a cell can only be written once.

use serde::{Deserialize, Serialize};

use super::error::GameError;

/// Default grid dimension for new games.
pub const DEFAULT_GRID_DIMENSION: usize = 5;

/// A single grid cell: empty, or holding exactly one letter.
pub type Cell = Option<char>;

/// Grid position, `[row, col]` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Check if position is within a grid of the given dimension.
    pub fn is_valid(&self, dimension: usize) -> bool {
        self.row < dimension && self.col < dimension
    }
}

impl From<[usize; 2]> for Position {
    fn from([row, col]: [usize; 2]) -> Self {
        Self { row, col }
    }
}

impl From<Position> for [usize; 2] {
    fn from(pos: Position) -> Self {
        [pos.row, pos.col]
    }
}

/// Check `lower <= value < upper`.
pub fn check_semi_inclusive(
    (lower, upper): (usize, usize),
    value: usize,
    context: impl FnOnce() -> String,
) -> Result<(), GameError> {
    if value < lower || value >= upper {
        return Err(GameError::BoundsCheck {
            context: context(),
            lower,
            upper,
            value,
        });
    }
    Ok(())
}

/// Parse a string holding exactly one character.
pub fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// Square letter grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    dimension: usize,
    cells: Vec<Vec<Cell>>,
}

impl Grid {
    /// Build a grid from raw string cells (`""` for empty).
    ///
    /// The data is copied; the caller keeps ownership of `data`.
    pub fn new(dimension: usize, data: &[Vec<String>]) -> Result<Self, GameError> {
        validate_dimension(dimension)?;

        if data.len() != dimension || data.iter().any(|row| row.len() != dimension) {
            return Err(GameError::invalid_model("grid data did not match dimension"));
        }

        let cells = data
            .iter()
            .map(|row| row.iter().map(|cell| parse_cell(cell)).collect())
            .collect::<Result<Vec<Vec<Cell>>, _>>()?;

        Ok(Self { dimension, cells })
    }

    /// Build an all-empty grid.
    pub fn empty(dimension: usize) -> Result<Self, GameError> {
        validate_dimension(dimension)?;
        Ok(Self {
            dimension,
            cells: vec![vec![None; dimension]; dimension],
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Read the cell at a position.
    pub fn get(&self, pos: Position) -> Result<Cell, GameError> {
        self.check_position(pos)?;
        Ok(self.cells[pos.row][pos.col])
    }

    /// Place a letter given as a string.
    ///
    /// Bounds are checked before the letter itself.
    pub fn place(&mut self, letter: &str, pos: Position) -> Result<(), GameError> {
        self.check_position(pos)?;
        let letter = single_char(letter).ok_or_else(|| {
            GameError::invalid_model("letter to place may only be a single character")
        })?;
        self.place_char(letter, pos)
    }

    /// Place a single letter into an empty cell.
    pub fn place_char(&mut self, letter: char, pos: Position) -> Result<(), GameError> {
        self.check_position(pos)?;

        let cell = &mut self.cells[pos.row][pos.col];
        if let Some(existing) = cell {
            return Err(GameError::invalid_model(format!(
                "cell {},{} already holds {}",
                pos.row, pos.col, existing
            )));
        }
        *cell = Some(letter);
        Ok(())
    }

    /// Copy of the full matrix, `""` for empty cells.
    pub fn raw(&self) -> Vec<Vec<String>> {
        self.cells
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.map(String::from).unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    /// Cells with their positions in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (Cell, Position)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .map(move |(col, cell)| (*cell, Position::new(row, col)))
        })
    }

    /// Short-circuiting existential check in row-major order.
    pub fn some(&self, mut f: impl FnMut(Cell, Position) -> bool) -> bool {
        self.iter().any(|(cell, pos)| f(cell, pos))
    }

    /// Short-circuiting universal check in row-major order.
    pub fn all(&self, mut f: impl FnMut(Cell, Position) -> bool) -> bool {
        self.iter().all(|(cell, pos)| f(cell, pos))
    }

    pub fn is_full(&self) -> bool {
        self.all(|cell, _| cell.is_some())
    }

    fn check_position(&self, pos: Position) -> Result<(), GameError> {
        check_semi_inclusive((0, self.dimension), pos.row, || {
            format!("invalid grid row coordinate {}", pos.row)
        })?;
        check_semi_inclusive((0, self.dimension), pos.col, || {
            format!("invalid grid column coordinate {}", pos.col)
        })
    }
}

fn validate_dimension(dimension: usize) -> Result<(), GameError> {
    if dimension == 0 {
        return Err(GameError::invalid_model(format!(
            "grid dimension {} is not valid",
            dimension
        )));
    }
    Ok(())
}

fn parse_cell(cell: &str) -> Result<Cell, GameError> {
    if cell.is_empty() {
        return Ok(None);
    }
    single_char(cell)
        .map(Some)
        .ok_or_else(|| GameError::invalid_model("grid data contained non-single-character items"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_grid_construction_validates_dimension() {
        assert!(matches!(Grid::new(0, &[]), Err(GameError::InvalidModel(_))));
        assert!(matches!(Grid::empty(0), Err(GameError::InvalidModel(_))));
    }

    #[test]
    fn test_grid_construction_validates_shape() {
        let short = rows(&[&["a", "b"]]);
        assert!(matches!(Grid::new(2, &short), Err(GameError::InvalidModel(_))));

        let ragged = rows(&[&["a", "b"], &["c"]]);
        assert!(matches!(Grid::new(2, &ragged), Err(GameError::InvalidModel(_))));
    }

    #[test]
    fn test_grid_construction_rejects_multi_char_cells() {
        let data = rows(&[&["ab", ""], &["", ""]]);
        assert!(matches!(Grid::new(2, &data), Err(GameError::InvalidModel(_))));
    }

    #[test]
    fn test_grid_copies_input() {
        let mut data = rows(&[&["a", ""], &["", "b"]]);
        let grid = Grid::new(2, &data).unwrap();
        data[0][1] = "z".to_string();

        assert_eq!(grid.get(Position::new(0, 1)).unwrap(), None);
        assert_eq!(grid.get(Position::new(1, 1)).unwrap(), Some('b'));
    }

    #[test]
    fn test_grid_get_bounds() {
        let grid = Grid::empty(3).unwrap();
        assert!(grid.get(Position::new(0, 0)).is_ok());
        assert!(grid.get(Position::new(2, 2)).is_ok());
        assert!(matches!(
            grid.get(Position::new(3, 0)),
            Err(GameError::BoundsCheck { value: 3, .. })
        ));
        assert!(matches!(
            grid.get(Position::new(0, 3)),
            Err(GameError::BoundsCheck { upper: 3, .. })
        ));
    }

    #[test]
    fn test_grid_place() {
        let mut grid = Grid::empty(2).unwrap();
        grid.place("x", Position::new(1, 0)).unwrap();
        assert_eq!(grid.get(Position::new(1, 0)).unwrap(), Some('x'));

        // Occupied
        assert!(matches!(
            grid.place("y", Position::new(1, 0)),
            Err(GameError::InvalidModel(_))
        ));
        // Multi-character letter
        assert!(matches!(
            grid.place("yy", Position::new(0, 0)),
            Err(GameError::InvalidModel(_))
        ));
        assert!(matches!(
            grid.place("", Position::new(0, 0)),
            Err(GameError::InvalidModel(_))
        ));
        // Bounds come first
        assert!(matches!(
            grid.place("yy", Position::new(5, 0)),
            Err(GameError::BoundsCheck { .. })
        ));
    }

    #[test]
    fn test_grid_raw_is_a_copy() {
        let grid = Grid::new(2, &rows(&[&["a", ""], &["", ""]])).unwrap();
        let mut raw = grid.raw();
        raw[0][0] = "q".to_string();

        assert_eq!(grid.raw(), rows(&[&["a", ""], &["", ""]]));
    }

    #[test]
    fn test_grid_iteration_is_row_major() {
        let grid = Grid::empty(2).unwrap();
        let order: Vec<Position> = grid.iter().map(|(_, pos)| pos).collect();
        assert_eq!(
            order,
            vec![
                Position::new(0, 0),
                Position::new(0, 1),
                Position::new(1, 0),
                Position::new(1, 1),
            ]
        );

        // Restartable
        assert_eq!(grid.iter().count(), 4);
    }

    #[test]
    fn test_grid_some_all_short_circuit() {
        let grid = Grid::new(2, &rows(&[&["", "a"], &["", ""]])).unwrap();

        let mut visited = 0;
        assert!(grid.some(|cell, _| {
            visited += 1;
            cell.is_some()
        }));
        assert_eq!(visited, 2);

        let mut visited = 0;
        assert!(!grid.all(|cell, _| {
            visited += 1;
            cell.is_none()
        }));
        assert_eq!(visited, 2);
    }

    #[test]
    fn test_grid_is_full() {
        let mut grid = Grid::new(2, &rows(&[&["a", "b"], &["c", ""]])).unwrap();
        assert!(!grid.is_full());
        grid.place_char('d', Position::new(1, 1)).unwrap();
        assert!(grid.is_full());
    }

    #[test]
    fn test_position_wire_format() {
        let pos: Position = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(pos, Position::new(1, 2));
        assert_eq!(serde_json::to_string(&pos).unwrap(), "[1,2]");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn empty_grid_is_never_full(dimension in 1usize..12) {
                let grid = Grid::empty(dimension).unwrap();
                prop_assert!(!grid.is_full());
                prop_assert!(grid.all(|cell, _| cell.is_none()));
            }

            #[test]
            fn place_then_get_returns_letter(
                dimension in 1usize..10,
                row in 0usize..10,
                col in 0usize..10,
                letter in proptest::char::range('a', 'z'),
                other in proptest::char::range('a', 'z'),
            ) {
                let pos = Position::new(row % dimension, col % dimension);
                let mut grid = Grid::empty(dimension).unwrap();

                grid.place_char(letter, pos).unwrap();
                prop_assert_eq!(grid.get(pos).unwrap(), Some(letter));

                let second = grid.place_char(other, pos);
                prop_assert!(matches!(second, Err(GameError::InvalidModel(_))));
            }
        }
    }
}
