//! Territory ownership grid.
//!
//! A coarse wrap-around grid of cells, each owned by at most one tribe.
//! Pioneers paint cells directly; painting is visible to every later lookup
//! in the same tick.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{TribeId, Vec2, WorldBounds};

/// Integer cell coordinate. Always kept wrapped into the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Cardinal grid direction. `y` grows downward, so turning right takes
/// `(1, 0)` to `(0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridDir {
    pub dx: i32,
    pub dy: i32,
}

impl GridDir {
    pub const EAST: GridDir = GridDir { dx: 1, dy: 0 };
    pub const SOUTH: GridDir = GridDir { dx: 0, dy: 1 };
    pub const WEST: GridDir = GridDir { dx: -1, dy: 0 };
    pub const NORTH: GridDir = GridDir { dx: 0, dy: -1 };

    /// Fixed probe order used wherever a starting direction is searched for.
    pub const ALL: [GridDir; 4] = [GridDir::EAST, GridDir::SOUTH, GridDir::WEST, GridDir::NORTH];

    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    pub fn rotate_right(self) -> Self {
        Self { dx: -self.dy, dy: self.dx }
    }

    pub fn rotate_left(self) -> Self {
        Self { dx: self.dy, dy: -self.dx }
    }
}

/// Resource: which tribe owns each cell
#[derive(Resource, Debug, Clone)]
pub struct TerritoryGrid {
    cell_size: f32,
    cols: i32,
    rows: i32,
    owners: Vec<Option<TribeId>>,
}

impl TerritoryGrid {
    pub fn new(bounds: &WorldBounds, cell_size: f32) -> Self {
        let cols = (bounds.width / cell_size).ceil().max(1.0) as i32;
        let rows = (bounds.height / cell_size).ceil().max(1.0) as i32;
        Self {
            cell_size,
            cols,
            rows,
            owners: vec![None; (cols * rows) as usize],
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn wrap_cell(&self, cell: Cell) -> Cell {
        Cell::new(cell.x.rem_euclid(self.cols), cell.y.rem_euclid(self.rows))
    }

    pub fn cell_at(&self, position: Vec2) -> Cell {
        self.wrap_cell(Cell::new(
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        ))
    }

    pub fn cell_center(&self, cell: Cell) -> Vec2 {
        let cell = self.wrap_cell(cell);
        Vec2::new(
            (cell.x as f32 + 0.5) * self.cell_size,
            (cell.y as f32 + 0.5) * self.cell_size,
        )
    }

    pub fn step(&self, cell: Cell, dir: GridDir) -> Cell {
        self.wrap_cell(Cell::new(cell.x + dir.dx, cell.y + dir.dy))
    }

    fn slot(&self, cell: Cell) -> usize {
        let cell = self.wrap_cell(cell);
        (cell.y * self.cols + cell.x) as usize
    }

    pub fn owner_of(&self, cell: Cell) -> Option<TribeId> {
        self.owners.get(self.slot(cell)).copied().flatten()
    }

    pub fn owner_at(&self, position: Vec2) -> Option<TribeId> {
        self.owner_of(self.cell_at(position))
    }

    pub fn is_owned_by(&self, position: Vec2, tribe: TribeId) -> bool {
        self.owner_at(position) == Some(tribe)
    }

    /// Marks an unowned cell as owned. Cells that already have an owner,
    /// this tribe or another, keep it.
    pub fn paint(&mut self, cell: Cell, tribe: TribeId) {
        let slot = self.slot(cell);
        if let Some(owner) = self.owners.get_mut(slot) {
            owner.get_or_insert(tribe);
        }
    }

    /// Paints every cell within `radius` cells of `center`.
    pub fn paint_disc(&mut self, center: Vec2, radius: i32, tribe: TribeId) {
        let origin = self.cell_at(center);
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.paint(Cell::new(origin.x + dx, origin.y + dy), tribe);
                }
            }
        }
    }

    /// A border marker may go on an unowned cell touching the tribe's land,
    /// diagonals included.
    pub fn can_place_border(&self, cell: Cell, tribe: TribeId) -> bool {
        if self.owner_of(cell).is_some() {
            return false;
        }
        (-1..=1).any(|dy| {
            (-1..=1).any(|dx| {
                (dx != 0 || dy != 0)
                    && self.owner_of(Cell::new(cell.x + dx, cell.y + dy)) == Some(tribe)
            })
        })
    }

    pub fn cell_count(&self, tribe: TribeId) -> usize {
        self.owners.iter().filter(|o| **o == Some(tribe)).count()
    }

    /// Owned cells in row-major order.
    pub fn cells_of(&self, tribe: TribeId) -> Vec<Cell> {
        self.owners
            .iter()
            .enumerate()
            .filter(|(_, owner)| **owner == Some(tribe))
            .map(|(i, _)| Cell::new(i as i32 % self.cols, i as i32 / self.cols))
            .collect()
    }

    /// Owned cells with at least one cardinal neighbour outside the territory.
    pub fn border_cells(&self, tribe: TribeId) -> Vec<Cell> {
        self.cells_of(tribe)
            .into_iter()
            .filter(|cell| {
                GridDir::ALL
                    .iter()
                    .any(|dir| self.owner_of(self.step(*cell, *dir)) != Some(tribe))
            })
            .collect()
    }

    /// Nearest owned cell that has a cardinal neighbour where a border marker
    /// could be planted. Ties resolve to the lower cell in row-major order.
    pub fn nearest_frontier(&self, bounds: &WorldBounds, from: Vec2, tribe: TribeId) -> Option<Cell> {
        self.cells_of(tribe)
            .into_iter()
            .filter(|cell| {
                GridDir::ALL
                    .iter()
                    .any(|dir| self.can_place_border(self.step(*cell, *dir), tribe))
            })
            .map(|cell| (bounds.distance(from, self.cell_center(cell)), cell))
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, cell)| cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> TerritoryGrid {
        TerritoryGrid::new(&WorldBounds::new(200.0, 200.0), 20.0)
    }

    #[test]
    fn test_rotation() {
        assert_eq!(GridDir::EAST.rotate_right(), GridDir::SOUTH);
        assert_eq!(GridDir::SOUTH.rotate_right(), GridDir::WEST);
        assert_eq!(GridDir::EAST.rotate_left(), GridDir::NORTH);
        assert_eq!(GridDir::NORTH.rotate_left().rotate_left(), GridDir::SOUTH);
    }

    #[test]
    fn test_cells_wrap() {
        let grid = grid();
        assert_eq!(grid.cell_at(Vec2::new(-1.0, 205.0)), Cell::new(9, 0));
        assert_eq!(grid.step(Cell::new(9, 0), GridDir::EAST), Cell::new(0, 0));
    }

    #[test]
    fn test_paint_keeps_existing_owner() {
        let mut grid = grid();
        grid.paint(Cell::new(3, 3), TribeId(1));
        grid.paint(Cell::new(3, 3), TribeId(2));
        grid.paint(Cell::new(3, 3), TribeId(1));
        assert_eq!(grid.owner_of(Cell::new(3, 3)), Some(TribeId(1)));
        assert_eq!(grid.cell_count(TribeId(1)), 1);
        assert_eq!(grid.cell_count(TribeId(2)), 0);
    }

    #[test]
    fn test_can_place_border_requires_adjacency() {
        let mut grid = grid();
        let tribe = TribeId(1);
        grid.paint(Cell::new(5, 5), tribe);

        assert!(grid.can_place_border(Cell::new(6, 5), tribe));
        assert!(grid.can_place_border(Cell::new(6, 6), tribe));
        assert!(!grid.can_place_border(Cell::new(7, 5), tribe));
        assert!(!grid.can_place_border(Cell::new(5, 5), tribe));
        assert!(!grid.can_place_border(Cell::new(6, 5), TribeId(2)));
    }

    #[test]
    fn test_border_and_frontier() {
        let mut grid = grid();
        let tribe = TribeId(1);
        grid.paint_disc(Vec2::new(100.0, 100.0), 1, tribe);
        assert_eq!(grid.cell_count(tribe), 5);
        assert_eq!(grid.border_cells(tribe).len(), 4);

        let bounds = WorldBounds::new(200.0, 200.0);
        let frontier = grid.nearest_frontier(&bounds, Vec2::new(150.0, 110.0), tribe);
        assert_eq!(frontier, Some(Cell::new(6, 5)));
    }
}
