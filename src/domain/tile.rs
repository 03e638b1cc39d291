/// Terrain variants, their collision policy, and the grid that holds them.
/// Policy is queried via methods on the kind tag, not stored per object,
/// so the per-variant resolution table lives in one place.

use crate::domain::entity::Direction;
use crate::domain::physics::Rect;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TerrainKind {
    Brick, // destructible, staged damage
    Stone, // solid, only pierced by an increased-damage bullet
    Water, // bullets fly over it
    Ice,   // marks slide status, never blocks
    Bush,  // overlay only, never placed in the grid
}

impl TerrainKind {
    /// Bullets pass over these without interacting.
    pub fn bullet_passes(self) -> bool {
        matches!(self, TerrainKind::Water | TerrainKind::Ice)
    }

    /// Takes staged bullet damage instead of shrugging the hit off.
    pub fn is_destructible(self) -> bool {
        matches!(self, TerrainKind::Brick)
    }

    /// Hulls pick up slide status on enough overlap instead of stopping.
    pub fn is_slippery(self) -> bool {
        matches!(self, TerrainKind::Ice)
    }
}

/// One placed terrain object: kind tag plus its static collision rectangle.
///
/// Brick damage staging: removal after 2 hits. The first hit keeps only the
/// rectangle half facing away from the shot and records a directional state
/// code 1..=4 for rendering; the second hit spends the object.
#[derive(Clone, Debug)]
pub struct Terrain {
    pub kind: TerrainKind,
    pub rect: Rect,
    pub hit_count: u8,
    pub state_code: u8,
}

impl Terrain {
    pub fn new(kind: TerrainKind, col: usize, row: usize, tile_w: i32, tile_h: i32) -> Self {
        Terrain {
            kind,
            rect: Rect::new(col as i32 * tile_w, row as i32 * tile_h, tile_w, tile_h),
            hit_count: 0,
            state_code: 0,
        }
    }

    /// Register a bullet hit travelling in `dir`. Returns true once the
    /// object is spent and must be removed from the grid. Only bricks
    /// stage damage; every other kind ignores the call.
    pub fn bullet_hit(&mut self, dir: Direction) -> bool {
        if self.kind != TerrainKind::Brick {
            return false;
        }
        self.hit_count += 1;
        if self.hit_count > 1 {
            return true;
        }
        // The half facing the shot is blown off; keep the far half.
        match dir {
            Direction::Up => {
                self.state_code = 1;
                self.rect.h /= 2;
            }
            Direction::Right => {
                self.state_code = 2;
                self.rect.x += self.rect.w / 2;
                self.rect.w /= 2;
            }
            Direction::Down => {
                self.state_code = 3;
                self.rect.y += self.rect.h / 2;
                self.rect.h /= 2;
            }
            Direction::Left => {
                self.state_code = 4;
                self.rect.w /= 2;
            }
        }
        false
    }
}

/// The level's terrain store: rows of optional cells. Row count is the
/// descriptor's line count; the column count is row 0's length. Later rows
/// may be ragged; accessors bounds-check both axes.
#[derive(Clone, Debug, Default)]
pub struct Grid {
    pub cells: Vec<Vec<Option<Terrain>>>,
    pub rows: usize,
    pub cols: usize,
}

impl Grid {
    pub fn empty() -> Self {
        Grid::default()
    }

    pub fn from_cells(cells: Vec<Vec<Option<Terrain>>>) -> Self {
        let rows = cells.len();
        let cols = cells.first().map_or(0, |r| r.len());
        Grid { cells, rows, cols }
    }

    /// Out-of-range and ragged gaps read as empty.
    pub fn at(&self, row: usize, col: usize) -> Option<&Terrain> {
        self.cells.get(row)?.get(col)?.as_ref()
    }

    pub fn at_mut(&mut self, row: usize, col: usize) -> Option<&mut Terrain> {
        self.cells.get_mut(row)?.get_mut(col)?.as_mut()
    }

    /// Remove and return whatever occupies the cell.
    pub fn clear_at(&mut self, row: usize, col: usize) -> Option<Terrain> {
        self.cells.get_mut(row)?.get_mut(col)?.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_table() {
        assert!(TerrainKind::Water.bullet_passes());
        assert!(TerrainKind::Ice.bullet_passes());
        assert!(!TerrainKind::Brick.bullet_passes());
        assert!(!TerrainKind::Stone.bullet_passes());
        assert!(TerrainKind::Brick.is_destructible());
        assert!(!TerrainKind::Stone.is_destructible());
        assert!(TerrainKind::Ice.is_slippery());
        assert!(!TerrainKind::Water.is_slippery());
    }

    #[test]
    fn brick_spent_after_two_hits() {
        let mut brick = Terrain::new(TerrainKind::Brick, 3, 2, 16, 16);
        assert!(!brick.bullet_hit(Direction::Up));
        assert_eq!(brick.hit_count, 1);
        assert!(brick.bullet_hit(Direction::Left));
        assert_eq!(brick.hit_count, 2);
    }

    #[test]
    fn brick_first_hit_keeps_far_half() {
        // Shot flying up takes the bottom half; the top survives.
        let mut b = Terrain::new(TerrainKind::Brick, 0, 0, 16, 16);
        b.bullet_hit(Direction::Up);
        assert_eq!(b.rect, Rect::new(0, 0, 16, 8));
        assert_eq!(b.state_code, 1);

        // Shot flying down takes the top half.
        let mut b = Terrain::new(TerrainKind::Brick, 0, 0, 16, 16);
        b.bullet_hit(Direction::Down);
        assert_eq!(b.rect, Rect::new(0, 8, 16, 8));
        assert_eq!(b.state_code, 3);

        // Shot flying right takes the left half.
        let mut b = Terrain::new(TerrainKind::Brick, 0, 0, 16, 16);
        b.bullet_hit(Direction::Right);
        assert_eq!(b.rect, Rect::new(8, 0, 8, 16));
        assert_eq!(b.state_code, 2);

        // Shot flying left takes the right half.
        let mut b = Terrain::new(TerrainKind::Brick, 0, 0, 16, 16);
        b.bullet_hit(Direction::Left);
        assert_eq!(b.rect, Rect::new(0, 0, 8, 16));
        assert_eq!(b.state_code, 4);
    }

    #[test]
    fn stone_ignores_staged_damage() {
        let mut stone = Terrain::new(TerrainKind::Stone, 0, 0, 16, 16);
        assert!(!stone.bullet_hit(Direction::Up));
        assert!(!stone.bullet_hit(Direction::Up));
        assert_eq!(stone.rect, Rect::new(0, 0, 16, 16));
        assert_eq!(stone.state_code, 0);
    }

    #[test]
    fn terrain_sits_on_its_grid_cell() {
        let t = Terrain::new(TerrainKind::Brick, 3, 2, 16, 16);
        assert_eq!((t.rect.x, t.rect.y), (48, 32));
    }

    #[test]
    fn ragged_and_out_of_range_reads_are_empty() {
        let cells = vec![
            vec![Some(Terrain::new(TerrainKind::Brick, 0, 0, 16, 16)), None],
            vec![], // ragged row
        ];
        let grid = Grid::from_cells(cells);
        assert_eq!(grid.rows, 2);
        assert_eq!(grid.cols, 2);
        assert!(grid.at(0, 0).is_some());
        assert!(grid.at(0, 1).is_none());
        assert!(grid.at(1, 0).is_none()); // ragged gap
        assert!(grid.at(7, 7).is_none()); // out of range
    }

    #[test]
    fn empty_grid_has_no_dimensions() {
        let grid = Grid::empty();
        assert_eq!(grid.rows, 0);
        assert_eq!(grid.cols, 0);
        assert!(grid.at(0, 0).is_none());
    }
}
