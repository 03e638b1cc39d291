/// Collision geometry and the grid/entity resolution passes.
///
/// ## Scan windows
///
/// One scan-range computation serves tanks and bullets: both examine the
/// tile strip at their leading edge, tanks with a tile of slack around the
/// strip (margin 1 / reach 1), bullets with the exact strip (margin 0 /
/// reach 0). Indices clamp into the grid; ragged rows read as empty.
///
/// ## Pass asymmetries
///
/// All of these are load-bearing:
///   - tank passes intersect the *projected* rectangle, bullet passes the
///     *current* one;
///   - a tank stops scanning at its first non-ice contact, a bullet hits
///     every tile in range (a straddling shot takes out two bricks);
///   - bullet↔tank skips collided bullets and erased tanks, tank↔tank has
///     no guards, bullet↔bullet guards on erasure only.
///
/// The tank pass has no water branch: water falls through to the generic
/// blocking handler like any solid tile. Slide status is re-derived on
/// every pass; only an overlap deeper than `ICE_MIN_OVERLAP` on both axes
/// counts.

use crate::domain::entity::{Bullet, Direction, Eagle, Tank};
use crate::domain::tile::Grid;

/// Minimum per-axis overlap with an ice tile before a hull starts sliding.
pub const ICE_MIN_OVERLAP: i32 = 10;

/// Axis-aligned rectangle in whole map units.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Rect { x, y, w, h }
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    /// Overlap region, if it has positive area.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let w = self.right().min(other.right()) - x;
        let h = self.bottom().min(other.bottom()) - y;
        if w > 0 && h > 0 {
            Some(Rect::new(x, y, w, h))
        } else {
            None
        }
    }
}

/// Inclusive tile window produced by `scan_range`, already clamped.
/// An inverted range is empty; iteration order is rows, then columns.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ScanRange {
    pub row_start: i32,
    pub row_end: i32,
    pub col_start: i32,
    pub col_end: i32,
}

impl ScanRange {
    fn clamp(mut self, rows: usize, cols: usize) -> ScanRange {
        if self.row_start < 0 {
            self.row_start = 0;
        }
        if self.col_start < 0 {
            self.col_start = 0;
        }
        if self.row_end >= rows as i32 {
            self.row_end = rows as i32 - 1;
        }
        if self.col_end >= cols as i32 {
            self.col_end = cols as i32 - 1;
        }
        self
    }

    /// Cells in scan order.
    pub fn cells(self) -> impl Iterator<Item = (usize, usize)> {
        (self.row_start..=self.row_end).flat_map(move |r| {
            (self.col_start..=self.col_end).map(move |c| (r as usize, c as usize))
        })
    }
}

/// Tile window at `rect`'s leading edge for travel direction `dir`: the
/// edge tile extended `reach` tiles onward in the travel direction and
/// `margin` tiles sideways along the perpendicular span.
#[allow(clippy::too_many_arguments)]
pub fn scan_range(
    rect: &Rect,
    dir: Direction,
    margin: i32,
    reach: i32,
    tile_w: i32,
    tile_h: i32,
    rows: usize,
    cols: usize,
) -> ScanRange {
    let range = match dir {
        Direction::Up => {
            let edge = rect.y / tile_h;
            ScanRange {
                row_start: edge - reach,
                row_end: edge,
                col_start: rect.x / tile_w - margin,
                col_end: rect.right() / tile_w + margin,
            }
        }
        Direction::Down => {
            let edge = rect.bottom() / tile_h;
            ScanRange {
                row_start: edge,
                row_end: edge + reach,
                col_start: rect.x / tile_w - margin,
                col_end: rect.right() / tile_w + margin,
            }
        }
        Direction::Left => {
            let edge = rect.x / tile_w;
            ScanRange {
                row_start: rect.y / tile_h - margin,
                row_end: rect.bottom() / tile_h + margin,
                col_start: edge - reach,
                col_end: edge,
            }
        }
        Direction::Right => {
            let edge = rect.right() / tile_w;
            ScanRange {
                row_start: rect.y / tile_h - margin,
                row_end: rect.bottom() / tile_h + margin,
                col_start: edge,
                col_end: edge + reach,
            }
        }
    };
    range.clamp(rows, cols)
}

/// Everything a moving hull can run into: terrain in its leading-edge
/// window (first non-ice contact ends the scan), the four map-boundary
/// strips, and the eagle. Erased hulls skip the pass.
#[allow(clippy::too_many_arguments)]
pub fn tank_vs_grid(
    tank: &mut Tank,
    grid: &Grid,
    eagle: &Eagle,
    dt: u32,
    tile_w: i32,
    tile_h: i32,
    map_w: i32,
    map_h: i32,
) {
    if tank.to_erase {
        return;
    }
    tank.on_ice = false;

    let range = scan_range(
        &tank.rect, tank.dir, 1, 1, tile_w, tile_h, grid.rows, grid.cols,
    );
    let pr = tank.projected_rect(dt);

    for (row, col) in range.cells() {
        let Some(cell) = grid.at(row, col) else { continue };
        let Some(overlap) = cell.rect.intersection(&pr) else { continue };
        if cell.kind.is_slippery() {
            if overlap.w > ICE_MIN_OVERLAP && overlap.h > ICE_MIN_OVERLAP {
                tank.on_ice = true;
            }
            continue;
        }
        tank.collide(overlap);
        break;
    }

    // Boundary strips, one tile thick, the vertical pair extended a tile
    // past each corner.
    let strips = [
        Rect::new(-tile_w, -tile_h, tile_w, map_h + 2 * tile_h),
        Rect::new(map_w, -tile_h, tile_w, map_h + 2 * tile_h),
        Rect::new(0, -tile_h, map_w, tile_h),
        Rect::new(0, map_h, map_w, tile_h),
    ];
    for strip in &strips {
        if let Some(overlap) = strip.intersection(&pr) {
            tank.collide(overlap);
        }
    }

    // The base blocks like solid terrain, wreck or not.
    if let Some(overlap) = eagle.rect.intersection(&pr) {
        tank.collide(overlap);
    }
}

/// A bullet's full grid pass: terrain damage in its window, burn-out at
/// the map edge, and the eagle. Returns true when this bullet felled the
/// eagle, which is the caller's cue to start game-over sequencing.
/// Collided bullets skip the pass.
#[allow(clippy::too_many_arguments)]
pub fn bullet_vs_grid(
    bullet: &mut Bullet,
    grid: &mut Grid,
    eagle: &mut Eagle,
    game_over: bool,
    tile_w: i32,
    tile_h: i32,
    map_w: i32,
    map_h: i32,
) -> bool {
    if bullet.collided {
        return false;
    }

    let range = scan_range(
        &bullet.rect, bullet.dir, 0, 0, tile_w, tile_h, grid.rows, grid.cols,
    );
    for (row, col) in range.cells() {
        let hit = match grid.at(row, col) {
            Some(cell) if !cell.kind.bullet_passes() => {
                cell.rect.intersection(&bullet.rect).is_some()
            }
            _ => false,
        };
        if !hit {
            continue;
        }
        if bullet.increased_damage {
            grid.clear_at(row, col);
        } else if let Some(cell) = grid.at_mut(row, col) {
            if cell.kind.is_destructible() && cell.bullet_hit(bullet.dir) {
                grid.clear_at(row, col);
            }
        }
        bullet.destroy();
    }

    if bullet.rect.x < 0
        || bullet.rect.y < 0
        || bullet.rect.right() > map_w
        || bullet.rect.bottom() > map_h
    {
        bullet.destroy();
    }

    if !eagle.destroyed && !game_over && eagle.rect.intersection(&bullet.rect).is_some() {
        bullet.destroy();
        eagle.destroy();
        return true;
    }
    false
}

/// Mutual blocking between two hulls, on their projected rectangles.
pub fn tank_vs_tank(a: &mut Tank, b: &mut Tank, dt: u32) {
    let pa = a.projected_rect(dt);
    let pb = b.projected_rect(dt);
    if let Some(overlap) = pa.intersection(&pb) {
        a.collide(overlap);
        b.collide(overlap);
    }
}

/// One-shot shell hit on a hull. The shell burns here; what the kill
/// means for the hull (score, respawn, erasure) is the caller's call.
/// Returns true when contact was made.
pub fn bullet_vs_tank(bullet: &mut Bullet, tank: &Tank) -> bool {
    if bullet.collided || tank.to_erase {
        return false;
    }
    if bullet.rect.intersection(&tank.rect).is_none() {
        return false;
    }
    bullet.destroy();
    true
}

/// Head-on shell trade: both burn unless either is already spent.
pub fn bullet_vs_bullet(a: &mut Bullet, b: &mut Bullet) {
    if a.to_erase || b.to_erase {
        return;
    }
    if a.rect.intersection(&b.rect).is_some() {
        a.destroy();
        b.destroy();
    }
}
