/// Stage descriptors: plain text files named `1` through `35` in the
/// levels directory, one character per tile cell.
///
/// ## Legend
///
///   `#` brick, `@` stone, `~` water, `-` ice, `%` bush overlay,
///   anything else open ground.
///
/// Rows follow line order, columns follow character order. Bushes never
/// occupy a grid cell; they go to a separate draw-over list. The fort slot
/// (columns 12..=13 of the last two rows) is cleared after parsing so the
/// eagle never spawns inside terrain.

use std::fs;
use std::path::Path;

use crate::config::GameConfig;
use crate::domain::entity::Eagle;
use crate::domain::tile::{Grid, Terrain, TerrainKind};

/// Everything one stage descriptor yields.
pub struct ParsedLevel {
    pub grid: Grid,
    pub bushes: Vec<Terrain>,
    pub eagle: Eagle,
}

/// Load stage `number` from the configured levels directory. A missing or
/// unreadable descriptor degrades to an open map.
pub fn load(number: u32, cfg: &GameConfig) -> ParsedLevel {
    let path = cfg.levels_dir.join(number.to_string());
    parse(&read_descriptor(&path), cfg)
}

/// Build a stage from descriptor text.
pub fn parse(text: &str, cfg: &GameConfig) -> ParsedLevel {
    let m = cfg.map;
    let mut bushes = Vec::new();

    let cells: Vec<Vec<Option<Terrain>>> = text
        .lines()
        .enumerate()
        .map(|(row, line)| {
            line.chars()
                .enumerate()
                .map(|(col, ch)| {
                    let kind = match ch {
                        '#' => TerrainKind::Brick,
                        '@' => TerrainKind::Stone,
                        '~' => TerrainKind::Water,
                        '-' => TerrainKind::Ice,
                        '%' => {
                            bushes.push(Terrain::new(
                                TerrainKind::Bush,
                                col,
                                row,
                                m.tile_w,
                                m.tile_h,
                            ));
                            return None;
                        }
                        _ => return None,
                    };
                    Some(Terrain::new(kind, col, row, m.tile_w, m.tile_h))
                })
                .collect()
        })
        .collect();

    let mut grid = Grid::from_cells(cells);

    // Open up the fort slot; the eagle parks there.
    for row in grid.rows.saturating_sub(2)..grid.rows {
        for col in 12..14 {
            grid.clear_at(row, col);
        }
    }

    let eagle = Eagle::new(
        12 * m.tile_w,
        (grid.rows as i32 - 2) * m.tile_h,
        2 * m.tile_w,
        2 * m.tile_h,
    );

    ParsedLevel {
        grid,
        bushes,
        eagle,
    }
}

fn read_descriptor(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("Warning: cannot read level file {}: {err}", path.display());
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::physics::Rect;

    fn cfg() -> GameConfig {
        GameConfig::default()
    }

    #[test]
    fn legend_maps_to_kinds() {
        let parsed = parse("#@~-\n", &cfg());
        let kind = |col| parsed.grid.at(0, col).map(|t| t.kind);
        assert_eq!(kind(0), Some(TerrainKind::Brick));
        assert_eq!(kind(1), Some(TerrainKind::Stone));
        assert_eq!(kind(2), Some(TerrainKind::Water));
        assert_eq!(kind(3), Some(TerrainKind::Ice));
    }

    #[test]
    fn open_ground_reads_as_empty() {
        let parsed = parse(". x,\n", &cfg());
        for col in 0..4 {
            assert!(parsed.grid.at(0, col).is_none());
        }
        assert_eq!(parsed.grid.rows, 1);
        assert_eq!(parsed.grid.cols, 4);
    }

    #[test]
    fn cells_carry_their_map_rectangle() {
        let parsed = parse("....\n....\n...#\n", &cfg());
        let tile = parsed.grid.at(2, 3).unwrap();
        assert_eq!(tile.rect, Rect::new(48, 32, 16, 16));
    }

    #[test]
    fn bushes_overlay_an_open_cell() {
        let parsed = parse(".%\n", &cfg());
        assert!(parsed.grid.at(0, 1).is_none());
        assert_eq!(parsed.bushes.len(), 1);
        assert_eq!(parsed.bushes[0].kind, TerrainKind::Bush);
        assert_eq!(parsed.bushes[0].rect, Rect::new(16, 0, 16, 16));
    }

    #[test]
    fn fort_slot_is_cleared() {
        let line = "#".repeat(26);
        let text = vec![line.as_str(); 26].join("\n");
        let parsed = parse(&text, &cfg());
        for row in 24..26 {
            assert!(parsed.grid.at(row, 12).is_none());
            assert!(parsed.grid.at(row, 13).is_none());
            // the walls next door stay up
            assert!(parsed.grid.at(row, 11).is_some());
            assert!(parsed.grid.at(row, 14).is_some());
        }
    }

    #[test]
    fn eagle_parks_in_the_fort() {
        let text = vec![".".repeat(26); 26].join("\n");
        let parsed = parse(&text, &cfg());
        assert_eq!(parsed.eagle.rect, Rect::new(192, 384, 32, 32));
        assert!(!parsed.eagle.destroyed);
    }

    #[test]
    fn empty_descriptor_degrades_to_open_map() {
        let parsed = parse("", &cfg());
        assert_eq!(parsed.grid.rows, 0);
        assert!(parsed.bushes.is_empty());
        // the eagle lands off-map, where nothing can reach it
        assert!(parsed.eagle.rect.y < 0);
    }

    #[test]
    fn trailing_newline_adds_no_row() {
        let parsed = parse("..\n..\n", &cfg());
        assert_eq!(parsed.grid.rows, 2);
    }

    #[test]
    fn missing_file_degrades_to_open_map() {
        let mut cfg = cfg();
        cfg.levels_dir = std::env::temp_dir().join("steelgrid-no-such-levels");
        let parsed = load(7, &cfg);
        assert_eq!(parsed.grid.rows, 0);
    }
}
