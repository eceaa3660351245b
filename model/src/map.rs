use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::check_block_probability;
use crate::{Direction, Error, GameConfig, Grid, PowerUpKind, Result};

#[derive(Clone, Debug, Serialize)]
pub struct Map {
    width: u16,
    height: u16,
    cells: Grid<CellKind>,
    spawn_points: Vec<(i32, i32)>,
    power_ups: Vec<((i32, i32), PowerUpKind)>,
}

impl Map {
    /// Generates a map where every cell with two even coordinates is a wall and every other cell
    /// is a block with probability `block_probability`, otherwise empty.
    ///
    /// Fails with `InvalidMap` if the probability isn't within `[0, 1]`. Nothing guarantees that
    /// the generated map is fair or that every cell is reachable.
    pub fn generate<R: Rng>(
        width: u16,
        height: u16,
        block_probability: f64,
        rng: &mut R,
    ) -> Result<Map> {
        check_block_probability(block_probability)?;

        let mut cells = Grid::fill_with_clone(CellKind::Empty, width as usize, height as usize);

        for x in 0..width as usize {
            for y in 0..height as usize {
                cells[x][y] = if x % 2 == 0 && y % 2 == 0 {
                    CellKind::Wall
                } else if rng.gen_bool(block_probability) {
                    CellKind::Block
                } else {
                    CellKind::Empty
                };
            }
        }

        Ok(Map {
            width,
            height,
            cells,
            spawn_points: Vec::new(),
            power_ups: Vec::new(),
        })
    }

    /// Generates a map from the config using its seed (or a random seed if there isn't one).
    pub fn from_config(config: &GameConfig) -> Result<Map> {
        use rand::{rngs::StdRng, SeedableRng};

        config.validate()?;
        let width = dimension(config.width)?;
        let height = dimension(config.height)?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Map::generate(width, height, config.block_probability, &mut rng)
    }

    /// Parses a map from a block of text, one row per line:
    ///
    /// - `#` wall
    /// - `+` block
    /// - `.` empty
    /// - `P` empty with an agent spawn point
    /// - `b`, `f`, `s` empty with a bombs, flames or speed power up
    ///
    /// Leading and trailing blank lines are ignored, every row must be the same width.
    pub fn new_from_string(layout: &str) -> Result<Map> {
        let rows: Vec<&str> = layout
            .lines()
            .map(str::trim_end)
            .skip_while(|row| row.is_empty())
            .collect();
        let rows: Vec<&str> = match rows.iter().rposition(|row| !row.is_empty()) {
            Some(last) => rows[..=last].to_vec(),
            None => return Err(Error::InvalidMap("map has no rows".to_owned())),
        };

        let width = rows[0].chars().count();
        let height = dimension(rows.len())?;
        let width_u16 = dimension(width)?;

        let mut cells = Grid::fill_with_clone(CellKind::Empty, width, rows.len());
        let mut spawn_points = Vec::new();
        let mut power_ups = Vec::new();

        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(Error::InvalidMap(format!(
                    "row {} has width {} but the first row has width {}",
                    y,
                    row.chars().count(),
                    width
                )));
            }

            for (x, c) in row.chars().enumerate() {
                let pos = (x as i32, y as i32);
                cells[x][y] = match c {
                    '#' => CellKind::Wall,
                    '+' => CellKind::Block,
                    '.' => CellKind::Empty,
                    'P' => {
                        spawn_points.push(pos);
                        CellKind::Empty
                    }
                    'b' | 'f' | 's' => {
                        let kind = match c {
                            'b' => PowerUpKind::Bombs,
                            'f' => PowerUpKind::Flames,
                            _ => PowerUpKind::Speed,
                        };
                        power_ups.push((pos, kind));
                        CellKind::Empty
                    }
                    other => {
                        return Err(Error::InvalidMap(format!(
                            "unknown tile `{}` at ({}, {})",
                            other, x, y
                        )))
                    }
                };
            }
        }

        Ok(Map {
            width: width_u16,
            height,
            cells,
            spawn_points,
            power_ups,
        })
    }

    pub fn get_cell(&self, x: i32, y: i32) -> Result<CellKind> {
        self.cells.get(x, y).map(|kind| *kind)
    }

    pub fn set_cell_kind(&mut self, x: i32, y: i32, kind: CellKind) -> Result<()> {
        *self.cells.get_mut(x, y)? = kind;
        Ok(())
    }

    /// Turns a block into empty space. Returns whether the cell was a block, destroying an
    /// already empty cell (or a wall) leaves it untouched.
    pub fn destroy_block(&mut self, x: i32, y: i32) -> Result<bool> {
        let cell = self.cells.get_mut(x, y)?;
        if *cell == CellKind::Block {
            *cell = CellKind::Empty;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Clears blocks from the cell and its four neighbours so an agent spawning there can move.
    /// Walls are kept and neighbours off the map are skipped.
    pub fn clear_around(&mut self, x: i32, y: i32) -> Result<()> {
        self.destroy_block(x, y)?;
        for direction in &Direction::ALL {
            if let Ok((nx, ny)) = self.calc_forward((x, y), *direction, 1) {
                self.destroy_block(nx, ny)?;
            }
        }
        Ok(())
    }

    /// Applies `steps` cells of the given direction to the position, the destination has to be
    /// on the map.
    pub fn calc_forward(
        &self,
        (x, y): (i32, i32),
        direction: Direction,
        steps: i32,
    ) -> Result<(i32, i32)> {
        let (dx, dy) = direction.delta();
        let dest = (x + dx * steps, y + dy * steps);

        if self.cells.contains(dest.0, dest.1) {
            Ok(dest)
        } else {
            Err(Error::OutOfBounds {
                x: dest.0,
                y: dest.1,
                width: self.cells.width(),
                height: self.cells.height(),
            })
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.cells.contains(x, y)
    }

    pub fn cells(&self) -> &Grid<CellKind> {
        &self.cells
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn spawn_points(&self) -> &[(i32, i32)] {
        &self.spawn_points
    }

    /// Power ups that should be placed when a game starts on this map.
    pub fn initial_power_ups(&self) -> &[((i32, i32), PowerUpKind)] {
        &self.power_ups
    }
}

fn dimension(size: usize) -> Result<u16> {
    if size == 0 || size > u16::MAX as usize {
        return Err(Error::InvalidMap(format!("invalid map dimension {}", size)));
    }
    Ok(size as u16)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    #[serde(rename = "X")]
    Wall,
    #[serde(rename = "B")]
    Block,
    #[serde(rename = "E")]
    Empty,
}

impl CellKind {
    /// Agents can't move into walls or blocks.
    pub fn is_solid(self) -> bool {
        self != CellKind::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn even_coordinates_are_always_walls() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let map = Map::generate(9, 7, 0.5, &mut rng).unwrap();

            for ((x, y), kind) in map.cells().iter_column_major() {
                if x % 2 == 0 && y % 2 == 0 {
                    assert_eq!(*kind, CellKind::Wall, "seed {} at ({}, {})", seed, x, y);
                } else {
                    assert_ne!(*kind, CellKind::Wall, "seed {} at ({}, {})", seed, x, y);
                }
            }
        }
    }

    #[test]
    fn probability_extremes() {
        let mut rng = StdRng::seed_from_u64(3);
        let all_blocks = Map::generate(5, 5, 1.0, &mut rng).unwrap();
        let no_blocks = Map::generate(5, 5, 0.0, &mut rng).unwrap();

        assert_eq!(all_blocks.get_cell(1, 0).unwrap(), CellKind::Block);
        assert_eq!(no_blocks.get_cell(1, 0).unwrap(), CellKind::Empty);
    }

    #[test]
    fn rejects_probabilities_outside_unit_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for &p in &[-0.1, 1.5, std::f64::NAN] {
            assert!(matches!(
                Map::generate(5, 5, p, &mut rng),
                Err(Error::InvalidMap(_))
            ));
        }
    }

    #[test]
    fn same_seed_same_map() {
        let config = GameConfig {
            seed: Some(99),
            ..GameConfig::default()
        };
        let a = Map::from_config(&config).unwrap();
        let b = Map::from_config(&config).unwrap();

        assert_eq!(a.cells().as_ref(), b.cells().as_ref());
    }

    #[test]
    fn parses_layout() {
        let map = Map::new_from_string(
            "
            #####
            #P+b#
            #.#.#
            #s.f#
            #####
            "
            .lines()
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n")
            .as_str(),
        )
        .unwrap();

        assert_eq!((map.width(), map.height()), (5, 5));
        assert_eq!(map.get_cell(2, 1).unwrap(), CellKind::Block);
        assert_eq!(map.get_cell(2, 2).unwrap(), CellKind::Wall);
        assert_eq!(map.spawn_points(), &[(1, 1)]);
        assert_eq!(
            map.initial_power_ups(),
            &[
                ((3, 1), PowerUpKind::Bombs),
                ((1, 3), PowerUpKind::Speed),
                ((3, 3), PowerUpKind::Flames)
            ]
        );
    }

    #[test]
    fn rejects_ragged_and_unknown() {
        assert!(matches!(
            Map::new_from_string("###\n##"),
            Err(Error::InvalidMap(_))
        ));
        assert!(matches!(
            Map::new_from_string("#?#"),
            Err(Error::InvalidMap(_))
        ));
        assert!(matches!(Map::new_from_string("\n\n"), Err(Error::InvalidMap(_))));
    }

    #[test]
    fn cell_access_is_bounds_checked() {
        let mut map = Map::new_from_string("...\n...").unwrap();

        assert!(matches!(map.get_cell(3, 0), Err(Error::OutOfBounds { .. })));
        assert!(matches!(
            map.set_cell_kind(0, 2, CellKind::Wall),
            Err(Error::OutOfBounds { .. })
        ));

        map.set_cell_kind(2, 1, CellKind::Block).unwrap();
        assert_eq!(map.get_cell(2, 1).unwrap(), CellKind::Block);
    }

    #[test]
    fn destroying_blocks_is_idempotent() {
        let mut map = Map::new_from_string("#+.").unwrap();

        assert!(map.destroy_block(1, 0).unwrap());
        assert!(!map.destroy_block(1, 0).unwrap());
        assert!(!map.destroy_block(0, 0).unwrap());
        assert_eq!(map.get_cell(0, 0).unwrap(), CellKind::Wall);
        assert_eq!(map.get_cell(1, 0).unwrap(), CellKind::Empty);
    }

    #[test]
    fn clear_around_keeps_walls() {
        let mut map = Map::new_from_string("+++\n+#+\n+++").unwrap();
        map.clear_around(1, 0).unwrap();

        assert_eq!(map.get_cell(0, 0).unwrap(), CellKind::Empty);
        assert_eq!(map.get_cell(1, 0).unwrap(), CellKind::Empty);
        assert_eq!(map.get_cell(2, 0).unwrap(), CellKind::Empty);
        assert_eq!(map.get_cell(1, 1).unwrap(), CellKind::Wall);
        assert_eq!(map.get_cell(0, 1).unwrap(), CellKind::Block);
    }
}
