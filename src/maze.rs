use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    COLLISION_BUFFER_RATIO, DEFAULT_TILE_SIZE, HOUSE_CENTER_TILE, HOUSE_ENTRANCE_MAX_X,
    HOUSE_ENTRANCE_MIN_X, HOUSE_ROW, PELLET_POINTS, DOT_POINTS, PLAYER_SPAWN_TILE, TUNNEL_ROW,
};
use crate::geometry::tile_center;
use crate::types::{AgentKind, Direction, Personality, Tile, TilePos, Vec2f};

const CLASSIC_LAYOUT: [&str; 20] = [
    "####################",
    "# .......##.......o#",
    "#.##.###.##.###.##.#",
    "#.##.###.##.###.##.#",
    "#..................#",
    "#.##.#.######.#.##.#",
    "#o...#...##...#....#",
    "####.###.##.###.####",
    "####.#........#.####",
    "       #----#       ",
    "#.##.#........#.##.#",
    "#..#.###.##.###.#..#",
    "##.#.....##.....#.##",
    "#....###....###....#",
    "#.##.....##.....##.#",
    "#....###.##.###....#",
    "#.##.#........#.##.#",
    "#.##.#.######.#.##.#",
    "#o................o#",
    "####################",
];

#[derive(Debug, Error)]
pub enum MazeError {
    #[error("layout has no rows")]
    Empty,
    #[error("row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown tile {value:?} at row {row}, column {col}")]
    UnknownTile { row: usize, col: usize, value: char },
    #[error("{what} at ({x}, {y}) is outside the maze or blocked")]
    BadAnchor { what: &'static str, x: i32, y: i32 },
    #[error("invalid maze file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ghost house placement. Walls on `row` inside the entrance span stay
/// passable for ghosts so they can leave and re-enter the house.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HouseLayout {
    pub row: i32,
    #[serde(rename = "entranceMinX")]
    pub entrance_min_x: i32,
    #[serde(rename = "entranceMaxX")]
    pub entrance_max_x: i32,
    pub center: TilePos,
    pub slots: [TilePos; 4],
}

impl HouseLayout {
    pub fn is_entrance(&self, x: i32, y: i32) -> bool {
        y == self.row && (self.entrance_min_x..=self.entrance_max_x).contains(&x)
    }
}

impl Default for HouseLayout {
    fn default() -> Self {
        let (cx, cy) = HOUSE_CENTER_TILE;
        Self {
            row: HOUSE_ROW,
            entrance_min_x: HOUSE_ENTRANCE_MIN_X,
            entrance_max_x: HOUSE_ENTRANCE_MAX_X,
            center: TilePos::new(cx, cy),
            slots: [
                TilePos::new(8, HOUSE_ROW),
                TilePos::new(9, HOUSE_ROW),
                TilePos::new(10, HOUSE_ROW),
                TilePos::new(11, HOUSE_ROW),
            ],
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
struct MazeFile {
    rows: Vec<String>,
    #[serde(default)]
    house: HouseLayout,
    #[serde(rename = "tunnelRow", default)]
    tunnel_row: Option<i32>,
    #[serde(rename = "playerSpawn")]
    player_spawn: Option<TilePos>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Collected {
    pub points: u32,
    pub triggers_frightened: bool,
}

#[derive(Clone, Debug)]
pub struct Maze {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    tile_size: f32,
    house: HouseLayout,
    tunnel_row: Option<i32>,
    player_spawn: TilePos,
}

impl Maze {
    /// The 20×20 reference board with a left/right tunnel on the house row.
    pub fn classic() -> Self {
        let (sx, sy) = PLAYER_SPAWN_TILE;
        let tiles = CLASSIC_LAYOUT
            .iter()
            .flat_map(|row| row.chars())
            .map(|value| Tile::from_char(value).unwrap_or(Tile::Wall))
            .collect();
        Self {
            width: CLASSIC_LAYOUT[0].len() as i32,
            height: CLASSIC_LAYOUT.len() as i32,
            tiles,
            tile_size: DEFAULT_TILE_SIZE,
            house: HouseLayout::default(),
            tunnel_row: Some(TUNNEL_ROW),
            player_spawn: TilePos::new(sx, sy),
        }
    }

    pub fn parse<S: AsRef<str>>(
        rows: &[S],
        house: HouseLayout,
        tunnel_row: Option<i32>,
        player_spawn: TilePos,
    ) -> Result<Self, MazeError> {
        let Some(first) = rows.first() else {
            return Err(MazeError::Empty);
        };
        let width = first.as_ref().chars().count();
        if width == 0 {
            return Err(MazeError::Empty);
        }

        let mut tiles = Vec::with_capacity(width * rows.len());
        for (row_idx, row) in rows.iter().enumerate() {
            let found = row.as_ref().chars().count();
            if found != width {
                return Err(MazeError::RaggedRow {
                    row: row_idx,
                    expected: width,
                    found,
                });
            }
            for (col, value) in row.as_ref().chars().enumerate() {
                let tile = Tile::from_char(value).ok_or(MazeError::UnknownTile {
                    row: row_idx,
                    col,
                    value,
                })?;
                tiles.push(tile);
            }
        }

        let maze = Self {
            width: width as i32,
            height: rows.len() as i32,
            tiles,
            tile_size: DEFAULT_TILE_SIZE,
            house,
            tunnel_row,
            player_spawn,
        };
        maze.validate_anchors()?;
        Ok(maze)
    }

    pub fn from_json_str(text: &str) -> Result<Self, MazeError> {
        let file: MazeFile = serde_json::from_str(text)?;
        let (sx, sy) = PLAYER_SPAWN_TILE;
        Self::parse(
            &file.rows,
            file.house,
            file.tunnel_row,
            file.player_spawn.unwrap_or(TilePos::new(sx, sy)),
        )
    }

    fn validate_anchors(&self) -> Result<(), MazeError> {
        let spawn = self.player_spawn;
        if !self.is_passable(spawn.x, spawn.y, AgentKind::Player) {
            return Err(MazeError::BadAnchor {
                what: "player spawn",
                x: spawn.x,
                y: spawn.y,
            });
        }
        let center = self.house.center;
        if !self.is_passable(center.x, center.y, AgentKind::Ghost) {
            return Err(MazeError::BadAnchor {
                what: "house center",
                x: center.x,
                y: center.y,
            });
        }
        for slot in &self.house.slots {
            if !self.is_passable(slot.x, slot.y, AgentKind::Ghost) {
                return Err(MazeError::BadAnchor {
                    what: "house slot",
                    x: slot.x,
                    y: slot.y,
                });
            }
        }
        if let Some(row) = self.tunnel_row {
            if row < 0 || row >= self.height {
                return Err(MazeError::BadAnchor {
                    what: "tunnel row",
                    x: 0,
                    y: row,
                });
            }
        }
        Ok(())
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// Viewport resize. Positions are owned by the agents and must be rescaled
    /// by the caller; see `GameEngine::resize`.
    pub fn set_tile_size(&mut self, tile_size: f32) {
        if tile_size.is_finite() && tile_size > 0.0 {
            self.tile_size = tile_size;
        }
    }

    pub fn house(&self) -> &HouseLayout {
        &self.house
    }

    pub fn tunnel_row(&self) -> Option<i32> {
        self.tunnel_row
    }

    pub fn player_spawn(&self) -> TilePos {
        self.player_spawn
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<Tile> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        self.tiles.get((y * self.width + x) as usize).copied()
    }

    fn tile_mut(&mut self, x: i32, y: i32) -> Option<&mut Tile> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        self.tiles.get_mut((y * self.width + x) as usize)
    }

    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        self.tile(x, y).is_none_or(|tile| tile == Tile::Wall)
    }

    /// Columns just past either edge of the tunnel row borrow the edge tile,
    /// so a hitbox poking out of the tunnel mouth does not block the wrap.
    pub fn is_passable(&self, x: i32, y: i32, agent: AgentKind) -> bool {
        let x = match self.tunnel_row {
            Some(row) if row == y && x == -1 => 0,
            Some(row) if row == y && x == self.width => self.width - 1,
            _ => x,
        };
        let Some(tile) = self.tile(x, y) else {
            return false;
        };
        match agent {
            AgentKind::Player => !matches!(tile, Tile::Wall | Tile::GhostOnlyPath),
            AgentKind::Ghost => tile != Tile::Wall || self.house.is_entrance(x, y),
        }
    }

    /// True when the hitbox centered on `(x, y)` overlaps a tile `agent` may not enter.
    pub fn collides(&self, x: f32, y: f32, half_width: f32, agent: AgentKind) -> bool {
        let buffer = self.tile_size * COLLISION_BUFFER_RATIO;
        let left = ((x - half_width + buffer) / self.tile_size).floor() as i32;
        let right = ((x + half_width - buffer) / self.tile_size).floor() as i32;
        let top = ((y - half_width + buffer) / self.tile_size).floor() as i32;
        let bottom = ((y + half_width - buffer) / self.tile_size).floor() as i32;

        for ty in top..=bottom {
            for tx in left..=right {
                if !self.is_passable(tx, ty, agent) {
                    return true;
                }
            }
        }
        false
    }

    /// Adjacent tile in `dir`, wrapping horizontally across the tunnel row.
    pub fn neighbor(&self, tile: TilePos, dir: Direction) -> TilePos {
        let next = tile.step(dir);
        if Some(next.y) == self.tunnel_row {
            if next.x < 0 {
                return TilePos::new(self.width - 1, next.y);
            }
            if next.x >= self.width {
                return TilePos::new(0, next.y);
            }
        }
        next
    }

    pub fn consume_if_collectible(&mut self, x: i32, y: i32) -> Collected {
        let Some(tile) = self.tile_mut(x, y) else {
            return Collected::default();
        };
        match *tile {
            Tile::Dot => {
                *tile = Tile::EmptyPath;
                Collected {
                    points: DOT_POINTS,
                    triggers_frightened: false,
                }
            }
            Tile::PowerPellet => {
                *tile = Tile::EmptyPath;
                Collected {
                    points: PELLET_POINTS,
                    triggers_frightened: true,
                }
            }
            _ => Collected::default(),
        }
    }

    pub fn remaining_dot_count(&self) -> usize {
        self.tiles.iter().filter(|tile| **tile == Tile::Dot).count()
    }

    /// Teleports across the tunnel row once an agent heading outward passes
    /// the center of an edge tile. Direction and row are preserved.
    pub fn wrap_tunnel(&self, pos: Vec2f, dir: Direction) -> Vec2f {
        let Some(row) = self.tunnel_row else {
            return pos;
        };
        let ts = self.tile_size;
        if (pos.y / ts).floor() as i32 != row {
            return pos;
        }
        let left_center = ts / 2.0;
        let right_center = self.width as f32 * ts - ts / 2.0;
        match dir {
            Direction::Left if pos.x <= left_center => Vec2f::new(right_center, pos.y),
            Direction::Right if pos.x >= right_center => Vec2f::new(left_center, pos.y),
            _ => pos,
        }
    }

    pub fn scatter_corner(&self, personality: Personality) -> TilePos {
        let far_x = self.width - 2;
        let far_y = self.height - 2;
        match personality {
            Personality::Aggressive => TilePos::new(far_x, 0),
            Personality::Ambush => TilePos::new(0, 0),
            Personality::Unpredictable => TilePos::new(far_x, far_y),
            Personality::Defensive => TilePos::new(0, far_y),
        }
    }

    pub fn center_of(&self, tile: TilePos) -> Vec2f {
        tile_center(tile, self.tile_size)
    }

    pub fn render_rows(&self) -> Vec<String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| self.tile(x, y).map_or('#', Tile::to_char))
                    .collect()
            })
            .collect()
    }
}
