use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// Fixed enumeration order used for every ghost decision.
    pub const DECISION_ORDER: [Direction; 4] = [
        Direction::Right,
        Direction::Left,
        Direction::Down,
        Direction::Up,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::None => Self::None,
        }
    }

    /// Unit step in tile coordinates; y grows downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::None => (0, 0),
        }
    }

    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::Left | Self::Right)
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tile {
    Wall,
    Dot,
    EmptyPath,
    GhostOnlyPath,
    PowerPellet,
}

impl Tile {
    pub fn from_char(value: char) -> Option<Self> {
        match value {
            '#' => Some(Self::Wall),
            '.' => Some(Self::Dot),
            ' ' => Some(Self::EmptyPath),
            '-' => Some(Self::GhostOnlyPath),
            'o' => Some(Self::PowerPellet),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Self::Wall => '#',
            Self::Dot => '.',
            Self::EmptyPath => ' ',
            Self::GhostOnlyPath => '-',
            Self::PowerPellet => 'o',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentKind {
    Player,
    Ghost,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostState {
    InHouse,
    Scatter,
    Chase,
    Frightened,
    Eaten,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Aggressive,
    Ambush,
    Unpredictable,
    Defensive,
}

impl Personality {
    /// House order; the first entry is the leader the unpredictable ghost reflects.
    pub const ALL: [Personality; 4] = [
        Personality::Aggressive,
        Personality::Ambush,
        Personality::Unpredictable,
        Personality::Defensive,
    ];

    pub fn slot(self) -> usize {
        match self {
            Self::Aggressive => 0,
            Self::Ambush => 1,
            Self::Unpredictable => 2,
            Self::Defensive => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    Won,
    Lost,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Vec2f {
    pub x: f32,
    pub y: f32,
}

impl Vec2f {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Direction) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    #[serde(rename = "nextDir")]
    pub next_dir: Direction,
    pub alive: bool,
    pub invulnerable: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub personality: Personality,
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    pub state: GhostState,
    #[serde(rename = "targetX")]
    pub target_x: f32,
    #[serde(rename = "targetY")]
    pub target_y: f32,
    #[serde(rename = "respawnProgress")]
    pub respawn_progress: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    DotEaten {
        x: i32,
        y: i32,
    },
    PelletEaten {
        x: i32,
        y: i32,
        frightened: usize,
    },
    GhostReleased {
        personality: Personality,
    },
    GhostEaten {
        personality: Personality,
    },
    GhostRespawned {
        personality: Personality,
        #[serde(rename = "failSafe")]
        fail_safe: bool,
    },
    PlayerCaught {
        by: Personality,
        #[serde(rename = "livesLeft")]
        lives_left: u32,
    },
    TunnelWarp {
        #[serde(rename = "toX")]
        to_x: f32,
    },
    RoundWon,
    GameOver,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub clock: f32,
    pub score: u32,
    pub lives: u32,
    #[serde(rename = "remainingDots")]
    pub remaining_dots: usize,
    #[serde(rename = "frightenedActive")]
    pub frightened_active: bool,
    pub outcome: Option<RoundOutcome>,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RoundSummary {
    pub outcome: Option<RoundOutcome>,
    #[serde(rename = "durationSecs")]
    pub duration_secs: f32,
    pub ticks: u64,
    pub score: u32,
    #[serde(rename = "dotsEaten")]
    pub dots_eaten: u32,
    #[serde(rename = "pelletsEaten")]
    pub pellets_eaten: u32,
    #[serde(rename = "ghostsEaten")]
    pub ghosts_eaten: u32,
    #[serde(rename = "livesLost")]
    pub lives_lost: u32,
    #[serde(rename = "remainingDots")]
    pub remaining_dots: usize,
}
