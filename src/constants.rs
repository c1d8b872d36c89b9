pub const TICK_RATE: u32 = 60;
pub const TICK_SECONDS: f32 = 1.0 / TICK_RATE as f32;

pub const DEFAULT_TILE_SIZE: f32 = 20.0;
pub const TUNNEL_ROW: i32 = 9;
pub const HOUSE_ROW: i32 = 9;
pub const HOUSE_ENTRANCE_MIN_X: i32 = 7;
pub const HOUSE_ENTRANCE_MAX_X: i32 = 12;
pub const HOUSE_CENTER_TILE: (i32, i32) = (9, 9);
pub const PLAYER_SPAWN_TILE: (i32, i32) = (1, 1);

/// Speeds are expressed in tiles per second so that a resize keeps the pace.
pub const PLAYER_SPEED_TILES: f32 = 9.0;
pub const GHOST_SPEED_TILES: f32 = 6.0;

pub const CENTER_THRESHOLD_RATIO: f32 = 0.2;
pub const HITBOX_RATIO: f32 = 0.4;
pub const COLLISION_BUFFER_RATIO: f32 = 0.05;
pub const PLAYER_HIT_SIZE_RATIO: f32 = 0.5;
pub const GHOST_HIT_SIZE_RATIO: f32 = 0.75;

pub const SCATTER_DURATION_SECS: f32 = 7.0;
pub const FRIGHTENED_DURATION_SECS: f32 = 7.0;
pub const EATEN_MAX_SECS: f32 = 3.0;
pub const INVULNERABLE_SECS: f32 = 2.0;
pub const GHOST_EXIT_DELAYS: [f32; 4] = [0.0, 1.5, 3.0, 4.5];

pub const AMBUSH_LOOKAHEAD_TILES: i32 = 4;
pub const DEFENSIVE_RADIUS_TILES: f32 = 8.0;

pub const DOT_POINTS: u32 = 10;
pub const PELLET_POINTS: u32 = 100;
pub const GHOST_POINTS: u32 = 200;
pub const STARTING_LIVES: u32 = 3;

/// Upper bound of fixed steps drained from one real frame.
pub const MAX_STEPS_PER_FRAME: u32 = 5;
