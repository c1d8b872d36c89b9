//! Tile math shared by every agent. Always pass the maze's current tile size,
//! it changes when the viewport is resized.

use crate::types::{Direction, TilePos, Vec2f};

pub fn tile_of(pos: Vec2f, tile_size: f32) -> TilePos {
    TilePos::new(
        (pos.x / tile_size).floor() as i32,
        (pos.y / tile_size).floor() as i32,
    )
}

pub fn tile_center(tile: TilePos, tile_size: f32) -> Vec2f {
    Vec2f::new(
        tile.x as f32 * tile_size + tile_size / 2.0,
        tile.y as f32 * tile_size + tile_size / 2.0,
    )
}

/// Center of the tile `pos` currently lies in.
pub fn snap_to_center(pos: Vec2f, tile_size: f32) -> Vec2f {
    tile_center(tile_of(pos, tile_size), tile_size)
}

pub fn near_center(pos: Vec2f, tile_size: f32, threshold: f32) -> bool {
    let center = snap_to_center(pos, tile_size);
    (pos.x - center.x).abs() < threshold && (pos.y - center.y).abs() < threshold
}

pub fn distance(a: Vec2f, b: Vec2f) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// One step of `speed` along `dir`, with the off-axis coordinate pinned to the
/// current tile's center line.
pub fn step_on_axis(pos: Vec2f, dir: Direction, speed: f32, tile_size: f32) -> Vec2f {
    let center = snap_to_center(pos, tile_size);
    match dir {
        Direction::Up => Vec2f::new(center.x, pos.y - speed),
        Direction::Down => Vec2f::new(center.x, pos.y + speed),
        Direction::Left => Vec2f::new(pos.x - speed, center.y),
        Direction::Right => Vec2f::new(pos.x + speed, center.y),
        Direction::None => pos,
    }
}

/// Moves each axis toward `target` by at most `speed`, ignoring walls.
pub fn step_toward(pos: Vec2f, target: Vec2f, speed: f32) -> Vec2f {
    let dx = (target.x - pos.x).clamp(-speed, speed);
    let dy = (target.y - pos.y).clamp(-speed, speed);
    Vec2f::new(pos.x + dx, pos.y + dy)
}
