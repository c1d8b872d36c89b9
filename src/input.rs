//! Turning raw controls into the one requested direction the engine reads
//! per tick.

use std::collections::VecDeque;

use crate::maze::Maze;
use crate::types::{AgentKind, Direction, Tile, TilePos};

/// What an input source may look at when choosing a direction.
#[derive(Clone, Debug)]
pub struct InputView<'a> {
    pub tick: u64,
    pub maze: &'a Maze,
    pub player_tile: TilePos,
    pub player_dir: Direction,
    /// Tiles holding a ghost that would catch the player.
    pub danger: Vec<TilePos>,
}

pub trait InputSource {
    fn requested_direction(&mut self, view: &InputView<'_>) -> Direction;
}

/// Joystick offset to a direction. Quadrants are split on the diagonals, so
/// the eight compass sectors collapse onto the four axes. Screen y grows
/// downward.
pub fn direction_from_vector(dx: f32, dy: f32, dead_zone: f32) -> Direction {
    if !(dx.is_finite() && dy.is_finite()) || dx.hypot(dy) < dead_zone.max(f32::EPSILON) {
        return Direction::None;
    }
    let degrees = dy.atan2(dx).to_degrees();
    if (-45.0..45.0).contains(&degrees) {
        Direction::Right
    } else if (45.0..135.0).contains(&degrees) {
        Direction::Down
    } else if degrees >= 135.0 || degrees < -135.0 {
        Direction::Left
    } else {
        Direction::Up
    }
}

/// Several active controls: the last one with an opinion wins.
pub fn merge_requests<I>(requests: I) -> Direction
where
    I: IntoIterator<Item = Direction>,
{
    requests
        .into_iter()
        .filter(|dir| *dir != Direction::None)
        .last()
        .unwrap_or(Direction::None)
}

/// Replays `(from_tick, direction)` pairs; each holds until the next one.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    script: Vec<(u64, Direction)>,
}

impl ScriptedInput {
    pub fn new(mut script: Vec<(u64, Direction)>) -> Self {
        script.sort_by_key(|(tick, _)| *tick);
        Self { script }
    }
}

impl InputSource for ScriptedInput {
    fn requested_direction(&mut self, view: &InputView<'_>) -> Direction {
        self.script
            .iter()
            .take_while(|(tick, _)| *tick <= view.tick)
            .last()
            .map_or(Direction::None, |(_, dir)| *dir)
    }
}

/// Heads for the closest dot or pellet, steering around tiles next to
/// dangerous ghosts when another route exists.
#[derive(Clone, Debug, Default)]
pub struct Autopilot;

impl InputSource for Autopilot {
    fn requested_direction(&mut self, view: &InputView<'_>) -> Direction {
        let blocked = danger_zone(view.maze, &view.danger);
        nearest_food_direction(view.maze, view.player_tile, &blocked)
            .or_else(|| nearest_food_direction(view.maze, view.player_tile, &[]))
            .unwrap_or(view.player_dir)
    }
}

fn danger_zone(maze: &Maze, danger: &[TilePos]) -> Vec<TilePos> {
    let mut blocked = Vec::with_capacity(danger.len() * 5);
    for tile in danger {
        blocked.push(*tile);
        for dir in Direction::DECISION_ORDER {
            blocked.push(maze.neighbor(*tile, dir));
        }
    }
    blocked
}

/// First move of a shortest player path to food, or `None` when no food is
/// reachable without crossing `blocked`.
pub fn nearest_food_direction(
    maze: &Maze,
    start: TilePos,
    blocked: &[TilePos],
) -> Option<Direction> {
    let width = maze.width();
    let index = |tile: TilePos| (tile.y * width + tile.x) as usize;
    if maze.tile(start.x, start.y).is_none() {
        return None;
    }

    let mut visited = vec![false; (width * maze.height()) as usize];
    visited[index(start)] = true;
    let mut queue = VecDeque::new();
    for dir in Direction::DECISION_ORDER {
        let next = maze.neighbor(start, dir);
        if maze.is_passable(next.x, next.y, AgentKind::Player)
            && !blocked.contains(&next)
            && !visited[index(next)]
        {
            visited[index(next)] = true;
            queue.push_back((next, dir));
        }
    }

    while let Some((tile, first)) = queue.pop_front() {
        if matches!(
            maze.tile(tile.x, tile.y),
            Some(Tile::Dot | Tile::PowerPellet)
        ) {
            return Some(first);
        }
        for dir in Direction::DECISION_ORDER {
            let next = maze.neighbor(tile, dir);
            if maze.is_passable(next.x, next.y, AgentKind::Player)
                && !blocked.contains(&next)
                && !visited[index(next)]
            {
                visited[index(next)] = true;
                queue.push_back((next, first));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::HouseLayout;

    fn view(maze: &Maze, tick: u64, player_tile: TilePos) -> InputView<'_> {
        InputView {
            tick,
            maze,
            player_tile,
            player_dir: Direction::None,
            danger: Vec::new(),
        }
    }

    #[test]
    fn joystick_quadrants_split_on_diagonals() {
        assert_eq!(direction_from_vector(10.0, 0.0, 5.0), Direction::Right);
        assert_eq!(direction_from_vector(10.0, 9.0, 5.0), Direction::Right);
        assert_eq!(direction_from_vector(9.0, 10.0, 5.0), Direction::Down);
        assert_eq!(direction_from_vector(-10.0, 1.0, 5.0), Direction::Left);
        assert_eq!(direction_from_vector(-10.0, -1.0, 5.0), Direction::Left);
        assert_eq!(direction_from_vector(1.0, -10.0, 5.0), Direction::Up);
    }

    #[test]
    fn joystick_dead_zone_yields_none() {
        assert_eq!(direction_from_vector(2.0, 2.0, 5.0), Direction::None);
        assert_eq!(direction_from_vector(0.0, 0.0, 0.0), Direction::None);
        assert_eq!(direction_from_vector(f32::NAN, 9.0, 1.0), Direction::None);
    }

    #[test]
    fn last_active_request_wins() {
        assert_eq!(
            merge_requests([Direction::Up, Direction::None, Direction::Left, Direction::None]),
            Direction::Left
        );
        assert_eq!(merge_requests([Direction::None]), Direction::None);
        assert_eq!(merge_requests(Vec::new()), Direction::None);
    }

    #[test]
    fn scripted_input_holds_until_next_entry() {
        let maze = Maze::classic();
        let mut input = ScriptedInput::new(vec![(10, Direction::Down), (0, Direction::Right)]);
        let spawn = maze.player_spawn();
        assert_eq!(input.requested_direction(&view(&maze, 0, spawn)), Direction::Right);
        assert_eq!(input.requested_direction(&view(&maze, 9, spawn)), Direction::Right);
        assert_eq!(input.requested_direction(&view(&maze, 10, spawn)), Direction::Down);
        assert_eq!(input.requested_direction(&view(&maze, 500, spawn)), Direction::Down);
    }

    #[test]
    fn autopilot_finds_nearest_food() {
        let maze = Maze::classic();
        // Spawn (1, 1) has a dot to the right and one below.
        assert_eq!(
            nearest_food_direction(&maze, TilePos::new(1, 1), &[]),
            Some(Direction::Right)
        );
        let mut autopilot = Autopilot;
        assert_eq!(
            autopilot.requested_direction(&view(&maze, 0, TilePos::new(1, 1))),
            Direction::Right
        );
    }

    #[test]
    fn autopilot_avoids_danger_when_possible() {
        let maze = Maze::classic();
        let mut autopilot = Autopilot;
        let mut input = view(&maze, 0, TilePos::new(1, 1));
        input.danger = vec![TilePos::new(3, 1)];
        assert_eq!(autopilot.requested_direction(&input), Direction::Down);
    }

    #[test]
    fn no_food_keeps_current_heading() {
        let rows = ["#####", "#   #", "#####"];
        let house = HouseLayout {
            row: 1,
            entrance_min_x: 3,
            entrance_max_x: 3,
            center: TilePos::new(3, 1),
            slots: [TilePos::new(3, 1); 4],
        };
        let maze = Maze::parse(&rows, house, None, TilePos::new(1, 1)).expect("valid corridor");
        assert_eq!(nearest_food_direction(&maze, TilePos::new(1, 1), &[]), None);

        let mut autopilot = Autopilot;
        let mut input = view(&maze, 0, TilePos::new(1, 1));
        input.player_dir = Direction::Left;
        assert_eq!(autopilot.requested_direction(&input), Direction::Left);
    }

    #[test]
    fn autopilot_crosses_the_tunnel() {
        let rows = [
            "#####", //
            "  # .",
            "#####",
        ];
        let house = HouseLayout {
            row: 1,
            entrance_min_x: 0,
            entrance_max_x: 0,
            center: TilePos::new(1, 1),
            slots: [TilePos::new(1, 1); 4],
        };
        let maze = Maze::parse(&rows, house, Some(1), TilePos::new(1, 1)).expect("valid tunnel");
        assert_eq!(
            nearest_food_direction(&maze, TilePos::new(1, 1), &[]),
            Some(Direction::Left)
        );
    }
}
