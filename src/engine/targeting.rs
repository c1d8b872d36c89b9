//! Where each ghost wants to go. Pure functions of the board and the agents'
//! positions so they can be checked without running a round.

use crate::constants::{AMBUSH_LOOKAHEAD_TILES, DEFENSIVE_RADIUS_TILES};
use crate::geometry::{distance, tile_of};
use crate::maze::Maze;
use crate::types::{Direction, GhostState, Personality, TilePos, Vec2f};

#[derive(Clone, Copy, Debug)]
pub struct TargetInputs {
    pub state: GhostState,
    pub personality: Personality,
    pub ghost_pos: Vec2f,
    pub player_pos: Vec2f,
    pub player_dir: Direction,
    pub leader_pos: Option<Vec2f>,
}

pub fn scatter_target(maze: &Maze, personality: Personality) -> Vec2f {
    maze.center_of(maze.scatter_corner(personality))
}

pub fn compute_target(maze: &Maze, inputs: &TargetInputs) -> Vec2f {
    match inputs.state {
        GhostState::Chase => chase_target(maze, inputs),
        GhostState::Frightened => flee_target(maze, inputs.ghost_pos, inputs.player_pos),
        GhostState::Eaten | GhostState::InHouse => maze.center_of(maze.house().center),
        GhostState::Scatter => scatter_target(maze, inputs.personality),
    }
}

fn chase_target(maze: &Maze, inputs: &TargetInputs) -> Vec2f {
    let ts = maze.tile_size();
    let player_tile = tile_of(inputs.player_pos, ts);
    match inputs.personality {
        Personality::Aggressive => inputs.player_pos,
        Personality::Ambush => {
            let (dx, dy) = inputs.player_dir.delta();
            maze.center_of(TilePos::new(
                player_tile.x + dx * AMBUSH_LOOKAHEAD_TILES,
                player_tile.y + dy * AMBUSH_LOOKAHEAD_TILES,
            ))
        }
        Personality::Unpredictable => {
            let Some(leader_pos) = inputs.leader_pos else {
                return scatter_target(maze, inputs.personality);
            };
            let leader_tile = tile_of(leader_pos, ts);
            maze.center_of(TilePos::new(
                2 * player_tile.x - leader_tile.x,
                2 * player_tile.y - leader_tile.y,
            ))
        }
        Personality::Defensive => {
            if distance(inputs.ghost_pos, inputs.player_pos) > DEFENSIVE_RADIUS_TILES * ts {
                inputs.player_pos
            } else {
                scatter_target(maze, inputs.personality)
            }
        }
    }
}

/// The player's tile mirrored through the ghost's tile: straight away from the player.
fn flee_target(maze: &Maze, ghost_pos: Vec2f, player_pos: Vec2f) -> Vec2f {
    let ts = maze.tile_size();
    let ghost_tile = tile_of(ghost_pos, ts);
    let player_tile = tile_of(player_pos, ts);
    maze.center_of(TilePos::new(
        2 * ghost_tile.x - player_tile.x,
        2 * ghost_tile.y - player_tile.y,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(personality: Personality, state: GhostState) -> TargetInputs {
        let maze = Maze::classic();
        TargetInputs {
            state,
            personality,
            ghost_pos: maze.center_of(TilePos::new(4, 4)),
            player_pos: maze.center_of(TilePos::new(8, 4)),
            player_dir: Direction::Right,
            leader_pos: Some(maze.center_of(TilePos::new(6, 1))),
        }
    }

    #[test]
    fn scatter_corners_are_distinct() {
        let maze = Maze::classic();
        let corners: Vec<TilePos> = Personality::ALL
            .iter()
            .map(|p| maze.scatter_corner(*p))
            .collect();
        for (i, a) in corners.iter().enumerate() {
            for b in corners.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn aggressive_targets_player_position() {
        let maze = Maze::classic();
        let input = inputs(Personality::Aggressive, GhostState::Chase);
        assert_eq!(compute_target(&maze, &input), input.player_pos);
    }

    #[test]
    fn ambush_targets_four_tiles_ahead() {
        let maze = Maze::classic();
        let mut input = inputs(Personality::Ambush, GhostState::Chase);
        assert_eq!(
            compute_target(&maze, &input),
            maze.center_of(TilePos::new(12, 4))
        );
        input.player_dir = Direction::Up;
        assert_eq!(
            compute_target(&maze, &input),
            maze.center_of(TilePos::new(8, 0))
        );
        input.player_dir = Direction::None;
        assert_eq!(
            compute_target(&maze, &input),
            maze.center_of(TilePos::new(8, 4))
        );
    }

    #[test]
    fn unpredictable_reflects_leader_through_player() {
        let maze = Maze::classic();
        let input = inputs(Personality::Unpredictable, GhostState::Chase);
        // leader (6,1) -> player (8,4) doubled lands on (10,7)
        assert_eq!(
            compute_target(&maze, &input),
            maze.center_of(TilePos::new(10, 7))
        );
    }

    #[test]
    fn unpredictable_without_leader_uses_scatter_corner() {
        let maze = Maze::classic();
        let mut input = inputs(Personality::Unpredictable, GhostState::Chase);
        input.leader_pos = None;
        assert_eq!(
            compute_target(&maze, &input),
            scatter_target(&maze, Personality::Unpredictable)
        );
    }

    #[test]
    fn defensive_switches_at_eight_tiles() {
        let maze = Maze::classic();
        let mut input = inputs(Personality::Defensive, GhostState::Chase);
        assert_eq!(
            compute_target(&maze, &input),
            scatter_target(&maze, Personality::Defensive)
        );
        input.player_pos = maze.center_of(TilePos::new(4, 13));
        assert_eq!(compute_target(&maze, &input), input.player_pos);
    }

    #[test]
    fn scatter_ignores_player() {
        let maze = Maze::classic();
        let input = inputs(Personality::Ambush, GhostState::Scatter);
        assert_eq!(
            compute_target(&maze, &input),
            scatter_target(&maze, Personality::Ambush)
        );
    }

    #[test]
    fn frightened_target_points_away_from_player() {
        let maze = Maze::classic();
        let input = inputs(Personality::Aggressive, GhostState::Frightened);
        let target = compute_target(&maze, &input);
        assert_eq!(target, maze.center_of(TilePos::new(0, 4)));
        assert!(
            distance(target, input.player_pos) > distance(input.ghost_pos, input.player_pos)
        );
    }
}
