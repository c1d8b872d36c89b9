use crate::config::GameOptions;
use crate::constants::HITBOX_RATIO;
use crate::geometry::{distance, near_center, step_on_axis, step_toward, tile_of};
use crate::maze::Maze;
use crate::rng::RandomSource;
use crate::types::{AgentKind, Direction, GhostState, GhostView, Personality, TilePos, Vec2f};

use super::targeting::{compute_target, TargetInputs};

/// Everything a ghost reads from the rest of the round during one tick.
pub struct GhostContext<'a> {
    pub maze: &'a Maze,
    pub options: &'a GameOptions,
    pub player_pos: Vec2f,
    pub player_dir: Direction,
    /// Current position of the aggressive ghost, if it exists.
    pub leader_pos: Option<Vec2f>,
    pub clock: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    pub tile: TilePos,
    pub previous: Direction,
    pub chosen: Direction,
    pub legal: usize,
}

/// What happened to a ghost during one update, for the controller's event log.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GhostTick {
    pub released: bool,
    /// `Some(fail_safe)` when the ghost left the eaten state this tick.
    pub respawned: Option<bool>,
    pub warped_to: Option<f32>,
    pub decision: Option<Decision>,
}

#[derive(Clone, Debug)]
pub struct Ghost {
    personality: Personality,
    home: TilePos,
    pos: Vec2f,
    dir: Direction,
    state: GhostState,
    resume_state: GhostState,
    exit_delay: f32,
    house_entered_at: f32,
    has_exited: bool,
    scatter_elapsed: f32,
    frightened_elapsed: f32,
    eaten_elapsed: f32,
    eaten_from_distance: f32,
    decided_at: Option<TilePos>,
    target: Vec2f,
}

impl Ghost {
    pub fn new(personality: Personality, maze: &Maze, exit_delay: f32) -> Self {
        let home = maze.house().slots[personality.slot()];
        let pos = maze.center_of(home);
        Self {
            personality,
            home,
            pos,
            dir: Direction::None,
            state: GhostState::InHouse,
            resume_state: GhostState::Scatter,
            exit_delay,
            house_entered_at: 0.0,
            has_exited: false,
            scatter_elapsed: 0.0,
            frightened_elapsed: 0.0,
            eaten_elapsed: 0.0,
            eaten_from_distance: 0.0,
            decided_at: None,
            target: pos,
        }
    }

    pub fn personality(&self) -> Personality {
        self.personality
    }

    pub fn position(&self) -> Vec2f {
        self.pos
    }

    pub fn direction(&self) -> Direction {
        self.dir
    }

    pub fn state(&self) -> GhostState {
        self.state
    }

    pub fn target(&self) -> Vec2f {
        self.target
    }

    pub fn has_exited(&self) -> bool {
        self.has_exited
    }

    /// Eaten and in-house ghosts cannot touch the player.
    pub fn is_tangible(&self) -> bool {
        !matches!(self.state, GhostState::InHouse | GhostState::Eaten)
    }

    pub fn update(&mut self, ctx: &GhostContext<'_>, rng: &mut dyn RandomSource) -> GhostTick {
        let mut tick = GhostTick::default();
        let maze = ctx.maze;

        match self.state {
            GhostState::InHouse => {
                self.pos = maze.center_of(self.home);
                if ctx.clock - self.house_entered_at <= self.exit_delay {
                    return tick;
                }
                self.state = GhostState::Scatter;
                self.resume_state = GhostState::Scatter;
                self.scatter_elapsed = 0.0;
                self.has_exited = true;
                tick.released = true;
            }
            GhostState::Eaten => {
                tick.respawned = self.return_home(ctx);
                return tick;
            }
            _ => self.advance_timers(ctx.options),
        }

        let target = compute_target(
            maze,
            &TargetInputs {
                state: self.state,
                personality: self.personality,
                ghost_pos: self.pos,
                player_pos: ctx.player_pos,
                player_dir: ctx.player_dir,
                leader_pos: ctx.leader_pos,
            },
        );
        debug_assert!(target.is_finite(), "non-finite target {target:?}");
        self.target = if target.is_finite() { target } else { self.pos };

        let ts = maze.tile_size();
        let half = HITBOX_RATIO * ts;
        let tile = tile_of(self.pos, ts);
        if near_center(self.pos, ts, ctx.options.center_threshold(ts))
            && self.decided_at != Some(tile)
        {
            match self.choose_direction(maze, tile, half, rng) {
                Some(decision) => {
                    self.dir = decision.chosen;
                    self.decided_at = Some(tile);
                    tick.decision = Some(decision);
                }
                None => {
                    // Boxed in: keep the heading and wait.
                    self.decided_at = None;
                    return tick;
                }
            }
        }

        if self.dir == Direction::None {
            return tick;
        }
        let next = step_on_axis(self.pos, self.dir, ctx.options.ghost_step(ts), ts);
        if maze.collides(next.x, next.y, half, AgentKind::Ghost) {
            self.decided_at = None;
            return tick;
        }
        self.pos = next;

        let wrapped = maze.wrap_tunnel(self.pos, self.dir);
        if wrapped != self.pos {
            self.pos = wrapped;
            tick.warped_to = Some(wrapped.x);
        }
        tick
    }

    fn advance_timers(&mut self, options: &GameOptions) {
        let dt = options.tick_seconds;
        match self.state {
            GhostState::Scatter => {
                self.scatter_elapsed += dt;
                if self.scatter_elapsed >= options.scatter_secs {
                    self.state = GhostState::Chase;
                }
            }
            GhostState::Frightened => {
                if self.resume_state == GhostState::Scatter {
                    self.scatter_elapsed += dt;
                }
                self.frightened_elapsed += dt;
                if self.frightened_elapsed >= options.frightened_secs {
                    self.state = if self.resume_state == GhostState::Scatter
                        && self.scatter_elapsed < options.scatter_secs
                    {
                        GhostState::Scatter
                    } else {
                        GhostState::Chase
                    };
                }
            }
            _ => {}
        }
    }

    fn choose_direction(
        &self,
        maze: &Maze,
        tile: TilePos,
        half: f32,
        rng: &mut dyn RandomSource,
    ) -> Option<Decision> {
        let legal: Vec<Direction> = Direction::DECISION_ORDER
            .into_iter()
            .filter(|dir| {
                let center = maze.center_of(maze.neighbor(tile, *dir));
                !maze.collides(center.x, center.y, half, AgentKind::Ghost)
            })
            .collect();
        if legal.is_empty() {
            return None;
        }

        let reverse = self.dir.opposite();
        let candidates: Vec<Direction> = if legal.len() > 1 {
            legal.iter().copied().filter(|dir| *dir != reverse).collect()
        } else {
            legal.clone()
        };

        let chosen = if self.state == GhostState::Frightened {
            candidates[rng.pick_index(candidates.len())]
        } else {
            let mut best = candidates[0];
            let mut best_distance = distance(maze.center_of(tile.step(best)), self.target);
            for dir in candidates.iter().skip(1) {
                let d = distance(maze.center_of(tile.step(*dir)), self.target);
                if d < best_distance {
                    best = *dir;
                    best_distance = d;
                }
            }
            best
        };

        Some(Decision {
            tile,
            previous: self.dir,
            chosen,
            legal: legal.len(),
        })
    }

    fn return_home(&mut self, ctx: &GhostContext<'_>) -> Option<bool> {
        let maze = ctx.maze;
        let center = maze.center_of(maze.house().center);
        self.target = center;
        self.eaten_elapsed += ctx.options.tick_seconds;
        self.pos = step_toward(
            self.pos,
            center,
            ctx.options.ghost_step(maze.tile_size()),
        );

        let reached = distance(self.pos, center) < 0.01;
        if !reached && self.eaten_elapsed < ctx.options.eaten_max_secs {
            return None;
        }
        self.pos = center;
        self.dir = Direction::Up;
        self.state = GhostState::Scatter;
        self.resume_state = GhostState::Scatter;
        self.scatter_elapsed = 0.0;
        self.eaten_elapsed = 0.0;
        self.decided_at = None;
        Some(!reached)
    }

    /// Returns false for ghosts a pellet cannot reach (in the house or eaten).
    pub fn frighten(&mut self) -> bool {
        match self.state {
            GhostState::InHouse | GhostState::Eaten => false,
            GhostState::Frightened => {
                self.frightened_elapsed = 0.0;
                true
            }
            other => {
                self.resume_state = other;
                self.state = GhostState::Frightened;
                self.frightened_elapsed = 0.0;
                true
            }
        }
    }

    pub fn eat(&mut self, house_center: Vec2f) -> bool {
        if self.state != GhostState::Frightened {
            return false;
        }
        self.state = GhostState::Eaten;
        self.eaten_elapsed = 0.0;
        self.eaten_from_distance = distance(self.pos, house_center);
        self.decided_at = None;
        true
    }

    /// Back to the house slot after the player died; the exit stagger
    /// restarts from `clock`.
    pub fn send_home(&mut self, maze: &Maze, clock: f32) {
        self.pos = maze.center_of(self.home);
        self.dir = Direction::None;
        self.state = GhostState::InHouse;
        self.resume_state = GhostState::Scatter;
        self.house_entered_at = clock;
        self.has_exited = false;
        self.scatter_elapsed = 0.0;
        self.frightened_elapsed = 0.0;
        self.eaten_elapsed = 0.0;
        self.decided_at = None;
        self.target = self.pos;
    }

    pub fn rescale(&mut self, factor: f32) {
        self.pos = Vec2f::new(self.pos.x * factor, self.pos.y * factor);
        self.target = Vec2f::new(self.target.x * factor, self.target.y * factor);
        self.eaten_from_distance *= factor;
    }

    fn respawn_progress(&self, maze: &Maze) -> f32 {
        if self.state != GhostState::Eaten || self.eaten_from_distance <= 0.0 {
            return 0.0;
        }
        let left = distance(self.pos, maze.center_of(maze.house().center));
        (1.0 - left / self.eaten_from_distance).clamp(0.0, 1.0)
    }

    pub fn view(&self, maze: &Maze) -> GhostView {
        GhostView {
            personality: self.personality,
            x: self.pos.x,
            y: self.pos.y,
            dir: self.dir,
            state: self.state,
            target_x: self.target.x,
            target_y: self.target.y,
            respawn_progress: self.respawn_progress(maze),
        }
    }

    #[cfg(test)]
    pub(crate) fn place(&mut self, pos: Vec2f, dir: Direction, state: GhostState) {
        self.pos = pos;
        self.dir = dir;
        self.state = state;
        self.resume_state = GhostState::Chase;
        self.has_exited = true;
        self.decided_at = None;
    }
}
