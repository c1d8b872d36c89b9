use crate::constants::HITBOX_RATIO;
use crate::geometry::{near_center, step_on_axis, tile_of};
use crate::maze::Maze;
use crate::types::{AgentKind, Direction, PlayerView, TilePos, Vec2f};

#[derive(Clone, Debug)]
pub struct Player {
    spawn: TilePos,
    pos: Vec2f,
    dir: Direction,
    next_dir: Direction,
    alive: bool,
    invulnerable_until: f32,
}

impl Player {
    pub fn new(maze: &Maze) -> Self {
        let spawn = maze.player_spawn();
        Self {
            spawn,
            pos: maze.center_of(spawn),
            dir: Direction::None,
            next_dir: Direction::None,
            alive: true,
            invulnerable_until: 0.0,
        }
    }

    pub fn position(&self) -> Vec2f {
        self.pos
    }

    pub fn direction(&self) -> Direction {
        self.dir
    }

    pub fn next_direction(&self) -> Direction {
        self.next_dir
    }

    pub fn tile(&self, tile_size: f32) -> TilePos {
        tile_of(self.pos, tile_size)
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_invulnerable(&self, clock: f32) -> bool {
        clock < self.invulnerable_until
    }

    /// An empty request keeps the last one, like a released key.
    pub fn request(&mut self, dir: Direction) {
        if dir != Direction::None {
            self.next_dir = dir;
        }
    }

    /// Moves one tick. Returns the new x when the tunnel wrapped the player.
    pub fn update(&mut self, maze: &Maze, speed: f32, center_threshold: f32) -> Option<f32> {
        let ts = maze.tile_size();
        let half = HITBOX_RATIO * ts;

        if self.next_dir != Direction::None
            && self.next_dir != self.dir
            && near_center(self.pos, ts, center_threshold)
        {
            let ahead = maze.center_of(maze.neighbor(tile_of(self.pos, ts), self.next_dir));
            if !maze.collides(ahead.x, ahead.y, half, AgentKind::Player) {
                self.dir = self.next_dir;
            }
        }

        if self.dir == Direction::None {
            return None;
        }
        let next = step_on_axis(self.pos, self.dir, speed, ts);
        if maze.collides(next.x, next.y, half, AgentKind::Player) {
            return None;
        }
        self.pos = next;

        let wrapped = maze.wrap_tunnel(self.pos, self.dir);
        if wrapped == self.pos {
            return None;
        }
        self.pos = wrapped;
        Some(wrapped.x)
    }

    pub fn respawn(&mut self, maze: &Maze, invulnerable_until: f32) {
        self.pos = maze.center_of(self.spawn);
        self.dir = Direction::None;
        self.next_dir = Direction::None;
        self.alive = true;
        self.invulnerable_until = invulnerable_until;
    }

    pub fn kill(&mut self) {
        self.alive = false;
        self.dir = Direction::None;
    }

    pub fn rescale(&mut self, factor: f32) {
        self.pos = Vec2f::new(self.pos.x * factor, self.pos.y * factor);
    }

    pub fn view(&self, clock: f32) -> PlayerView {
        PlayerView {
            x: self.pos.x,
            y: self.pos.y,
            dir: self.dir,
            next_dir: self.next_dir,
            alive: self.alive,
            invulnerable: self.is_invulnerable(clock),
        }
    }

    #[cfg(test)]
    pub(crate) fn place(&mut self, pos: Vec2f, dir: Direction) {
        self.pos = pos;
        self.dir = dir;
        self.next_dir = dir;
    }
}
