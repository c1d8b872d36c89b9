use crate::config::GameOptions;
use crate::constants::GHOST_POINTS;
use crate::geometry::tile_of;
use crate::input::InputView;
use crate::maze::Maze;
use crate::rng::{RandomSource, Rng};
use crate::types::{
    Direction, GhostState, Personality, RoundOutcome, RoundSummary, RuntimeEvent, Snapshot,
};

mod ghost;
mod player;
mod targeting;
mod utils;

pub use self::ghost::{Decision, Ghost, GhostContext, GhostTick};
pub use self::player::Player;
pub use self::targeting::{compute_target, scatter_target, TargetInputs};
pub use self::utils::FixedTimestep;

use self::utils::in_contact;

#[derive(Clone, Debug, Default)]
struct RoundStats {
    dots: u32,
    pellets: u32,
    ghosts: u32,
    lives_lost: u32,
}

/// One round of play: the maze, the player, the four ghosts and the score.
/// Advance it with [`GameEngine::step`]; nothing here reads the wall clock.
#[derive(Clone, Debug)]
pub struct GameEngine<R: RandomSource = Rng> {
    pub options: GameOptions,
    initial_maze: Maze,
    maze: Maze,
    rng: R,
    player: Player,
    ghosts: Vec<Ghost>,
    events: Vec<RuntimeEvent>,
    stats: RoundStats,

    clock: f32,
    tick_counter: u64,
    score: u32,
    lives: u32,
    outcome: Option<RoundOutcome>,
}

impl GameEngine<Rng> {
    pub fn new(options: GameOptions, maze: Maze, seed: u32) -> Self {
        Self::with_random(options, maze, Rng::new(seed))
    }
}

impl<R: RandomSource> GameEngine<R> {
    pub fn with_random(options: GameOptions, mut maze: Maze, rng: R) -> Self {
        maze.set_tile_size(options.tile_size);
        let player = Player::new(&maze);
        let ghosts = spawn_ghosts(&maze, &options);
        let lives = options.starting_lives;
        Self {
            options,
            initial_maze: maze.clone(),
            maze,
            rng,
            player,
            ghosts,
            events: Vec::new(),
            stats: RoundStats::default(),
            clock: 0.0,
            tick_counter: 0,
            score: 0,
            lives,
            outcome: None,
        }
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn ghost(&self, personality: Personality) -> Option<&Ghost> {
        self.ghosts
            .iter()
            .find(|ghost| ghost.personality() == personality)
    }

    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn outcome(&self) -> Option<RoundOutcome> {
        self.outcome
    }

    pub fn is_ended(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn frightened_active(&self) -> bool {
        self.ghosts
            .iter()
            .any(|ghost| ghost.state() == GhostState::Frightened)
    }

    pub fn input_view(&self) -> InputView<'_> {
        let ts = self.maze.tile_size();
        InputView {
            tick: self.tick_counter,
            maze: &self.maze,
            player_tile: self.player.tile(ts),
            player_dir: self.player.direction(),
            danger: self
                .ghosts
                .iter()
                .filter(|ghost| ghost.is_tangible() && ghost.state() != GhostState::Frightened)
                .map(|ghost| tile_of(ghost.position(), ts))
                .collect(),
        }
    }

    /// Advances one fixed step of `options.tick_seconds`. Does nothing once
    /// the round is won or lost.
    pub fn step(&mut self, requested: Direction) {
        if self.outcome.is_some() {
            return;
        }
        self.tick_counter += 1;
        self.clock += self.options.tick_seconds;

        let ts = self.maze.tile_size();
        self.player.request(requested);
        if let Some(to_x) = self.player.update(
            &self.maze,
            self.options.player_step(ts),
            self.options.center_threshold(ts),
        ) {
            self.events.push(RuntimeEvent::TunnelWarp { to_x });
        }

        self.collect();
        if self.outcome.is_some() {
            return;
        }
        self.update_ghosts();
        self.resolve_collisions();
    }

    /// Rebuilds the round from its construction parameters. Every pending
    /// deadline (exit stagger, frightened, respawn, invulnerability) is
    /// dropped with the old entities.
    pub fn reset(&mut self) {
        self.maze = self.initial_maze.clone();
        self.player = Player::new(&self.maze);
        self.ghosts = spawn_ghosts(&self.maze, &self.options);
        self.events.clear();
        self.stats = RoundStats::default();
        self.clock = 0.0;
        self.tick_counter = 0;
        self.score = 0;
        self.lives = self.options.starting_lives;
        self.outcome = None;
    }

    /// Viewport resize: positions are rescaled so every agent keeps its place
    /// relative to the grid.
    pub fn resize(&mut self, tile_size: f32) {
        if !(tile_size.is_finite() && tile_size > 0.0) {
            return;
        }
        let factor = tile_size / self.maze.tile_size();
        self.maze.set_tile_size(tile_size);
        self.initial_maze.set_tile_size(tile_size);
        self.options.tile_size = tile_size;
        self.player.rescale(factor);
        for ghost in &mut self.ghosts {
            ghost.rescale(factor);
        }
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        Snapshot {
            tick: self.tick_counter,
            clock: self.clock,
            score: self.score,
            lives: self.lives,
            remaining_dots: self.maze.remaining_dot_count(),
            frightened_active: self.frightened_active(),
            outcome: self.outcome,
            player: self.player.view(self.clock),
            ghosts: self
                .ghosts
                .iter()
                .map(|ghost| ghost.view(&self.maze))
                .collect(),
            events: if include_events {
                std::mem::take(&mut self.events)
            } else {
                Vec::new()
            },
        }
    }

    pub fn build_summary(&self) -> RoundSummary {
        RoundSummary {
            outcome: self.outcome,
            duration_secs: self.clock,
            ticks: self.tick_counter,
            score: self.score,
            dots_eaten: self.stats.dots,
            pellets_eaten: self.stats.pellets,
            ghosts_eaten: self.stats.ghosts,
            lives_lost: self.stats.lives_lost,
            remaining_dots: self.maze.remaining_dot_count(),
        }
    }

    fn collect(&mut self) {
        let tile = self.player.tile(self.maze.tile_size());
        let collected = self.maze.consume_if_collectible(tile.x, tile.y);
        if collected.points == 0 {
            return;
        }
        self.score += collected.points;

        if collected.triggers_frightened {
            let mut frightened = 0;
            for ghost in &mut self.ghosts {
                if ghost.frighten() {
                    frightened += 1;
                }
            }
            self.stats.pellets += 1;
            self.events.push(RuntimeEvent::PelletEaten {
                x: tile.x,
                y: tile.y,
                frightened,
            });
        } else {
            self.stats.dots += 1;
            self.events.push(RuntimeEvent::DotEaten {
                x: tile.x,
                y: tile.y,
            });
        }

        if self.maze.remaining_dot_count() == 0 {
            self.finish(RoundOutcome::Won);
        }
    }

    fn update_ghosts(&mut self) {
        let player_pos = self.player.position();
        let player_dir = self.player.direction();

        for idx in 0..self.ghosts.len() {
            // Read after earlier ghosts moved, so the leader's position is current.
            let leader_pos = self
                .ghosts
                .iter()
                .find(|ghost| ghost.personality() == Personality::Aggressive)
                .map(Ghost::position);
            let ctx = GhostContext {
                maze: &self.maze,
                options: &self.options,
                player_pos,
                player_dir,
                leader_pos,
                clock: self.clock,
            };
            let ghost = &mut self.ghosts[idx];
            let personality = ghost.personality();
            let tick = ghost.update(&ctx, &mut self.rng);

            if tick.released {
                self.events
                    .push(RuntimeEvent::GhostReleased { personality });
            }
            if let Some(fail_safe) = tick.respawned {
                self.events.push(RuntimeEvent::GhostRespawned {
                    personality,
                    fail_safe,
                });
            }
            if let Some(to_x) = tick.warped_to {
                self.events.push(RuntimeEvent::TunnelWarp { to_x });
            }
        }
    }

    fn resolve_collisions(&mut self) {
        let ts = self.maze.tile_size();
        let radius = self.options.contact_radius(ts);
        let player_pos = self.player.position();
        let house_center = self.maze.center_of(self.maze.house().center);
        let invulnerable = self.player.is_invulnerable(self.clock);

        let mut caught_by = None;
        for ghost in &mut self.ghosts {
            if !ghost.is_tangible() || !in_contact(player_pos, ghost.position(), radius) {
                continue;
            }
            if ghost.eat(house_center) {
                self.score += GHOST_POINTS;
                self.stats.ghosts += 1;
                self.events.push(RuntimeEvent::GhostEaten {
                    personality: ghost.personality(),
                });
                continue;
            }
            if !invulnerable {
                caught_by = Some(ghost.personality());
                break;
            }
        }

        if let Some(by) = caught_by {
            self.lose_life(by);
        }
    }

    fn lose_life(&mut self, by: Personality) {
        self.lives = self.lives.saturating_sub(1);
        self.stats.lives_lost += 1;
        self.events.push(RuntimeEvent::PlayerCaught {
            by,
            lives_left: self.lives,
        });

        if self.lives == 0 {
            self.player.kill();
            self.finish(RoundOutcome::Lost);
            return;
        }
        self.player
            .respawn(&self.maze, self.clock + self.options.invulnerable_secs);
        for ghost in &mut self.ghosts {
            ghost.send_home(&self.maze, self.clock);
        }
    }

    fn finish(&mut self, outcome: RoundOutcome) {
        if self.outcome.is_some() {
            return;
        }
        self.outcome = Some(outcome);
        self.events.push(match outcome {
            RoundOutcome::Won => RuntimeEvent::RoundWon,
            RoundOutcome::Lost => RuntimeEvent::GameOver,
        });
    }
}

fn spawn_ghosts(maze: &Maze, options: &GameOptions) -> Vec<Ghost> {
    Personality::ALL
        .iter()
        .map(|personality| {
            Ghost::new(
                *personality,
                maze,
                options.exit_delays[personality.slot()],
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::config::GameOptions;
    use crate::engine::GameEngine;
    use crate::input::{Autopilot, InputSource};
    use crate::maze::{HouseLayout, Maze};
    use crate::rng::SequenceRandom;
    use crate::types::{
        Direction, GhostState, Personality, RoundOutcome, RuntimeEvent, TilePos,
    };

    fn classic_engine(seed: u32) -> GameEngine {
        GameEngine::new(GameOptions::default(), Maze::classic(), seed)
    }

    fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() <= eps
    }

    fn wander(tick: u64) -> Direction {
        match (tick / 45) % 4 {
            0 => Direction::Right,
            1 => Direction::Down,
            2 => Direction::Left,
            _ => Direction::Up,
        }
    }

    #[test]
    fn same_seed_produces_same_progression() {
        let mut a = classic_engine(424_242);
        let mut b = classic_engine(424_242);

        for tick in 0..1_800 {
            a.step(wander(tick));
            b.step(wander(tick));
            let sa = a.build_snapshot(true);
            let sb = b.build_snapshot(true);

            assert_eq!(sa.score, sb.score);
            assert_eq!(sa.lives, sb.lives);
            assert_eq!(sa.player.x.to_bits(), sb.player.x.to_bits());
            assert_eq!(sa.player.y.to_bits(), sb.player.y.to_bits());
            for (ga, gb) in sa.ghosts.iter().zip(sb.ghosts.iter()) {
                assert_eq!(ga.x.to_bits(), gb.x.to_bits());
                assert_eq!(ga.y.to_bits(), gb.y.to_bits());
                assert_eq!(ga.state, gb.state);
            }
            assert_eq!(sa.events, sb.events);

            if a.is_ended() || b.is_ended() {
                assert_eq!(a.outcome(), b.outcome());
                break;
            }
        }
    }

    #[test]
    fn pellet_frightens_only_released_ghosts() {
        let mut engine = classic_engine(7);
        let maze = engine.maze().clone();
        engine
            .player
            .place(maze.center_of(TilePos::new(1, 6)), Direction::None);
        engine.ghosts[0].place(
            maze.center_of(TilePos::new(18, 18)),
            Direction::Left,
            GhostState::Chase,
        );
        engine.ghosts[1].place(
            maze.center_of(TilePos::new(8, 14)),
            Direction::Right,
            GhostState::Scatter,
        );
        engine.ghosts[3].place(
            maze.center_of(TilePos::new(15, 4)),
            Direction::Up,
            GhostState::Frightened,
        );
        assert!(engine.ghosts[3].eat(maze.center_of(maze.house().center)));

        engine.step(Direction::None);

        assert_eq!(engine.score(), 100);
        assert_eq!(engine.ghosts[0].state(), GhostState::Frightened);
        assert_eq!(engine.ghosts[1].state(), GhostState::Frightened);
        assert_eq!(engine.ghosts[2].state(), GhostState::InHouse);
        assert_eq!(engine.ghosts[3].state(), GhostState::Eaten);
        assert!(engine.frightened_active());

        let snapshot = engine.build_snapshot(true);
        assert!(snapshot.events.contains(&RuntimeEvent::PelletEaten {
            x: 1,
            y: 6,
            frightened: 2,
        }));
    }

    #[test]
    fn touching_frightened_ghost_eats_it() {
        let mut engine = classic_engine(11);
        let spawn = engine.maze().center_of(TilePos::new(1, 1));
        engine.ghosts[0].place(spawn, Direction::Right, GhostState::Frightened);

        engine.step(Direction::None);

        assert_eq!(engine.ghosts[0].state(), GhostState::Eaten);
        assert_eq!(engine.score(), 200);
        assert_eq!(engine.lives(), 3);
        let summary = engine.build_summary();
        assert_eq!(summary.ghosts_eaten, 1);

        // Intangible on the way home.
        engine.step(Direction::None);
        assert_eq!(engine.score(), 200);
    }

    #[test]
    fn touching_chasing_ghost_costs_a_life_then_grants_invulnerability() {
        let mut engine = classic_engine(13);
        let maze = engine.maze().clone();
        let spot = maze.center_of(TilePos::new(4, 4));
        engine.player.place(spot, Direction::None);
        engine.ghosts[0].place(spot, Direction::Right, GhostState::Chase);

        engine.step(Direction::None);

        assert_eq!(engine.lives(), 2);
        assert_eq!(engine.outcome(), None);
        assert_eq!(
            engine.player().position(),
            maze.center_of(maze.player_spawn())
        );
        assert!(engine.player().is_invulnerable(engine.clock()));
        assert!(engine
            .ghosts()
            .iter()
            .all(|ghost| ghost.state() == GhostState::InHouse));
        let events = engine.build_snapshot(true).events;
        assert!(events.contains(&RuntimeEvent::PlayerCaught {
            by: Personality::Aggressive,
            lives_left: 2,
        }));

        let spawn = engine.player().position();
        engine.ghosts[1].place(spawn, Direction::Left, GhostState::Chase);
        engine.step(Direction::None);
        assert_eq!(engine.lives(), 2);
    }

    #[test]
    fn invulnerability_expires_on_simulation_clock() {
        let mut options = GameOptions::default();
        options.invulnerable_secs = 0.05;
        let mut engine = GameEngine::new(options, Maze::classic(), 17);
        let spawn = engine.maze().center_of(TilePos::new(1, 1));
        engine.ghosts[0].place(spawn, Direction::Right, GhostState::Chase);
        engine.step(Direction::None);
        assert_eq!(engine.lives(), 2);

        for _ in 0..4 {
            engine.step(Direction::None);
        }
        assert!(!engine.player().is_invulnerable(engine.clock()));
        engine.ghosts[2].place(spawn, Direction::Left, GhostState::Chase);
        engine.step(Direction::None);
        assert_eq!(engine.lives(), 1);
    }

    #[test]
    fn last_life_ends_round() {
        let mut options = GameOptions::default();
        options.starting_lives = 1;
        let mut engine = GameEngine::new(options, Maze::classic(), 19);
        let spawn = engine.maze().center_of(TilePos::new(1, 1));
        engine.ghosts[0].place(spawn, Direction::Right, GhostState::Chase);

        engine.step(Direction::None);
        assert_eq!(engine.outcome(), Some(RoundOutcome::Lost));
        assert!(!engine.player().is_alive());
        let tick = engine.tick();
        engine.step(Direction::Right);
        assert_eq!(engine.tick(), tick);

        let events = engine.build_snapshot(true).events;
        assert_eq!(events.last(), Some(&RuntimeEvent::GameOver));
    }

    #[test]
    fn last_dot_wins_exactly_once() {
        let rows = ["#######", "# .   #", "#######"];
        let house = HouseLayout {
            row: 1,
            entrance_min_x: 5,
            entrance_max_x: 5,
            center: TilePos::new(5, 1),
            slots: [TilePos::new(5, 1); 4],
        };
        let maze = Maze::parse(&rows, house, None, TilePos::new(1, 1)).expect("valid layout");
        let mut options = GameOptions::default();
        options.exit_delays = [100.0; 4];
        let mut engine = GameEngine::new(options, maze, 23);

        let mut won_events = 0;
        for _ in 0..40 {
            engine.step(Direction::Right);
            won_events += engine
                .build_snapshot(true)
                .events
                .iter()
                .filter(|event| **event == RuntimeEvent::RoundWon)
                .count();
        }
        assert_eq!(engine.outcome(), Some(RoundOutcome::Won));
        assert_eq!(won_events, 1);
        assert_eq!(engine.maze().remaining_dot_count(), 0);
        assert_eq!(engine.score(), 10);
        assert!(engine.tick() < 40);
    }

    #[test]
    fn build_snapshot_drains_events_when_requested() {
        let mut engine = classic_engine(333);
        engine.step(Direction::None);
        engine.events.push(RuntimeEvent::RoundWon);

        let peek = engine.build_snapshot(false);
        assert!(peek.events.is_empty());
        let first = engine.build_snapshot(true);
        let second = engine.build_snapshot(true);
        assert!(!first.events.is_empty());
        assert!(second.events.is_empty());
    }

    #[test]
    fn reset_restores_initial_round() {
        let mut engine = classic_engine(29);
        for tick in 0..600 {
            engine.step(wander(tick));
        }
        assert!(engine.score() > 0);

        engine.reset();
        let snapshot = engine.build_snapshot(true);
        assert_eq!(snapshot.tick, 0);
        assert_eq!(snapshot.clock, 0.0);
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.lives, 3);
        assert_eq!(snapshot.remaining_dots, 177);
        assert!(snapshot.events.is_empty());
        assert!(snapshot
            .ghosts
            .iter()
            .all(|ghost| ghost.state == GhostState::InHouse));

        // The exit stagger starts over from the new clock.
        engine.step(Direction::None);
        assert_eq!(
            engine.ghost(Personality::Aggressive).map(|g| g.state()),
            Some(GhostState::Scatter)
        );
        assert_eq!(
            engine.ghost(Personality::Ambush).map(|g| g.state()),
            Some(GhostState::InHouse)
        );
    }

    #[test]
    fn resize_keeps_agents_on_the_same_tiles() {
        let mut engine = classic_engine(31);
        for _ in 0..30 {
            engine.step(Direction::Right);
        }
        let before = engine.player().tile(engine.maze().tile_size());
        let x_before = engine.player().position().x;

        engine.resize(40.0);
        assert_eq!(engine.maze().tile_size(), 40.0);
        assert!(approx_eq(engine.player().position().x, x_before * 2.0, 1e-3));
        assert_eq!(engine.player().tile(40.0), before);

        engine.resize(-3.0);
        assert_eq!(engine.maze().tile_size(), 40.0);
        engine.step(Direction::Right);
        engine.reset();
        assert_eq!(engine.maze().tile_size(), 40.0);
    }

    #[test]
    fn injected_random_source_drives_frightened_choices() {
        let mut engine = GameEngine::with_random(
            GameOptions::default(),
            Maze::classic(),
            SequenceRandom::new(vec![0.0]),
        );
        let maze = engine.maze().clone();
        engine.ghosts[0].place(
            maze.center_of(TilePos::new(9, 4)),
            Direction::Up,
            GhostState::Frightened,
        );
        engine.step(Direction::None);
        // Row 4 is open both ways; the first survivor in enumeration order wins.
        assert_eq!(engine.ghosts[0].direction(), Direction::Right);
    }

    #[test]
    fn autopilot_clears_dots() {
        let mut engine = classic_engine(37);
        let mut autopilot = Autopilot;
        for _ in 0..1_200 {
            let requested = autopilot.requested_direction(&engine.input_view());
            engine.step(requested);
            if engine.is_ended() {
                break;
            }
        }
        let summary = engine.build_summary();
        assert!(summary.dots_eaten >= 20, "ate only {}", summary.dots_eaten);
    }

    #[test]
    fn input_view_marks_only_dangerous_ghosts() {
        let mut engine = classic_engine(41);
        let maze = engine.maze().clone();
        engine.ghosts[0].place(
            maze.center_of(TilePos::new(4, 4)),
            Direction::Left,
            GhostState::Chase,
        );
        engine.ghosts[1].place(
            maze.center_of(TilePos::new(8, 4)),
            Direction::Left,
            GhostState::Frightened,
        );
        let view = engine.input_view();
        assert_eq!(view.danger, vec![TilePos::new(4, 4)]);
        assert_eq!(view.player_tile, TilePos::new(1, 1));
    }

    #[test]
    fn long_round_keeps_score_and_lives_consistent() {
        let mut engine = classic_engine(5);
        let mut last_score = 0;
        for tick in 0..7_200 {
            engine.step(wander(tick));
            assert!(engine.score() >= last_score);
            last_score = engine.score();
            if engine.is_ended() {
                break;
            }
        }
        let summary = engine.build_summary();
        assert_eq!(
            summary.score,
            summary.dots_eaten * 10 + summary.pellets_eaten * 100 + summary.ghosts_eaten * 200
        );
        assert_eq!(summary.lives_lost + engine.lives(), 3);
    }
}
