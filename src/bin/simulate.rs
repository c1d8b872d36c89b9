use chrono::{SecondsFormat, Utc};
use clap::Parser;
use packman_sim::config::GameOptions;
use packman_sim::constants::{DOT_POINTS, GHOST_POINTS, PELLET_POINTS};
use packman_sim::engine::GameEngine;
use packman_sim::input::{Autopilot, InputSource};
use packman_sim::maze::Maze;
use packman_sim::types::{RoundOutcome, RoundSummary, RuntimeEvent, Snapshot};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

const DEFAULT_TICK_LIMIT: u64 = 60 * 180;
const MAX_ROUNDS: u32 = 100;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless autopilot rounds of the maze chase")]
struct Cli {
    #[arg(long)]
    seed: Option<u64>,
    /// Tick limit per round; rounds still running at the limit time out.
    #[arg(long)]
    ticks: Option<u64>,
    #[arg(long)]
    rounds: Option<u32>,
    /// JSON file with game options.
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON maze file (`rows`, optional `house`, `tunnelRow`, `playerSpawn`).
    #[arg(long)]
    maze: Option<PathBuf>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    #[arg(long)]
    run_id: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    seed: u32,
    #[serde(rename = "tickLimit")]
    tick_limit: u64,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    outcome: String,
    #[serde(rename = "durationSecs")]
    duration_secs: f32,
    ticks: u64,
    score: u32,
    #[serde(rename = "dotsEaten")]
    dots_eaten: u32,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u32,
    #[serde(rename = "ghostsEaten")]
    ghosts_eaten: u32,
    #[serde(rename = "livesLost")]
    lives_lost: u32,
    #[serde(rename = "remainingDots")]
    remaining_dots: usize,
    #[serde(rename = "tunnelWarps")]
    tunnel_warps: u32,
    #[serde(rename = "failSafeRespawns")]
    fail_safe_respawns: u32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct ScenarioRunResult {
    result: ScenarioResultLine,
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageScore")]
    average_score: u32,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    timestamp: String,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let started_at = now_iso();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, Utc::now().timestamp_millis()));

    let options = match cli.config.as_deref() {
        Some(path) => match GameOptions::load(path) {
            Ok(options) => options,
            Err(error) => exit_on_load_error(&run_id, "config_load_failed", path, &error),
        },
        None => GameOptions::default(),
    };
    let maze = match cli.maze.as_deref() {
        Some(path) => match load_maze(path) {
            Ok(maze) => maze,
            Err(error) => exit_on_load_error(&run_id, "maze_load_failed", path, &error),
        },
        None => Maze::classic(),
    };

    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "tickLimit": scenario.tick_limit,
                "mazeWidth": maze.width(),
                "mazeHeight": maze.height(),
                "dots": maze.remaining_dot_count(),
            }),
        );
        let scenario_run = run_scenario(&scenario, &options, &maze);

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        *outcome_counts
            .entry(scenario_run.result.outcome.clone())
            .or_insert(0) += 1;

        emit_log(
            "info",
            "scenario_finished",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.finished_tick),
            json!({
                "outcome": scenario_run.result.outcome,
                "score": scenario_run.result.score,
                "durationSecs": scenario_run.result.duration_secs,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        println!("{}", to_json_line(&scenario_run.result));
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        run_id.clone(),
        started_at,
        now_iso(),
        scenario_results,
        outcome_counts,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageScore": summary.average_score,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario, options: &GameOptions, maze: &Maze) -> ScenarioRunResult {
    let mut engine = GameEngine::new(options.clone(), maze.clone(), scenario.seed);
    let mut autopilot = Autopilot;

    let mut tunnel_warps = 0;
    let mut fail_safe_respawns = 0;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut last_tick = 0u64;
    let mut last_score = 0u32;

    while !engine.is_ended() && engine.tick() < scenario.tick_limit {
        let requested = autopilot.requested_direction(&engine.input_view());
        engine.step(requested);
        let snapshot = engine.build_snapshot(true);
        last_tick = snapshot.tick;

        let bounds = (
            maze.width() as f32 * options.tile_size,
            maze.height() as f32 * options.tile_size,
        );
        for message in collect_snapshot_anomalies(&snapshot, last_score, bounds) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
        last_score = snapshot.score;

        for event in &snapshot.events {
            match event {
                RuntimeEvent::TunnelWarp { .. } => tunnel_warps += 1,
                RuntimeEvent::GhostRespawned {
                    fail_safe: true, ..
                } => fail_safe_respawns += 1,
                _ => {}
            }
        }
    }

    let summary = engine.build_summary();
    if let Some(message) = check_score_tally(&summary) {
        push_anomaly(
            &mut anomalies,
            &mut anomaly_records,
            &mut anomaly_seen,
            last_tick,
            message,
        );
    }
    ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            outcome: outcome_key(summary.outcome),
            duration_secs: (summary.duration_secs * 100.0).round() / 100.0,
            ticks: summary.ticks,
            score: summary.score,
            dots_eaten: summary.dots_eaten,
            pellets_eaten: summary.pellets_eaten,
            ghosts_eaten: summary.ghosts_eaten,
            lives_lost: summary.lives_lost,
            remaining_dots: summary.remaining_dots,
            tunnel_warps,
            fail_safe_respawns,
            anomalies,
        },
        anomaly_records,
        finished_tick: last_tick,
    }
}

fn collect_snapshot_anomalies(
    snapshot: &Snapshot,
    previous_score: u32,
    bounds: (f32, f32),
) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.score < previous_score {
        anomalies.push(format!(
            "score went down: {previous_score} -> {}",
            snapshot.score
        ));
    }

    let (max_x, max_y) = bounds;
    let in_bounds = |x: f32, y: f32| {
        x.is_finite() && y.is_finite() && (0.0..=max_x).contains(&x) && (0.0..=max_y).contains(&y)
    };
    if !in_bounds(snapshot.player.x, snapshot.player.y) {
        anomalies.push(format!(
            "player outside maze: ({}, {})",
            snapshot.player.x, snapshot.player.y
        ));
    }
    for ghost in &snapshot.ghosts {
        if !in_bounds(ghost.x, ghost.y) {
            anomalies.push(format!(
                "ghost {:?} outside maze: ({}, {})",
                ghost.personality, ghost.x, ghost.y
            ));
        }
        if !(ghost.target_x.is_finite() && ghost.target_y.is_finite()) {
            anomalies.push(format!("ghost {:?} has non-finite target", ghost.personality));
        }
    }
    anomalies
}

/// The final score must be exactly what the eaten dots, pellets and ghosts pay.
fn check_score_tally(summary: &RoundSummary) -> Option<String> {
    let expected = summary.dots_eaten * DOT_POINTS
        + summary.pellets_eaten * PELLET_POINTS
        + summary.ghosts_eaten * GHOST_POINTS;
    (summary.score != expected).then(|| {
        format!(
            "score {} does not match tally {expected} (dots={}, pellets={}, ghosts={})",
            summary.score, summary.dots_eaten, summary.pellets_eaten, summary.ghosts_eaten
        )
    })
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = normalize_seed(cli.seed.unwrap_or_else(|| rand::random::<u32>() as u64));
    let tick_limit = cli.ticks.unwrap_or(DEFAULT_TICK_LIMIT).max(1);

    if let Some(rounds) = cli.rounds {
        let rounds = rounds.clamp(1, MAX_ROUNDS);
        return (0..rounds)
            .map(|idx| Scenario {
                name: format!("round-{}", idx + 1),
                seed: normalize_seed(seed as u64 + idx as u64),
                tick_limit,
            })
            .collect();
    }

    vec![
        Scenario {
            name: "autopilot-quick".to_string(),
            seed,
            tick_limit: tick_limit.min(60 * 30),
        },
        Scenario {
            name: "autopilot-full".to_string(),
            seed: normalize_seed(seed as u64 + 1),
            tick_limit,
        },
    ]
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u32, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at: String,
    finished_at: String,
    scenarios: Vec<ScenarioResultLine>,
    outcome_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let total_score: u64 = scenarios.iter().map(|s| s.score as u64).sum();
    let average_score = if scenario_count == 0 {
        0
    } else {
        (total_score / scenario_count as u64) as u32
    };
    RunSummary {
        run_id,
        started_at,
        finished_at,
        scenario_count,
        anomaly_count,
        average_score,
        outcome_counts,
        scenarios,
    }
}

fn load_maze(path: &Path) -> Result<Maze, String> {
    let text = std::fs::read_to_string(path).map_err(|error| error.to_string())?;
    Maze::from_json_str(&text).map_err(|error| error.to_string())
}

fn exit_on_load_error(
    run_id: &str,
    event: &str,
    path: &Path,
    error: &dyn std::fmt::Display,
) -> ! {
    emit_log(
        "error",
        event,
        run_id,
        None,
        None,
        None,
        json!({
            "path": path.to_string_lossy(),
            "error": error.to_string(),
        }),
    );
    std::process::exit(2);
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp: now_iso(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    eprintln!("{}", to_json_line(&log_line));
}

fn to_json_line<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|error| {
        json!({
            "level": "error",
            "event": "serialize_failed",
            "error": error.to_string(),
        })
        .to_string()
    })
}

fn outcome_key(outcome: Option<RoundOutcome>) -> String {
    match outcome {
        Some(RoundOutcome::Won) => "won",
        Some(RoundOutcome::Lost) => "lost",
        None => "timeout",
    }
    .to_string()
}

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
