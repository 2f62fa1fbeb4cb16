use anyhow::{Context, Result};
use rujack_core::{
    Content, GameConfig, GameEvent, GameSession, MetaProgress, Phase, RecordingOptions, Side,
};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone)]
struct CliOptions {
    seed: u64,
    levels: u32,
    meta: Option<PathBuf>,
    record: Option<PathBuf>,
    verbose: bool,
}

fn parse_args() -> Result<CliOptions> {
    let mut options = CliOptions {
        seed: 0,
        levels: 3,
        meta: None,
        record: None,
        verbose: false,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => {
                let value = args.next().context("--seed needs a value")?;
                options.seed = value.parse().context("--seed must be an integer")?;
            }
            "--levels" => {
                let value = args.next().context("--levels needs a value")?;
                options.levels = value.parse().context("--levels must be an integer")?;
            }
            "--meta" => {
                let value = args.next().context("--meta needs a path")?;
                options.meta = Some(PathBuf::from(value));
            }
            "--record" => {
                let value = args.next().context("--record needs a path")?;
                options.record = Some(PathBuf::from(value));
            }
            "--verbose" | "-v" => options.verbose = true,
            "--help" | "-h" => {
                println!(
                    "usage: rujack-cli [--seed N] [--levels N] [--meta FILE] [--record FILE] [--verbose]"
                );
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument {other}"),
        }
    }
    Ok(options)
}

/// Persisted meta progress, if the caller carries one between runs.
fn load_meta(path: Option<&PathBuf>) -> Result<MetaProgress> {
    let Some(path) = path else {
        return Ok(MetaProgress::default());
    };
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn describe(event: &GameEvent) -> String {
    match event {
        GameEvent::HandAction { side, gesture } => format!("{side:?} {gesture:?}"),
        GameEvent::VisualEffect { side, cue, .. } => format!("{side:?} {cue:?}"),
        GameEvent::DamageNumber { side, amount, heal } => {
            if *heal {
                format!("{side:?} heals {amount}")
            } else {
                format!("{side:?} takes {amount}")
            }
        }
        GameEvent::ItemAnimation { side, item_id, .. } => format!("{side:?} uses {item_id}"),
        GameEvent::EnvironmentAnimation { card_id } => format!("environment: {card_id}"),
        GameEvent::PenaltyAnimation { card_id } => format!("penalty: {card_id}"),
        GameEvent::PenaltyCardRevealed { name, .. } => format!("penalty revealed: {name}"),
        GameEvent::ClashState {
            player_score,
            enemy_score,
            message,
            ..
        } => format!("clash {player_score} vs {enemy_score}: {message}"),
    }
}

fn drain_events(session: &mut GameSession, verbose: bool) {
    for event in session.events.drain() {
        if verbose {
            println!("  {}", describe(&event));
        }
    }
}

/// Headless auto-battle: hit below 17, stand otherwise, always take the
/// first reward. Exercises a full run the way a frontend would.
fn run(options: &CliOptions) -> Result<()> {
    let meta = load_meta(options.meta.as_ref())?;
    let mut session =
        GameSession::new(GameConfig::default(), Content::builtin(), options.seed).with_meta(meta);
    log::info!("starting run with seed {}", options.seed);
    if options.record.is_some() {
        session.store.start_recording(RecordingOptions {
            include_current: true,
        });
    }
    session.start_run()?;
    drain_events(&mut session, options.verbose);

    let mut steps = 0u32;
    loop {
        steps += 1;
        if steps > 10_000 {
            anyhow::bail!("run did not finish within the step budget");
        }
        let phase = session.store.state().phase;
        let level = session.store.state().level;
        match phase {
            Phase::Battle => {
                let flags = session.store.flags();
                let state = session.store.state();
                let my_turn = state.turn == Side::Player
                    && !state.stood.player
                    && !flags.is_dealing
                    && !flags.is_resolving_round
                    && !flags.is_processing_ai;
                let score = state.player.score;
                if my_turn {
                    if score < 17 {
                        session.hit(Side::Player);
                    } else {
                        session.stand(Side::Player);
                    }
                }
                session.tick();
            }
            Phase::Victory => {
                let hp = session.store.state().player.hp;
                println!("level {level} cleared, player hp {hp}");
                if level >= options.levels {
                    break;
                }
                session.proceed_to_rewards();
                session.pick_reward(0);
                session.next_level()?;
            }
            Phase::GameOver => {
                println!("defeated on level {level}");
                break;
            }
            Phase::Reward => {
                session.next_level()?;
            }
            Phase::Menu => anyhow::bail!("unexpected return to menu"),
        }
        drain_events(&mut session, options.verbose);
    }

    println!(
        "run over: gold {}, mutations {}",
        session.meta.gold,
        session.store.history_len()
    );
    if let Some(path) = &options.record {
        let frames = session
            .store
            .stop_recording()
            .context("recording was not active")?;
        let json = serde_json::to_string_pretty(&frames)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("wrote {} frames to {}", frames.len(), path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let options = parse_args()?;
    run(&options)
}
