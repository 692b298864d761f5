//! # PianOli replay
//!
//! Drives the piano engine from a plain-text touch script, the way a touchscreen would,
//! and plays the result on one of the built-in sound sets.
//!
//! ```text
//! RUST_LOG=debug pianoli --melodies demo.txt
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use pianoli::host::HostRequests;
use pianoli::reminder::ManualClock;
use pianoli::replay::{parse_script, replay};
use pianoli::session::Session;
use pianoli::settings::{load_desktop_settings, save_desktop_settings};
use pianoli::sound::{self, open_or_silent};

/// Time left for the last notes to ring out before exiting.
const TAIL: Duration = Duration::from_millis(1500);

#[derive(Parser, Debug)]
#[command(name = "pianoli", about = "Replay touch scripts through the PianOli engine")]
struct Args {
    /// Screen width in pixels.
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Screen height in pixels.
    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Sound set to play on (overrides the saved setting).
    #[arg(long)]
    sound_set: Option<String>,

    /// Play the selected melodies instead of the touched keys.
    #[arg(long)]
    melodies: bool,

    /// Seed for the unlock sequence, for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// Store the effective settings for next time.
    #[arg(long)]
    save: bool,

    /// Touch script to replay.
    script: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args = Args::parse();

    let mut settings = load_desktop_settings();
    if let Some(name) = &args.sound_set {
        settings.sound_set = sound::strip_prefix(name).to_string();
    }
    if args.melodies {
        settings.melodies_enabled = true;
    }

    let text = std::fs::read_to_string(&args.script)
        .map_err(|e| format!("{}: {e}", args.script.display()))?;
    let steps = parse_script(&text)?;

    let sound_set = open_or_silent(&settings.sound_set, settings.a4_tuning_hz);
    let audible = sound_set.name() != sound::SILENT;

    let rng: Box<dyn RngCore> = match args.seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
        None => Box::new(StdRng::from_entropy()),
    };
    let clock = Rc::new(ManualClock::new(0));
    let mut session = Session::with_clock_and_rng(
        args.width,
        args.height,
        &settings,
        sound_set,
        clock.clone(),
        rng,
    );

    println!(
        "{}x{}: {} keys, sound set '{}', unlock starts at key {}",
        args.width,
        args.height,
        session.keys_count(),
        session.sound_set_name(),
        session.next_expected_config_key().0
    );

    let summary = replay(&mut session, &clock, &steps, |step, r| {
        log::debug!("line {}: {r:?}", step.line);
        if r.contains(HostRequests::OPEN_CONFIG) {
            println!("line {}: settings unlocked", step.line);
        }
        if r.contains(HostRequests::SHOW_TOOLTIP) {
            println!("line {}: unlock hint shown", step.line);
        }
    });

    println!(
        "{} touch events, {} redraws, {} unlocks, {} hints",
        summary.touch_events, summary.redraws, summary.configs_opened, summary.tooltips_shown
    );

    if args.save {
        save_desktop_settings(&settings)?;
    }

    if audible {
        std::thread::sleep(TAIL);
    }

    Ok(())
}
