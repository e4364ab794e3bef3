use anyhow::{anyhow, Context};
use randomizer_core::{
    DrawMode, EventBus, Outcome, Randomizer, RngState, WeightMode, WeightStatus,
};
use randomizer_data::{
    default_assets_dir, list_presets, load_preset_pool, load_session_config, Preset, PresetOption,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;

const SEED_ENV: &str = "RANDOMIZER_SEED";

const USAGE: &str = "usage: randomizer [--mode winner|draft|lottery|powerball] [--option LABEL[=WEIGHT]]...
                  [--whole] [--count N] [--with-replacement] [--delay SECS]
                  [--seed N] [--assets DIR] [--preset NAME] [--normalize] [--json] [--menu]";

const MENU_HELP: &str = "commands:
  list                         show options, weights and settings
  add [LABEL] [WEIGHT]         add an option (numbered label when omitted)
  remove N                     remove option N
  rename N LABEL               rename option N
  weight N VALUE               set the weight of option N
  normalize                    scale weights to sum to 100 keeping ratios
  rebalance                    give every option the same weight
  method percent|whole         switch the weighting method (resets weights)
  mode winner|draft|lottery|powerball
  replacement on|off           allow repeated picks in draft lists
  delay SECS                   suspense delay between lottery draft picks
  replace A,B,C                replace every option
  presets                      list presets under the assets directory
  go [COUNT]                   run the current mode
  reset                        clear results
  help | quit";

#[derive(Debug, Clone, PartialEq)]
struct OptionSpec {
    label: String,
    weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
struct CliOptions {
    mode: DrawMode,
    options: Vec<OptionSpec>,
    whole: bool,
    count: usize,
    with_replacement: bool,
    delay: Option<f64>,
    seed: Option<u64>,
    assets: Option<PathBuf>,
    preset: Option<String>,
    normalize: bool,
    json: bool,
    menu: bool,
    help: bool,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            mode: DrawMode::default(),
            options: Vec::new(),
            whole: false,
            count: 1,
            with_replacement: false,
            delay: None,
            seed: None,
            assets: None,
            preset: None,
            normalize: false,
            json: false,
            menu: false,
            help: false,
        }
    }
}

fn parse_cli_options(args: &[String]) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        let mut value = || {
            idx += 1;
            args.get(idx)
                .cloned()
                .ok_or_else(|| format!("{flag} needs a value"))
        };
        match flag {
            "--mode" | "-m" => {
                let raw = value()?;
                options.mode =
                    DrawMode::from_id(&raw).ok_or_else(|| unknown_mode(&raw))?;
            }
            "--option" | "-o" => options.options.push(parse_option_spec(&value()?)?),
            "--whole" => options.whole = true,
            "--count" | "-n" => {
                let raw = value()?;
                options.count = raw
                    .parse()
                    .map_err(|_| format!("invalid count {raw:?}"))?;
            }
            "--with-replacement" => options.with_replacement = true,
            "--delay" => {
                let raw = value()?;
                options.delay = Some(raw.parse().map_err(|_| format!("invalid delay {raw:?}"))?);
            }
            "--seed" => {
                let raw = value()?;
                options.seed = Some(raw.parse().map_err(|_| format!("invalid seed {raw:?}"))?);
            }
            "--assets" => options.assets = Some(PathBuf::from(value()?)),
            "--preset" | "-p" => options.preset = Some(value()?),
            "--normalize" => options.normalize = true,
            "--json" => options.json = true,
            "--menu" => options.menu = true,
            "--help" | "-h" => options.help = true,
            other => return Err(format!("unknown argument {other:?}")),
        }
        idx += 1;
    }
    if options.preset.is_some() && !options.options.is_empty() {
        return Err("--preset and --option cannot be combined".to_string());
    }
    Ok(options)
}

fn unknown_mode(raw: &str) -> String {
    let known: Vec<&str> = DrawMode::ALL.iter().map(|mode| mode.id()).collect();
    format!("unknown mode {raw:?}, expected one of {}", known.join(", "))
}

/// `LABEL` or `LABEL=WEIGHT`; the last `=` splits, so labels may contain `=`.
fn parse_option_spec(raw: &str) -> Result<OptionSpec, String> {
    if let Some((label, weight)) = raw.rsplit_once('=') {
        if let Ok(weight) = weight.trim().parse::<f64>() {
            let label = label.trim();
            if label.is_empty() {
                return Err(format!("option {raw:?} has no label"));
            }
            return Ok(OptionSpec {
                label: label.to_string(),
                weight: Some(weight),
            });
        }
    }
    let label = raw.trim();
    if label.is_empty() {
        return Err("option label cannot be empty".to_string());
    }
    Ok(OptionSpec {
        label: label.to_string(),
        weight: None,
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_cli_options(&args) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("{err}");
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    };
    if options.help {
        println!("{USAGE}");
        return;
    }
    if let Err(err) = run(options) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(options: CliOptions) -> anyhow::Result<()> {
    let assets = options.assets.clone().unwrap_or_else(default_assets_dir);
    let mut session = build_session(&options, &assets)?;
    let mut events = EventBus::default();
    tracing::info!(seed = session.seed(), "session ready");
    warn_unbalanced(&session);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if options.menu {
        let stdin = io::stdin();
        run_menu(&mut session, &mut events, &assets, stdin.lock(), &mut out)?;
    } else {
        run_once(&mut session, &options, &mut events, &mut out)?;
    }
    log_events(&mut events);
    Ok(())
}

fn build_session(options: &CliOptions, assets: &std::path::Path) -> anyhow::Result<Randomizer> {
    let config = load_session_config(assets)?;
    let seed = match options.seed {
        Some(seed) => seed,
        None => seed_from_env()?.unwrap_or_else(|| RngState::from_entropy().seed()),
    };
    let pool = if let Some(name) = options.preset.as_deref() {
        Some(load_preset_pool(assets, name)?)
    } else if !options.options.is_empty() {
        let method = if options.whole {
            WeightMode::WholeNumber
        } else {
            WeightMode::Percentage
        };
        let preset = Preset {
            method,
            options: options
                .options
                .iter()
                .map(|spec| PresetOption {
                    label: spec.label.clone(),
                    weight: spec.weight,
                })
                .collect(),
        };
        Some(preset.into_pool().context("build pool from --option")?)
    } else {
        None
    };

    let mut events = EventBus::default();
    let mut session = match pool {
        Some(pool) => Randomizer::with_pool(config, pool, seed)?,
        None => {
            let mut session = Randomizer::new(config, seed)?;
            if options.whole {
                session.set_weight_mode(WeightMode::WholeNumber, &mut events);
            }
            session
        }
    };
    if options.normalize {
        session.normalize_weights(&mut events)?;
    }
    if let Some(delay) = options.delay {
        session.set_lottery_delay(delay)?;
    }
    if options.with_replacement {
        session.set_without_replacement(false, &mut events);
    }
    session.set_draw_mode(options.mode, &mut events);
    log_events(&mut events);
    Ok(session)
}

fn seed_from_env() -> anyhow::Result<Option<u64>> {
    match std::env::var(SEED_ENV) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("parse {SEED_ENV}={raw:?}")),
        Err(_) => Ok(None),
    }
}

fn warn_unbalanced(session: &Randomizer) {
    if session.pool().mode() != WeightMode::Percentage {
        return;
    }
    match session.pool().weight_status() {
        WeightStatus::Balanced => {}
        WeightStatus::Over(total) => {
            tracing::warn!("weights add up to {total:.2}%, which is more than 100%")
        }
        WeightStatus::Under(total) => {
            tracing::warn!("weights only add up to {total:.2}%, which is less than 100%")
        }
    }
}

fn log_events(events: &mut EventBus) {
    for event in events.drain() {
        tracing::debug!(?event, "event");
    }
}

fn run_once(
    session: &mut Randomizer,
    options: &CliOptions,
    events: &mut EventBus,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match session.mode() {
        DrawMode::SingleWinner => {
            session.pick_winner(events)?;
        }
        DrawMode::DraftList => {
            session.run_draft(options.count, events)?;
        }
        DrawMode::LotteryDraft => {
            while !session.draft().is_complete() {
                lottery_step(session, events, out)?;
            }
        }
        DrawMode::PowerBall => {
            session.draw_power_ball(events)?;
        }
    }
    if options.json {
        let outcome = session
            .outcome()
            .ok_or_else(|| anyhow!("no result was produced"))?;
        writeln!(out, "{}", serde_json::to_string_pretty(outcome)?)?;
    } else if session.mode() != DrawMode::LotteryDraft {
        print_outcome(session, out)?;
    }
    Ok(())
}

/// Announces the next pick, waits out the suspense delay, then reveals it.
fn lottery_step(
    session: &mut Randomizer,
    events: &mut EventBus,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let round = session.draft().round();
    write!(out, "The Number {round} Selection is... ")?;
    out.flush()?;
    thread::sleep(session.lottery_delay());
    let pick = session.draft_next(events)?;
    writeln!(out, "{}", pick.label)?;
    if session.draft().is_complete() {
        writeln!(out, "The draft is complete!")?;
    }
    Ok(())
}

fn print_outcome(session: &Randomizer, out: &mut dyn Write) -> io::Result<()> {
    match session.outcome() {
        Some(Outcome::Winner(pick)) => writeln!(out, "The winner is: {}", pick.label),
        Some(Outcome::Draft(picks)) => {
            writeln!(out, "Draft list:")?;
            for (i, pick) in picks.iter().enumerate() {
                writeln!(out, "{}. {}", i + 1, pick.label)?;
            }
            Ok(())
        }
        Some(Outcome::Lottery(numbers)) => writeln!(out, "Winning numbers: {numbers}"),
        None => writeln!(out, "Your results will appear here."),
    }
}

fn print_pool(session: &Randomizer, out: &mut dyn Write) -> io::Result<()> {
    let pool = session.pool();
    for (i, (label, weight)) in pool.entries().enumerate() {
        match pool.mode() {
            WeightMode::Percentage => writeln!(out, "{:>3}. {label:<24} {weight:>6.2}%", i + 1)?,
            WeightMode::WholeNumber => writeln!(out, "{:>3}. {label:<24} {weight:>6}", i + 1)?,
        }
    }
    if pool.mode() == WeightMode::Percentage {
        let status = match pool.weight_status() {
            WeightStatus::Balanced => "balanced".to_string(),
            WeightStatus::Over(total) => format!("{total:.2}% (more than 100%)"),
            WeightStatus::Under(total) => format!("{total:.2}% (less than 100%)"),
        };
        writeln!(out, "total: {status}")?;
    }
    writeln!(
        out,
        "method: {}  mode: {}  without replacement: {}  delay: {:.1}s",
        pool.mode().id(),
        session.mode().id(),
        session.without_replacement(),
        session.lottery_delay_secs()
    )
}

#[derive(Debug, Clone, PartialEq)]
enum MenuCommand {
    List,
    Add {
        label: Option<String>,
        weight: Option<f64>,
    },
    Remove(usize),
    Rename(usize, String),
    Weight(usize, f64),
    Normalize,
    Rebalance,
    Method(WeightMode),
    Mode(DrawMode),
    Replacement(bool),
    Delay(f64),
    Replace(Vec<String>),
    Presets,
    Go(Option<usize>),
    Reset,
    Help,
    Quit,
}

fn parse_menu_command(line: &str) -> Result<MenuCommand, String> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Err("empty command".to_string());
    };
    let rest: Vec<&str> = parts.collect();
    let position = |raw: Option<&&str>| -> Result<usize, String> {
        let raw = raw.ok_or("missing option number")?;
        match raw.parse::<usize>() {
            Ok(n) if n >= 1 => Ok(n - 1),
            _ => Err(format!("invalid option number {raw:?}")),
        }
    };
    let number = |raw: Option<&&str>| -> Result<f64, String> {
        let raw = raw.ok_or("missing value")?;
        raw.parse::<f64>()
            .map_err(|_| format!("invalid number {raw:?}"))
    };
    let command = match head.to_ascii_lowercase().as_str() {
        "list" | "ls" | "l" => MenuCommand::List,
        "add" | "a" => {
            let (label, weight) = match rest.split_last() {
                Some((last, init)) if !init.is_empty() && last.parse::<f64>().is_ok() => {
                    (Some(init.join(" ")), last.parse::<f64>().ok())
                }
                Some(_) => (Some(rest.join(" ")), None),
                None => (None, None),
            };
            MenuCommand::Add { label, weight }
        }
        "remove" | "rm" => MenuCommand::Remove(position(rest.first())?),
        "rename" => {
            let index = position(rest.first())?;
            let label = rest[1..].join(" ");
            if label.is_empty() {
                return Err("missing label".to_string());
            }
            MenuCommand::Rename(index, label)
        }
        "weight" | "w" => MenuCommand::Weight(position(rest.first())?, number(rest.get(1))?),
        "normalize" => MenuCommand::Normalize,
        "rebalance" => MenuCommand::Rebalance,
        "method" => {
            let raw = rest.first().ok_or("missing method")?;
            MenuCommand::Method(
                WeightMode::from_id(raw).ok_or_else(|| format!("unknown method {raw:?}"))?,
            )
        }
        "mode" => {
            let raw = rest.first().ok_or("missing mode")?;
            MenuCommand::Mode(DrawMode::from_id(raw).ok_or_else(|| unknown_mode(raw))?)
        }
        "replacement" => match rest.first().copied() {
            Some("on") | Some("yes") | Some("true") => MenuCommand::Replacement(true),
            Some("off") | Some("no") | Some("false") => MenuCommand::Replacement(false),
            _ => return Err("expected replacement on|off".to_string()),
        },
        "delay" => MenuCommand::Delay(number(rest.first())?),
        "replace" => {
            let labels: Vec<String> = rest
                .join(" ")
                .split(',')
                .map(|label| label.trim().to_string())
                .filter(|label| !label.is_empty())
                .collect();
            MenuCommand::Replace(labels)
        }
        "presets" => MenuCommand::Presets,
        "go" | "g" => match rest.first() {
            Some(raw) => MenuCommand::Go(Some(
                raw.parse()
                    .map_err(|_| format!("invalid count {raw:?}"))?,
            )),
            None => MenuCommand::Go(None),
        },
        "reset" => MenuCommand::Reset,
        "help" | "h" | "?" => MenuCommand::Help,
        "quit" | "exit" | "q" | "x" => MenuCommand::Quit,
        other => return Err(format!("unknown command {other:?}")),
    };
    Ok(command)
}

/// Applies one menu command. Returns false when the menu should exit.
fn apply_menu_command(
    session: &mut Randomizer,
    command: MenuCommand,
    events: &mut EventBus,
    assets: &std::path::Path,
    out: &mut dyn Write,
) -> anyhow::Result<bool> {
    match command {
        MenuCommand::List => print_pool(session, out)?,
        MenuCommand::Add { label, weight } => {
            let index = match label {
                Some(label) => session.add_option(label, weight, events)?,
                None => session.add_default_option(events)?,
            };
            writeln!(out, "added option {}", index + 1)?;
            if weight.is_some() && session.pool().mode() == WeightMode::Percentage {
                writeln!(
                    out,
                    "note: percentage pools rebalance on add, so every option now has {:.2}%",
                    session.pool().weights()[index]
                )?;
            }
        }
        MenuCommand::Remove(index) => {
            let label = session.remove_option(index, events)?;
            writeln!(out, "removed {label}")?;
        }
        MenuCommand::Rename(index, label) => session.rename_option(index, label, events)?,
        MenuCommand::Weight(index, weight) => {
            session.set_weight(index, weight, events)?;
            warn_unbalanced(session);
        }
        MenuCommand::Normalize => session.normalize_weights(events)?,
        MenuCommand::Rebalance => session.rebalance_weights(events)?,
        MenuCommand::Method(mode) => session.set_weight_mode(mode, events),
        MenuCommand::Mode(mode) => session.set_draw_mode(mode, events),
        MenuCommand::Replacement(allowed) => session.set_without_replacement(!allowed, events),
        MenuCommand::Delay(secs) => session.set_lottery_delay(secs)?,
        MenuCommand::Replace(labels) => {
            session.replace_options(labels, events)?;
            writeln!(out, "imported {} options", session.pool().len())?;
        }
        MenuCommand::Presets => {
            for name in list_presets(assets)? {
                writeln!(out, "{name}")?;
            }
        }
        MenuCommand::Go(count) => match session.mode() {
            DrawMode::LotteryDraft => lottery_step(session, events, out)?,
            DrawMode::DraftList => {
                session.run_draft(count.unwrap_or(1), events)?;
                print_outcome(session, out)?;
            }
            DrawMode::SingleWinner => {
                session.pick_winner(events)?;
                print_outcome(session, out)?;
            }
            DrawMode::PowerBall => {
                session.draw_power_ball(events)?;
                print_outcome(session, out)?;
            }
        },
        MenuCommand::Reset => session.reset_results(events),
        MenuCommand::Help => writeln!(out, "{MENU_HELP}")?,
        MenuCommand::Quit => return Ok(false),
    }
    Ok(true)
}

fn run_menu(
    session: &mut Randomizer,
    events: &mut EventBus,
    assets: &std::path::Path,
    input: impl BufRead,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    writeln!(out, "{MENU_HELP}")?;
    print_pool(session, out)?;
    write!(out, "> ")?;
    out.flush()?;
    for line in input.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            match parse_menu_command(&line) {
                Ok(command) => match apply_menu_command(session, command, events, assets, out) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(err) => writeln!(out, "error: {err:#}")?,
                },
                Err(err) => writeln!(out, "{err}")?,
            }
            log_events(events);
        }
        write!(out, "> ")?;
        out.flush()?;
    }
    Ok(())
}
