use randomizer_core::{
    DraftPhase, DrawMode, Event, EventBus, Outcome, Randomizer, WeightMode, WeightStatus,
};
use randomizer_data::{default_assets_dir, load_preset_pool, load_session_config};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tiny_http::{Header, Method, Response, Server, StatusCode};

const ADDR_ENV: &str = "RANDOMIZER_ADDR";
const DEFAULT_ADDR: &str = "0.0.0.0:7878";
const SEED_ENV: &str = "RANDOMIZER_SEED";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let app = match AppState::new() {
        Ok(app) => app,
        Err(err) => {
            tracing::error!("failed to build session: {err:#}");
            std::process::exit(1);
        }
    };
    let addr = std::env::var(ADDR_ENV).unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let server = match Server::http(&addr) {
        Ok(server) => server,
        Err(err) => {
            tracing::error!(%addr, "failed to start server: {err}");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, seed = app.session.seed(), "randomizer web server listening");
    let state = Arc::new(Mutex::new(app));
    for request in server.incoming_requests() {
        let state = state.clone();
        if let Err(err) = handle_request(request, state) {
            tracing::warn!("request error: {err}");
        }
    }
}

struct AppState {
    session: Randomizer,
    events: EventBus,
    assets: PathBuf,
}

impl AppState {
    fn new() -> anyhow::Result<Self> {
        let assets = default_assets_dir();
        let config = load_session_config(&assets)?;
        let seed = match std::env::var(SEED_ENV) {
            Ok(raw) => raw.trim().parse()?,
            Err(_) => randomizer_core::RngState::from_entropy().seed(),
        };
        Ok(Self {
            session: Randomizer::new(config, seed)?,
            events: EventBus::default(),
            assets,
        })
    }
}

#[derive(Serialize)]
struct ApiResponse {
    ok: bool,
    error: Option<String>,
    state: UiState,
    events: Vec<Event>,
}

#[derive(Debug, Serialize)]
struct UiState {
    options: Vec<UiOption>,
    weight_method: WeightMode,
    total_weight: f64,
    weight_status: WeightStatus,
    mode: DrawMode,
    without_replacement: bool,
    lottery_delay_secs: f64,
    draft_phase: DraftPhase,
    draft_round: usize,
    outcome: Option<Outcome>,
    seed: u64,
}

#[derive(Debug, Serialize)]
struct UiOption {
    label: String,
    weight: f64,
}

#[derive(Debug, Default, Deserialize)]
struct ActionRequest {
    action: String,
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    weights: Vec<f64>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    count: Option<usize>,
    #[serde(default)]
    value: Option<Value>,
}

fn handle_request(
    mut request: tiny_http::Request,
    state: Arc<Mutex<AppState>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let url = request.url().to_string();
    match (request.method(), url.as_str()) {
        (&Method::Get, "/api/state") => {
            let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
            let response = build_response(&mut guard, None);
            respond_json(request, response)?;
        }
        (&Method::Post, "/api/action") => {
            let mut body = String::new();
            request.as_reader().read_to_string(&mut body)?;
            let action: ActionRequest = match serde_json::from_str(&body) {
                Ok(action) => action,
                Err(err) => {
                    let response = Response::from_string(format!("bad request: {err}"))
                        .with_status_code(StatusCode(400));
                    request.respond(response)?;
                    return Ok(());
                }
            };
            let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
            let err = apply_action(&mut guard, action);
            let response = build_response(&mut guard, err);
            respond_json(request, response)?;
        }
        _ => {
            let response = Response::empty(StatusCode(404));
            request.respond(response)?;
        }
    }
    Ok(())
}

fn respond_json(
    request: tiny_http::Request,
    response: ApiResponse,
) -> Result<(), Box<dyn std::error::Error>> {
    let body = serde_json::to_vec_pretty(&response)?;
    let header = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .map_err(|_| "invalid content-type header")?;
    request.respond(Response::from_data(body).with_header(header))?;
    Ok(())
}

fn build_response(state: &mut AppState, err: Option<String>) -> ApiResponse {
    let events: Vec<_> = state.events.drain().collect();
    ApiResponse {
        ok: err.is_none(),
        error: err,
        state: snapshot_state(&state.session),
        events,
    }
}

fn snapshot_state(session: &Randomizer) -> UiState {
    let pool = session.pool();
    UiState {
        options: pool
            .entries()
            .map(|(label, weight)| UiOption {
                label: label.to_string(),
                weight,
            })
            .collect(),
        weight_method: pool.mode(),
        total_weight: pool.total_weight(),
        weight_status: pool.weight_status(),
        mode: session.mode(),
        without_replacement: session.without_replacement(),
        lottery_delay_secs: session.lottery_delay_secs(),
        draft_phase: session.draft().phase(),
        draft_round: session.draft().round(),
        outcome: session.outcome().cloned(),
        seed: session.seed(),
    }
}

/// Runs one action against the shared session; `Some(message)` on failure.
fn apply_action(state: &mut AppState, action: ActionRequest) -> Option<String> {
    let session = &mut state.session;
    let events = &mut state.events;
    let result: anyhow::Result<()> = (|| {
        match action.action.as_str() {
            "add_option" => {
                match action.label {
                    Some(label) => session.add_option(label, action.weight, events)?,
                    None => session.add_default_option(events)?,
                };
            }
            "remove_option" => {
                session.remove_option(require(action.index, "index")?, events)?;
            }
            "rename_option" => {
                let index = require(action.index, "index")?;
                session.rename_option(index, require(action.label, "label")?, events)?;
            }
            "set_weight" => {
                let index = require(action.index, "index")?;
                session.set_weight(index, require(action.weight, "weight")?, events)?;
            }
            "set_weights" => session.set_weights(&action.weights, events)?,
            "normalize" => session.normalize_weights(events)?,
            "rebalance" => session.rebalance_weights(events)?,
            "replace_options" => session.replace_options(action.labels, events)?,
            "set_weight_method" => {
                let raw = value_str(action.value.as_ref())?;
                let mode = WeightMode::from_id(raw)
                    .ok_or_else(|| anyhow::anyhow!("unknown weight method {raw:?}"))?;
                session.set_weight_mode(mode, events);
            }
            "set_mode" => {
                let raw = value_str(action.value.as_ref())?;
                let mode = DrawMode::from_id(raw)
                    .ok_or_else(|| anyhow::anyhow!("unknown draw mode {raw:?}"))?;
                session.set_draw_mode(mode, events);
            }
            "set_without_replacement" => {
                session.set_without_replacement(value_bool(action.value.as_ref())?, events)
            }
            "set_delay" => session.set_lottery_delay(value_f64(action.value.as_ref())?)?,
            "load_preset" => {
                let name = require(action.label, "label")?;
                let pool = load_preset_pool(&state.assets, &name)?;
                let weights = pool.weights().to_vec();
                session.set_weight_mode(pool.mode(), events);
                session.replace_options(pool.labels().to_vec(), events)?;
                session.set_weights(&weights, events)?;
            }
            "draw" => match session.mode() {
                DrawMode::SingleWinner => {
                    session.pick_winner(events)?;
                }
                DrawMode::DraftList => {
                    session.run_draft(action.count.unwrap_or(1), events)?;
                }
                DrawMode::LotteryDraft => {
                    session.draft_next(events)?;
                }
                DrawMode::PowerBall => {
                    session.draw_power_ball(events)?;
                }
            },
            "reset" => session.reset_results(events),
            other => anyhow::bail!("unknown action {other:?}"),
        }
        Ok(())
    })();
    result.err().map(|err| format!("{err:#}"))
}

fn require<T>(value: Option<T>, field: &str) -> anyhow::Result<T> {
    value.ok_or_else(|| anyhow::anyhow!("missing field {field:?}"))
}

fn value_str(value: Option<&Value>) -> anyhow::Result<&str> {
    require(value, "value")?
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("value must be a string"))
}

fn value_f64(value: Option<&Value>) -> anyhow::Result<f64> {
    match require(value, "value")? {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| anyhow::anyhow!("value is not a number")),
        Value::String(raw) => Ok(raw.trim().parse()?),
        other => anyhow::bail!("value must be a number, got {other}"),
    }
}

fn value_bool(value: Option<&Value>) -> anyhow::Result<bool> {
    match require(value, "value")? {
        Value::Bool(flag) => Ok(*flag),
        Value::String(raw) => match raw.as_str() {
            "on" | "true" | "yes" => Ok(true),
            "off" | "false" | "no" => Ok(false),
            _ => anyhow::bail!("value must be on or off, got {raw:?}"),
        },
        other => anyhow::bail!("value must be a boolean, got {other}"),
    }
}
