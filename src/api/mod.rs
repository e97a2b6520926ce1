use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    ComparisonResult, ControlPoint, DecayPolicy, FTE_HOURS_PER_YEAR, GlobalParams,
    HorizonConfig, ProgrammeInputs, ProgrammeOutcome, compare_programmes, evaluate_programme,
    presets,
};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliProgramme {
    BespokeOffering,
    Procrastination,
    Insomnia,
}

impl CliProgramme {
    fn preset_name(self) -> &'static str {
        match self {
            CliProgramme::BespokeOffering => "Bespoke Offering",
            CliProgramme::Procrastination => "Procrastination",
            CliProgramme::Insomnia => "Insomnia",
        }
    }

    fn default_months_to_zero(self) -> f64 {
        match self {
            CliProgramme::BespokeOffering | CliProgramme::Insomnia => 12.0,
            CliProgramme::Procrastination => 6.0,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliDecayModel {
    Exponential,
    Linear,
    Custom,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiProgramme {
    #[serde(alias = "bespokeOffering", alias = "bespoke_offering", alias = "bespoke")]
    BespokeOffering,
    Procrastination,
    Insomnia,
}

impl From<ApiProgramme> for CliProgramme {
    fn from(value: ApiProgramme) -> Self {
        match value {
            ApiProgramme::BespokeOffering => CliProgramme::BespokeOffering,
            ApiProgramme::Procrastination => CliProgramme::Procrastination,
            ApiProgramme::Insomnia => CliProgramme::Insomnia,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiDecayModel {
    #[serde(alias = "exponential-decay", alias = "exponentialDecay")]
    Exponential,
    #[serde(alias = "linear-decay", alias = "linearDecay")]
    Linear,
    #[serde(alias = "custom-curve", alias = "customCurve")]
    Custom,
}

impl From<ApiDecayModel> for CliDecayModel {
    fn from(value: ApiDecayModel) -> Self {
        match value {
            ApiDecayModel::Exponential => CliDecayModel::Exponential,
            ApiDecayModel::Linear => CliDecayModel::Linear,
            ApiDecayModel::Custom => CliDecayModel::Custom,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct EvaluatePayload {
    programme: Option<ApiProgramme>,

    pre_intervention_hours: Option<f64>,
    post_intervention_hours: Option<f64>,
    productivity_multiplier: Option<f64>,
    retention_rate: Option<f64>,
    participants: Option<u32>,

    decay_model: Option<ApiDecayModel>,
    annual_decay_rate: Option<f64>,
    months_to_zero: Option<f64>,
    month3_benefit: Option<f64>,
    month6_benefit: Option<f64>,
    month9_benefit: Option<f64>,
    month12_benefit: Option<f64>,

    cost_per_session: Option<f64>,
    working_weeks_per_year: Option<u32>,
    proportion_time_during_work: Option<f64>,
    homework_hours_per_session: Option<f64>,
    avg_sessions_for_dropouts: Option<f64>,
    session_duration_hours: Option<f64>,
    disappointment_hours_per_dropout: Option<f64>,
    baseline_org_yearly_clients: Option<f64>,
}

#[derive(Parser, Debug)]
#[command(
    name = "cea",
    about = "Cost-effectiveness calculator for coaching programmes (decay-adjusted productive hours bought)"
)]
struct Cli {
    #[arg(long, value_enum, default_value_t = CliProgramme::BespokeOffering)]
    programme: CliProgramme,

    #[arg(
        long,
        help = "Hours/week the median completer spends on work before the intervention; defaults to the programme preset"
    )]
    pre_intervention_hours: Option<f64>,
    #[arg(long, help = "Hours/week expected after the intervention")]
    post_intervention_hours: Option<f64>,
    #[arg(
        long,
        help = "Productivity multiplier per post-intervention hour, e.g. 1.10 = 10% more productive"
    )]
    productivity_multiplier: Option<f64>,
    #[arg(long, help = "Completion probability in percent")]
    retention_rate: Option<f64>,
    #[arg(long)]
    participants: Option<u32>,

    #[arg(
        long,
        value_enum,
        default_value_t = CliDecayModel::Exponential,
        help = "Benefit decay model: exponential, linear, or a custom spline curve"
    )]
    decay_model: CliDecayModel,
    #[arg(
        long,
        help = "Annual decay rate in percent for the exponential model; cannot be 0 or 100"
    )]
    annual_decay_rate: Option<f64>,
    #[arg(long, help = "Months until the linearly decaying effect reaches zero")]
    months_to_zero: Option<f64>,
    #[arg(long, default_value_t = 75.0, help = "Custom curve: benefit at 3 months in percent")]
    month3_benefit: f64,
    #[arg(long, default_value_t = 50.0, help = "Custom curve: benefit at 6 months in percent")]
    month6_benefit: f64,
    #[arg(long, default_value_t = 30.0, help = "Custom curve: benefit at 9 months in percent")]
    month9_benefit: f64,
    #[arg(long, default_value_t = 15.0, help = "Custom curve: benefit at 12 months in percent")]
    month12_benefit: f64,

    #[arg(long, default_value_t = presets::DEFAULT_COST_PER_SESSION)]
    cost_per_session: f64,
    #[arg(long, default_value_t = presets::DEFAULT_WORKING_WEEKS_PER_YEAR)]
    working_weeks_per_year: u32,
    #[arg(
        long,
        default_value_t = 50.0,
        help = "Share of coaching/homework time that falls inside work hours, in percent"
    )]
    proportion_time_during_work: f64,
    #[arg(long, default_value_t = presets::DEFAULT_HOMEWORK_HOURS_PER_SESSION)]
    homework_hours_per_session: f64,
    #[arg(long, default_value_t = presets::DEFAULT_AVG_SESSIONS_FOR_DROPOUTS)]
    avg_sessions_for_dropouts: f64,
    #[arg(long, default_value_t = presets::DEFAULT_SESSION_DURATION_HOURS)]
    session_duration_hours: f64,
    #[arg(long, default_value_t = presets::DEFAULT_DISAPPOINTMENT_HOURS_PER_DROPOUT)]
    disappointment_hours_per_dropout: f64,
    #[arg(long, default_value_t = presets::DEFAULT_BASELINE_ORG_YEARLY_CLIENTS)]
    baseline_org_yearly_clients: f64,
}

#[derive(Debug)]
struct ApiRequest {
    programme: ProgrammeInputs,
    globals: GlobalParams,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EvaluateResponse {
    programme: ProgrammeOutcome,
    comparison: ComparisonResult,
    timeframe_weeks: f64,
    fte_hours_per_year: f64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_globals(cli: &Cli) -> Result<GlobalParams, String> {
    if cli.cost_per_session < 0.0 {
        return Err("--cost-per-session must be >= 0".to_string());
    }
    if !(1..=52).contains(&cli.working_weeks_per_year) {
        return Err("--working-weeks-per-year must be between 1 and 52".to_string());
    }
    if !(0.0..=100.0).contains(&cli.proportion_time_during_work) {
        return Err("--proportion-time-during-work must be between 0 and 100".to_string());
    }
    if cli.homework_hours_per_session < 0.0 {
        return Err("--homework-hours-per-session must be >= 0".to_string());
    }
    if cli.avg_sessions_for_dropouts < 0.0 {
        return Err("--avg-sessions-for-dropouts must be >= 0".to_string());
    }
    if cli.session_duration_hours <= 0.0 {
        return Err("--session-duration-hours must be > 0".to_string());
    }
    if cli.disappointment_hours_per_dropout < 0.0 {
        return Err("--disappointment-hours-per-dropout must be >= 0".to_string());
    }
    if cli.baseline_org_yearly_clients < 0.0 {
        return Err("--baseline-org-yearly-clients must be >= 0".to_string());
    }

    Ok(GlobalParams {
        cost_per_session: cli.cost_per_session,
        working_weeks_per_year: cli.working_weeks_per_year,
        proportion_time_during_work: cli.proportion_time_during_work / 100.0,
        homework_hours_per_session: cli.homework_hours_per_session,
        avg_sessions_for_dropouts: cli.avg_sessions_for_dropouts,
        session_duration_hours: cli.session_duration_hours,
        sign_up_hours_per_participant: presets::DEFAULT_SIGN_UP_HOURS_PER_PARTICIPANT,
        disappointment_hours_per_dropout: cli.disappointment_hours_per_dropout,
        baseline_org_yearly_clients: cli.baseline_org_yearly_clients,
        organisation_fixed_costs: presets::ORGANISATION_FIXED_COSTS,
    })
}

fn build_programme(cli: &Cli) -> Result<ProgrammeInputs, String> {
    let mut programme = presets::default_programmes()
        .into_iter()
        .find(|p| p.name == cli.programme.preset_name())
        .ok_or_else(|| "unknown programme preset".to_string())?;

    if let Some(v) = cli.pre_intervention_hours {
        if !(0.0..=80.0).contains(&v) {
            return Err("--pre-intervention-hours must be between 0 and 80".to_string());
        }
        programme.pre_intervention_hours = v;
    }
    if let Some(v) = cli.post_intervention_hours {
        if !(0.0..=80.0).contains(&v) {
            return Err("--post-intervention-hours must be between 0 and 80".to_string());
        }
        programme.post_intervention_hours = v;
    }
    if let Some(v) = cli.productivity_multiplier {
        if !(0.0..=2.0).contains(&v) {
            return Err("--productivity-multiplier must be between 0 and 2".to_string());
        }
        programme.productivity_multiplier = v;
    }
    if let Some(v) = cli.retention_rate {
        if !(0.0..=100.0).contains(&v) {
            return Err("--retention-rate must be between 0 and 100".to_string());
        }
        programme.retention_rate = v / 100.0;
    }
    if let Some(v) = cli.participants {
        if !(10..=1_000).contains(&v) {
            return Err("--participants must be between 10 and 1000".to_string());
        }
        programme.participants = v;
    }

    programme.decay_policy = build_decay_policy(cli)?;
    programme.decay_policy.validate()?;
    Ok(programme)
}

fn build_decay_policy(cli: &Cli) -> Result<DecayPolicy, String> {
    match cli.decay_model {
        CliDecayModel::Exponential => {
            let preset_rate = match &presets::default_programmes()
                .into_iter()
                .find(|p| p.name == cli.programme.preset_name())
                .map(|p| p.decay_policy)
            {
                Some(DecayPolicy::Exponential { annual_decay_rate }) => *annual_decay_rate,
                _ => 0.25,
            };
            let rate = match cli.annual_decay_rate {
                Some(percent) => {
                    if !(0.0..=100.0).contains(&percent) {
                        return Err(
                            "--annual-decay-rate must be between 0 and 100".to_string()
                        );
                    }
                    percent / 100.0
                }
                None => preset_rate,
            };
            Ok(DecayPolicy::Exponential {
                annual_decay_rate: rate,
            })
        }
        CliDecayModel::Linear => {
            let months = cli
                .months_to_zero
                .unwrap_or_else(|| cli.programme.default_months_to_zero());
            if !(0.0..=60.0).contains(&months) {
                return Err("--months-to-zero must be between 0 and 60".to_string());
            }
            Ok(DecayPolicy::Linear {
                months_to_zero: months,
            })
        }
        CliDecayModel::Custom => {
            let mut control_points = Vec::with_capacity(4);
            for (month, percent) in [
                (3.0, cli.month3_benefit),
                (6.0, cli.month6_benefit),
                (9.0, cli.month9_benefit),
                (12.0, cli.month12_benefit),
            ] {
                if !(0.0..=100.0).contains(&percent) {
                    return Err(
                        "custom curve benefits must be between 0 and 100 percent".to_string()
                    );
                }
                control_points.push(ControlPoint {
                    month,
                    relative_benefit: percent / 100.0,
                });
            }
            Ok(DecayPolicy::Custom { control_points })
        }
    }
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/evaluate",
            get(evaluate_get_handler).post(evaluate_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    println!("CEA HTTP API listening on http://{addr}");
    println!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, app).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn evaluate_get_handler(Query(payload): Query<EvaluatePayload>) -> Response {
    evaluate_handler_impl(payload)
}

async fn evaluate_post_handler(Json(payload): Json<EvaluatePayload>) -> Response {
    evaluate_handler_impl(payload)
}

fn evaluate_handler_impl(payload: EvaluatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    match build_evaluate_response(&request) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

fn build_evaluate_response(request: &ApiRequest) -> Result<EvaluateResponse, String> {
    let selected = evaluate_programme(&request.programme, &request.globals)?;

    // The comparison table holds every offering; the selected one uses the
    // caller's slider values, the rest stay on their preset defaults.
    let mut outcomes = Vec::new();
    for preset in presets::default_programmes() {
        if preset.name == request.programme.name {
            outcomes.push(selected.clone());
        } else {
            outcomes.push(evaluate_programme(&preset, &request.globals)?);
        }
    }
    let comparison = compare_programmes(&outcomes, &request.globals);

    let horizon = HorizonConfig {
        timeframe_months: 12.0,
        working_weeks_per_year: request.globals.working_weeks_per_year,
    };

    Ok(EvaluateResponse {
        programme: selected,
        comparison,
        timeframe_weeks: horizon.timeframe_weeks(),
        fte_hours_per_year: FTE_HOURS_PER_YEAR,
    })
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<EvaluatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: EvaluatePayload) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.programme {
        cli.programme = v.into();
    }
    if let Some(v) = payload.pre_intervention_hours {
        cli.pre_intervention_hours = Some(v);
    }
    if let Some(v) = payload.post_intervention_hours {
        cli.post_intervention_hours = Some(v);
    }
    if let Some(v) = payload.productivity_multiplier {
        cli.productivity_multiplier = Some(v);
    }
    if let Some(v) = payload.retention_rate {
        cli.retention_rate = Some(v);
    }
    if let Some(v) = payload.participants {
        cli.participants = Some(v);
    }

    if let Some(v) = payload.decay_model {
        cli.decay_model = v.into();
    }
    if let Some(v) = payload.annual_decay_rate {
        cli.annual_decay_rate = Some(v);
    }
    if let Some(v) = payload.months_to_zero {
        cli.months_to_zero = Some(v);
    }
    if let Some(v) = payload.month3_benefit {
        cli.month3_benefit = v;
    }
    if let Some(v) = payload.month6_benefit {
        cli.month6_benefit = v;
    }
    if let Some(v) = payload.month9_benefit {
        cli.month9_benefit = v;
    }
    if let Some(v) = payload.month12_benefit {
        cli.month12_benefit = v;
    }

    if let Some(v) = payload.cost_per_session {
        cli.cost_per_session = v;
    }
    if let Some(v) = payload.working_weeks_per_year {
        cli.working_weeks_per_year = v;
    }
    if let Some(v) = payload.proportion_time_during_work {
        cli.proportion_time_during_work = v;
    }
    if let Some(v) = payload.homework_hours_per_session {
        cli.homework_hours_per_session = v;
    }
    if let Some(v) = payload.avg_sessions_for_dropouts {
        cli.avg_sessions_for_dropouts = v;
    }
    if let Some(v) = payload.session_duration_hours {
        cli.session_duration_hours = v;
    }
    if let Some(v) = payload.disappointment_hours_per_dropout {
        cli.disappointment_hours_per_dropout = v;
    }
    if let Some(v) = payload.baseline_org_yearly_clients {
        cli.baseline_org_yearly_clients = v;
    }

    let globals = build_globals(&cli)?;
    let programme = build_programme(&cli)?;
    Ok(ApiRequest { programme, globals })
}

fn default_cli_for_api() -> Cli {
    Cli {
        programme: CliProgramme::BespokeOffering,
        pre_intervention_hours: None,
        post_intervention_hours: None,
        productivity_multiplier: None,
        retention_rate: None,
        participants: None,
        decay_model: CliDecayModel::Exponential,
        annual_decay_rate: None,
        months_to_zero: None,
        month3_benefit: 75.0,
        month6_benefit: 50.0,
        month9_benefit: 30.0,
        month12_benefit: 15.0,
        cost_per_session: presets::DEFAULT_COST_PER_SESSION,
        working_weeks_per_year: presets::DEFAULT_WORKING_WEEKS_PER_YEAR,
        proportion_time_during_work: 50.0,
        homework_hours_per_session: presets::DEFAULT_HOMEWORK_HOURS_PER_SESSION,
        avg_sessions_for_dropouts: presets::DEFAULT_AVG_SESSIONS_FOR_DROPOUTS,
        session_duration_hours: presets::DEFAULT_SESSION_DURATION_HOURS,
        disappointment_hours_per_dropout: presets::DEFAULT_DISAPPOINTMENT_HOURS_PER_DROPOUT,
        baseline_org_yearly_clients: presets::DEFAULT_BASELINE_ORG_YEARLY_CLIENTS,
    }
}
