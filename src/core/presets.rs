use super::types::{ControlPoint, DecayPolicy, GlobalParams, ProgrammeInputs};

pub const DEFAULT_COST_PER_SESSION: f64 = 5.0;
pub const DEFAULT_WORKING_WEEKS_PER_YEAR: u32 = 46;
pub const DEFAULT_PROPORTION_TIME_DURING_WORK: f64 = 0.5;
pub const DEFAULT_HOMEWORK_HOURS_PER_SESSION: f64 = 1.0;
pub const DEFAULT_AVG_SESSIONS_FOR_DROPOUTS: f64 = 2.0;
pub const DEFAULT_SESSION_DURATION_HOURS: f64 = 1.0;
pub const DEFAULT_SIGN_UP_HOURS_PER_PARTICIPANT: f64 = 0.5;
pub const DEFAULT_DISAPPOINTMENT_HOURS_PER_DROPOUT: f64 = 40.0;
pub const DEFAULT_BASELINE_ORG_YEARLY_CLIENTS: f64 = 3_100.0;
/// Fixed R&D budget in USD, used only for the apportioned-cost table.
pub const ORGANISATION_FIXED_COSTS: f64 = 136_000.0;

/// Default control points for the custom decay curve sliders
/// (months 3/6/9/12; month 0 is always anchored at 1.0).
pub const DEFAULT_CUSTOM_POINTS: [(f64, f64); 4] =
    [(3.0, 0.75), (6.0, 0.5), (9.0, 0.3), (12.0, 0.15)];

pub fn default_globals() -> GlobalParams {
    GlobalParams {
        cost_per_session: DEFAULT_COST_PER_SESSION,
        working_weeks_per_year: DEFAULT_WORKING_WEEKS_PER_YEAR,
        proportion_time_during_work: DEFAULT_PROPORTION_TIME_DURING_WORK,
        homework_hours_per_session: DEFAULT_HOMEWORK_HOURS_PER_SESSION,
        avg_sessions_for_dropouts: DEFAULT_AVG_SESSIONS_FOR_DROPOUTS,
        session_duration_hours: DEFAULT_SESSION_DURATION_HOURS,
        sign_up_hours_per_participant: DEFAULT_SIGN_UP_HOURS_PER_PARTICIPANT,
        disappointment_hours_per_dropout: DEFAULT_DISAPPOINTMENT_HOURS_PER_DROPOUT,
        baseline_org_yearly_clients: DEFAULT_BASELINE_ORG_YEARLY_CLIENTS,
        organisation_fixed_costs: ORGANISATION_FIXED_COSTS,
    }
}

/// The three built-in coaching offerings with their slider defaults.
pub fn default_programmes() -> Vec<ProgrammeInputs> {
    vec![
        ProgrammeInputs {
            name: "Bespoke Offering".to_string(),
            pre_intervention_hours: 39.0,
            post_intervention_hours: 45.0,
            productivity_multiplier: 1.04,
            retention_rate: 0.60,
            participants: 400,
            sessions_per_participant: 6,
            decay_policy: DecayPolicy::Exponential {
                annual_decay_rate: 0.50,
            },
        },
        ProgrammeInputs {
            name: "Procrastination".to_string(),
            pre_intervention_hours: 30.0,
            post_intervention_hours: 39.0,
            productivity_multiplier: 1.01,
            retention_rate: 0.70,
            participants: 300,
            sessions_per_participant: 4,
            decay_policy: DecayPolicy::Exponential {
                annual_decay_rate: 0.80,
            },
        },
        ProgrammeInputs {
            name: "Insomnia".to_string(),
            pre_intervention_hours: 30.0,
            post_intervention_hours: 36.0,
            productivity_multiplier: 1.06,
            retention_rate: 0.70,
            participants: 150,
            sessions_per_participant: 4,
            decay_policy: DecayPolicy::Exponential {
                annual_decay_rate: 0.60,
            },
        },
    ]
}

pub fn default_custom_policy() -> DecayPolicy {
    DecayPolicy::Custom {
        control_points: DEFAULT_CUSTOM_POINTS
            .iter()
            .map(|&(month, relative_benefit)| ControlPoint {
                month,
                relative_benefit,
            })
            .collect(),
    }
}
