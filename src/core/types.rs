use serde::Serialize;

/// How a programme's weekly benefit shrinks over the evaluation horizon.
#[derive(Debug, Clone, PartialEq)]
pub enum DecayPolicy {
    /// Remaining benefit shrinks by a fixed fraction each year.
    /// The rate must be strictly between 0 and 1.
    Exponential { annual_decay_rate: f64 },
    /// Benefit falls by a fixed amount each week until it hits zero.
    Linear { months_to_zero: f64 },
    /// Benefit follows a monotone spline through user-set control points.
    /// A month-0 anchor at 1.0 is always enforced on top of these.
    Custom { control_points: Vec<ControlPoint> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    pub month: f64,
    pub relative_benefit: f64,
}

impl DecayPolicy {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            DecayPolicy::Exponential { annual_decay_rate } => {
                if !annual_decay_rate.is_finite()
                    || *annual_decay_rate <= 0.0
                    || *annual_decay_rate >= 1.0
                {
                    return Err(
                        "annual decay rate must be strictly between 0 and 1; \
                         0% and 100% make the weekly factor degenerate"
                            .to_string(),
                    );
                }
            }
            DecayPolicy::Linear { months_to_zero } => {
                if !months_to_zero.is_finite() || *months_to_zero <= 0.0 {
                    return Err("months to zero must be > 0".to_string());
                }
            }
            DecayPolicy::Custom { control_points } => {
                let mut prev_month = 0.0_f64;
                for point in control_points {
                    if !(0.0..=12.0).contains(&point.month) {
                        return Err("control point months must be within [0, 12]".to_string());
                    }
                    if !(0.0..=1.0).contains(&point.relative_benefit) {
                        return Err(
                            "control point benefit values must be within [0, 1]".to_string()
                        );
                    }
                    if point.month <= prev_month && point.month != 0.0 {
                        return Err("control point months must be strictly increasing".to_string());
                    }
                    prev_month = point.month;
                }
            }
        }
        Ok(())
    }
}

/// Fixed evaluation window. The timeframe is 12 months throughout the model;
/// the week count it implies depends on how many weeks a participant works.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HorizonConfig {
    pub timeframe_months: f64,
    pub working_weeks_per_year: u32,
}

impl HorizonConfig {
    pub fn timeframe_weeks(&self) -> f64 {
        self.timeframe_months / 12.0 * self.working_weeks_per_year as f64
    }
}

/// Per-programme inputs from the dashboard sliders.
#[derive(Debug, Clone)]
pub struct ProgrammeInputs {
    pub name: String,
    pub pre_intervention_hours: f64,
    pub post_intervention_hours: f64,
    pub productivity_multiplier: f64,
    pub retention_rate: f64,
    pub participants: u32,
    pub sessions_per_participant: u32,
    pub decay_policy: DecayPolicy,
}

/// Parameters shared by every programme evaluation.
#[derive(Debug, Clone, Copy)]
pub struct GlobalParams {
    pub cost_per_session: f64,
    pub working_weeks_per_year: u32,
    pub proportion_time_during_work: f64,
    pub homework_hours_per_session: f64,
    pub avg_sessions_for_dropouts: f64,
    pub session_duration_hours: f64,
    pub sign_up_hours_per_participant: f64,
    pub disappointment_hours_per_dropout: f64,
    pub baseline_org_yearly_clients: f64,
    pub organisation_fixed_costs: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgrammeOutcome {
    pub name: String,
    pub initial_weekly_gain: f64,
    pub cumulative_gain_per_completer: f64,
    pub weekly_benefit_curve: Vec<f64>,
    pub direct_cost: f64,
    pub net_productive_hours_bought: f64,
    pub cost_per_productive_hour: Option<f64>,
    pub clients_seen: f64,
    pub clients_retained: f64,
    pub net_hours_per_retained_client: f64,
    pub cost_per_retained_client: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub name: String,
    pub direct_cost: f64,
    pub net_productive_hours_bought: f64,
    pub clients_seen: f64,
    pub clients_retained: f64,
    pub net_hours_per_retained_client: Option<f64>,
    pub cost_per_productive_hour: Option<f64>,
    pub cost_per_fte: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub rows: Vec<ComparisonRow>,
    pub totals: ComparisonRow,
    /// Same rows with a per-client share of the organisation's fixed costs
    /// folded into each programme's direct cost.
    pub fixed_cost_adjusted_rows: Vec<ComparisonRow>,
    pub fixed_cost_adjusted_totals: ComparisonRow,
    pub fixed_cost_share_per_client: f64,
}
