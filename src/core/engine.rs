use super::decay::{cumulative_gain, weekly_benefit_curve};
use super::types::{
    ComparisonResult, ComparisonRow, GlobalParams, HorizonConfig, ProgrammeInputs,
    ProgrammeOutcome,
};

/// Hours in one full-time-equivalent year (40 h/week, no holidays).
pub const FTE_HOURS_PER_YEAR: f64 = 2_080.0;

/// Evaluate one programme: decay-adjusted gain per completer, work-time and
/// dropout deductions, direct cost, and the derived cost-effectiveness ratios.
pub fn evaluate_programme(
    programme: &ProgrammeInputs,
    globals: &GlobalParams,
) -> Result<ProgrammeOutcome, String> {
    validate_programme(programme)?;
    validate_globals(globals)?;

    let horizon = HorizonConfig {
        timeframe_months: 12.0,
        working_weeks_per_year: globals.working_weeks_per_year,
    };

    // Completers who dropped out without reporting improvement are assumed to
    // have gained nothing, so the gain side only counts retained clients.
    let initial_weekly_gain = initial_weekly_gain(programme);
    let curve = weekly_benefit_curve(&programme.decay_policy, &horizon)?;
    let gain_per_completer = cumulative_gain(
        initial_weekly_gain,
        &programme.decay_policy,
        &horizon,
        Some(&curve),
    )?;

    let clients_seen = programme.participants as f64;
    let clients_retained = clients_seen * programme.retention_rate;
    let dropouts = clients_seen - clients_retained;

    let gross_hours_from_retained = gain_per_completer * clients_retained;

    let hours_per_session = globals.session_duration_hours + globals.homework_hours_per_session;
    let retained_time_during_work = clients_retained
        * programme.sessions_per_participant as f64
        * hours_per_session
        * globals.proportion_time_during_work;
    let dropout_time_during_work = dropouts
        * globals.avg_sessions_for_dropouts
        * hours_per_session
        * globals.proportion_time_during_work;
    let sign_up_time_during_work = clients_seen
        * globals.sign_up_hours_per_participant
        * globals.proportion_time_during_work;
    let dropout_disappointment_hours = dropouts * globals.disappointment_hours_per_dropout;

    let net_productive_hours_bought = gross_hours_from_retained
        - retained_time_during_work
        - dropout_time_during_work
        - sign_up_time_during_work
        - dropout_disappointment_hours;

    let direct_cost =
        programme.sessions_per_participant as f64 * globals.cost_per_session * clients_seen;

    let cost_per_productive_hour = ratio(direct_cost, net_productive_hours_bought);
    let net_hours_per_retained_client = if clients_retained > 0.0 {
        net_productive_hours_bought / clients_retained
    } else {
        0.0
    };
    let cost_per_retained_client = ratio(direct_cost, clients_retained);

    Ok(ProgrammeOutcome {
        name: programme.name.clone(),
        initial_weekly_gain,
        cumulative_gain_per_completer: gain_per_completer,
        weekly_benefit_curve: curve,
        direct_cost,
        net_productive_hours_bought,
        cost_per_productive_hour,
        clients_seen,
        clients_retained,
        net_hours_per_retained_client,
        cost_per_retained_client,
    })
}

/// Build the cross-programme comparison: per-programme rows, a totals row
/// with ratios recomputed from the sums, and the fixed-cost-adjusted variant
/// where each programme carries its client share of the organisation's fixed
/// costs.
pub fn compare_programmes(
    outcomes: &[ProgrammeOutcome],
    globals: &GlobalParams,
) -> ComparisonResult {
    let rows: Vec<ComparisonRow> = outcomes
        .iter()
        .map(|o| comparison_row(&o.name, o.direct_cost, o))
        .collect();
    let totals = totals_row(&rows);

    let total_clients_seen: f64 = outcomes.iter().map(|o| o.clients_seen).sum();
    let share_denominator = globals.baseline_org_yearly_clients + total_clients_seen;
    let fixed_cost_share_per_client = if share_denominator > 0.0 {
        globals.organisation_fixed_costs / share_denominator
    } else {
        0.0
    };

    let fixed_cost_adjusted_rows: Vec<ComparisonRow> = outcomes
        .iter()
        .map(|o| {
            let adjusted_cost = o.direct_cost + o.clients_seen * fixed_cost_share_per_client;
            comparison_row(&o.name, adjusted_cost, o)
        })
        .collect();
    let fixed_cost_adjusted_totals = totals_row(&fixed_cost_adjusted_rows);

    ComparisonResult {
        rows,
        totals,
        fixed_cost_adjusted_rows,
        fixed_cost_adjusted_totals,
        fixed_cost_share_per_client,
    }
}

fn initial_weekly_gain(programme: &ProgrammeInputs) -> f64 {
    let post_effective = programme.post_intervention_hours * programme.productivity_multiplier;
    if programme.pre_intervention_hours == 0.0 {
        post_effective
    } else {
        post_effective - programme.pre_intervention_hours
    }
}

fn comparison_row(name: &str, direct_cost: f64, outcome: &ProgrammeOutcome) -> ComparisonRow {
    ComparisonRow {
        name: name.to_string(),
        direct_cost,
        net_productive_hours_bought: outcome.net_productive_hours_bought,
        clients_seen: outcome.clients_seen,
        clients_retained: outcome.clients_retained,
        net_hours_per_retained_client: ratio(
            outcome.net_productive_hours_bought,
            outcome.clients_retained,
        ),
        cost_per_productive_hour: ratio(direct_cost, outcome.net_productive_hours_bought),
        cost_per_fte: ratio(
            direct_cost,
            outcome.net_productive_hours_bought / FTE_HOURS_PER_YEAR,
        ),
    }
}

fn totals_row(rows: &[ComparisonRow]) -> ComparisonRow {
    let direct_cost: f64 = rows.iter().map(|r| r.direct_cost).sum();
    let net_hours: f64 = rows.iter().map(|r| r.net_productive_hours_bought).sum();
    let clients_seen: f64 = rows.iter().map(|r| r.clients_seen).sum();
    let clients_retained: f64 = rows.iter().map(|r| r.clients_retained).sum();

    ComparisonRow {
        name: "Total/Overall Average".to_string(),
        direct_cost,
        net_productive_hours_bought: net_hours,
        clients_seen,
        clients_retained,
        net_hours_per_retained_client: ratio(net_hours, clients_retained),
        cost_per_productive_hour: ratio(direct_cost, net_hours),
        cost_per_fte: ratio(direct_cost, net_hours / FTE_HOURS_PER_YEAR),
    }
}

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator != 0.0 && denominator.is_finite() {
        Some(numerator / denominator)
    } else {
        None
    }
}

fn validate_programme(programme: &ProgrammeInputs) -> Result<(), String> {
    if !(0.0..=1.0).contains(&programme.retention_rate) {
        return Err("retention rate must be between 0 and 1".to_string());
    }
    if programme.pre_intervention_hours < 0.0 || programme.post_intervention_hours < 0.0 {
        return Err("intervention hours must be >= 0".to_string());
    }
    if !programme.productivity_multiplier.is_finite() || programme.productivity_multiplier < 0.0 {
        return Err("productivity multiplier must be >= 0".to_string());
    }
    programme.decay_policy.validate()
}

fn validate_globals(globals: &GlobalParams) -> Result<(), String> {
    if globals.cost_per_session < 0.0 {
        return Err("cost per session must be >= 0".to_string());
    }
    if !(0.0..=1.0).contains(&globals.proportion_time_during_work) {
        return Err("proportion of time during work must be between 0 and 1".to_string());
    }
    if globals.homework_hours_per_session < 0.0
        || globals.avg_sessions_for_dropouts < 0.0
        || globals.sign_up_hours_per_participant < 0.0
        || globals.disappointment_hours_per_dropout < 0.0
    {
        return Err("time parameters must be >= 0".to_string());
    }
    if globals.session_duration_hours <= 0.0 {
        return Err("session duration must be > 0".to_string());
    }
    if globals.baseline_org_yearly_clients < 0.0 {
        return Err("baseline organisation clients must be >= 0".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::presets;
    use crate::core::types::DecayPolicy;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn zero_overhead_globals() -> GlobalParams {
        GlobalParams {
            cost_per_session: 5.0,
            working_weeks_per_year: 48,
            proportion_time_during_work: 0.0,
            homework_hours_per_session: 0.0,
            avg_sessions_for_dropouts: 0.0,
            session_duration_hours: 1.0,
            sign_up_hours_per_participant: 0.0,
            disappointment_hours_per_dropout: 0.0,
            baseline_org_yearly_clients: 0.0,
            organisation_fixed_costs: 0.0,
        }
    }

    fn linear_programme() -> ProgrammeInputs {
        ProgrammeInputs {
            name: "Linear test".to_string(),
            pre_intervention_hours: 30.0,
            post_intervention_hours: 32.0,
            productivity_multiplier: 1.0,
            retention_rate: 1.0,
            participants: 10,
            sessions_per_participant: 4,
            decay_policy: DecayPolicy::Linear {
                months_to_zero: 6.0,
            },
        }
    }

    #[test]
    fn programme_outcome_matches_hand_computed_oracle() {
        // Weekly gain 2 h, linear decay to zero at 24 weeks, 10 fully
        // retained clients, and no time overheads: 25 h per completer.
        let outcome =
            evaluate_programme(&linear_programme(), &zero_overhead_globals()).expect("valid");

        assert_approx(outcome.initial_weekly_gain, 2.0);
        assert_approx(outcome.cumulative_gain_per_completer, 25.0);
        assert_approx(outcome.net_productive_hours_bought, 250.0);
        assert_approx(outcome.direct_cost, 4.0 * 5.0 * 10.0);
        assert_approx(outcome.clients_retained, 10.0);
        assert_approx(outcome.cost_per_productive_hour.expect("non-zero hours"), 0.8);
        assert_approx(outcome.net_hours_per_retained_client, 25.0);
    }

    #[test]
    fn time_overheads_and_dropouts_reduce_net_hours() {
        let mut globals = zero_overhead_globals();
        globals.proportion_time_during_work = 0.5;
        globals.homework_hours_per_session = 1.0;
        globals.avg_sessions_for_dropouts = 2.0;
        globals.sign_up_hours_per_participant = 0.5;
        globals.disappointment_hours_per_dropout = 40.0;

        let mut programme = linear_programme();
        programme.retention_rate = 0.6;

        let outcome = evaluate_programme(&programme, &globals).expect("valid");

        // 6 retained * 25 h gross, minus retained session time (6*4*2*0.5),
        // dropout session time (4*2*2*0.5), sign-up (10*0.5*0.5), and
        // disappointment (4*40).
        let expected = 6.0 * 25.0 - 24.0 - 8.0 - 2.5 - 160.0;
        assert_approx(outcome.net_productive_hours_bought, expected);
        assert_approx(outcome.clients_retained, 6.0);
    }

    #[test]
    fn zero_pre_hours_uses_post_hours_as_the_full_gain() {
        let mut programme = linear_programme();
        programme.pre_intervention_hours = 0.0;
        programme.post_intervention_hours = 10.0;
        programme.productivity_multiplier = 1.1;

        let outcome =
            evaluate_programme(&programme, &zero_overhead_globals()).expect("valid");
        assert_approx(outcome.initial_weekly_gain, 11.0);
    }

    #[test]
    fn zero_net_hours_yields_no_cost_ratio_instead_of_nan() {
        let mut programme = linear_programme();
        // No improvement at all: gain is zero and so are all overheads.
        programme.post_intervention_hours = programme.pre_intervention_hours;

        let outcome =
            evaluate_programme(&programme, &zero_overhead_globals()).expect("valid");
        assert_approx(outcome.net_productive_hours_bought, 0.0);
        assert!(outcome.cost_per_productive_hour.is_none());
    }

    #[test]
    fn degenerate_working_weeks_produce_zero_gain() {
        let mut globals = zero_overhead_globals();
        globals.working_weeks_per_year = 0;

        let degenerate = evaluate_programme(&linear_programme(), &globals).expect("valid");
        assert_approx(degenerate.cumulative_gain_per_completer, 0.0);
        assert!(degenerate.weekly_benefit_curve.is_empty());
    }

    #[test]
    fn boundary_decay_rate_is_rejected_not_clamped() {
        let mut programme = linear_programme();
        programme.decay_policy = DecayPolicy::Exponential {
            annual_decay_rate: 1.0,
        };
        evaluate_programme(&programme, &zero_overhead_globals())
            .expect_err("boundary rate must surface as an error");
    }

    #[test]
    fn comparison_totals_recompute_ratios_from_sums() {
        let globals = zero_overhead_globals();
        let mut second = linear_programme();
        second.name = "Second".to_string();
        second.participants = 20;

        let outcomes = vec![
            evaluate_programme(&linear_programme(), &globals).expect("valid"),
            evaluate_programme(&second, &globals).expect("valid"),
        ];
        let comparison = compare_programmes(&outcomes, &globals);

        assert_eq!(comparison.rows.len(), 2);
        assert_approx(comparison.totals.direct_cost, 200.0 + 400.0);
        assert_approx(comparison.totals.net_productive_hours_bought, 250.0 + 500.0);
        assert_approx(
            comparison.totals.cost_per_productive_hour.expect("hours"),
            600.0 / 750.0,
        );
        assert_approx(
            comparison.totals.cost_per_fte.expect("hours"),
            600.0 / (750.0 / FTE_HOURS_PER_YEAR),
        );
    }

    #[test]
    fn fixed_cost_share_is_apportioned_by_clients_seen() {
        let mut globals = zero_overhead_globals();
        globals.organisation_fixed_costs = 136_000.0;
        globals.baseline_org_yearly_clients = 3_100.0;

        let outcomes =
            vec![evaluate_programme(&linear_programme(), &globals).expect("valid")];
        let comparison = compare_programmes(&outcomes, &globals);

        let share = 136_000.0 / (3_100.0 + 10.0);
        assert_approx(comparison.fixed_cost_share_per_client, share);
        assert_approx(
            comparison.fixed_cost_adjusted_rows[0].direct_cost,
            200.0 + 10.0 * share,
        );
        // The unadjusted table is left untouched.
        assert_approx(comparison.rows[0].direct_cost, 200.0);
    }

    #[test]
    fn presets_evaluate_cleanly_with_default_globals() {
        let globals = presets::default_globals();
        for programme in presets::default_programmes() {
            let outcome = evaluate_programme(&programme, &globals).expect("preset must be valid");
            assert!(outcome.cumulative_gain_per_completer.is_finite());
            assert_eq!(
                outcome.weekly_benefit_curve.len(),
                globals.working_weeks_per_year as usize
            );
        }
    }

    #[test]
    fn default_custom_policy_evaluates_cleanly() {
        let globals = presets::default_globals();
        let mut programme = presets::default_programmes().remove(0);
        programme.decay_policy = presets::default_custom_policy();

        let outcome = evaluate_programme(&programme, &globals).expect("valid");
        assert!(outcome.cumulative_gain_per_completer > 0.0);
        assert_approx(outcome.weekly_benefit_curve[0], 1.0);
    }

    proptest! {
        #[test]
        fn prop_outcomes_are_finite_for_valid_slider_ranges(
            pre_hours in 0u32..=80,
            post_hours in 0u32..=80,
            multiplier_pct in 0u32..=200,
            retention_pct in 0u32..=100,
            participants in 10u32..=1_000,
            decay_rate_bp in 10u32..9_990,
            working_weeks in 1u32..=52,
        ) {
            let programme = ProgrammeInputs {
                name: "prop".to_string(),
                pre_intervention_hours: pre_hours as f64,
                post_intervention_hours: post_hours as f64,
                productivity_multiplier: multiplier_pct as f64 / 100.0,
                retention_rate: retention_pct as f64 / 100.0,
                participants,
                sessions_per_participant: 6,
                decay_policy: DecayPolicy::Exponential {
                    annual_decay_rate: decay_rate_bp as f64 / 10_000.0,
                },
            };
            let mut globals = presets::default_globals();
            globals.working_weeks_per_year = working_weeks;

            let outcome = evaluate_programme(&programme, &globals).expect("valid inputs");
            prop_assert!(outcome.net_productive_hours_bought.is_finite());
            prop_assert!(outcome.direct_cost >= 0.0);
            prop_assert!(outcome.clients_retained <= outcome.clients_seen);
            for value in &outcome.weekly_benefit_curve {
                prop_assert!((0.0..=1.0).contains(value));
            }
        }
    }
}
