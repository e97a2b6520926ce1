use super::types::{ControlPoint, DecayPolicy, HorizonConfig};

/// Relative benefit still in effect at each elapsed week of the horizon,
/// starting from 1.0 at week 0. Empty when the horizon is degenerate.
pub fn weekly_benefit_curve(
    policy: &DecayPolicy,
    horizon: &HorizonConfig,
) -> Result<Vec<f64>, String> {
    policy.validate()?;

    let timeframe_weeks = horizon.timeframe_weeks();
    if horizon.working_weeks_per_year == 0 || timeframe_weeks <= 0.0 {
        return Ok(Vec::new());
    }
    let week_count = timeframe_weeks.floor() as usize;

    let curve = match policy {
        DecayPolicy::Exponential { annual_decay_rate } => {
            let weekly_factor = weekly_decay_factor(
                *annual_decay_rate,
                horizon.working_weeks_per_year,
            );
            (0..week_count)
                .map(|w| weekly_factor.powf(w as f64))
                .collect()
        }
        DecayPolicy::Linear { months_to_zero } => {
            let weeks_to_zero =
                months_to_zero / 12.0 * horizon.working_weeks_per_year as f64;
            (0..week_count)
                .map(|w| (1.0 - w as f64 / weeks_to_zero).max(0.0))
                .collect()
        }
        DecayPolicy::Custom { control_points } => {
            let spline = Pchip::fit(&anchored_points(control_points));
            // The horizon is always rescaled onto the 0-12 month domain,
            // whatever the week count.
            (0..week_count)
                .map(|w| {
                    let month = w as f64 / timeframe_weeks * 12.0;
                    spline.eval(month).clamp(0.0, 1.0)
                })
                .collect()
        }
    };

    Ok(curve)
}

/// Total benefit units accrued over the horizon, given the per-week magnitude
/// at week 0 and the decay policy.
///
/// For `Custom`, pass the precomputed weekly curve; without one the gain
/// degrades to a flat 50%-of-initial estimate rather than failing.
pub fn cumulative_gain(
    initial_weekly_gain: f64,
    policy: &DecayPolicy,
    horizon: &HorizonConfig,
    custom_curve: Option<&[f64]>,
) -> Result<f64, String> {
    policy.validate()?;

    let timeframe_weeks = horizon.timeframe_weeks();
    if horizon.working_weeks_per_year == 0 || timeframe_weeks <= 0.0 {
        return Ok(0.0);
    }

    let gain = match policy {
        DecayPolicy::Exponential { annual_decay_rate } => {
            let weekly_factor = weekly_decay_factor(
                *annual_decay_rate,
                horizon.working_weeks_per_year,
            );
            if (1.0 - weekly_factor).abs() < 1e-9 {
                // Geometric denominator vanishes; the series is flat.
                initial_weekly_gain * timeframe_weeks
            } else {
                initial_weekly_gain * (1.0 - weekly_factor.powf(timeframe_weeks))
                    / (1.0 - weekly_factor)
            }
        }
        DecayPolicy::Linear { months_to_zero } => {
            let weeks_to_zero =
                months_to_zero / 12.0 * horizon.working_weeks_per_year as f64;
            // Weeks past weeks_to_zero contribute nothing and are excluded
            // from the loop rather than summed as zeros.
            let effective_weeks = timeframe_weeks.min(weeks_to_zero);
            (0..effective_weeks.floor() as usize)
                .map(|w| initial_weekly_gain * (1.0 - w as f64 / weeks_to_zero).max(0.0))
                .sum()
        }
        DecayPolicy::Custom { .. } => match custom_curve {
            Some(curve) => curve.iter().map(|v| initial_weekly_gain * v).sum(),
            None => initial_weekly_gain * timeframe_weeks * 0.5,
        },
    };

    Ok(gain)
}

fn weekly_decay_factor(annual_decay_rate: f64, working_weeks_per_year: u32) -> f64 {
    (1.0 - annual_decay_rate).powf(1.0 / working_weeks_per_year as f64)
}

fn anchored_points(control_points: &[ControlPoint]) -> Vec<ControlPoint> {
    let mut points = vec![ControlPoint {
        month: 0.0,
        relative_benefit: 1.0,
    }];
    points.extend(control_points.iter().filter(|p| p.month > 0.0).copied());
    points
}

/// Piecewise cubic Hermite interpolation with Fritsch-Carlson slopes. Keeps
/// the interpolant monotone between control points, so a decaying set of
/// points never overshoots above an earlier one.
struct Pchip {
    xs: Vec<f64>,
    ys: Vec<f64>,
    slopes: Vec<f64>,
}

impl Pchip {
    fn fit(points: &[ControlPoint]) -> Self {
        let xs: Vec<f64> = points.iter().map(|p| p.month).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.relative_benefit).collect();
        let n = xs.len();

        if n < 2 {
            return Self {
                xs,
                ys,
                slopes: vec![0.0; n],
            };
        }

        let h: Vec<f64> = (0..n - 1).map(|i| xs[i + 1] - xs[i]).collect();
        let secants: Vec<f64> = (0..n - 1).map(|i| (ys[i + 1] - ys[i]) / h[i]).collect();

        let mut slopes = vec![0.0; n];
        if n == 2 {
            slopes[0] = secants[0];
            slopes[1] = secants[0];
        } else {
            for i in 1..n - 1 {
                if secants[i - 1] * secants[i] <= 0.0 {
                    slopes[i] = 0.0;
                } else {
                    let w1 = 2.0 * h[i] + h[i - 1];
                    let w2 = h[i] + 2.0 * h[i - 1];
                    slopes[i] = (w1 + w2) / (w1 / secants[i - 1] + w2 / secants[i]);
                }
            }
            slopes[0] = endpoint_slope(h[0], h[1], secants[0], secants[1]);
            slopes[n - 1] = endpoint_slope(
                h[n - 2],
                h[n - 3],
                secants[n - 2],
                secants[n - 3],
            );
        }

        Self { xs, ys, slopes }
    }

    fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if n == 0 {
            return 0.0;
        }
        if n == 1 || x <= self.xs[0] {
            return self.ys[0];
        }
        if x >= self.xs[n - 1] {
            return self.ys[n - 1];
        }

        let mut i = 0;
        while i + 2 < n && x >= self.xs[i + 1] {
            i += 1;
        }

        let h = self.xs[i + 1] - self.xs[i];
        let t = (x - self.xs[i]) / h;
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        self.ys[i] * h00
            + h * self.slopes[i] * h10
            + self.ys[i + 1] * h01
            + h * self.slopes[i + 1] * h11
    }
}

/// One-sided three-point slope estimate with the Fritsch-Carlson
/// monotonicity clamps, matching the usual PCHIP boundary treatment.
fn endpoint_slope(h_edge: f64, h_inner: f64, secant_edge: f64, secant_inner: f64) -> f64 {
    let slope = ((2.0 * h_edge + h_inner) * secant_edge - h_edge * secant_inner)
        / (h_edge + h_inner);
    if slope * secant_edge <= 0.0 {
        0.0
    } else if secant_edge * secant_inner <= 0.0 && slope.abs() > 3.0 * secant_edge.abs() {
        3.0 * secant_edge
    } else {
        slope
    }
}
