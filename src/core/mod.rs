mod decay;
mod engine;
pub mod presets;
mod types;

pub use decay::{cumulative_gain, weekly_benefit_curve};
pub use engine::{FTE_HOURS_PER_YEAR, compare_programmes, evaluate_programme};
pub use types::{
    ComparisonResult, ComparisonRow, ControlPoint, DecayPolicy, GlobalParams, HorizonConfig,
    ProgrammeInputs, ProgrammeOutcome,
};
