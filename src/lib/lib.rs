pub mod arm;
pub mod bayesian;
pub mod business;
pub mod decision;
pub mod error;
pub mod experiment;
pub mod frequentist;
pub mod logging;
pub mod power;
pub mod report;
pub mod simulate;
pub mod stats;
pub mod validate;

pub use error::{AnalysisError, ConfigurationError, NumericalWarning, ValidationError};
pub use experiment::{
    AnalysisConfig, ArmObservation, BusinessParameters, DecisionPolicy, ExperimentInput,
    IntervalSource,
};
pub use report::{run_experiment_analysis, AnalysisReport};
