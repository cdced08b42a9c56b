//! A deterministic, autonomous pipeline that takes a fixed-priority periodic
//! task set and turns it into a verified timed-automata model: schedulability
//! analysis, priority validation, model/property synthesis and a bounded
//! repair loop around an external verifier.

pub mod analysis;
pub mod clock;
pub mod config;
pub mod errors;
pub mod input;
pub mod model;
pub mod pipeline;
pub mod synth;
pub mod validator;
pub mod verifier;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::RunConfig;
pub use errors::{AnalysisError, ExternalError, InputError, PipelineError, SpecError};

pub mod prelude {
    pub use super::analysis::prelude::*;
    pub use super::clock::{Clock, FixedClock, SystemClock};
    pub use super::config::RunConfig;
    pub use super::errors::{AnalysisError, ExternalError, InputError, PipelineError, SpecError};
    pub use super::input::prelude::*;
    pub use super::model::prelude::*;
    pub use super::pipeline::prelude::*;
    pub use super::synth::dialect::{Property, PropertyCategory, PropertyOrigin, PropertySource};
    pub use super::validator::prelude::*;
    pub use super::verifier::{Verdict, Verifier, VerifierOutcome};
}
