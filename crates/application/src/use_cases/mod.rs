pub mod dns;

pub use dns::{HandleQueryUseCase, QueryOutcome};
