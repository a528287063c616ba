pub mod step;
pub mod trace;

pub use step::Step;
pub use trace::TraceDocument;
