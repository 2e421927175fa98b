pub mod backward_pass;
pub mod float;
pub mod forward_pass;

pub use backward_pass::{BackwardPass, LateDates};
pub use float::FloatAnalysis;
pub use forward_pass::{EarlyDates, ForwardPass};
