mod facilitator;

pub use facilitator::*;
