pub mod ranges;
pub mod sat;
