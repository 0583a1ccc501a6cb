pub mod derivability;
pub mod queue;
pub mod resolution;
pub mod selection;
