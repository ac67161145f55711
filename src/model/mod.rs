// In-memory model representation

mod parameters;

pub use parameters::{Model, Parameter};
