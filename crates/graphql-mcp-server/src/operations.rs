//! Turn root fields into executable operations

pub mod document;
pub mod selection;

pub use document::{Operation, build};
pub use selection::{SelectionNode, SelectionSynthesizer};
