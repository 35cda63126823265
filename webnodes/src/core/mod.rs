//! Core types shared by every node.
//!
//! - [`InputItem`]: one record of the host's input batch
//! - [`ResultEnvelope`]: one record of the output batch, paired to its input

mod envelope;
mod item;

pub use envelope::{PairedItem, ResultEnvelope};
pub use item::InputItem;
