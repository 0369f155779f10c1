//! Command handlers for the `battery-arb` binary

pub(crate) mod data;
pub(crate) mod evaluate;
pub(crate) mod settings;
pub(crate) mod train;
