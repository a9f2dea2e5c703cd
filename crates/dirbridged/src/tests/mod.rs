//! Test suites for the bridge daemon.

mod bootstrap_behaviour;
mod support;
