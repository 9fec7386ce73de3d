//! Bidirectional channel between many explorer actors and a single control actor.
//! Explorers report through a plain bounded FIFO, control answers with message pairs that
//! are delivered whole to exactly one explorer.
pub mod app;
pub mod channel;
pub mod simulation;

// Runs before tests are run
#[cfg(test)]
#[ctor::ctor]
fn init_tests() {
    let _ = app::setup_logger("warn", None);
}
