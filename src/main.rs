use explorer_channel::app::{self, AppConfig};
use explorer_channel::simulation::Simulation;

fn init() {
    AppConfig::init();
    let config = AppConfig::get();
    app::setup_logger(&config.log_level, config.log_file.as_deref()).expect("Failed to initialize logger");
}

fn main() {
    init();
    let config = AppConfig::get();

    let simulation = Simulation::new(config.channel_config(), config.simulation_settings()).unwrap_or_else(|e| {
        log::error!("Failed to create simulation: {e}");
        panic!("Failed to create simulation: {e}");
    });
    match simulation.run() {
        Ok(report) => log::info!(
            "{} explorers consumed {} pairs out of {} sent",
            report.pairs_consumed.len(),
            report.total_consumed(),
            report.pairs_sent
        ),
        Err(e) => {
            log::error!("Simulation terminated with error: {e}");
            std::process::exit(1);
        }
    }
}
