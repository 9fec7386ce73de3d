//! Demo wiring: a control actor and a crew of explorers talking through one channel.
//! The explorers report to control, control answers every report with an `(ack, echo)` pair.

mod control;
mod explorer;

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::channel::{CancelToken, ChannelConfig, CommunicationChannel, ID};

pub(crate) use control::Control;
pub(crate) use explorer::Explorer;

#[derive(Debug, Clone)]
pub struct SimulationSettings {
    pub explorers: usize,
    pub reports_per_explorer: usize,
    /// Longest time an actor waits for the next message before giving up.
    pub max_wait_time: Duration,
}

/// Final counters of a run.
#[derive(Debug, Default)]
pub struct SimulationReport {
    pub reports_received: usize,
    pub pairs_sent: usize,
    pub pairs_consumed: HashMap<ID, usize>,
}

impl SimulationReport {
    pub fn total_consumed(&self) -> usize { self.pairs_consumed.values().sum() }
}

pub struct Simulation {
    channel: Arc<CommunicationChannel>,
    settings: SimulationSettings,
}

impl Simulation {
    pub fn new(config: ChannelConfig, settings: SimulationSettings) -> Result<Self, String> {
        let channel = CommunicationChannel::new(config).map_err(|e| e.to_string())?;
        Ok(Self { channel: Arc::new(channel), settings })
    }

    pub fn run(&self) -> Result<SimulationReport, String> {
        let stop = CancelToken::new();
        let handles = (0..self.settings.explorers)
            .map(|n| -> Result<_, String> {
                let id = ID::try_from(n + 1).map_err(|e| e.to_string())?;
                let mut explorer =
                    Explorer::new(id, Arc::clone(&self.channel), stop.clone(), self.settings.reports_per_explorer);
                Ok((id, thread::spawn(move || explorer.run())))
            })
            .collect::<Result<Vec<_>, String>>()?;

        let mut control = Control::new(Arc::clone(&self.channel), self.settings.clone());
        let control_result = control.run();
        if control_result.is_ok() {
            self.wait_drained();
        }
        stop.cancel();

        let mut report = SimulationReport::default();
        for (id, handle) in handles {
            let consumed = handle
                .join()
                .map_err(|e| format!("Explorer {id} panicked: {e:?}"))?
                .map_err(|e| format!("Explorer {id} terminated with error: {e}"))?;
            report.pairs_consumed.insert(id, consumed);
        }

        let (received, sent) = control_result?;
        report.reports_received = received;
        report.pairs_sent = sent;
        if report.total_consumed() != report.pairs_sent {
            return Err(format!(
                "Control sent {} pairs but explorers consumed {}",
                report.pairs_sent,
                report.total_consumed()
            ));
        }
        log::info!(
            "Simulation done: {} reports, {} pairs, per explorer {:?}",
            report.reports_received,
            report.pairs_sent,
            report.pairs_consumed
        );
        Ok(report)
    }

    /// Waits until every pair has been fully taken by some explorer.
    fn wait_drained(&self) {
        let deadline = Instant::now() + self.settings.max_wait_time;
        while self.channel.pending_to_explorers() > 0 || !self.channel.reader_gate_free() {
            if Instant::now() >= deadline {
                log::warn!("Explorers left {} messages unread", self.channel.pending_to_explorers());
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(explorers: usize, reports: usize) -> SimulationSettings {
        SimulationSettings { explorers, reports_per_explorer: reports, max_wait_time: Duration::from_secs(10) }
    }

    #[test]
    fn every_report_gets_a_pair() {
        let simulation = Simulation::new(ChannelConfig::default(), settings(6, 200)).unwrap();
        let report = simulation.run().unwrap();
        assert_eq!(report.reports_received, 1_200);
        assert_eq!(report.pairs_sent, 1_200);
        assert_eq!(report.total_consumed(), 1_200);
        assert_eq!(report.pairs_consumed.len(), 6);
    }

    #[test]
    fn small_queues_apply_back_pressure() {
        let config = ChannelConfig { capacity: 3, ..ChannelConfig::default() };
        let report = Simulation::new(config, settings(4, 50)).unwrap().run().unwrap();
        assert_eq!(report.total_consumed(), 200);
    }

    #[test]
    fn no_explorers_is_an_empty_run() {
        let report = Simulation::new(ChannelConfig::default(), settings(0, 10)).unwrap().run().unwrap();
        assert_eq!(report.pairs_sent, 0);
        assert!(report.pairs_consumed.is_empty());
    }

    #[test]
    fn zero_capacity_config_fails() {
        let config = ChannelConfig { capacity: 0, ..ChannelConfig::default() };
        assert!(Simulation::new(config, settings(1, 1)).is_err());
    }
}
