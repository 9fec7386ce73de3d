use std::sync::Arc;

use super::SimulationSettings;
use crate::channel::{CancelToken, CommunicationChannel, Message};

/// Single control actor: answers every explorer report with an `(ack, echo)` pair.
pub(crate) struct Control {
    channel: Arc<CommunicationChannel>,
    settings: SimulationSettings,
    token: CancelToken,
}

impl Control {
    pub fn new(channel: Arc<CommunicationChannel>, settings: SimulationSettings) -> Self {
        Self { channel, settings, token: CancelToken::new() }
    }

    /// Returns `(reports received, pairs sent)`.
    pub fn run(&mut self) -> Result<(usize, usize), String> {
        let expected = self.settings.explorers * self.settings.reports_per_explorer;
        let mut pairs_sent = 0;
        for received in 0..expected {
            let report = self
                .channel
                .receive_from_explorers_timeout(self.settings.max_wait_time, &self.token)
                .map_err(|e| format!("Control stopped after {received} of {expected} reports: {e}"))?;
            let (ack, echo) = Self::answer(&report);
            self.channel.send_pair(ack, echo, &self.token).map_err(|e| e.to_string())?;
            pairs_sent += 1;
        }
        // Shutdown signal, never reaches the explorers
        self.channel.send_to_explorer(Message::end(), &self.token).map_err(|e| e.to_string())?;
        log::info!("Control answered {pairs_sent} reports");
        Ok((expected, pairs_sent))
    }

    fn answer(report: &Message) -> (Message, Message) {
        let (ack, echo) = (format!("ack {}", report.payload()), format!("echo {}", report.payload()));
        match report.origin() {
            Some(origin) => (Message::from_origin(origin, ack), Message::from_origin(origin, echo)),
            None => (Message::new(ack), Message::new(echo)),
        }
    }
}
