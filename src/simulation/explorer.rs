use std::sync::Arc;

use crate::channel::{CancelToken, ChannelError, CommunicationChannel, Message, ID};

/// Sends its reports one by one, consuming one answer pair after each of them.
/// The pair it gets may answer another explorer's report, only its integrity is checked.
pub(crate) struct Explorer {
    id: ID,
    channel: Arc<CommunicationChannel>,
    stop: CancelToken,
    reports: usize,
}

impl Explorer {
    pub fn new(id: ID, channel: Arc<CommunicationChannel>, stop: CancelToken, reports: usize) -> Self {
        Self { id, channel, stop, reports }
    }

    /// Returns the number of pairs consumed.
    pub fn run(&mut self) -> Result<usize, String> {
        let mut consumed = 0;
        for n in 0..self.reports {
            let report = Message::from_origin(self.id, format!("report {n} signal {:.3}", rand::random::<f32>()));
            match self.channel.send_to_control(report, &self.stop) {
                Ok(()) => {}
                Err(ChannelError::Cancelled) => break,
                Err(e) => return Err(e.to_string()),
            }
            match self.channel.receive_pair(&self.stop) {
                Ok((first, second)) => {
                    Self::check_pair(&first, &second)?;
                    consumed += 1;
                }
                Err(ChannelError::Cancelled) => break,
                Err(e) => return Err(e.to_string()),
            }
        }
        log::debug!("Explorer {} consumed {consumed} pairs", self.id);
        Ok(consumed)
    }

    fn check_pair(first: &Message, second: &Message) -> Result<(), String> {
        let ack = first.payload().strip_prefix("ack ");
        let echo = second.payload().strip_prefix("echo ");
        if first.origin() != second.origin() || ack.is_none() || ack != echo {
            return Err(format!("Received a split pair: ({first}, {second})"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_pairs_are_detected() {
        let ack = Message::from_origin(1, "ack report 0");
        assert!(Explorer::check_pair(&ack, &Message::from_origin(1, "echo report 0")).is_ok());
        assert!(Explorer::check_pair(&ack, &Message::from_origin(1, "echo report 1")).is_err());
        assert!(Explorer::check_pair(&ack, &Message::from_origin(2, "echo report 0")).is_err());
        assert!(Explorer::check_pair(&Message::new("x"), &Message::new("x")).is_err());
    }

    #[test]
    fn stops_when_cancelled() {
        let channel = Arc::new(CommunicationChannel::with_capacity(4).unwrap());
        let stop = CancelToken::new();
        let mut explorer = Explorer::new(1, Arc::clone(&channel), stop.clone(), 10);
        let handle = std::thread::spawn(move || explorer.run());
        std::thread::sleep(std::time::Duration::from_millis(50));
        stop.cancel();
        assert_eq!(handle.join().unwrap(), Ok(0));
        assert_eq!(channel.pending_to_control(), 1);
    }
}
