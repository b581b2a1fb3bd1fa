//! Link status derived from delivery outcomes.

use crate::error::ChannelError;
use crate::wire::Ack;

/// Reachability of the remote backend as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// No reply observed yet.
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

impl std::fmt::Display for Connectivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "Unknown"),
            Self::Connected => write!(f, "Connected"),
            Self::Disconnected => write!(f, "Disconnected"),
        }
    }
}

/// Snapshot of what the channel has learned from replies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkStatus {
    pub connectivity: Connectivity,
    /// Remote cursor position from the most recent move reply.
    pub cursor: Option<(i32, i32)>,
    /// Total failed deliveries.
    pub failures: u64,
}

impl LinkStatus {
    /// Fold one delivery outcome into the status.
    pub fn record(&mut self, outcome: &Result<Ack, ChannelError>) {
        match outcome {
            Ok(ack) => {
                self.connectivity = Connectivity::Connected;
                if let Ack::Cursor { x, y } = ack {
                    self.cursor = Some((*x, *y));
                }
            }
            Err(_) => {
                self.connectivity = Connectivity::Disconnected;
                self.failures += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_marks_connected_and_tracks_cursor() {
        let mut status = LinkStatus::default();
        status.record(&Ok(Ack::Cursor { x: 10, y: 20 }));
        assert_eq!(status.connectivity, Connectivity::Connected);
        assert_eq!(status.cursor, Some((10, 20)));

        status.record(&Ok(Ack::Ok));
        assert_eq!(status.cursor, Some((10, 20)));
    }

    #[test]
    fn failure_marks_disconnected() {
        let mut status = LinkStatus::default();
        status.record(&Ok(Ack::Ok));
        status.record(&Err(ChannelError::Remote("offline".to_string())));
        assert_eq!(status.connectivity, Connectivity::Disconnected);
        assert_eq!(status.failures, 1);
    }
}
