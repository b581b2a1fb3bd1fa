//! In-process stand-in for the remote backend.
//!
//! Speaks the same reply grammar as the device-side service: moves return the
//! new (clamped) cursor position, everything else returns `ok`, and an
//! offline backend answers `error:accessibility_not_enabled`.
//!
//! The most recent requests are kept for inspection (1024 by default); older
//! ones are discarded.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::info;

use crate::error::ChannelError;
use crate::remote::Transport;
use crate::wire::{
    WireRequest, PATH_KEY_DOWN, PATH_KEY_PRESS, PATH_KEY_UP, PATH_MOUSE_CLICK, PATH_MOUSE_MOVE,
    PATH_MOUSE_SCROLL,
};

const OFFLINE_REPLY: &str = "error:accessibility_not_enabled";
const DEFAULT_REQUEST_LOG: usize = 1024;

#[derive(Debug)]
struct LoopbackState {
    width: i32,
    height: i32,
    cursor: (i32, i32),
    online: bool,
    requests: VecDeque<WireRequest>,
    log_capacity: usize,
}

/// Loopback transport with a virtual cursor on a `width` x `height` screen.
#[derive(Debug)]
pub struct LoopbackTransport {
    state: Mutex<LoopbackState>,
}

impl LoopbackTransport {
    /// Create a loopback backend with the cursor centred on the screen.
    pub fn new(width: u32, height: u32) -> Self {
        let width = i32::try_from(width).unwrap_or(i32::MAX).max(1);
        let height = i32::try_from(height).unwrap_or(i32::MAX).max(1);
        Self {
            state: Mutex::new(LoopbackState {
                width,
                height,
                cursor: (width / 2, height / 2),
                online: true,
                requests: VecDeque::new(),
                log_capacity: DEFAULT_REQUEST_LOG,
            }),
        }
    }

    /// Keep at most `capacity` recent requests.
    #[must_use]
    pub fn with_request_log(self, capacity: usize) -> Self {
        {
            let mut state = self.lock();
            state.log_capacity = capacity;
            while state.requests.len() > capacity {
                state.requests.pop_front();
            }
        }
        self
    }

    /// Take the backend offline (or back online).
    pub fn set_online(&self, online: bool) {
        self.lock().online = online;
    }

    /// Current virtual cursor position.
    pub fn cursor(&self) -> (i32, i32) {
        self.lock().cursor
    }

    /// The most recent requests, in arrival order.
    pub fn requests(&self) -> Vec<WireRequest> {
        self.lock().requests.iter().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LoopbackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn post(&self, request: WireRequest) -> Result<String, ChannelError> {
        let mut state = self.lock();
        info!(path = request.path, body = %request.body(), "loopback request");
        if state.log_capacity > 0 {
            if state.requests.len() == state.log_capacity {
                state.requests.pop_front();
            }
            state.requests.push_back(request.clone());
        }

        if !state.online {
            return Ok(OFFLINE_REPLY.to_string());
        }

        match request.path {
            PATH_MOUSE_MOVE => {
                let dx = int_field(&request, "dx")?;
                let dy = int_field(&request, "dy")?;
                let x = state.cursor.0.saturating_add(dx).clamp(0, state.width - 1);
                let y = state.cursor.1.saturating_add(dy).clamp(0, state.height - 1);
                state.cursor = (x, y);
                Ok(format!("ok:{x},{y}"))
            }
            PATH_MOUSE_CLICK | PATH_MOUSE_SCROLL | PATH_KEY_DOWN | PATH_KEY_UP
            | PATH_KEY_PRESS => Ok("ok".to_string()),
            other => Err(ChannelError::Transport(format!("no handler for {other}"))),
        }
    }
}

fn int_field(request: &WireRequest, name: &str) -> Result<i32, ChannelError> {
    request
        .field(name)
        .unwrap_or("0")
        .parse()
        .map_err(|e| ChannelError::Transport(format!("bad {name} field: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::encode_command;
    use tvremote_types::{KeyId, RemoteCommand};

    #[tokio::test]
    async fn move_reports_clamped_cursor() {
        let transport = LoopbackTransport::new(100, 50);
        let reply = transport
            .post(encode_command(&RemoteCommand::Move { dx: 10, dy: -5 }))
            .await
            .unwrap();
        assert_eq!(reply, "ok:60,20");

        let reply = transport
            .post(encode_command(&RemoteCommand::Move { dx: 500, dy: -500 }))
            .await
            .unwrap();
        assert_eq!(reply, "ok:99,0");
        assert_eq!(transport.cursor(), (99, 0));
    }

    #[tokio::test]
    async fn offline_backend_replies_with_error() {
        let transport = LoopbackTransport::new(1920, 1080);
        transport.set_online(false);
        let reply = transport
            .post(encode_command(&RemoteCommand::KeyDown(KeyId::new("19"))))
            .await
            .unwrap();
        assert_eq!(reply, OFFLINE_REPLY);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn request_log_keeps_most_recent() {
        let transport = LoopbackTransport::new(1920, 1080).with_request_log(2);
        for dy in 1..=3 {
            transport
                .post(encode_command(&RemoteCommand::Scroll { dy }))
                .await
                .unwrap();
        }
        let bodies: Vec<_> = transport.requests().iter().map(WireRequest::body).collect();
        assert_eq!(bodies, vec!["dy=2", "dy=3"]);
    }

    #[tokio::test]
    async fn unknown_path_is_transport_error() {
        let transport = LoopbackTransport::new(1920, 1080);
        let request = WireRequest {
            path: "/mouse/show",
            form: Vec::new(),
        };
        assert!(matches!(
            transport.post(request).await,
            Err(ChannelError::Transport(_))
        ));
    }
}
