//! Wire format: form-encoded requests and plain-text replies.
//!
//! Each command maps to one request path with url-encoded form fields:
//!
//! | command      | path            | fields      |
//! |--------------|-----------------|-------------|
//! | key-down     | `/keydown`      | `code`      |
//! | key-up       | `/keyup`        | `code`      |
//! | key-press    | `/key`          | `code`      |
//! | mouse-move   | `/mouse/move`   | `dx`, `dy`  |
//! | mouse-click  | `/mouse/click`  | `button`    |
//! | mouse-scroll | `/mouse/scroll` | `dy`        |
//!
//! Replies are `ok`, `ok:<x>,<y>` (moves) or `error:<reason>`.

use tvremote_types::RemoteCommand;

use crate::error::ChannelError;

pub const PATH_KEY_DOWN: &str = "/keydown";
pub const PATH_KEY_UP: &str = "/keyup";
pub const PATH_KEY_PRESS: &str = "/key";
pub const PATH_MOUSE_MOVE: &str = "/mouse/move";
pub const PATH_MOUSE_CLICK: &str = "/mouse/click";
pub const PATH_MOUSE_SCROLL: &str = "/mouse/scroll";

/// A request ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRequest {
    pub path: &'static str,
    pub form: Vec<(&'static str, String)>,
}

impl WireRequest {
    /// Url-encoded form body (`dx=6&dy=3`).
    pub fn body(&self) -> String {
        self.form
            .iter()
            .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Look up a form field by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Structured acknowledgment from the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    /// Plain `ok`.
    Ok,
    /// Cursor position after a move.
    Cursor { x: i32, y: i32 },
    /// Any other non-error body (key and scroll replies are not interpreted).
    Opaque(String),
}

/// Map a command to its request.
pub fn encode_command(command: &RemoteCommand) -> WireRequest {
    match command {
        RemoteCommand::KeyDown(key) => WireRequest {
            path: PATH_KEY_DOWN,
            form: vec![("code", key.to_string())],
        },
        RemoteCommand::KeyUp(key) => WireRequest {
            path: PATH_KEY_UP,
            form: vec![("code", key.to_string())],
        },
        RemoteCommand::KeyPress(key) => WireRequest {
            path: PATH_KEY_PRESS,
            form: vec![("code", key.to_string())],
        },
        RemoteCommand::Move { dx, dy } => WireRequest {
            path: PATH_MOUSE_MOVE,
            form: vec![("dx", dx.to_string()), ("dy", dy.to_string())],
        },
        RemoteCommand::Click(button) => WireRequest {
            path: PATH_MOUSE_CLICK,
            form: vec![("button", button.code().to_string())],
        },
        RemoteCommand::Scroll { dy } => WireRequest {
            path: PATH_MOUSE_SCROLL,
            form: vec![("dy", dy.to_string())],
        },
    }
}

/// Interpret a reply body for the command that produced it.
pub fn decode_reply(command: &RemoteCommand, body: &str) -> Result<Ack, ChannelError> {
    let reply = body.trim();
    if let Some(reason) = reply.strip_prefix("error:") {
        return Err(ChannelError::Remote(reason.to_string()));
    }

    match command {
        // Moves must report the cursor; a bare `ok` is not enough.
        RemoteCommand::Move { .. } => reply
            .strip_prefix("ok:")
            .and_then(parse_cursor)
            .map(|(x, y)| Ack::Cursor { x, y })
            .ok_or_else(|| malformed(command, reply)),
        _ if reply == "ok" => Ok(Ack::Ok),
        RemoteCommand::Click(_) => Err(malformed(command, reply)),
        _ => Ok(Ack::Opaque(reply.to_string())),
    }
}

fn parse_cursor(pos: &str) -> Option<(i32, i32)> {
    let (x, y) = pos.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

fn malformed(command: &RemoteCommand, reply: &str) -> ChannelError {
    ChannelError::MalformedReply {
        command: command.to_string(),
        reply: reply.to_string(),
    }
}
