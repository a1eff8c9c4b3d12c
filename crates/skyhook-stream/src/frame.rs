//! Data frames and close reasons carried by a transport.

use std::fmt;

use tokio_tungstenite::tungstenite::protocol::{CloseFrame, Message};

/// An inbound or outbound data frame. Payloads are opaque to the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

impl Frame {
    #[must_use]
    pub fn text(data: impl Into<String>) -> Self {
        Self::Text(data.into())
    }

    #[must_use]
    pub fn binary(data: impl Into<Vec<u8>>) -> Self {
        Self::Binary(data.into())
    }

    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Binary(_) => None,
        }
    }

    /// Raw payload bytes regardless of frame kind.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Binary(b) => b,
        }
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Frame {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Frame {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Frame {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

impl From<Frame> for Message {
    fn from(frame: Frame) -> Self {
        match frame {
            Frame::Text(s) => Self::Text(s.into()),
            Frame::Binary(b) => Self::Binary(b.into()),
        }
    }
}

/// Why a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    /// WebSocket close code, if the peer sent a close frame.
    pub code: Option<u16>,
    pub reason: String,
}

impl CloseReason {
    #[must_use]
    pub fn new(code: Option<u16>, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// Normal closure initiated by this side.
    #[must_use]
    pub fn local() -> Self {
        Self::new(Some(1000), "closed by client")
    }

    /// Connection lost without a close handshake.
    #[must_use]
    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self::new(Some(1006), reason)
    }
}

impl From<Option<CloseFrame>> for CloseReason {
    fn from(frame: Option<CloseFrame>) -> Self {
        frame.map_or_else(
            || Self::new(Some(1005), "no status received"),
            |f| Self::new(Some(f.code.into()), f.reason.to_string()),
        )
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{code} {}", self.reason),
            None => f.write_str(&self.reason),
        }
    }
}
