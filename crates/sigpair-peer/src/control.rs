use sigpair_frame::Frame;

/// Initiator readiness signal.
pub const READY: &[u8] = b"ready";
/// Responder confirmation.
pub const ACK: &[u8] = b"ack";
/// Sent in place of a key, envelope or confirmation when a step fails.
pub const FAILED: &[u8] = b"failed";

/// The fixed literal frames of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    Ready,
    Ack,
    Failed,
}

impl ControlMessage {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Ready => READY,
            Self::Ack => ACK,
            Self::Failed => FAILED,
        }
    }

    /// Exact byte-and-length match against the three literals.
    pub fn classify(frame: &Frame) -> Option<Self> {
        [Self::Ready, Self::Ack, Self::Failed]
            .into_iter()
            .find(|msg| frame.is(msg.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_requires_exact_match() {
        assert_eq!(
            ControlMessage::classify(&Frame::new(&b"ready"[..])),
            Some(ControlMessage::Ready)
        );
        assert_eq!(
            ControlMessage::classify(&Frame::new(&b"ack"[..])),
            Some(ControlMessage::Ack)
        );
        assert_eq!(
            ControlMessage::classify(&Frame::new(&b"failed"[..])),
            Some(ControlMessage::Failed)
        );
        assert_eq!(ControlMessage::classify(&Frame::new(&b"ready!"[..])), None);
        assert_eq!(ControlMessage::classify(&Frame::new(&b"ac"[..])), None);
        assert_eq!(ControlMessage::classify(&Frame::new(&b""[..])), None);
    }
}
