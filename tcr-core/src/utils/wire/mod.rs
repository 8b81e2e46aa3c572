//! Drive frame codec for the control link.
//!
//! A frame is six base-10 integers joined by commas, no terminator:
//!
//! ```text
//! timestamp,leftForward,leftBackward,rightForward,rightBackward,light
//! ```
//!
//! The receiver ignores the timestamp, writes the four motor magnitudes to
//! the H-bridge pairs and the light value to the headlight. Individual bad
//! tokens degrade to 0 rather than failing the frame; only empty or
//! oversized input is rejected outright, and rejected input must leave the
//! actuators exactly as they were.

use alloc::format;
use alloc::string::String;

use crate::utils::math::steering::MotorMix;

/// Upper bound on an accepted wire frame, in bytes.
pub const MAX_FRAME_LEN: usize = 1024;

/// Failures on the control link.
///
/// Every variant resolves to the same first step, stop the vehicle; the
/// transport variants additionally ask the controller side to reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    /// Empty or undecodable input.
    Malformed,
    /// Input longer than [`MAX_FRAME_LEN`].
    Oversized,
    /// The transport closed underneath the link.
    TransportClosed,
    /// The transport reported a protocol or I/O fault.
    TransportError,
}

impl ControlError {
    /// Whether the controller side should schedule a reconnect for this
    /// error.
    pub fn needs_reconnect(&self) -> bool {
        matches!(self, ControlError::TransportClosed | ControlError::TransportError)
    }
}

/// One control frame, decoded from or headed for the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DriveFrame {
    /// Sender clock in milliseconds. Carried but never validated.
    pub timestamp: u64,
    pub left_forward: u16,
    pub left_backward: u16,
    pub right_forward: u16,
    pub right_backward: u16,
    pub light: u16,
}

impl DriveFrame {
    /// Frame a motor mix and a light byte at the given clock.
    pub fn from_mix(
        timestamp: u64,
        mix: &MotorMix,
        light: u8,
    ) -> Self {
        DriveFrame {
            timestamp,
            left_forward: mix.left_forward as u16,
            left_backward: mix.left_backward as u16,
            right_forward: mix.right_forward as u16,
            right_backward: mix.right_backward as u16,
            light: light as u16,
        }
    }

    /// Render the frame into its wire form.
    pub fn encode(&self) -> String {
        format!(
            "{},{},{},{},{},{}",
            self.timestamp,
            self.left_forward,
            self.left_backward,
            self.right_forward,
            self.right_backward,
            self.light,
        )
    }

    /// Parse a wire frame.
    ///
    /// Empty input is [`ControlError::Malformed`] and anything past
    /// [`MAX_FRAME_LEN`] is [`ControlError::Oversized`]. Everything else
    /// yields a frame: missing, empty, or non-numeric tokens come back as 0,
    /// and the returned flag is false when any token degraded that way.
    /// Tokens past the sixth are ignored.
    pub fn decode(raw: &str) -> Result<(Self, bool), ControlError> {
        if raw.is_empty() {
            return Err(ControlError::Malformed);
        }
        if raw.len() > MAX_FRAME_LEN {
            return Err(ControlError::Oversized);
        }

        let mut tokens = raw.split(',');
        let (timestamp, ts_ok) = parse_field::<u64>(tokens.next());
        let (left_forward, lf_ok) = parse_field::<u16>(tokens.next());
        let (left_backward, lb_ok) = parse_field::<u16>(tokens.next());
        let (right_forward, rf_ok) = parse_field::<u16>(tokens.next());
        let (right_backward, rb_ok) = parse_field::<u16>(tokens.next());
        let (light, li_ok) = parse_field::<u16>(tokens.next());

        let frame = DriveFrame {
            timestamp,
            left_forward,
            left_backward,
            right_forward,
            right_backward,
            light,
        };
        Ok((frame, ts_ok && lf_ok && lb_ok && rf_ok && rb_ok && li_ok))
    }
}

/// Best-effort integer parse for one token.
///
/// A missing, empty, or non-numeric token, or one that does not fit the
/// field's type, degrades to 0 with the flag lowered.
fn parse_field<T>(token: Option<&str>) -> (T, bool)
where
    T: core::str::FromStr + Default,
{
    match token.map(str::trim).and_then(|t| t.parse::<T>().ok()) {
        Some(value) => (value, true),
        None => (T::default(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_joins_six_fields() {
        let frame = DriveFrame {
            timestamp: 1000,
            left_forward: 200,
            left_backward: 0,
            right_forward: 0,
            right_backward: 150,
            light: 128,
        };
        assert_eq!(frame.encode(), "1000,200,0,0,150,128");
    }

    #[test]
    fn test_decode_reads_a_clean_frame() {
        let (frame, clean) = DriveFrame::decode("1000,200,0,0,150,128").unwrap();
        assert!(clean);
        assert_eq!(frame.timestamp, 1000);
        assert_eq!(frame.left_forward, 200);
        assert_eq!(frame.left_backward, 0);
        assert_eq!(frame.right_forward, 0);
        assert_eq!(frame.right_backward, 150);
        assert_eq!(frame.light, 128);
    }

    #[test]
    fn test_decode_rejects_empty_input() {
        assert_eq!(DriveFrame::decode(""), Err(ControlError::Malformed));
    }

    #[test]
    fn test_decode_rejects_oversized_input() {
        let raw = "9".repeat(MAX_FRAME_LEN + 1);
        assert_eq!(DriveFrame::decode(&raw), Err(ControlError::Oversized));
        let raw = "9".repeat(MAX_FRAME_LEN);
        assert!(DriveFrame::decode(&raw).is_ok());
    }

    #[test]
    fn test_delimiters_only_is_an_all_zero_frame() {
        let (frame, clean) = DriveFrame::decode(",,,,,").unwrap();
        assert!(!clean);
        assert_eq!(frame, DriveFrame::default());
    }

    #[test]
    fn test_bad_tokens_degrade_without_poisoning_good_ones() {
        let (frame, clean) = DriveFrame::decode("abc,12,x,,300,9").unwrap();
        assert!(!clean);
        assert_eq!(frame.timestamp, 0);
        assert_eq!(frame.left_forward, 12);
        assert_eq!(frame.left_backward, 0);
        assert_eq!(frame.right_forward, 0);
        assert_eq!(frame.right_backward, 300);
        assert_eq!(frame.light, 9);
    }

    #[test]
    fn test_values_above_the_pwm_range_pass_through() {
        let (frame, clean) = DriveFrame::decode("1,999,0,0,0,400").unwrap();
        assert!(clean);
        assert_eq!(frame.left_forward, 999);
        assert_eq!(frame.light, 400);
    }

    #[test]
    fn test_missing_tail_fields_read_as_zero() {
        let (frame, clean) = DriveFrame::decode("5,140").unwrap();
        assert!(!clean);
        assert_eq!(frame.timestamp, 5);
        assert_eq!(frame.left_forward, 140);
        assert_eq!(frame.light, 0);
    }

    #[test]
    fn test_extra_tokens_are_ignored() {
        let (frame, clean) = DriveFrame::decode("1,2,3,4,5,6,garbage,99").unwrap();
        assert!(clean);
        assert_eq!(frame.light, 6);
    }

    #[test]
    fn test_round_trip_preserves_every_field() {
        let frame = DriveFrame {
            timestamp: 123456789,
            left_forward: 255,
            left_backward: 0,
            right_forward: 141,
            right_backward: 0,
            light: 255,
        };
        let encoded = frame.encode();
        let (decoded, clean) = DriveFrame::decode(&encoded).unwrap();
        assert!(clean);
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_transport_errors_want_a_reconnect() {
        assert!(ControlError::TransportClosed.needs_reconnect());
        assert!(ControlError::TransportError.needs_reconnect());
        assert!(!ControlError::Malformed.needs_reconnect());
        assert!(!ControlError::Oversized.needs_reconnect());
    }
}
