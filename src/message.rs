//! The `InsteonMessage` value type (spec §3/§4.D) and its flag byte.

use bitflags::bitflags;

use crate::error::Error;
use crate::identity::Identity;

bitflags! {
    /// Flag bits living in the upper nibble of the flags byte. The lower
    /// nibble carries `max_hops`/`hops_left`, handled separately.
    pub struct MessageFlags: u8 {
        const EXTENDED  = 1 << 4;
        const ACK       = 1 << 5;
        const ALL_LINK  = 1 << 6;
        const BROADCAST = 1 << 7;
        const NONE      = 0;
    }
}

impl Default for MessageFlags {
    fn default() -> Self {
        MessageFlags::NONE
    }
}

/// Encodes `(hops_left, max_hops, flags)` into a single wire byte:
/// `MMHH_FFFF` where `MM` is `max_hops`, `HH` is `hops_left`, and the upper
/// nibble is `flags`.
pub fn encode_flags_byte(hops_left: u8, max_hops: u8, flags: MessageFlags) -> u8 {
    debug_assert!(hops_left <= 3);
    debug_assert!(max_hops <= 3);
    flags.bits() | ((hops_left & 0b11) << 2) | (max_hops & 0b11)
}

/// Decodes a wire flags byte into `(hops_left, max_hops, flags)`.
pub fn decode_flags_byte(byte: u8) -> (u8, u8, MessageFlags) {
    let max_hops = byte & 0b11;
    let hops_left = (byte >> 2) & 0b11;
    let flags = MessageFlags::from_bits_truncate(byte & 0xf0);
    (hops_left, max_hops, flags)
}

/// A structured standard or extended Insteon message.
///
/// Invariant: `flags.contains(EXTENDED) <=> user_data.is_some()`.
#[derive(Clone, Debug, PartialEq)]
pub struct InsteonMessage {
    pub sender: Identity,
    pub target: Identity,
    pub hops_left: u8,
    pub max_hops: u8,
    pub flags: MessageFlags,
    pub command_bytes: [u8; 2],
    pub user_data: Option<[u8; 14]>,
}

impl InsteonMessage {
    /// Builds a standard (non-extended) message.
    pub fn standard(target: Identity, command_bytes: [u8; 2]) -> Self {
        InsteonMessage {
            sender: Identity::default(),
            target,
            hops_left: 3,
            max_hops: 3,
            flags: MessageFlags::NONE,
            command_bytes,
            user_data: None,
        }
    }

    /// Builds an extended message, computing and installing the trailing
    /// checksum byte of `user_data` (spec §3: `((0xFF XOR sum) + 1) & 0xFF`
    /// over the command bytes plus the first 13 payload bytes).
    pub fn extended(target: Identity, command_bytes: [u8; 2], mut user_data: [u8; 14]) -> Self {
        user_data[13] = checksum(command_bytes, &user_data[..13]);
        InsteonMessage {
            sender: Identity::default(),
            target,
            hops_left: 3,
            max_hops: 3,
            flags: MessageFlags::EXTENDED,
            command_bytes,
            user_data: Some(user_data),
        }
    }

    pub fn is_extended(&self) -> bool {
        self.flags.contains(MessageFlags::EXTENDED)
    }

    /// Validates the extended/user_data length invariant.
    pub fn validate(&self) -> Result<(), Error> {
        match (self.is_extended(), &self.user_data) {
            (true, Some(_)) | (false, None) => Ok(()),
            (true, None) => Err(Error::ProtocolViolation(
                "extended flag set but user_data is absent",
            )),
            (false, Some(_)) => Err(Error::ProtocolViolation(
                "user_data present on a non-extended message",
            )),
        }
    }

    /// Returns true if `self` is itself an acknowledgment of `request`,
    /// i.e. it was sent by the request's target back to us and carries the
    /// ACK flag.
    pub fn is_ack_of(&self, request: &InsteonMessage) -> bool {
        self.sender == request.target && self.flags.contains(MessageFlags::ACK)
    }
}

/// Computes the extended-message checksum over `command_bytes` followed by
/// `payload` (the first 13 user-data bytes): `((0xFF XOR sum) + 1) & 0xFF`.
pub fn checksum(command_bytes: [u8; 2], payload: &[u8]) -> u8 {
    let sum: u32 = command_bytes
        .iter()
        .chain(payload.iter())
        .fold(0u32, |acc, &b| acc + u32::from(b));
    ((!sum).wrapping_add(1) & 0xff) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_byte_roundtrip() {
        for hops_left in 0..=3u8 {
            for max_hops in 0..=3u8 {
                for bits in &[
                    MessageFlags::NONE,
                    MessageFlags::EXTENDED,
                    MessageFlags::ACK,
                    MessageFlags::ALL_LINK,
                    MessageFlags::BROADCAST,
                    MessageFlags::EXTENDED | MessageFlags::ACK,
                ] {
                    let byte = encode_flags_byte(hops_left, max_hops, *bits);
                    let (back_hops_left, back_max_hops, back_flags) = decode_flags_byte(byte);
                    assert_eq!(back_hops_left, hops_left);
                    assert_eq!(back_max_hops, max_hops);
                    assert_eq!(back_flags, *bits);
                }
            }
        }
    }

    #[test]
    fn extended_checksum_sums_to_zero_mod_256() {
        let msg = InsteonMessage::extended(
            Identity::from([0x01, 0x02, 0x03]),
            [0x09, 0x01],
            [0u8; 14],
        );
        let user_data = msg.user_data.unwrap();
        let total: u32 = msg
            .command_bytes
            .iter()
            .chain(user_data.iter())
            .fold(0, |acc, &b| acc + u32::from(b));
        assert_eq!(total % 256, 0);
    }

    #[test]
    fn validate_rejects_mismatched_extended_flag() {
        let mut msg = InsteonMessage::standard(Identity::default(), [0x11, 0x00]);
        msg.flags = MessageFlags::EXTENDED;
        assert!(msg.validate().is_err());
    }

    #[test]
    fn is_ack_of_checks_sender_and_flag() {
        let request = InsteonMessage::standard(Identity::from([0x01, 0x02, 0x03]), [0x11, 0x00]);
        let mut reply = InsteonMessage::standard(Identity::default(), [0x11, 0x00]);
        reply.sender = Identity::from([0x01, 0x02, 0x03]);
        reply.flags = MessageFlags::ACK;
        assert!(reply.is_ack_of(&request));

        reply.flags = MessageFlags::NONE;
        assert!(!reply.is_ack_of(&request));
    }
}
