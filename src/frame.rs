//! The frame codec (spec §4.B): bidirectional conversion between the byte
//! stream and typed `Frame`s, a body-size table keyed by command byte, and
//! the resync policy.

use std::fmt;
use std::str::FromStr;

use bytes::{Buf, BufMut, BytesMut};
use log::warn;
use tokio_util::codec::{Decoder, Encoder};

use crate::category::{parse_device_categories, DeviceCategory, DeviceSubcategory};
use crate::constants::*;
use crate::error::Error;
use crate::identity::Identity;
use crate::message::{decode_flags_byte, encode_flags_byte, InsteonMessage, MessageFlags};

/// The role a PLM plays in a single link record: bit 6 (`0x40`) of the
/// record's flags byte set means Controller, clear means Responder (spec §3,
/// §6), matching the ALDB flags byte in the Insteon developer's guide.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AllLinkRole {
    Controller,
    Responder,
}

impl AllLinkRole {
    pub fn from_flags_byte(byte: u8) -> Self {
        if byte & 0x40 != 0 {
            AllLinkRole::Controller
        } else {
            AllLinkRole::Responder
        }
    }
}

/// The mode requested of (or reported by) an all-linking session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AllLinkMode {
    Responder,
    Controller,
    Auto,
    Unknown,
    Delete,
}

impl AllLinkMode {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            LINK_MODE_RESPONDER => Some(AllLinkMode::Responder),
            LINK_MODE_CONTROLLER => Some(AllLinkMode::Controller),
            LINK_MODE_AUTO => Some(AllLinkMode::Auto),
            LINK_MODE_UNKNOWN => Some(AllLinkMode::Unknown),
            LINK_MODE_DELETE => Some(AllLinkMode::Delete),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            AllLinkMode::Responder => LINK_MODE_RESPONDER,
            AllLinkMode::Controller => LINK_MODE_CONTROLLER,
            AllLinkMode::Auto => LINK_MODE_AUTO,
            AllLinkMode::Unknown => LINK_MODE_UNKNOWN,
            AllLinkMode::Delete => LINK_MODE_DELETE,
        }
    }
}

impl FromStr for AllLinkMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "responder" => Ok(AllLinkMode::Responder),
            "controller" => Ok(AllLinkMode::Controller),
            "auto" => Ok(AllLinkMode::Auto),
            "unknown" => Ok(AllLinkMode::Unknown),
            "delete" => Ok(AllLinkMode::Delete),
            _ => Err(Error::Parse),
        }
    }
}

impl fmt::Display for AllLinkMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            AllLinkMode::Responder => "responder",
            AllLinkMode::Controller => "controller",
            AllLinkMode::Auto => "auto",
            AllLinkMode::Unknown => "unknown",
            AllLinkMode::Delete => "delete",
        };
        write!(f, "{}", name)
    }
}

/// Information about the attached modem, as returned by `get_info`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModemInfo {
    pub identity: Identity,
    pub category: DeviceCategory,
    pub subcategory: DeviceSubcategory,
    pub firmware_version: u8,
}

/// A single row in the PLM's link database.
#[derive(Debug, Clone, PartialEq)]
pub struct AllLinkRecord {
    pub role: AllLinkRole,
    pub identity: Identity,
    pub group: u8,
    pub data: [u8; 3],
}

/// The result of a completed (or failed) all-linking session.
#[derive(Debug, Clone, PartialEq)]
pub struct AllLinkComplete {
    /// `None` when the frame's mode byte falls outside the known
    /// enumeration, signalling that a deletion found no matching entry.
    pub mode: Option<AllLinkMode>,
    pub group: u8,
    pub identity: Identity,
    pub category: DeviceCategory,
    pub subcategory: DeviceSubcategory,
    pub firmware_version: u8,
}

/// A single command sent to, or frame received from, the modem.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Request: fetch modem info. No body.
    GetImInfo,
    /// Response to `GetImInfo`.
    ImInfo(ModemInfo),
    /// Both directions: send (and the modem's echoed ack of) an all-link
    /// broadcast command.
    AllLinkCommand { group: u8, cmd1: u8, cmd2: u8 },
    /// Both directions: send (and the echoed ack of) a standard or extended
    /// Insteon message. `data` is `Some` iff extended.
    InsteonSend {
        to: Identity,
        hops_left: u8,
        max_hops: u8,
        flags: MessageFlags,
        cmd1: u8,
        cmd2: u8,
        data: Option<[u8; 14]>,
    },
    /// Both directions: put the modem into (or out of) all-linking mode.
    StartAllLinking { mode: AllLinkMode, group: u8 },
    CancelAllLinking,
    ResetIm,
    GetFirstAllLinkRecord,
    GetNextAllLinkRecord,
    SetImConfiguration(u8),
    LedOn,
    LedOff,
    /// Request: fetch modem configuration flags. No body.
    GetImConfiguration,
    /// Response to `GetImConfiguration`.
    ImConfiguration([u8; 3]),

    /// Unsolicited: a standard or extended message addressed to or
    /// broadcast by a device. `user_data` is `Some` iff extended.
    MessageReceived(InsteonMessage),
    AllLinkingCompleted(AllLinkComplete),
    ButtonEventReport(u8),
    UserResetDetected,
    AllLinkCleanupFailureReport([u8; 5]),
    AllLinkRecordResponse(AllLinkRecord),
    AllLinkCleanupStatusReport(u8),
}

impl Frame {
    pub fn command_byte(&self) -> u8 {
        match self {
            Frame::GetImInfo | Frame::ImInfo(_) => GET_IM_INFO,
            Frame::AllLinkCommand { .. } => SEND_ALL_LINK_COMMAND,
            Frame::InsteonSend { .. } => SEND_INSTEON_MESSAGE,
            Frame::StartAllLinking { .. } => START_ALL_LINKING,
            Frame::CancelAllLinking => CANCEL_ALL_LINKING,
            Frame::ResetIm => RESET_IM,
            Frame::GetFirstAllLinkRecord => GET_FIRST_ALL_LINK_RECORD,
            Frame::GetNextAllLinkRecord => GET_NEXT_ALL_LINK_RECORD,
            Frame::SetImConfiguration(_) => SET_IM_CONFIGURATION,
            Frame::LedOn => LED_ON,
            Frame::LedOff => LED_OFF,
            Frame::GetImConfiguration | Frame::ImConfiguration(_) => GET_IM_CONFIGURATION,
            Frame::MessageReceived(msg) if msg.is_extended() => EXTENDED_MESSAGE_RECEIVED,
            Frame::MessageReceived(_) => STANDARD_MESSAGE_RECEIVED,
            Frame::AllLinkingCompleted(_) => ALL_LINKING_COMPLETED,
            Frame::ButtonEventReport(_) => BUTTON_EVENT_REPORT,
            Frame::UserResetDetected => USER_RESET_DETECTED,
            Frame::AllLinkCleanupFailureReport(_) => ALL_LINK_CLEANUP_FAILURE_REPORT,
            Frame::AllLinkRecordResponse(_) => ALL_LINK_RECORD_RESPONSE,
            Frame::AllLinkCleanupStatusReport(_) => ALL_LINK_CLEANUP_STATUS_REPORT,
        }
    }

    /// True if this command's wire response ends with an ACK/NAK epilogue
    /// byte (all host-originated commands do; unsolicited inbound frames
    /// do not).
    fn has_ack_epilogue(cmd: u8) -> bool {
        matches!(
            cmd,
            GET_IM_INFO
                | SEND_ALL_LINK_COMMAND
                | SEND_INSTEON_MESSAGE
                | START_ALL_LINKING
                | CANCEL_ALL_LINKING
                | RESET_IM
                | GET_FIRST_ALL_LINK_RECORD
                | GET_NEXT_ALL_LINK_RECORD
                | SET_IM_CONFIGURATION
                | LED_ON
                | LED_OFF
                | GET_IM_CONFIGURATION
        )
    }

    /// Serializes the frame's body (everything after `START, cmd`) into
    /// `dst`. Does not write the ACK/NAK epilogue (the modem supplies that).
    pub fn encode_body(&self, dst: &mut BytesMut) {
        match self {
            Frame::GetImInfo | Frame::GetFirstAllLinkRecord | Frame::GetNextAllLinkRecord => {}
            Frame::CancelAllLinking | Frame::ResetIm | Frame::LedOn | Frame::LedOff => {}
            Frame::GetImConfiguration => {}
            Frame::ImInfo(info) => {
                dst.put_slice(info.identity.as_bytes());
                dst.put_u8(info.category.to_byte());
                dst.put_u8(info.subcategory.to_byte());
                dst.put_u8(info.firmware_version);
            }
            Frame::AllLinkCommand { group, cmd1, cmd2 } => {
                dst.put_u8(*group);
                dst.put_u8(*cmd1);
                dst.put_u8(*cmd2);
            }
            Frame::InsteonSend {
                to,
                hops_left,
                max_hops,
                flags,
                cmd1,
                cmd2,
                data,
            } => {
                dst.put_slice(to.as_bytes());
                dst.put_u8(encode_flags_byte(*hops_left, *max_hops, *flags));
                dst.put_u8(*cmd1);
                dst.put_u8(*cmd2);
                if let Some(data) = data {
                    dst.put_slice(&data[..]);
                }
            }
            Frame::StartAllLinking { mode, group } => {
                dst.put_u8((*mode).to_byte());
                dst.put_u8(*group);
            }
            Frame::SetImConfiguration(flags) => dst.put_u8(*flags),
            Frame::ImConfiguration(bytes) => dst.put_slice(&bytes[..]),
            Frame::MessageReceived(msg) => {
                dst.put_slice(msg.sender.as_bytes());
                dst.put_slice(msg.target.as_bytes());
                dst.put_u8(encode_flags_byte(msg.hops_left, msg.max_hops, msg.flags));
                dst.put_u8(msg.command_bytes[0]);
                dst.put_u8(msg.command_bytes[1]);
                if let Some(data) = msg.user_data {
                    dst.put_slice(&data[..]);
                }
            }
            Frame::AllLinkingCompleted(complete) => {
                dst.put_u8(complete.mode.map(AllLinkMode::to_byte).unwrap_or(0xaa));
                dst.put_u8(complete.group);
                dst.put_slice(complete.identity.as_bytes());
                dst.put_u8(complete.category.to_byte());
                dst.put_u8(complete.subcategory.to_byte());
                dst.put_u8(complete.firmware_version);
            }
            Frame::ButtonEventReport(b) => dst.put_u8(*b),
            Frame::UserResetDetected => {}
            Frame::AllLinkCleanupFailureReport(raw) => dst.put_slice(&raw[..]),
            Frame::AllLinkRecordResponse(record) => {
                let flags: u8 = match record.role {
                    AllLinkRole::Controller => 0xc2,
                    AllLinkRole::Responder => 0x02,
                };
                dst.put_u8(flags);
                dst.put_u8(record.group);
                dst.put_slice(record.identity.as_bytes());
                dst.put_slice(&record.data[..]);
            }
            Frame::AllLinkCleanupStatusReport(b) => dst.put_u8(*b),
        }
    }

    /// Serializes the full wire encoding of the frame (`START, cmd, body`),
    /// including the extended-message checksum fixup when applicable.
    pub fn to_bytes(&self, dst: &mut BytesMut) {
        dst.put_u8(START);
        dst.put_u8(self.command_byte());
        let body_start = dst.len();
        self.encode_body(dst);

        if let Frame::InsteonSend {
            data: Some(_),
            cmd1,
            cmd2,
            ..
        } = self
        {
            // Layout from body_start: to(3) flags(1) cmd1(1) cmd2(1) data(14).
            let data_start = body_start + 6;
            let payload = dst[data_start..data_start + 13].to_vec();
            let sum = crate::message::checksum([*cmd1, *cmd2], &payload);
            dst[data_start + 13] = sum;
        }
    }
}

/// Decodes frames out of a byte stream per spec §4.B: resync on garbage,
/// table-driven body-length lookup, ACK/NAK epilogue handling.
pub struct FrameCodec;

impl FrameCodec {
    /// Discards leading non-`START` bytes from `src`, logging nonzero runs
    /// at warning level unless the run is entirely `0x00` (a known modem
    /// idle artifact).
    fn resync(src: &mut BytesMut) {
        let junk_len = src.iter().position(|&b| b == START).unwrap_or(src.len());
        if junk_len == 0 {
            return;
        }

        let all_zero = src[..junk_len].iter().all(|&b| b == 0);
        if !all_zero {
            warn!(
                "discarding {} unexpected byte(s) while resynchronizing: {:02x?}",
                junk_len,
                &src[..junk_len]
            );
        }
        src.advance(junk_len);
    }

    fn decode_one(src: &mut BytesMut) -> Result<Option<Frame>, Error> {
        loop {
            Self::resync(src);

            if src.len() < 2 {
                return Ok(None);
            }

            let cmd = src[1];
            let has_ack = Frame::has_ack_epilogue(cmd);

            let body_len = match Self::body_len(cmd, src) {
                BodyLen::Unknown => {
                    warn!("unrecognized command code 0x{:02x}, discarding", cmd);
                    src.advance(2);
                    continue;
                }
                BodyLen::NeedMore => return Ok(None),
                BodyLen::Known(n) => n,
            };

            let total = 2 + body_len + if has_ack { 1 } else { 0 };
            if src.len() < total {
                return Ok(None);
            }

            let body = src[2..2 + body_len].to_vec();
            let ack_byte = if has_ack { Some(src[2 + body_len]) } else { None };
            src.advance(total);

            let frame = Self::build_frame(cmd, &body)?;

            return match ack_byte {
                Some(NAK) => Err(Error::NotAcknowledged),
                Some(ACK) | None => Ok(Some(frame)),
                Some(_) => Err(Error::ProtocolViolation("expected ACK or NAK epilogue byte")),
            };
        }
    }

    fn body_len(cmd: u8, src: &[u8]) -> BodyLen {
        if cmd == SEND_INSTEON_MESSAGE {
            // Need `to(3) + flags(1)` to know whether this is extended.
            if src.len() < 2 + 4 {
                return BodyLen::NeedMore;
            }
            let flags_byte = src[2 + 3];
            let (_, _, flags) = decode_flags_byte(flags_byte);
            return BodyLen::Known(if flags.contains(MessageFlags::EXTENDED) {
                20
            } else {
                6
            });
        }

        if cmd == GET_IM_INFO {
            return BodyLen::Known(6);
        }
        if cmd == GET_IM_CONFIGURATION {
            return BodyLen::Known(3);
        }

        if let Some(n) = outbound_response_body_len(cmd) {
            return BodyLen::Known(n);
        }
        if let Some(n) = inbound_body_len(cmd) {
            return BodyLen::Known(n);
        }

        BodyLen::Unknown
    }

    fn build_frame(cmd: u8, body: &[u8]) -> Result<Frame, Error> {
        Ok(match cmd {
            GET_IM_INFO => {
                let identity = Identity::from(&body[0..3]);
                let (category, subcategory) = parse_device_categories([body[3], body[4]]);
                Frame::ImInfo(ModemInfo {
                    identity,
                    category,
                    subcategory,
                    firmware_version: body[5],
                })
            }
            SEND_ALL_LINK_COMMAND => Frame::AllLinkCommand {
                group: body[0],
                cmd1: body[1],
                cmd2: body[2],
            },
            SEND_INSTEON_MESSAGE => {
                let to = Identity::from(&body[0..3]);
                let (hops_left, max_hops, flags) = decode_flags_byte(body[3]);
                let cmd1 = body[4];
                let cmd2 = body[5];
                let data = if flags.contains(MessageFlags::EXTENDED) {
                    let mut d = [0u8; 14];
                    d.copy_from_slice(&body[6..20]);
                    Some(d)
                } else {
                    None
                };
                Frame::InsteonSend {
                    to,
                    hops_left,
                    max_hops,
                    flags,
                    cmd1,
                    cmd2,
                    data,
                }
            }
            START_ALL_LINKING => Frame::StartAllLinking {
                mode: AllLinkMode::from_byte(body[0]).unwrap_or(AllLinkMode::Unknown),
                group: body[1],
            },
            CANCEL_ALL_LINKING => Frame::CancelAllLinking,
            RESET_IM => Frame::ResetIm,
            GET_FIRST_ALL_LINK_RECORD => Frame::GetFirstAllLinkRecord,
            GET_NEXT_ALL_LINK_RECORD => Frame::GetNextAllLinkRecord,
            SET_IM_CONFIGURATION => Frame::SetImConfiguration(body[0]),
            LED_ON => Frame::LedOn,
            LED_OFF => Frame::LedOff,
            GET_IM_CONFIGURATION => Frame::ImConfiguration([body[0], body[1], body[2]]),
            STANDARD_MESSAGE_RECEIVED => {
                Frame::MessageReceived(decode_message(body, None))
            }
            EXTENDED_MESSAGE_RECEIVED => {
                let mut data = [0u8; 14];
                data.copy_from_slice(&body[9..23]);
                Frame::MessageReceived(decode_message(body, Some(data)))
            }
            ALL_LINKING_COMPLETED => {
                let mode = AllLinkMode::from_byte(body[0]);
                let (category, subcategory) = parse_device_categories([body[5], body[6]]);
                Frame::AllLinkingCompleted(AllLinkComplete {
                    mode,
                    group: body[1],
                    identity: Identity::from(&body[2..5]),
                    category,
                    subcategory,
                    firmware_version: body[7],
                })
            }
            BUTTON_EVENT_REPORT => Frame::ButtonEventReport(body[0]),
            USER_RESET_DETECTED => Frame::UserResetDetected,
            ALL_LINK_CLEANUP_FAILURE_REPORT => {
                let mut raw = [0u8; 5];
                raw.copy_from_slice(body);
                Frame::AllLinkCleanupFailureReport(raw)
            }
            ALL_LINK_RECORD_RESPONSE => {
                let role = AllLinkRole::from_flags_byte(body[0]);
                Frame::AllLinkRecordResponse(AllLinkRecord {
                    role,
                    group: body[1],
                    identity: Identity::from(&body[2..5]),
                    data: [body[5], body[6], body[7]],
                })
            }
            ALL_LINK_CLEANUP_STATUS_REPORT => Frame::AllLinkCleanupStatusReport(body[0]),
            _ => return Err(Error::Parse),
        })
    }
}

fn decode_message(body: &[u8], data: Option<[u8; 14]>) -> InsteonMessage {
    let sender = Identity::from(&body[0..3]);
    let target = Identity::from(&body[3..6]);
    let (hops_left, max_hops, mut flags) = decode_flags_byte(body[6]);
    if data.is_some() {
        flags |= MessageFlags::EXTENDED;
    }
    InsteonMessage {
        sender,
        target,
        hops_left,
        max_hops,
        flags,
        command_bytes: [body[7], body[8]],
        user_data: data,
    }
}

enum BodyLen {
    Known(usize),
    NeedMore,
    Unknown,
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, Error> {
        Self::decode_one(src)
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Error> {
        item.to_bytes(dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(mut buf: BytesMut) -> Vec<Result<Frame, Error>> {
        let mut out = Vec::new();
        loop {
            match FrameCodec::decode_one(&mut buf) {
                Ok(Some(frame)) => out.push(Ok(frame)),
                Ok(None) => break,
                Err(e) => out.push(Err(e)),
            }
            if buf.is_empty() {
                break;
            }
        }
        out
    }

    #[test]
    fn s1_get_info() {
        let mut buf = BytesMut::from(&[0x02, 0x60, 0x1A, 0x2B, 0x3C, 0x03, 0x2A, 0x07, 0x06][..]);
        let frames = decode_all(buf.split());
        assert_eq!(frames.len(), 1);
        match frames[0].as_ref().unwrap() {
            Frame::ImInfo(info) => {
                assert_eq!(info.identity, Identity::from([0x1A, 0x2B, 0x3C]));
                assert_eq!(info.category, DeviceCategory::NetworkBridges);
                assert_eq!(info.subcategory.to_byte(), 0x2A);
                assert_eq!(info.firmware_version, 0x07);
            }
            other => panic!("unexpected frame {:?}", other),
        }
    }

    #[test]
    fn s2_link_enumeration() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[0x02, 0x69, 0x06]);
        buf.extend_from_slice(&[0x02, 0x57, 0xE2, 0x01, 0xAA, 0xBB, 0xCC, 0x01, 0x02, 0x03]);
        buf.extend_from_slice(&[0x02, 0x6A, 0x06]);
        buf.extend_from_slice(&[0x02, 0x57, 0xA2, 0x02, 0xDD, 0xEE, 0xFF, 0x04, 0x05, 0x06]);
        buf.extend_from_slice(&[0x02, 0x6A, 0x15]);

        let frames = decode_all(buf);
        assert_eq!(frames.len(), 5);
        assert!(matches!(frames[0], Ok(Frame::GetFirstAllLinkRecord)));
        match frames[1].as_ref().unwrap() {
            Frame::AllLinkRecordResponse(r) => {
                assert_eq!(r.role, AllLinkRole::Controller);
                assert_eq!(r.group, 1);
                assert_eq!(r.identity, Identity::from([0xAA, 0xBB, 0xCC]));
                assert_eq!(r.data, [0x01, 0x02, 0x03]);
            }
            other => panic!("{:?}", other),
        }
        assert!(matches!(frames[2], Ok(Frame::GetNextAllLinkRecord)));
        match frames[3].as_ref().unwrap() {
            Frame::AllLinkRecordResponse(r) => {
                assert_eq!(r.role, AllLinkRole::Responder);
                assert_eq!(r.identity, Identity::from([0xDD, 0xEE, 0xFF]));
            }
            other => panic!("{:?}", other),
        }
        assert_eq!(frames[4], Err(Error::NotAcknowledged));
    }

    #[test]
    fn s3_standard_message() {
        let mut buf = BytesMut::from(
            &[0x02, 0x50, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x02, 0x13, 0x00][..],
        );
        let frames = decode_all(buf.split());
        match frames[0].as_ref().unwrap() {
            Frame::MessageReceived(msg) => {
                assert_eq!(msg.sender, Identity::from([0x11, 0x22, 0x33]));
                assert_eq!(msg.target, Identity::from([0x44, 0x55, 0x66]));
                assert_eq!(msg.max_hops, 2);
                assert_eq!(msg.hops_left, 0);
                assert_eq!(msg.flags, MessageFlags::NONE);
                assert_eq!(msg.command_bytes, [0x13, 0x00]);
                assert_eq!(msg.user_data, None);
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn s4_extended_message_with_ack_flag() {
        let mut body = vec![0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff, 0x2F, 0x2E, 0x01];
        body.extend_from_slice(&[0u8; 13]);
        body.push(0xAB);
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[0x02, 0x51]);
        buf.extend_from_slice(&body);

        let frames = decode_all(buf);
        match frames[0].as_ref().unwrap() {
            Frame::MessageReceived(msg) => {
                assert!(msg.flags.contains(MessageFlags::ACK));
                assert!(msg.flags.contains(MessageFlags::EXTENDED));
                assert!(msg.user_data.is_some());
            }
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn s5_light_on_encoding() {
        let frame = Frame::InsteonSend {
            to: Identity::from([0x01, 0x02, 0x03]),
            hops_left: 3,
            max_hops: 3,
            flags: MessageFlags::NONE,
            cmd1: 0x11,
            cmd2: 0x7F,
            data: None,
        };
        let mut buf = BytesMut::new();
        frame.to_bytes(&mut buf);
        assert_eq!(
            &buf[..],
            &[0x02, 0x62, 0x01, 0x02, 0x03, 0x0F, 0x11, 0x7F][..]
        );
    }

    #[test]
    fn s6_extended_checksum() {
        let mut user_data = [0u8; 14];
        user_data[0] = 0x09;
        user_data[1] = 0x01;
        let msg = InsteonMessage::extended(Identity::from([0x01, 0x02, 0x03]), [0x09, 0x01], user_data);
        let frame = Frame::InsteonSend {
            to: msg.target,
            hops_left: msg.hops_left,
            max_hops: msg.max_hops,
            flags: msg.flags,
            cmd1: msg.command_bytes[0],
            cmd2: msg.command_bytes[1],
            data: msg.user_data,
        };
        let mut buf = BytesMut::new();
        frame.to_bytes(&mut buf);
        let sum: u32 = buf[6..].iter().fold(0u32, |acc, &b| acc + u32::from(b));
        assert_eq!(sum % 256, 0);
    }

    #[test]
    fn resync_discards_junk_before_start() {
        let mut buf = BytesMut::from(&[0xff, 0xee, 0x02, 0x65, 0x06][..]);
        let frames = decode_all(buf);
        assert_eq!(frames, vec![Ok(Frame::CancelAllLinking)]);
    }

    #[test]
    fn resync_ignores_leading_zero_runs_silently() {
        let mut buf = BytesMut::from(&[0x00, 0x00, 0x00, 0x02, 0x65, 0x06][..]);
        let frames = decode_all(buf);
        assert_eq!(frames, vec![Ok(Frame::CancelAllLinking)]);
    }

    #[test]
    fn unknown_command_is_discarded_and_resync_continues() {
        let mut buf = BytesMut::from(&[0x02, 0x95, 0x02, 0x65, 0x06][..]);
        let frames = decode_all(buf);
        assert_eq!(frames, vec![Ok(Frame::CancelAllLinking)]);
    }

    #[test]
    fn incomplete_frame_requests_more_bytes() {
        let mut buf = BytesMut::from(&[0x02, 0x60][..]);
        assert_eq!(FrameCodec::decode_one(&mut buf), Ok(None));
        assert_eq!(&buf[..], &[0x02, 0x60][..]);
    }

    #[test]
    fn garbage_with_no_start_byte_is_fully_discarded_without_looping_forever() {
        let mut buf = BytesMut::from(&[0x01u8; 128][..]);
        assert_eq!(FrameCodec::decode_one(&mut buf), Ok(None));
        assert!(buf.is_empty());
    }
}
