//! Wire-level constants: frame delimiters, command codes, and the body-size
//! table used by the frame codec (spec §6).

pub const START: u8 = 0x02u8;
pub const ACK: u8 = 0x06u8;
pub const NAK: u8 = 0x15u8;

// PLM -> host, unsolicited.
pub const STANDARD_MESSAGE_RECEIVED: u8 = 0x50;
pub const EXTENDED_MESSAGE_RECEIVED: u8 = 0x51;
pub const ALL_LINKING_COMPLETED: u8 = 0x53;
pub const BUTTON_EVENT_REPORT: u8 = 0x54;
pub const USER_RESET_DETECTED: u8 = 0x55;
pub const ALL_LINK_CLEANUP_FAILURE_REPORT: u8 = 0x56;
pub const ALL_LINK_RECORD_RESPONSE: u8 = 0x57;
pub const ALL_LINK_CLEANUP_STATUS_REPORT: u8 = 0x58;

// Host -> PLM commands (each expects a trailing ACK/NAK byte after its body).
pub const GET_IM_INFO: u8 = 0x60;
pub const SEND_ALL_LINK_COMMAND: u8 = 0x61;
pub const SEND_INSTEON_MESSAGE: u8 = 0x62;
pub const START_ALL_LINKING: u8 = 0x64;
pub const CANCEL_ALL_LINKING: u8 = 0x65;
pub const RESET_IM: u8 = 0x67;
pub const GET_FIRST_ALL_LINK_RECORD: u8 = 0x69;
pub const GET_NEXT_ALL_LINK_RECORD: u8 = 0x6a;
pub const SET_IM_CONFIGURATION: u8 = 0x6b;
pub const LED_ON: u8 = 0x6d;
pub const LED_OFF: u8 = 0x6e;
pub const GET_IM_CONFIGURATION: u8 = 0x73;

// Link-mode bytes (`AllLinkMode`).
pub const LINK_MODE_RESPONDER: u8 = 0x00;
pub const LINK_MODE_CONTROLLER: u8 = 0x01;
pub const LINK_MODE_AUTO: u8 = 0x03;
pub const LINK_MODE_UNKNOWN: u8 = 0xfe;
pub const LINK_MODE_DELETE: u8 = 0xff;

// Insteon standard/extended-message command bytes used by the façade.
pub const CMD_LIGHT_ON: u8 = 0x11;
pub const CMD_LIGHT_ON_FAST: u8 = 0x12;
pub const CMD_LIGHT_OFF: u8 = 0x13;
pub const CMD_LIGHT_OFF_FAST: u8 = 0x14;
pub const CMD_ENTER_LINKING: u8 = 0x09;
pub const CMD_ENTER_UNLINKING: u8 = 0x0a;
pub const CMD_ID_REQUEST: u8 = 0x10;
pub const CMD_REMOTE_SET: u8 = 0x25;
pub const CMD_BEEP: u8 = 0x30;
pub const CMD_GET_SET_DEVICE_INFO: u8 = 0x2e;

/// Response-body length for an outbound command byte, or `None` for
/// `SEND_INSTEON_MESSAGE` (depends on the extended flag, handled by the
/// caller) and for commands this driver never issues.
pub fn outbound_response_body_len(cmd: u8) -> Option<usize> {
    match cmd {
        GET_IM_INFO => Some(6),
        SEND_ALL_LINK_COMMAND => Some(3),
        START_ALL_LINKING => Some(2),
        CANCEL_ALL_LINKING => Some(0),
        RESET_IM => Some(0),
        GET_FIRST_ALL_LINK_RECORD => Some(0),
        GET_NEXT_ALL_LINK_RECORD => Some(0),
        SET_IM_CONFIGURATION => Some(1),
        LED_ON => Some(0),
        LED_OFF => Some(0),
        GET_IM_CONFIGURATION => Some(3),
        _ => None,
    }
}

/// Body length for unsolicited inbound frames, keyed by command byte.
pub fn inbound_body_len(cmd: u8) -> Option<usize> {
    match cmd {
        STANDARD_MESSAGE_RECEIVED => Some(9),
        EXTENDED_MESSAGE_RECEIVED => Some(23),
        ALL_LINKING_COMPLETED => Some(8),
        BUTTON_EVENT_REPORT => Some(1),
        USER_RESET_DETECTED => Some(0),
        ALL_LINK_CLEANUP_FAILURE_REPORT => Some(5),
        ALL_LINK_RECORD_RESPONSE => Some(8),
        ALL_LINK_CLEANUP_STATUS_REPORT => Some(1),
        _ => None,
    }
}
