//! The PLM façade (spec §4.D): the public operations built atop the
//! multiplexer. Grounded on `examples/snorp-plm-rs/src/modem.rs`'s `Modem`,
//! generalized to the operation set named in SPEC_FULL.md's module map.

use std::path::Path;
use std::thread::JoinHandle;

use log::debug;

use crate::category::{parse_device_categories, DeviceCategory, DeviceSubcategory};
use crate::constants::*;
use crate::error::Error;
use crate::frame::{AllLinkComplete, AllLinkMode, AllLinkRecord, AllLinkRole, Frame, ModemInfo};
use crate::identity::Identity;
use crate::message::InsteonMessage;
use crate::mux::Multiplexer;
use crate::transport::ByteTransport;
use crate::units::{
    led_brightness_from_percent, led_brightness_to_percent, on_level_from_percent,
    on_level_to_percent, ramp_rate_from_seconds, ramp_rate_to_seconds,
};

/// The extended get/set "Data 1" field selector understood by
/// `get_device_info`/`set_device_info`. Not named by a wire protocol table
/// in spec.md; chosen to match the byte offsets the get-response payload
/// uses (spec §4.D), see DESIGN.md.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceInfoField {
    X10House,
    X10Unit,
    RampRate,
    OnLevel,
    LedBrightness,
}

impl DeviceInfoField {
    fn selector_byte(self) -> u8 {
        match self {
            DeviceInfoField::X10House => 0x04,
            DeviceInfoField::X10Unit => 0x05,
            DeviceInfoField::RampRate => 0x06,
            DeviceInfoField::OnLevel => 0x07,
            DeviceInfoField::LedBrightness => 0x08,
        }
    }

    fn encode(self, value: f64) -> u8 {
        match self {
            DeviceInfoField::X10House | DeviceInfoField::X10Unit => value as u8,
            DeviceInfoField::RampRate => ramp_rate_from_seconds(value),
            DeviceInfoField::OnLevel => on_level_from_percent(value),
            DeviceInfoField::LedBrightness => led_brightness_from_percent(value),
        }
    }
}

/// Decoded reply to `get_device_info`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeviceInfo {
    pub x10_house: u8,
    pub x10_unit: u8,
    pub ramp_rate_seconds: f64,
    pub on_level_percent: f64,
    pub led_level_percent: f64,
}

/// A connection to an Insteon PLM and the high-level operations built atop
/// it (spec §4.D).
pub struct Plm {
    mux: Multiplexer,
    reader_thread: Option<JoinHandle<()>>,
    identity: Identity,
    category: DeviceCategory,
    subcategory: DeviceSubcategory,
    firmware_version: u8,
}

impl Plm {
    /// Opens the serial port at `url` and eagerly populates identity fields
    /// via a mandatory synchronous `get_info()` (spec §3, "PLM state").
    pub fn open(url: impl AsRef<Path> + Send + 'static) -> Result<Plm, Error> {
        let (mux, reader_thread) = Multiplexer::open(url)?;
        let mut plm = Plm {
            mux,
            reader_thread: Some(reader_thread),
            identity: Identity::default(),
            category: DeviceCategory::Generic(0),
            subcategory: DeviceSubcategory::Generic(0),
            firmware_version: 0,
        };

        let info = futures::executor::block_on(plm.get_info())?;
        plm.identity = info.identity;
        plm.category = info.category;
        plm.subcategory = info.subcategory;
        plm.firmware_version = info.firmware_version;

        Ok(plm)
    }

    /// Wraps an already-open transport (e.g. one half of a
    /// `tokio::net::UnixStream::pair()` in tests) instead of opening a serial
    /// port. Identity fields are left at their defaults; call
    /// [`get_info`](Self::get_info) explicitly.
    pub fn from_transport<T>(transport: T) -> Plm
    where
        T: ByteTransport,
    {
        Plm {
            mux: Multiplexer::spawn(transport),
            reader_thread: None,
            identity: Identity::default(),
            category: DeviceCategory::Generic(0),
            subcategory: DeviceSubcategory::Generic(0),
            firmware_version: 0,
        }
    }

    /// Stops the reader and releases the serial handle. Dropping the
    /// multiplexer closes its command channel, which ends the event loop;
    /// this then joins the reader thread so the handle is guaranteed
    /// released before returning.
    pub fn close(self) {
        let Plm {
            mux, reader_thread, ..
        } = self;
        drop(mux);
        if let Some(handle) = reader_thread {
            let _ = handle.join();
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Retrieve information about the attached modem (`0x60`).
    pub async fn get_info(&self) -> Result<ModemInfo, Error> {
        match self
            .mux
            .write_read_default(Frame::GetImInfo, &[GET_IM_INFO])
            .await?
        {
            Frame::ImInfo(info) => Ok(info),
            _ => Err(Error::UnexpectedResponse),
        }
    }

    /// Enumerate the PLM's link database (`0x69`/`0x6A`/`0x57`), partitioned
    /// by role and sorted by `(identity, group)`.
    pub async fn get_all_link_records(
        &self,
    ) -> Result<(Vec<AllLinkRecord>, Vec<AllLinkRecord>), Error> {
        let mut records = self.mux.read(&[ALL_LINK_RECORD_RESPONSE]).await?;

        match self
            .mux
            .write_read_default(Frame::GetFirstAllLinkRecord, &[GET_FIRST_ALL_LINK_RECORD])
            .await
        {
            Ok(_) => {}
            Err(Error::NotAcknowledged) => return Ok((Vec::new(), Vec::new())),
            Err(e) => return Err(e),
        }

        let mut controllers = Vec::new();
        let mut responders = Vec::new();

        loop {
            match records.next().await {
                Some(Frame::AllLinkRecordResponse(record)) => {
                    debug!("got all-link record: {:?}", record);
                    match record.role {
                        AllLinkRole::Controller => controllers.push(record),
                        AllLinkRole::Responder => responders.push(record),
                    }
                }
                _ => return Err(Error::Disconnected),
            }

            match self
                .mux
                .write_read_default(Frame::GetNextAllLinkRecord, &[GET_NEXT_ALL_LINK_RECORD])
                .await
            {
                Ok(_) => continue,
                Err(Error::NotAcknowledged) => break,
                Err(e) => return Err(e),
            }
        }

        let sort_key = |r: &AllLinkRecord| (*r.identity.as_bytes(), r.group);
        controllers.sort_by_key(sort_key);
        responders.sort_by_key(sort_key);

        Ok((controllers, responders))
    }

    /// Puts the modem into all-linking mode (`0x64`).
    pub async fn start_all_linking_session(&self, group: u8, mode: AllLinkMode) -> Result<(), Error> {
        self.mux
            .write_read_default(
                Frame::StartAllLinking { mode, group },
                &[START_ALL_LINKING],
            )
            .await?;
        Ok(())
    }

    /// Cancels an in-progress all-linking session (`0x65`).
    pub async fn cancel_all_linking_session(&self) -> Result<(), Error> {
        self.mux
            .write_read_default(Frame::CancelAllLinking, &[CANCEL_ALL_LINKING])
            .await?;
        Ok(())
    }

    /// Scoped all-linking session: starts on entry, always cancels on exit
    /// regardless of how `body` completes. Grounded on
    /// `examples/snorp-plm-rs/src/modem.rs`'s `Modem::link_device`, which
    /// sends `CancelAllLink` both before starting and after the result is
    /// known.
    pub async fn all_linking_session<F, Fut, R>(
        &self,
        group: u8,
        mode: AllLinkMode,
        body: F,
    ) -> Result<R, Error>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<R, Error>>,
    {
        self.start_all_linking_session(group, mode).await?;
        let result = body().await;
        let _ = self.cancel_all_linking_session().await;
        result
    }

    /// Registers a one-shot waiter fulfilled on the next all-linking
    /// completion (`0x53`). Cancellable by dropping the returned future.
    pub async fn wait_all_linking_completed(&self) -> Result<AllLinkComplete, Error> {
        self.mux.wait_all_linking_completed().await
    }

    /// Sends a standard or extended Insteon message (`0x62`) and awaits the
    /// modem's command-level ACK.
    pub async fn send_standard_or_extended_message(
        &self,
        msg: InsteonMessage,
    ) -> Result<InsteonMessage, Error> {
        msg.validate()?;
        let frame = Frame::InsteonSend {
            to: msg.target,
            hops_left: msg.hops_left,
            max_hops: msg.max_hops,
            flags: msg.flags,
            cmd1: msg.command_bytes[0],
            cmd2: msg.command_bytes[1],
            data: msg.user_data,
        };

        match self
            .mux
            .write_read_default(frame, &[SEND_INSTEON_MESSAGE])
            .await?
        {
            Frame::InsteonSend {
                to,
                hops_left,
                max_hops,
                flags,
                cmd1,
                cmd2,
                data,
            } => Ok(InsteonMessage {
                sender: Identity::default(),
                target: to,
                hops_left,
                max_hops,
                flags,
                command_bytes: [cmd1, cmd2],
                user_data: data,
            }),
            _ => Err(Error::UnexpectedResponse),
        }
    }

    async fn send_standard(&self, to: Identity, command_bytes: [u8; 2]) -> Result<(), Error> {
        self.send_standard_or_extended_message(InsteonMessage::standard(to, command_bytes))
            .await?;
        Ok(())
    }

    async fn send_extended(
        &self,
        to: Identity,
        command_bytes: [u8; 2],
        user_data: [u8; 14],
    ) -> Result<(), Error> {
        self.send_standard_or_extended_message(InsteonMessage::extended(
            to,
            command_bytes,
            user_data,
        ))
        .await?;
        Ok(())
    }

    /// Sends an ID request and decodes the target's reply (spec §4.D): the
    /// reply's `target` field carries `[category, subcategory,
    /// firmware_version]`.
    pub async fn id_request(
        &self,
        identity: Identity,
    ) -> Result<(DeviceCategory, DeviceSubcategory, u8), Error> {
        let mut messages = self.mux.read_insteon_messages().await?;
        self.send_standard(identity, [CMD_ID_REQUEST, 0x00]).await?;

        while let Some(msg) = messages.next().await {
            if msg.sender == identity && msg.target != self.identity {
                let bytes = msg.target.as_bytes();
                let (category, subcategory) = parse_device_categories([bytes[0], bytes[1]]);
                return Ok((category, subcategory, bytes[2]));
            }
        }

        Err(Error::Disconnected)
    }

    /// Turns a light on at `level_percent`, returning the level actually
    /// applied after byte quantization.
    pub async fn light_on(
        &self,
        identity: Identity,
        level_percent: f64,
        instant: bool,
    ) -> Result<f64, Error> {
        let cmd1 = if instant { CMD_LIGHT_ON_FAST } else { CMD_LIGHT_ON };
        let level_byte = on_level_from_percent(level_percent);
        self.send_standard(identity, [cmd1, level_byte]).await?;
        Ok(on_level_to_percent(level_byte))
    }

    /// Turns a light off.
    pub async fn light_off(&self, identity: Identity, instant: bool) -> Result<f64, Error> {
        let cmd1 = if instant { CMD_LIGHT_OFF_FAST } else { CMD_LIGHT_OFF };
        self.send_standard(identity, [cmd1, 0x00]).await?;
        Ok(0.0)
    }

    /// Tells a remote device to enter linking mode for `group`.
    pub async fn remote_enter_linking(&self, identity: Identity, group: u8) -> Result<(), Error> {
        self.send_extended(identity, [CMD_ENTER_LINKING, group], [0u8; 14])
            .await
    }

    /// Tells a remote device to leave linking mode.
    pub async fn remote_enter_unlinking(&self, identity: Identity, group: u8) -> Result<(), Error> {
        self.send_extended(identity, [CMD_ENTER_UNLINKING, group], [0u8; 14])
            .await
    }

    pub async fn remote_set(&self, identity: Identity) -> Result<(), Error> {
        self.send_standard(identity, [CMD_REMOTE_SET, 0x00]).await
    }

    pub async fn beep(&self, identity: Identity) -> Result<(), Error> {
        self.send_standard(identity, [CMD_BEEP, 0x00]).await
    }

    /// Reads a device's extended configuration (x10 house/unit, ramp rate,
    /// on-level, LED brightness). Spec §4.D: "the first returned Insteon
    /// message is the ack; the second carries payload".
    pub async fn get_device_info(&self, identity: Identity) -> Result<DeviceInfo, Error> {
        let mut messages = self.mux.read_insteon_messages().await?;
        self.send_extended(identity, [CMD_GET_SET_DEVICE_INFO, 0x00], [0u8; 14])
            .await?;

        let mut seen_ack = false;
        while let Some(msg) = messages.next().await {
            if msg.sender != identity {
                continue;
            }
            if !seen_ack {
                seen_ack = true;
                continue;
            }

            let data = msg
                .user_data
                .ok_or(Error::ProtocolViolation("expected extended device-info reply"))?;

            return Ok(DeviceInfo {
                x10_house: data[4],
                x10_unit: data[5],
                ramp_rate_seconds: ramp_rate_to_seconds(data[6]),
                on_level_percent: on_level_to_percent(data[7]),
                led_level_percent: led_brightness_to_percent(data[8]),
            });
        }

        Err(Error::Disconnected)
    }

    /// Writes a single extended configuration field on a device, awaiting
    /// only the modem's command-level ack.
    pub async fn set_device_info(
        &self,
        identity: Identity,
        field: DeviceInfoField,
        value: f64,
    ) -> Result<(), Error> {
        let mut user_data = [0u8; 14];
        user_data[1] = field.selector_byte();
        user_data[2] = field.encode(value);
        self.send_extended(identity, [CMD_GET_SET_DEVICE_INFO, 0x00], user_data)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::UnixStream;

    #[tokio::test]
    async fn get_info_populates_identity() {
        let (host, mut fake_modem) = UnixStream::pair().unwrap();
        tokio::spawn(async move {
            let mut buf = [0u8; 2];
            fake_modem.read_exact(&mut buf).await.unwrap();
            assert_eq!(buf, [0x02, GET_IM_INFO]);
            fake_modem
                .write_all(&[0x02, GET_IM_INFO, 0x1A, 0x2B, 0x3C, 0x03, 0x2A, 0x07, ACK])
                .await
                .unwrap();
        });

        let plm = Plm::from_transport(host);
        let info = plm.get_info().await.unwrap();
        assert_eq!(info.identity, Identity::from([0x1A, 0x2B, 0x3C]));
        assert_eq!(info.firmware_version, 0x07);
    }

    #[tokio::test]
    async fn light_on_returns_quantized_percent() {
        let (host, mut fake_modem) = UnixStream::pair().unwrap();
        tokio::spawn(async move {
            let mut buf = [0u8; 8];
            fake_modem.read_exact(&mut buf).await.unwrap();
            assert_eq!(buf[0], 0x02);
            assert_eq!(buf[1], SEND_INSTEON_MESSAGE);
            assert_eq!(buf[6], CMD_LIGHT_ON);
            let level_byte = buf[7];

            let mut response = vec![0x02, SEND_INSTEON_MESSAGE];
            response.extend_from_slice(&buf[2..8]);
            response.push(ACK);
            fake_modem.write_all(&response).await.unwrap();
            let _ = level_byte;
        });

        let plm = Plm::from_transport(host);
        let applied = plm
            .light_on(Identity::from([0x01, 0x02, 0x03]), 50.0, false)
            .await
            .unwrap();
        assert_eq!(applied, on_level_to_percent(on_level_from_percent(50.0)));
    }

    #[tokio::test]
    async fn device_info_field_selector_matches_get_response_offsets() {
        assert_eq!(DeviceInfoField::X10House.selector_byte(), 4);
        assert_eq!(DeviceInfoField::X10Unit.selector_byte(), 5);
        assert_eq!(DeviceInfoField::RampRate.selector_byte(), 6);
        assert_eq!(DeviceInfoField::OnLevel.selector_byte(), 7);
        assert_eq!(DeviceInfoField::LedBrightness.selector_byte(), 8);
    }
}
