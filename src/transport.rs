//! The byte transport (spec §4.A): owns the serial handle and knows nothing
//! about frames. Grounded on `examples/snorp-plm-rs/src/broker.rs`'s
//! `Broker::from_path`, which configures the same port settings.

use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_serial::{DataBits, FlowControl, Parity, Serial, SerialPortSettings, StopBits};

/// The fixed line discipline for an Insteon PLM (spec §6).
fn port_settings() -> SerialPortSettings {
    SerialPortSettings {
        baud_rate: 19200,
        data_bits: DataBits::Eight,
        flow_control: FlowControl::None,
        parity: Parity::None,
        stop_bits: StopBits::One,
        timeout: Duration::from_secs(1),
    }
}

/// Opens the serial port at `url` (e.g. `/dev/ttyUSB0`, a COM port, or a
/// virtual-port URL) with the modem's fixed 19200 8-N-1 settings.
pub fn open(url: impl AsRef<Path>) -> std::io::Result<Serial> {
    Serial::from_path(url.as_ref(), &port_settings())
}

/// Anything the multiplexer can drive as a byte transport: a duplex,
/// unbuffered, blocking-underneath I/O handle. Implemented by `Serial` and,
/// in tests, by one half of a `tokio::net::UnixStream::pair()`.
pub trait ByteTransport: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + 'static> ByteTransport for T {}
