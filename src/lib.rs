#![recursion_limit = "256"]

//! Host-side driver core for an INSTEON™ PowerLine Modem: a self-syncing
//! frame codec, a request/response multiplexer, and the high-level device
//! operations built on top of it.
//!
//! # Example
//! ```no_run
//! # use plm_core::{Plm, Identity, AllLinkMode};
//! # use std::str::FromStr;
//! # #[tokio::main]
//! # async fn main() -> Result<(), plm_core::Error> {
//! // Use the modem attached to /dev/ttyUSB0 to turn on the switch
//! // at 11.22.33.
//! let plm = Plm::open("/dev/ttyUSB0")?;
//! plm.light_on(Identity::from_str("11.22.33")?, 100.0, false).await?;
//! # Ok(())
//! # }
//! ```

mod automation;
mod category;
mod constants;
mod directory;
mod error;
mod frame;
mod identity;
mod message;
mod mux;
mod plm;
mod transport;
mod units;

pub use automation::{AutomationRegistry, Predicate, Token};
pub use category::{parse_device_categories, DeviceCategory, DeviceSubcategory};
pub use directory::{DeviceDirectory, DeviceRecord};
pub use error::Error;
pub use frame::{
    AllLinkComplete, AllLinkMode, AllLinkRecord, AllLinkRole, Frame, ModemInfo,
};
pub use identity::Identity;
pub use message::{InsteonMessage, MessageFlags};
pub use mux::{MessageSubscription, Multiplexer, Subscription};
pub use plm::{DeviceInfo, DeviceInfoField, Plm};
pub use transport::ByteTransport;
pub use units::{
    led_brightness_from_percent, led_brightness_to_percent, on_level_from_percent,
    on_level_to_percent, ramp_rate_from_seconds, ramp_rate_to_seconds,
};
