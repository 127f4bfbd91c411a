//! The device directory interface (spec §6/§9): an abstract contract only.
//! No persistent implementation is in scope (spec §1 non-goal); the core
//! depends on this trait, never on a concrete store.
//!
//! Grounded on `examples/original_source/pysteon/database.py`'s duck-typed
//! `get`/`get_by_alias`/`set` device store, replaced here with a single
//! `DeviceRecord` value type per spec §9 ("duck-typed device objects...
//! replace with a single `DeviceRecord` value type").

use std::collections::HashMap;

use crate::category::{DeviceCategory, DeviceSubcategory};
use crate::identity::Identity;

/// A directory entry: everything the core or an automation rule might want
/// to know about a previously-seen device.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceRecord {
    pub identity: Identity,
    pub alias: Option<String>,
    pub description: Option<String>,
    pub category: DeviceCategory,
    pub subcategory: DeviceSubcategory,
    pub firmware_version: u8,
}

/// The abstract device directory contract consumed by the core. Callers
/// supply an implementation (flat file, embedded SQL, in-memory); the core
/// only ever calls through this trait and never assumes atomicity across
/// calls (spec §6: "implementations need not be atomic; the core serializes
/// its own calls").
pub trait DeviceDirectory {
    fn get(&self, identity: Identity) -> Option<DeviceRecord>;
    fn get_by_alias(&self, alias: &str) -> Option<DeviceRecord>;
    fn set(
        &mut self,
        identity: Identity,
        alias: Option<String>,
        description: Option<String>,
        category: DeviceCategory,
        subcategory: DeviceSubcategory,
        firmware_version: u8,
    ) -> DeviceRecord;
    fn list(&self) -> HashMap<Identity, DeviceRecord>;
}
