//! Device category / subcategory catalog.
//!
//! Ported from the category table at
//! <http://cache.insteon.com/pdf/INSTEON_Developers_Guide_20070816a.pdf>,
//! page 83 (see `examples/original_source/pysteon/objects.py`). Unknown byte
//! values never fail to parse: they become `Generic(value)`, carrying the
//! raw byte and a synthesized title.

use std::fmt;

/// A device category, or `Generic` for a byte outside the known set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceCategory {
    GeneralizedControllers,
    DimmableLightingControl,
    SwitchedLightingControl,
    NetworkBridges,
    IrrigationControl,
    ClimateControl,
    PoolAndSpaControl,
    SensorsAndActuators,
    HomeEntertainment,
    EnergyManagement,
    BuiltInApplianceControl,
    Plumbing,
    Communication,
    ComputerControl,
    WindowCoverings,
    AccessControl,
    SecurityHealthSafety,
    Surveillance,
    Automotive,
    PetCare,
    Toys,
    Timekeeping,
    Holiday,
    Unassigned,
    Generic(u8),
}

impl DeviceCategory {
    pub fn from_byte(value: u8) -> Self {
        use DeviceCategory::*;
        match value {
            0x00 => GeneralizedControllers,
            0x01 => DimmableLightingControl,
            0x02 => SwitchedLightingControl,
            0x03 => NetworkBridges,
            0x04 => IrrigationControl,
            0x05 => ClimateControl,
            0x06 => PoolAndSpaControl,
            0x07 => SensorsAndActuators,
            0x08 => HomeEntertainment,
            0x09 => EnergyManagement,
            0x0a => BuiltInApplianceControl,
            0x0b => Plumbing,
            0x0c => Communication,
            0x0d => ComputerControl,
            0x0e => WindowCoverings,
            0x0f => AccessControl,
            0x10 => SecurityHealthSafety,
            0x11 => Surveillance,
            0x12 => Automotive,
            0x13 => PetCare,
            0x14 => Toys,
            0x15 => Timekeeping,
            0x16 => Holiday,
            0xff => Unassigned,
            other => Generic(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        use DeviceCategory::*;
        match self {
            GeneralizedControllers => 0x00,
            DimmableLightingControl => 0x01,
            SwitchedLightingControl => 0x02,
            NetworkBridges => 0x03,
            IrrigationControl => 0x04,
            ClimateControl => 0x05,
            PoolAndSpaControl => 0x06,
            SensorsAndActuators => 0x07,
            HomeEntertainment => 0x08,
            EnergyManagement => 0x09,
            BuiltInApplianceControl => 0x0a,
            Plumbing => 0x0b,
            Communication => 0x0c,
            ComputerControl => 0x0d,
            WindowCoverings => 0x0e,
            AccessControl => 0x0f,
            SecurityHealthSafety => 0x10,
            Surveillance => 0x11,
            Automotive => 0x12,
            PetCare => 0x13,
            Toys => 0x14,
            Timekeeping => 0x15,
            Holiday => 0x16,
            Unassigned => 0xff,
            Generic(b) => b,
        }
    }

    pub fn title(&self) -> String {
        use DeviceCategory::*;
        match self {
            GeneralizedControllers => "Generalized Controllers".into(),
            DimmableLightingControl => "Dimmable Lighting Control".into(),
            SwitchedLightingControl => "Switched Lighting Control".into(),
            NetworkBridges => "Network Bridges".into(),
            IrrigationControl => "Irrigation Control".into(),
            ClimateControl => "Climate Control".into(),
            PoolAndSpaControl => "Pool and Spa Control".into(),
            SensorsAndActuators => "Sensors and Actuators".into(),
            HomeEntertainment => "Home Entertainment".into(),
            EnergyManagement => "Energy Management".into(),
            BuiltInApplianceControl => "Built-In Appliance Control".into(),
            Plumbing => "Plumbing".into(),
            Communication => "Communication".into(),
            ComputerControl => "Computer Control".into(),
            WindowCoverings => "Window Coverings".into(),
            AccessControl => "Access Control".into(),
            SecurityHealthSafety => "Security, Health, Safety".into(),
            Surveillance => "Surveillance".into(),
            Automotive => "Automotive".into(),
            PetCare => "Pet Care".into(),
            Toys => "Toys".into(),
            Timekeeping => "Timekeeping".into(),
            Holiday => "Holiday".into(),
            Unassigned => "Unassigned".into(),
            Generic(b) => format!("Unknown device category ({:02x})", b),
        }
    }

    pub fn examples(&self) -> &'static str {
        use DeviceCategory::*;
        match self {
            GeneralizedControllers => "ControLinc, RemoteLinc, SignaLinc, etc",
            DimmableLightingControl => "Dimmable Light Switches, Dimmable Plug-In Module",
            SwitchedLightingControl => "Relay Switches, Relay Plug-In Module",
            NetworkBridges => "PowerLinc Controllers, TRex, Lonworks, ZigBee, etc",
            IrrigationControl => "Irrigation Management, Sprinkler Controller",
            ClimateControl => {
                "Heating, Air conditioning, Exhausts Fans, Ceiling Fans, Indoor Air Quality"
            }
            PoolAndSpaControl => "Pumps, Heaters, Chemical",
            SensorsAndActuators => "Sensors, Contact Closure",
            HomeEntertainment => "Audio/Video Equipment",
            EnergyManagement => "Electricity, Water, Gas Consumption, Leak Monitor",
            BuiltInApplianceControl => "White Goods, Brown Goods",
            Plumbing => "Faucets, Showers, Toilets",
            Communication => "Telephone System Controls, Intercom",
            ComputerControl => "PC On/Off, UPS Control, App Activation, Remote Mouse, Keyboard",
            WindowCoverings => "Drapes, Blinds, Awnings",
            AccessControl => "Automatic Doors, Gates, Windows, Locks",
            SecurityHealthSafety => "Door and Window Sensors, Motion Sensors, Scales",
            Surveillance => "Video Camera Control, Time-lapse Recorders, Security System Link",
            Automotive => "Remote Starters, Car Alarms, Car Door Locks",
            PetCare => "Pet Feeders, Trackers",
            Toys => "Model Trains, Robots",
            Timekeeping => "Clocks, Alarms, Timers",
            Holiday => "Christmas Lights, Display",
            Unassigned => "For devices that will be assigned a DevCat and SubCat by software",
            Generic(_) => "",
        }
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (0x{:02x})", self.title(), self.to_byte())
    }
}

/// A device subcategory. Known subcategories are resolved against the table
/// for their owning category; anything else (including categories with no
/// catalogued subcategory table) becomes `Generic(value)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceSubcategory {
    Known {
        category: DeviceCategory,
        value: u8,
    },
    Generic(u8),
}

impl DeviceSubcategory {
    pub fn parse(category: DeviceCategory, value: u8) -> Self {
        if subcategory_title(category, value).is_some() {
            DeviceSubcategory::Known { category, value }
        } else {
            DeviceSubcategory::Generic(value)
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            DeviceSubcategory::Known { value, .. } => value,
            DeviceSubcategory::Generic(value) => value,
        }
    }

    pub fn title(&self) -> String {
        match *self {
            DeviceSubcategory::Known { category, value } => subcategory_title(category, value)
                .expect("Known variant always resolves a title")
                .to_string(),
            DeviceSubcategory::Generic(value) => format!("Unknown subcategory ({:02x})", value),
        }
    }
}

/// Parses both bytes of a device-category pair at once, as delivered in the
/// wire protocol (category byte, then subcategory byte).
pub fn parse_device_categories(value: [u8; 2]) -> (DeviceCategory, DeviceSubcategory) {
    let category = DeviceCategory::from_byte(value[0]);
    let subcategory = DeviceSubcategory::parse(category, value[1]);
    (category, subcategory)
}

fn subcategory_title(category: DeviceCategory, value: u8) -> Option<&'static str> {
    use DeviceCategory::*;
    match category {
        GeneralizedControllers => Some(match value {
            0x04 => "ControLinc [2430]",
            0x05 => "RemoteLinc [2440]",
            0x06 => "Icon Tabletop Controller [2830]",
            0x09 => "SignaLinc RF Signal Enhancer",
            0x0a => "Balboa Instruments Poolux LCD Controller",
            0x0b => "Access Point",
            0x0c => "IES Color Touchscreen",
            _ => return None,
        }),
        DimmableLightingControl => Some(match value {
            0x00 => "LampLinc V2 [2456D3]",
            0x01 => "SwitchLinc V2 Dimmer 600W [2476D]",
            0x02 => "In-LineLinc Dimmer [2475D]",
            0x03 => "Icon Switch Dimmer [2876D]",
            0x04 => "SwitchLinc V2 Dimmer 1000W [2476DH]",
            0x06 => "LampLinc 2-Pin [2456D2]",
            0x07 => "Icon LampLinc V2 2-Pin [2456D2]",
            0x09 => "KeypadLinc Dimmer [2486D]",
            0x0a => "Icon In-Wall Controller [2886D]",
            0x0d => "SocketLinc [2454D]",
            0x13 => "Icon SwitchLinc Dimmer for Lixar/Bell Canada [2676D-B]",
            0x17 => "ToggleLinc Dimmer [2466D]",
            _ => return None,
        }),
        SwitchedLightingControl => Some(match value {
            0x09 => "ApplianceLinc [2456S3]",
            0x0a => "SwitchLinc Relay [2476S]",
            0x0b => "Icon On Off Switch [2876S]",
            0x0c => "Icon Appliance Adapter [2856S3]",
            0x0d => "ToggleLinc Relay [2466S]",
            0x0e => "SwitchLinc Relay Countdown Timer [2476ST]",
            0x10 => "In-LineLinc Relay [2475D]",
            0x13 => "Icon SwitchLinc Relay for Lixar/Bell Canada [2676R-B]",
            _ => return None,
        }),
        NetworkBridges => Some(match value {
            0x01 => "PowerLinc Serial [2414S]",
            0x02 => "PowerLinc USB [2414U]",
            0x03 => "Icon PowerLinc Serial [2814S]",
            0x04 => "Icon PowerLinc USB [2814U]",
            0x05 => "Smartlabs Power Line Modem Serial [2412S]",
            _ => return None,
        }),
        IrrigationControl => Some(match value {
            0x00 => "Compacta EZRain Sprinkler Controller",
            _ => return None,
        }),
        ClimateControl => Some(match value {
            0x00 => "Broan SMSC080 Exhaust Fan",
            0x01 => "Compacta EZTherm",
            0x02 => "Broan SMSC110 Exhaust Fan",
            0x03 => "Venstar RF Thermostat Module",
            0x04 => "Compacta EZThermx Thermostat",
            _ => return None,
        }),
        PoolAndSpaControl => Some(match value {
            0x00 => "Compacta EZPool",
            _ => return None,
        }),
        SensorsAndActuators => Some(match value {
            0x00 => "IOLinc",
            _ => return None,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_category_roundtrips() {
        let cat = DeviceCategory::from_byte(0x03);
        assert_eq!(cat, DeviceCategory::NetworkBridges);
        assert_eq!(cat.to_byte(), 0x03);
        assert_eq!(cat.title(), "Network Bridges");
    }

    #[test]
    fn unknown_category_is_generic() {
        let cat = DeviceCategory::from_byte(0x42);
        assert_eq!(cat, DeviceCategory::Generic(0x42));
        assert!(cat.title().contains("42"));
    }

    #[test]
    fn known_subcategory_title() {
        let (cat, sub) = parse_device_categories([0x03, 0x01]);
        assert_eq!(cat, DeviceCategory::NetworkBridges);
        assert_eq!(sub.title(), "PowerLinc Serial [2414S]");
    }

    #[test]
    fn unknown_subcategory_is_generic() {
        let (_, sub) = parse_device_categories([0x03, 0xaa]);
        assert_eq!(sub, DeviceSubcategory::Generic(0xaa));
    }

    #[test]
    fn category_with_no_table_yields_generic_subcategory() {
        let (_, sub) = parse_device_categories([0x08, 0x01]);
        assert_eq!(sub, DeviceSubcategory::Generic(0x01));
    }
}
