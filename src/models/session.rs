use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Reserved device name meaning "no device selected".
pub const NO_DEVICE: &str = "NONE";

bitflags! {
    /// Which parts of a device description the host should apply.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResponseFlags: u32 {
        /// Create segments for the `area` lines
        const AREA = 0x1;
        /// Name the port addresses
        const PORT = 0x2;
        /// Create entry points for the `entry` lines
        const INTERRUPT = 0x4;
        const ALL = Self::AREA.bits() | Self::PORT.bits() | Self::INTERRUPT.bits();
    }
}

impl ResponseFlags {
    /// Flags from a stored or configured mask, warning about bits no flag uses.
    pub fn from_mask(mask: u32) -> Self {
        let unknown = Self::unknown_bits(mask);
        if unknown != 0 {
            tracing::warn!(
                "Ignoring unknown response flag bits {:#x} in mask {:#x}",
                unknown,
                mask
            );
        }
        Self::from_bits_truncate(mask)
    }

    pub fn unknown_bits(mask: u32) -> u32 {
        mask & !Self::all().bits()
    }
}

impl Default for ResponseFlags {
    fn default() -> Self {
        Self::ALL
    }
}

/// Persisted device choice of one extension namespace.
///
/// Overwritten on every successful load and read back when the extension
/// starts in a later process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSession {
    pub device_name: String,

    #[serde(with = "flags_as_bits")]
    pub response_flags: ResponseFlags,

    /// Configuration file the device came from, relative to the config root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_file: Option<String>,
}

impl DeviceSession {
    pub fn new(device_name: impl Into<String>, response_flags: ResponseFlags) -> Self {
        Self {
            device_name: device_name.into(),
            response_flags,
            config_file: None,
        }
    }

    pub fn with_config_file(mut self, config_file: impl Into<String>) -> Self {
        self.config_file = Some(config_file.into());
        self
    }

    /// True unless the record holds the "no device" sentinel.
    pub fn has_device(&self) -> bool {
        is_real_device(&self.device_name)
    }
}

pub fn is_real_device(name: &str) -> bool {
    !name.is_empty() && name != NO_DEVICE
}

// Stored as the plain integer mask
mod flags_as_bits {
    use super::ResponseFlags;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(flags: &ResponseFlags, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(flags.bits())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ResponseFlags, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Ok(ResponseFlags::from_mask(bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_flags_default_is_all() {
        assert_eq!(ResponseFlags::default(), ResponseFlags::ALL);
        assert_eq!(ResponseFlags::ALL.bits(), 7);
    }

    #[test]
    fn test_mask_keeps_known_bits() {
        assert_eq!(
            ResponseFlags::from_mask(3),
            ResponseFlags::AREA | ResponseFlags::PORT
        );
        assert_eq!(ResponseFlags::unknown_bits(3), 0);

        assert_eq!(ResponseFlags::from_mask(15), ResponseFlags::ALL);
        assert_eq!(ResponseFlags::unknown_bits(15), 0x8);
        assert_eq!(ResponseFlags::unknown_bits(0xff), 0xf8);
    }

    #[test]
    fn test_sentinel_is_not_a_device() {
        assert!(!DeviceSession::new(NO_DEVICE, ResponseFlags::ALL).has_device());
        assert!(!DeviceSession::new("", ResponseFlags::ALL).has_device());
        assert!(DeviceSession::new("ATmega8", ResponseFlags::PORT).has_device());
    }

    #[test]
    fn test_flags_serialize_as_integer() {
        let session = DeviceSession::new("ATmega8", ResponseFlags::AREA | ResponseFlags::PORT);
        let yaml = serde_yaml_ng::to_string(&session).unwrap();

        assert!(yaml.contains("response_flags: 3"));
        assert!(!yaml.contains("config_file"));
    }

    #[test]
    fn test_record_without_config_file_loads() {
        let yaml = "device_name: PIC16F84\nresponse_flags: 15\n";
        let session: DeviceSession = serde_yaml_ng::from_str(yaml).unwrap();

        assert_eq!(session.device_name, "PIC16F84");
        // Unknown bits are dropped
        assert_eq!(session.response_flags, ResponseFlags::ALL);
        assert!(session.config_file.is_none());
    }
}
