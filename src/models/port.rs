use indexmap::IndexMap;
use std::collections::HashMap;

/// A single named I/O port (register) of a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortEntry {
    pub name: String,
    pub address: u64,

    /// Free text after the address on the defining line
    pub comment: Option<String>,

    /// Named bits of the register, in definition order (`PORT.BIT n` lines)
    pub bits: IndexMap<String, u8>,
}

impl PortEntry {
    pub fn new(name: impl Into<String>, address: u64) -> Self {
        Self {
            name: name.into(),
            address,
            comment: None,
            bits: IndexMap::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Memory area declared by an `area CLASS NAME START:END` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryArea {
    pub class: String,
    pub name: String,
    pub start: u64,
    pub end: u64,
    pub comment: Option<String>,
}

/// Entry point (usually an interrupt vector) declared by an `entry NAME ADDR` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
    pub address: u64,
    pub comment: Option<String>,
}

/// One device section of a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceDescription {
    pub name: String,
    pub ports: Vec<PortEntry>,
    pub areas: Vec<MemoryArea>,
    pub entries: Vec<EntryPoint>,

    /// `KEY=VALUE` lines of the section
    pub parameters: IndexMap<String, String>,
}

impl DeviceDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn port_mut(&mut self, name: &str) -> Option<&mut PortEntry> {
        self.ports.iter_mut().find(|p| p.name == name)
    }
}

/// Every device described by one configuration file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceCatalog {
    pub devices: IndexMap<String, DeviceDescription>,

    /// Device named by the `.default` directive, if any
    pub default_device: Option<String>,
}

impl DeviceCatalog {
    pub fn get(&self, name: &str) -> Option<&DeviceDescription> {
        self.devices.get(name)
    }

    pub fn device_names(&self) -> impl Iterator<Item = &str> {
        self.devices.keys().map(String::as_str)
    }

    /// The `.default` device when it exists in the file, otherwise the first device.
    pub fn preferred_device(&self) -> Option<&DeviceDescription> {
        self.default_device
            .as_deref()
            .and_then(|name| self.devices.get(name))
            .or_else(|| self.devices.values().next())
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Lookup table of the ports of the selected device.
///
/// Entries keep their file order. Several ports may share an address; the one
/// inserted first answers [`lookup`](Self::lookup) for that address.
#[derive(Debug, Clone, Default)]
pub struct PortTable {
    entries: IndexMap<String, PortEntry>,
    by_address: HashMap<u64, usize>,
}

impl PortTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the table for one device.
    pub fn from_device(device: &DeviceDescription) -> Self {
        let mut table = Self::empty();
        for port in &device.ports {
            table.insert(port.clone());
        }
        table
    }

    /// Add a port. Returns false and keeps the existing entry when the name
    /// is already taken.
    pub fn insert(&mut self, port: PortEntry) -> bool {
        if self.entries.contains_key(&port.name) {
            return false;
        }
        let address = port.address;
        let (index, _) = self.entries.insert_full(port.name.clone(), port);
        self.by_address.entry(address).or_insert(index);
        true
    }

    pub fn lookup(&self, address: u64) -> Option<&PortEntry> {
        self.by_address
            .get(&address)
            .and_then(|&index| self.entries.get_index(index))
            .map(|(_, port)| port)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&PortEntry> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PortEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
