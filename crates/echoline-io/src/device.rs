//! Device catalog: enumeration, lookup, and line opening.
//!
//! A [`DeviceCatalog`] is the only thing the processor needs from a platform
//! audio subsystem. Lookup is by name, **case-insensitive and exact**: a name
//! that matches no entry is [`Error::DeviceNotFound`], never a fuzzy guess.

use crate::{AudioFormat, CaptureLine, Error, PlaybackLine, Result};

/// Description of one audio endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Human-readable device name, the lookup key.
    pub name: String,
    /// Vendor or host API that provides the device.
    pub vendor: String,
    /// Free-form description of the endpoint.
    pub description: String,
    /// Driver or API version, `"Unknown Version"` when not reported.
    pub version: String,
    /// Whether the device supports audio input.
    pub is_input: bool,
    /// Whether the device supports audio output.
    pub is_output: bool,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
}

impl DeviceInfo {
    /// Whether this device can be opened in the given direction.
    pub fn supports(&self, direction: Direction) -> bool {
        match direction {
            Direction::Capture => self.is_input,
            Direction::Playback => self.is_output,
        }
    }

    /// Case-insensitive exact name comparison.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

/// Direction of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Recording from the device.
    Capture,
    /// Playing to the device.
    Playback,
}

impl Direction {
    /// Lower-case label used in messages.
    pub fn label(self) -> &'static str {
        match self {
            Direction::Capture => "input",
            Direction::Playback => "output",
        }
    }
}

/// Source of audio devices and the lines they open.
///
/// ## Implementing a Custom Catalog
///
/// ```rust,ignore
/// use echoline_io::{AudioFormat, CaptureLine, DeviceCatalog, DeviceInfo, PlaybackLine, Result};
///
/// struct MyCatalog { /* ... */ }
///
/// impl DeviceCatalog for MyCatalog {
///     fn backend_name(&self) -> &str { "my-backend" }
///
///     fn devices(&self) -> Result<Vec<DeviceInfo>> {
///         // Enumerate endpoints
///         todo!()
///     }
///
///     fn open_capture(&self, name: &str, format: AudioFormat) -> Result<Box<dyn CaptureLine>> {
///         // Resolve `name`, open a mono 16-bit line at `format.sample_rate`
///         todo!()
///     }
///
///     fn open_playback(&self, name: &str, format: AudioFormat) -> Result<Box<dyn PlaybackLine>> {
///         todo!()
///     }
/// }
/// ```
pub trait DeviceCatalog {
    /// Human-readable name of the backend (e.g., "cpal", "memory").
    fn backend_name(&self) -> &str;

    /// Enumerate every available device.
    fn devices(&self) -> Result<Vec<DeviceInfo>>;

    /// Open a capture line on the device called `name`.
    ///
    /// Fails with [`Error::DeviceNotFound`] or [`Error::LineUnavailable`].
    fn open_capture(&self, name: &str, format: AudioFormat) -> Result<Box<dyn CaptureLine>>;

    /// Open a playback line on the device called `name`.
    ///
    /// Fails with [`Error::DeviceNotFound`] or [`Error::LineUnavailable`].
    fn open_playback(&self, name: &str, format: AudioFormat) -> Result<Box<dyn PlaybackLine>>;
}

/// List all devices of `catalog`.
pub fn list_devices<C: DeviceCatalog + ?Sized>(catalog: &C) -> Result<Vec<DeviceInfo>> {
    catalog.devices()
}

/// Resolve a device by case-insensitive exact name.
///
/// # Example
///
/// ```rust
/// use echoline_io::{Error, find_device};
/// use echoline_io::memory::MemoryCatalog;
///
/// let catalog = MemoryCatalog::new().with_capture("Built-in Microphone", Vec::new());
/// assert!(find_device(&catalog, "built-in microphone").is_ok());
/// assert!(matches!(find_device(&catalog, "Built-in"), Err(Error::DeviceNotFound(_))));
/// ```
pub fn find_device<C: DeviceCatalog + ?Sized>(catalog: &C, name: &str) -> Result<DeviceInfo> {
    let devices = catalog.devices()?;
    match_device(&devices, name, None).cloned()
}

/// Resolve a capture-capable device by case-insensitive exact name.
pub fn find_input_device<C: DeviceCatalog + ?Sized>(catalog: &C, name: &str) -> Result<DeviceInfo> {
    let devices = catalog.devices()?;
    match_device(&devices, name, Some(Direction::Capture)).cloned()
}

/// Resolve a playback-capable device by case-insensitive exact name.
pub fn find_output_device<C: DeviceCatalog + ?Sized>(
    catalog: &C,
    name: &str,
) -> Result<DeviceInfo> {
    let devices = catalog.devices()?;
    match_device(&devices, name, Some(Direction::Playback)).cloned()
}

/// First device whose name matches `name` exactly, ignoring case, and that
/// supports `direction` when one is given.
pub(crate) fn match_device<'a>(
    devices: &'a [DeviceInfo],
    name: &str,
    direction: Option<Direction>,
) -> Result<&'a DeviceInfo> {
    devices
        .iter()
        .filter(|d| direction.is_none_or(|dir| d.supports(dir)))
        .find(|d| d.name_matches(name))
        .ok_or_else(|| match direction {
            Some(dir) => {
                Error::DeviceNotFound(format!("no {} device named '{name}'", dir.label()))
            }
            None => Error::DeviceNotFound(format!("no device named '{name}'")),
        })
}
