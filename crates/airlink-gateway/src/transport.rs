// ── Wire-level device addressing ──
//
// The transport selector and address tuple handed to the control script
// as positional arguments. The core crate re-exports these types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Transport variant the control script should use to reach the device.
///
/// Both are the same protocol family; `Coaps` is the encrypted variant
/// and the default for current firmware.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Transport {
    /// Plaintext CoAP (older firmware).
    Coap,
    /// Encrypted CoAP.
    #[default]
    Coaps,
}

/// Everything the gateway needs to address one device.
///
/// Built by the session layer from the device configuration; the `id` is
/// only used by the managed invocation style (the interface script keys
/// its own bookkeeping on it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAddress {
    pub id: String,
    pub host: String,
    pub transport: Transport,
}
