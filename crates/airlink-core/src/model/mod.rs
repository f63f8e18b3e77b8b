// ── Domain model ──

pub mod device_id;
pub mod status;

pub use device_id::DeviceId;
pub use status::{
    FILTER_SERVICE_LIFE_DAYS, FilterLife, OperatingMode, PowerState, StatusSnapshot,
};
