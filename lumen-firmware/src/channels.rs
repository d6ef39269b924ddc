//! Cross-core communication channels
//!
//! Core 1 publishes power requests; the render loop on core 0 drains them
//! without blocking at the start of each tick.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use lumen_core::PowerRequest;

/// Channel capacity for power requests
const POWER_CHANNEL_SIZE: usize = 4;

/// Brightness and on/off requests from the power policy
pub static POWER_CHANNEL: Channel<CriticalSectionRawMutex, PowerRequest, POWER_CHANNEL_SIZE> =
    Channel::new();

