//! Power policy task (core 1)
//!
//! Dims the backlight after a period without button presses, then puts the
//! panel to sleep. Any press wakes it at full brightness.
//!
//! ```text
//!            press                 dim timeout            off timeout
//!   Active ◄──────── Dimmed/Off    Active ──────► Dimmed ──────► Off
//! ```

use defmt::*;
use embassy_rp::gpio::Input;
use embassy_time::{with_timeout, Duration, Instant};

use lumen_core::PowerRequest;

use crate::channels::POWER_CHANNEL;

/// How often the policy re-evaluates without input
const POLL_INTERVAL_MS: u64 = 250;

/// Power levels the policy moves between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerLevel {
    Active,
    Dimmed,
    Off,
}

/// Policy inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerEvent {
    Activity,
    DimTimeout,
    OffTimeout,
}

impl PowerLevel {
    pub fn transition(self, event: PowerEvent) -> Self {
        use PowerEvent::*;
        use PowerLevel::*;

        match (self, event) {
            (_, Activity) => Active,
            (Active, DimTimeout) => Dimmed,
            (Dimmed, OffTimeout) => Off,
            (level, _) => level,
        }
    }
}

/// Inactivity-driven backlight policy
pub struct IdlePolicy {
    dim_after_ms: u64,
    off_after_ms: u64,
    active_brightness: u8,
    dim_brightness: u8,
    last_activity_ms: u64,
    level: PowerLevel,
}

impl IdlePolicy {
    /// # Arguments
    /// * `dim_after_ms` - Idle time before dimming
    /// * `off_after_ms` - Idle time before sleeping; at least `dim_after_ms`
    pub const fn new(dim_after_ms: u64, off_after_ms: u64, active_brightness: u8, dim_brightness: u8) -> Self {
        Self {
            dim_after_ms,
            off_after_ms: if off_after_ms < dim_after_ms {
                dim_after_ms
            } else {
                off_after_ms
            },
            active_brightness,
            dim_brightness,
            last_activity_ms: 0,
            level: PowerLevel::Active,
        }
    }

    pub fn level(&self) -> PowerLevel {
        self.level
    }

    /// The request matching the current level
    pub fn request(&self) -> PowerRequest {
        match self.level {
            PowerLevel::Active => PowerRequest {
                on: true,
                brightness: self.active_brightness,
            },
            PowerLevel::Dimmed => PowerRequest {
                on: true,
                brightness: self.dim_brightness,
            },
            PowerLevel::Off => PowerRequest {
                on: false,
                brightness: 0,
            },
        }
    }

    /// Record a button press; returns a request if the level changed
    pub fn activity(&mut self, now_ms: u64) -> Option<PowerRequest> {
        self.last_activity_ms = now_ms;
        self.apply(PowerEvent::Activity)
    }

    /// Advance time; returns a request if the level changed
    pub fn update(&mut self, now_ms: u64) -> Option<PowerRequest> {
        let idle = now_ms.saturating_sub(self.last_activity_ms);
        if idle >= self.off_after_ms && self.level == PowerLevel::Dimmed {
            return self.apply(PowerEvent::OffTimeout);
        }
        if idle >= self.dim_after_ms {
            return self.apply(PowerEvent::DimTimeout);
        }
        None
    }

    fn apply(&mut self, event: PowerEvent) -> Option<PowerRequest> {
        let next = self.level.transition(event);
        if next == self.level {
            return None;
        }
        self.level = next;
        Some(self.request())
    }
}

/// Power policy task - watches the wake button and publishes requests
#[embassy_executor::task]
pub async fn power_task(mut button: Input<'static>, mut policy: IdlePolicy) {
    info!("Power task started");

    POWER_CHANNEL.send(policy.request()).await;

    loop {
        let pressed = with_timeout(
            Duration::from_millis(POLL_INTERVAL_MS),
            button.wait_for_falling_edge(),
        )
        .await
        .is_ok();

        let now_ms = Instant::now().as_millis();
        let request = if pressed {
            policy.activity(now_ms)
        } else {
            policy.update(now_ms)
        };

        if let Some(request) = request {
            info!("Power: {} (brightness {})", policy.level(), request.brightness);
            POWER_CHANNEL.send(request).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> IdlePolicy {
        IdlePolicy::new(10_000, 30_000, 80, 20)
    }

    #[test]
    fn test_starts_active() {
        let p = policy();
        assert_eq!(p.level(), PowerLevel::Active);
        assert_eq!(p.request(), PowerRequest { on: true, brightness: 80 });
    }

    #[test]
    fn test_dims_then_sleeps() {
        let mut p = policy();
        assert_eq!(p.update(9_999), None);
        assert_eq!(p.update(10_000), Some(PowerRequest { on: true, brightness: 20 }));
        assert_eq!(p.update(20_000), None);
        assert_eq!(p.update(30_000), Some(PowerRequest { on: false, brightness: 0 }));
        assert_eq!(p.update(60_000), None);
    }

    #[test]
    fn test_long_gap_steps_through_dimmed() {
        let mut p = policy();
        // One poll after a long stall still dims first, then sleeps
        assert_eq!(p.update(100_000).map(|r| r.on), Some(true));
        assert_eq!(p.update(100_250).map(|r| r.on), Some(false));
    }

    #[test]
    fn test_activity_wakes_and_restarts_timer() {
        let mut p = policy();
        p.update(10_000);
        p.update(30_000);
        assert_eq!(p.level(), PowerLevel::Off);

        assert_eq!(p.activity(31_000), Some(PowerRequest { on: true, brightness: 80 }));
        assert_eq!(p.update(40_999), None);
        assert_eq!(p.update(41_000).map(|r| r.brightness), Some(20));
    }

    #[test]
    fn test_activity_while_active_is_silent() {
        let mut p = policy();
        assert_eq!(p.activity(500), None);
    }

    #[test]
    fn test_transitions() {
        use PowerEvent::*;
        use PowerLevel::*;
        assert_eq!(Active.transition(OffTimeout), Active);
        assert_eq!(Dimmed.transition(DimTimeout), Dimmed);
        assert_eq!(Off.transition(Activity), Active);
    }
}
