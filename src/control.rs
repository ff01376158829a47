use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::fitness_machine::{
    self, IndoorBikeSimulationParameters, MachineStatusMessage, MachineStatusOpCode,
};

/// Outcome of a requested control-point write
#[derive(Debug, Clone, PartialEq)]
pub enum WriteDecision {
    /// Write these bytes to the control point
    Send(Vec<u8>),
    /// Suppressed: an equivalent write is already awaiting its status echo
    AwaitingEcho,
    /// Suppressed: the machine already reports the requested target
    AlreadySet,
}

impl WriteDecision {
    /// Bytes to send, if the write was not suppressed
    #[must_use]
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Self::Send(bytes) => Some(bytes),
            Self::AwaitingEcho | Self::AlreadySet => None,
        }
    }
}

/// Tuning knobs for the control-point wrappers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Tolerance for floating-point target comparison
    pub epsilon: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            epsilon: f64::EPSILON,
        }
    }
}

/// Pending-write de-duplication for the fitness machine control point
///
/// Each target kind moves Idle -> PendingWrite on a sent command and back to
/// Idle when the matching machine-status event echoes the change. While a
/// write is pending, or while the machine already reports the requested
/// value, further writes of the same target are suppressed. Integer targets
/// compare exactly; resistance level and simulation parameters compare
/// within the configured epsilon.
#[derive(Debug, Clone, Default)]
pub struct TargetWriteGate {
    config: ControlConfig,
    pending_power: Option<i16>,
    pending_resistance: Option<f64>,
    pending_sim: Option<IndoorBikeSimulationParameters>,
    acked_power: Option<i16>,
    acked_resistance: Option<f64>,
    acked_sim: Option<IndoorBikeSimulationParameters>,
}

impl TargetWriteGate {
    /// Create a gate with the given comparison config
    #[must_use]
    pub fn new(config: ControlConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Request a target power write
    pub fn set_target_power(&mut self, watts: i16) -> WriteDecision {
        if self.pending_power.is_some() {
            debug!(watts, "target power write suppressed, echo pending");
            return WriteDecision::AwaitingEcho;
        }
        if self.acked_power == Some(watts) {
            debug!(watts, "target power write suppressed, already set");
            return WriteDecision::AlreadySet;
        }
        self.pending_power = Some(watts);
        WriteDecision::Send(fitness_machine::set_target_power(watts))
    }

    /// Request a target resistance level write
    pub fn set_target_resistance_level(&mut self, level: f64) -> WriteDecision {
        if self.pending_resistance.is_some() {
            debug!(level, "resistance write suppressed, echo pending");
            return WriteDecision::AwaitingEcho;
        }
        if let Some(acked) = self.acked_resistance {
            if (acked - level).abs() <= self.config.epsilon {
                debug!(level, "resistance write suppressed, already set");
                return WriteDecision::AlreadySet;
            }
        }
        self.pending_resistance = Some(level);
        WriteDecision::Send(fitness_machine::set_target_resistance_level(level))
    }

    /// Request a simulation parameter write
    pub fn set_simulation_parameters(
        &mut self,
        params: IndoorBikeSimulationParameters,
    ) -> WriteDecision {
        if self.pending_sim.is_some() {
            debug!("simulation write suppressed, echo pending");
            return WriteDecision::AwaitingEcho;
        }
        if let Some(acked) = &self.acked_sim {
            if acked.approx_eq(&params, self.config.epsilon) {
                debug!("simulation write suppressed, already set");
                return WriteDecision::AlreadySet;
            }
        }
        self.pending_sim = Some(params);
        WriteDecision::Send(fitness_machine::set_indoor_bike_simulation_parameters(
            &params,
        ))
    }

    /// Feed a decoded machine-status event into the gate
    ///
    /// The matching status echo clears the pending state and records the
    /// machine's view of the target for future suppression.
    pub fn machine_status_received(&mut self, message: &MachineStatusMessage) {
        match message.op_code {
            MachineStatusOpCode::TargetPowerChanged => {
                self.pending_power = None;
                self.acked_power = message.target_power;
            }
            MachineStatusOpCode::TargetResistanceLevelChanged => {
                self.pending_resistance = None;
                self.acked_resistance = message.target_resistance_level;
            }
            MachineStatusOpCode::IndoorBikeSimulationParametersChanged => {
                self.pending_sim = None;
                self.acked_sim = message.target_sim_parameters;
            }
            _ => {}
        }
    }

    /// Forget all pending and acknowledged state, e.g. on reconnect
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }
}

/// Minimum-interval rate limiter for brake targets
///
/// Some trainers need settling time between resistance writes; a write
/// inside the interval is held as the latest pending target and released by
/// [`ErgWriteLimiter::poll`] once the interval has elapsed. State is an
/// explicit last-sent-at / pending-target pair; the caller supplies the
/// clock.
#[derive(Debug, Clone)]
pub struct ErgWriteLimiter {
    min_interval: Duration,
    encode: fn(u16) -> Vec<u8>,
    last_write_at: Option<Instant>,
    pending_watts: Option<u16>,
}

impl ErgWriteLimiter {
    /// Create a limiter around a vendor's ERG encode function
    #[must_use]
    pub fn new(min_interval: Duration, encode: fn(u16) -> Vec<u8>) -> Self {
        Self {
            min_interval,
            encode,
            last_write_at: None,
            pending_watts: None,
        }
    }

    /// Request an ERG target write at time `now`
    ///
    /// Returns the encoded command when the interval allows an immediate
    /// write; otherwise the target is held for a later [`Self::poll`].
    pub fn request(&mut self, watts: u16, now: Instant) -> Option<Vec<u8>> {
        if self.interval_elapsed(now) {
            self.last_write_at = Some(now);
            self.pending_watts = None;
            Some((self.encode)(watts))
        } else {
            debug!(watts, "ERG write deferred inside settle interval");
            self.pending_watts = Some(watts);
            None
        }
    }

    /// Release the held target if the interval has elapsed by `now`
    pub fn poll(&mut self, now: Instant) -> Option<Vec<u8>> {
        let watts = self.pending_watts?;
        if self.interval_elapsed(now) {
            self.last_write_at = Some(now);
            self.pending_watts = None;
            Some((self.encode)(watts))
        } else {
            None
        }
    }

    /// Drop any held target, e.g. when switching control modes
    pub fn cancel(&mut self) {
        self.pending_watts = None;
    }

    fn interval_elapsed(&self, now: Instant) -> bool {
        self.last_write_at
            .is_none_or(|last| now.duration_since(last) >= self.min_interval)
    }
}

/// One-shot unlock precondition for trainers that ignore commands until
/// unlocked
#[derive(Debug, Clone)]
pub struct UnlockGate {
    unlock: Vec<u8>,
    sent: bool,
}

impl UnlockGate {
    /// Create a gate around the vendor's unlock command bytes
    #[must_use]
    pub fn new(unlock: Vec<u8>) -> Self {
        Self {
            unlock,
            sent: false,
        }
    }

    /// Sequence a command behind the unlock
    ///
    /// The first call prepends the unlock frame; later calls pass the
    /// command through unchanged.
    pub fn prepare(&mut self, command: Vec<u8>) -> Vec<Vec<u8>> {
        if self.sent {
            vec![command]
        } else {
            self.sent = true;
            debug!("sending unlock before first trainer command");
            vec![self.unlock.clone(), command]
        }
    }

    /// Forget the unlock, e.g. after a disconnect
    pub fn reset(&mut self) {
        self.sent = false;
    }
}
