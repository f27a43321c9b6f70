//! Motor physics model.
//!
//! Field-oriented current control on a fixed rotor+load inertia:
//!
//! ```text
//! I      = clamp(I_desired, ±I_limit)
//! τ_out  = I · Kt_motor · gear_ratio
//! a      = τ_out / J
//! v     += a·dt ;  x += v·dt ;  v += (−b·v / J)·dt
//! T      = T_ambient + I²·R · R_th
//! ```

use mech_common::actuator::{ActuatorConfig, ActuatorRequest};

/// Motor torque constant [N·m/A].
pub const MOTOR_KT: f64 = 0.1;
/// Winding resistance [Ω].
pub const MOTOR_RESISTANCE: f64 = 0.1;
/// Rotor inertia [kg·m²].
pub const ROTOR_INERTIA: f64 = 0.001;
/// Reflected load inertia [kg·m²].
pub const LOAD_INERTIA: f64 = 0.1;
/// Viscous damping [N·m·s/rad].
pub const DAMPING: f64 = 0.1;
/// Thermal resistance [°C/W].
pub const THERMAL_RESISTANCE: f64 = 0.1;
/// Ambient temperature [°C].
pub const AMBIENT_TEMPERATURE: f64 = 25.0;

/// Integral accumulates only while |position error| is below this.
const INTEGRAL_WINDOW: f64 = 0.1;
/// Integral clamp.
const INTEGRAL_LIMIT: f64 = 1.0;

/// State of one simulated motor, in output units.
#[derive(Debug, Clone, PartialEq)]
pub struct MotorModel {
    /// Output position.
    pub position: f64,
    /// Output velocity.
    pub velocity: f64,
    /// Output acceleration of the last step.
    pub acceleration: f64,
    /// Applied current of the last step [A].
    pub current: f64,
    /// Winding temperature [°C].
    pub temperature: f64,
    integral_error: f64,
}

impl Default for MotorModel {
    fn default() -> Self {
        Self {
            position: 0.0,
            velocity: 0.0,
            acceleration: 0.0,
            current: 0.0,
            temperature: AMBIENT_TEMPERATURE,
            integral_error: 0.0,
        }
    }
}

impl MotorModel {
    /// Fresh model at rest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to rest at the origin.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Current the on-board controller asks for to track `request`.
    ///
    /// Position mode runs PID on the position error with velocity error as the
    /// derivative term. Velocity mode runs P on velocity error plus `kv`/`ka`
    /// feedforward. Both add `feedforward · kt`.
    pub fn desired_current(&mut self, config: &ActuatorConfig, request: &ActuatorRequest, dt: f64) -> f64 {
        let velocity_error = request.target_velocity - self.velocity;
        let ff = request.feedforward * config.kt;

        match request.target_position {
            Some(target) => {
                let position_error = target - self.position;
                if position_error.abs() < INTEGRAL_WINDOW {
                    self.integral_error += position_error * dt;
                } else {
                    self.integral_error = 0.0;
                }
                self.integral_error = self.integral_error.clamp(-INTEGRAL_LIMIT, INTEGRAL_LIMIT);

                config.kp * position_error
                    + config.ki * self.integral_error
                    + config.kd * velocity_error
                    + ff
            }
            None => {
                self.integral_error = 0.0;
                config.kp * velocity_error
                    + config.kv * request.target_velocity
                    + config.ka * request.target_acceleration
                    + ff
            }
        }
    }

    /// Advance the model by `dt` seconds with `desired_current`.
    pub fn step(&mut self, config: &ActuatorConfig, desired_current: f64, dt: f64) {
        self.current = match config.current_limit() {
            Some(limit) => desired_current.clamp(-limit, limit),
            None => desired_current,
        };

        let inertia = ROTOR_INERTIA + LOAD_INERTIA;
        let torque = self.current * MOTOR_KT * config.gear_ratio;

        self.acceleration = torque / inertia;
        self.velocity += self.acceleration * dt;
        self.position += self.velocity * dt;
        self.velocity += (-DAMPING * self.velocity / inertia) * dt;

        let power_loss = self.current * self.current * MOTOR_RESISTANCE;
        self.temperature = AMBIENT_TEMPERATURE + power_loss * THERMAL_RESISTANCE;
    }
}
