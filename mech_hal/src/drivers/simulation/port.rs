//! Simulated actuator port.
//!
//! Each `update_feedback` call advances the motor model by one fixed step
//! using the most recent request. A [`SimHandle`] shares the port's state with
//! tests and the CLI so they can watch commands and inject faults.

use std::sync::Arc;
use std::time::Duration;

use mech_common::actuator::{
    ActuatorConfig, ActuatorError, ActuatorFeedback, ActuatorPort, ActuatorRequest,
};
use mech_common::consts::CYCLE_TIME_MS;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::motor::MotorModel;

#[derive(Debug)]
struct SimShared {
    model: MotorModel,
    last_request: Option<ActuatorRequest>,
    commands_issued: u64,
    connected: bool,
    fail_feedback: bool,
    fail_commands: bool,
}

impl Default for SimShared {
    fn default() -> Self {
        Self {
            model: MotorModel::new(),
            last_request: None,
            commands_issued: 0,
            connected: true,
            fail_feedback: false,
            fail_commands: false,
        }
    }
}

/// Observer/fault-injection handle onto a [`SimulatedActuator`].
#[derive(Debug, Clone)]
pub struct SimHandle {
    shared: Arc<Mutex<SimShared>>,
}

impl SimHandle {
    /// Last request the port accepted.
    pub fn last_request(&self) -> Option<ActuatorRequest> {
        self.shared.lock().last_request
    }

    /// Number of accepted requests.
    pub fn commands_issued(&self) -> u64 {
        self.shared.lock().commands_issued
    }

    /// Snapshot of the motor model.
    pub fn model(&self) -> MotorModel {
        self.shared.lock().model.clone()
    }

    /// Simulate losing (false) or regaining (true) the device.
    pub fn set_connected(&self, connected: bool) {
        self.shared.lock().connected = connected;
    }

    /// Make `update_feedback` fail with a communication error.
    pub fn set_feedback_failure(&self, fail: bool) {
        self.shared.lock().fail_feedback = fail;
    }

    /// Make `issue_command` fail with a communication error.
    pub fn set_command_failure(&self, fail: bool) {
        self.shared.lock().fail_commands = fail;
    }

    /// Teleport the output to `position` at rest.
    pub fn set_position(&self, position: f64) {
        let mut s = self.shared.lock();
        s.model.position = position;
        s.model.velocity = 0.0;
        s.model.acceleration = 0.0;
    }
}

/// Software actuator backed by [`MotorModel`].
pub struct SimulatedActuator {
    name: String,
    config: Option<ActuatorConfig>,
    step: Duration,
    shared: Arc<Mutex<SimShared>>,
}

impl SimulatedActuator {
    /// Unconfigured simulated actuator stepping at the nominal cycle time.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: None,
            step: Duration::from_millis(CYCLE_TIME_MS),
            shared: Arc::new(Mutex::new(SimShared::default())),
        }
    }

    /// Override the simulation step.
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    /// Handle sharing this actuator's state.
    pub fn handle(&self) -> SimHandle {
        SimHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    fn config(&self) -> Result<&ActuatorConfig, ActuatorError> {
        self.config
            .as_ref()
            .ok_or_else(|| ActuatorError::NotConfigured(self.name.clone()))
    }
}

impl ActuatorPort for SimulatedActuator {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply_config(&mut self, config: &ActuatorConfig) -> Result<(), ActuatorError> {
        config.validate()?;
        let mut s = self.shared.lock();
        s.model.reset();
        s.last_request = None;
        drop(s);
        debug!(
            actuator = %self.name,
            gear_ratio = config.gear_ratio,
            current_limit = ?config.current_limit(),
            "Simulated actuator configured"
        );
        self.config = Some(config.clone());
        Ok(())
    }

    fn update_feedback(&mut self, feedback: &mut ActuatorFeedback) -> Result<(), ActuatorError> {
        let config = self.config()?;
        let dt = self.step.as_secs_f64();
        let mut s = self.shared.lock();

        if s.fail_feedback {
            return Err(ActuatorError::Communication(format!(
                "{}: feedback read failed",
                self.name
            )));
        }
        if !s.connected {
            feedback.connected = false;
            return Ok(());
        }

        let sign = if config.reversed { -1.0 } else { 1.0 };
        let desired = match s.last_request {
            Some(req) => {
                let device_req = ActuatorRequest {
                    target_position: req.target_position.map(|p| p * sign),
                    target_velocity: req.target_velocity * sign,
                    target_acceleration: req.target_acceleration * sign,
                    feedforward: req.feedforward * sign,
                };
                s.model.desired_current(config, &device_req, dt)
            }
            None => 0.0,
        };
        s.model.step(config, desired, dt);

        feedback.position = s.model.position * sign;
        feedback.velocity = s.model.velocity * sign;
        feedback.acceleration = s.model.acceleration * sign;
        feedback.current_draw = s.model.current * sign;
        feedback.temperature = s.model.temperature;
        feedback.connected = true;
        feedback.measurement_latency = self.step;

        trace!(
            actuator = %self.name,
            position = feedback.position,
            velocity = feedback.velocity,
            current = feedback.current_draw,
            "Simulated feedback"
        );
        Ok(())
    }

    fn issue_command(&mut self, request: &ActuatorRequest) -> Result<(), ActuatorError> {
        self.config()?;
        let mut s = self.shared.lock();
        if s.fail_commands {
            warn!(actuator = %self.name, "Simulated command rejected");
            return Err(ActuatorError::Communication(format!(
                "{}: command write failed",
                self.name
            )));
        }
        s.last_request = Some(*request);
        s.commands_issued += 1;
        Ok(())
    }
}
