// Motor control for the Body's two DC motors
//
// Provides:
// - H-bridge output with deadband compensation over embedded-hal PWM legs
// - Ramp / boost state machine with Rotation-Drive mutual exclusion

mod control;
pub mod output;

pub use control::{Motor, MotorControl, MotorState, MotorTuning};
pub use output::{Actuator, HBridge, OutputError, SimLeg};
