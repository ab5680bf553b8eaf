//! Command/telemetry link and real-time control logic for a two-node robot.
//!
//! The Body runs a cooperative control loop: it frames serial input into
//! command lines, drives two motors through a ramp/boost state machine,
//! samples the IMU and streams telemetry back. The Head decodes that
//! telemetry, watches for falls and lifts, and issues motion commands.

pub mod body;
pub mod config;
pub mod head;
pub mod imu;
pub mod link;
pub mod messages;
pub mod motor;
pub mod protocol;
pub mod runtime;
pub mod safety;
