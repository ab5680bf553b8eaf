// Ramp / boost state machine for the Rotation and Drive motors
//
// Rotation ramps toward its target a fixed step per tick. Drive starts from
// standstill with a full-power boost window, then settles directly on its
// target. Only one motor may be commanded nonzero at a time.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::output::Actuator;
use crate::messages::{SPEED_LIMIT, clamp_speed};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motor {
    Rotation,
    Drive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotorState {
    pub current_speed: i8,
    pub target_speed: i8,
}

/// Timing and output tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MotorTuning {
    /// Ramp/boost tick period
    pub tick_period_ms: u64,
    /// Rotation change per tick
    pub ramp_step: u8,
    /// Drive full-power window on start
    pub boost_duration_ms: u64,
    /// Drive speed during the boost window
    pub boost_speed: i8,
    /// Minimum effective Rotation magnitude
    pub rotation_deadband: u8,
    /// Minimum effective Drive magnitude (higher load)
    pub drive_deadband: u8,
}

impl Default for MotorTuning {
    fn default() -> Self {
        Self {
            tick_period_ms: 50,
            ramp_step: 5,
            boost_duration_ms: 200,
            boost_speed: SPEED_LIMIT,
            rotation_deadband: 20,
            drive_deadband: 65,
        }
    }
}

impl MotorTuning {
    /// Pull loaded values back into range: boost within 1..=100, ramp step at
    /// least 1, deadband floors at most 100
    pub fn sanitized(self) -> Self {
        let limit = SPEED_LIMIT as u8;
        let tuning = Self {
            boost_speed: self.boost_speed.clamp(1, SPEED_LIMIT),
            ramp_step: self.ramp_step.max(1),
            rotation_deadband: self.rotation_deadband.min(limit),
            drive_deadband: self.drive_deadband.min(limit),
            ..self.clone()
        };
        if tuning != self {
            warn!("Motor tuning out of range, using {:?}", tuning);
        }
        tuning
    }
}

pub struct MotorControl<R, D> {
    rotation: R,
    drive: D,
    rotation_state: MotorState,
    drive_state: MotorState,
    boost_active: bool,
    boost_start_ms: u64,
    last_tick_ms: Option<u64>,
    tuning: MotorTuning,
}

impl<R: Actuator, D: Actuator> MotorControl<R, D> {
    /// Take ownership of both outputs and force them to stop
    pub fn new(rotation: R, drive: D, tuning: MotorTuning) -> Self {
        let mut control = Self {
            rotation,
            drive,
            rotation_state: MotorState::default(),
            drive_state: MotorState::default(),
            boost_active: false,
            boost_start_ms: 0,
            last_tick_ms: None,
            tuning: tuning.sanitized(),
        };
        control.stop();
        control
    }

    /// Request a new target speed (clamped to [-100, 100]).
    ///
    /// A nonzero target immediately halts the other motor.
    pub fn set_speed(&mut self, motor: Motor, speed: i32, now_ms: u64) {
        let speed = clamp_speed(speed as i64);
        debug!("Set {:?} target to {}", motor, speed);

        match motor {
            Motor::Rotation => {
                if speed != 0 {
                    self.halt_drive();
                }
                self.rotation_state.target_speed = speed;
            }
            Motor::Drive => {
                if speed != 0 {
                    self.halt_rotation();
                }
                self.set_drive_target(speed, now_ms);
            }
        }
    }

    fn set_drive_target(&mut self, speed: i8, now_ms: u64) {
        let state = &mut self.drive_state;
        state.target_speed = speed;

        if speed == 0 {
            self.boost_active = false;
            state.current_speed = 0;
        } else if state.current_speed == 0 {
            // Standstill: full power for the boost window to break static friction
            self.boost_active = true;
            self.boost_start_ms = now_ms;
            state.current_speed = boost_level(speed, self.tuning.boost_speed);
            debug!("Drive boost armed at {} ms", now_ms);
        } else if self.boost_active {
            state.current_speed = boost_level(speed, self.tuning.boost_speed);
        } else {
            state.current_speed = speed;
        }

        self.drive.drive(state.current_speed);
    }

    fn halt_rotation(&mut self) {
        self.rotation_state = MotorState::default();
        self.rotation.drive(0);
    }

    fn halt_drive(&mut self) {
        self.drive_state = MotorState::default();
        self.boost_active = false;
        self.drive.drive(0);
    }

    /// Hard stop of both motors, bypassing ramp and boost
    pub fn stop(&mut self) {
        info!("Stopping all motors");
        self.halt_rotation();
        self.halt_drive();
    }

    /// Advance ramp and boost. Calls before the tick period has elapsed do nothing.
    pub fn update(&mut self, now_ms: u64) {
        if let Some(last) = self.last_tick_ms {
            if now_ms.saturating_sub(last) < self.tuning.tick_period_ms {
                return;
            }
        }
        self.last_tick_ms = Some(now_ms);

        self.ramp_rotation();
        self.settle_drive(now_ms);
    }

    fn ramp_rotation(&mut self) {
        let state = &mut self.rotation_state;
        if state.current_speed == state.target_speed {
            return;
        }

        let step = self.tuning.ramp_step as i16;
        let gap = state.target_speed as i16 - state.current_speed as i16;
        state.current_speed = if gap.abs() <= step {
            state.target_speed
        } else {
            (state.current_speed as i16 + step * gap.signum()) as i8
        };

        self.rotation.drive(state.current_speed);
    }

    fn settle_drive(&mut self, now_ms: u64) {
        let state = &mut self.drive_state;

        if self.boost_active {
            if now_ms.saturating_sub(self.boost_start_ms) >= self.tuning.boost_duration_ms {
                self.boost_active = false;
                state.current_speed = state.target_speed;
                debug!("Drive boost finished, settling at {}", state.target_speed);
            } else {
                state.current_speed = boost_level(state.target_speed, self.tuning.boost_speed);
            }
        } else if state.current_speed != state.target_speed {
            state.current_speed = state.target_speed;
        } else {
            return;
        }

        self.drive.drive(state.current_speed);
    }

    pub fn state(&self, motor: Motor) -> MotorState {
        match motor {
            Motor::Rotation => self.rotation_state,
            Motor::Drive => self.drive_state,
        }
    }

    pub fn boost_active(&self) -> bool {
        self.boost_active
    }

    pub fn rotation_output(&self) -> &R {
        &self.rotation
    }

    pub fn drive_output(&self) -> &D {
        &self.drive
    }
}

/// ±boost speed, following the sign of the target
fn boost_level(target: i8, boost_speed: i8) -> i8 {
    if target >= 0 { boost_speed } else { -boost_speed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Records every speed written to it
    #[derive(Default)]
    struct SpeedLog(Vec<i8>);

    impl Actuator for SpeedLog {
        fn drive(&mut self, speed: i8) {
            self.0.push(speed);
        }
    }

    impl SpeedLog {
        fn last(&self) -> i8 {
            *self.0.last().unwrap()
        }
    }

    fn control() -> MotorControl<SpeedLog, SpeedLog> {
        MotorControl::new(SpeedLog::default(), SpeedLog::default(), MotorTuning::default())
    }

    fn current(c: &MotorControl<SpeedLog, SpeedLog>, motor: Motor) -> i8 {
        c.state(motor).current_speed
    }

    #[test]
    fn test_out_of_range_tuning_is_clamped() {
        let tuning = MotorTuning {
            boost_speed: 127,
            ramp_step: 0,
            ..MotorTuning::default()
        };
        let mut c = MotorControl::new(SpeedLog::default(), SpeedLog::default(), tuning);
        c.set_speed(Motor::Drive, 50, 0);
        assert_eq!(current(&c, Motor::Drive), 100);

        c.set_speed(Motor::Rotation, 3, 10);
        c.update(10);
        assert_eq!(current(&c, Motor::Rotation), 1);
        c.update(60);
        assert_eq!(current(&c, Motor::Rotation), 2);
    }

    #[test]
    fn test_negative_boost_does_not_overflow() {
        let tuning = MotorTuning {
            boost_speed: i8::MIN,
            ..MotorTuning::default()
        };
        let mut c = MotorControl::new(SpeedLog::default(), SpeedLog::default(), tuning);
        c.set_speed(Motor::Drive, -50, 0);
        assert_eq!(current(&c, Motor::Drive), -1);
        c.update(0);
        c.update(200);
        assert_eq!(current(&c, Motor::Drive), -50);
    }

    #[test]
    fn test_sanitized_keeps_valid_tuning() {
        assert_eq!(MotorTuning::default().sanitized(), MotorTuning::default());
        let tuning = MotorTuning {
            drive_deadband: 200,
            ..MotorTuning::default()
        }
        .sanitized();
        assert_eq!(tuning.drive_deadband, 100);
    }

    #[test]
    fn test_new_stops_outputs() {
        let c = control();
        assert_eq!(c.rotation_output().0, vec![0]);
        assert_eq!(c.drive_output().0, vec![0]);
    }

    #[test]
    fn test_rotation_ramp_no_overshoot() {
        let mut c = control();
        c.set_speed(Motor::Rotation, 30, 0);

        let mut seen = Vec::new();
        for tick in 0..8 {
            c.update(tick * 50);
            seen.push(current(&c, Motor::Rotation));
        }
        assert_eq!(seen, vec![5, 10, 15, 20, 25, 30, 30, 30]);
        assert_eq!(c.rotation_output().last(), 30);
    }

    #[test]
    fn test_rotation_ramp_down_and_reverse() {
        let mut c = control();
        c.set_speed(Motor::Rotation, 12, 0);
        c.update(0);
        c.update(50);
        c.update(100);
        assert_eq!(current(&c, Motor::Rotation), 12);

        c.set_speed(Motor::Rotation, -3, 100);
        let mut seen = Vec::new();
        for tick in 3..7 {
            c.update(tick * 50);
            seen.push(current(&c, Motor::Rotation));
        }
        assert_eq!(seen, vec![7, 2, -3, -3]);
    }

    #[test]
    fn test_early_tick_is_noop() {
        let mut c = control();
        c.set_speed(Motor::Rotation, 50, 0);
        c.update(1000);
        assert_eq!(current(&c, Motor::Rotation), 5);
        c.update(1001);
        c.update(1049);
        assert_eq!(current(&c, Motor::Rotation), 5);
        c.update(1050);
        assert_eq!(current(&c, Motor::Rotation), 10);
    }

    #[test]
    fn test_drive_boost_then_snap() {
        let mut c = control();
        c.set_speed(Motor::Drive, 50, 0);
        assert!(c.boost_active());
        assert_eq!(current(&c, Motor::Drive), 100);

        for t in [0, 50, 100, 150] {
            c.update(t);
            assert_eq!(current(&c, Motor::Drive), 100, "at {t} ms");
        }

        c.update(200);
        assert!(!c.boost_active());
        assert_eq!(current(&c, Motor::Drive), 50);
        assert_eq!(c.drive_output().last(), 50);
    }

    #[test]
    fn test_reverse_boost() {
        let mut c = control();
        c.set_speed(Motor::Drive, -30, 0);
        assert_eq!(current(&c, Motor::Drive), -100);
        c.update(0);
        c.update(250);
        assert_eq!(current(&c, Motor::Drive), -30);
    }

    #[test]
    fn test_running_drive_changes_immediately() {
        let mut c = control();
        c.set_speed(Motor::Drive, 50, 0);
        c.update(0);
        c.update(200);
        assert_eq!(current(&c, Motor::Drive), 50);

        c.set_speed(Motor::Drive, 80, 210);
        assert!(!c.boost_active());
        assert_eq!(current(&c, Motor::Drive), 80);
        assert_eq!(c.drive_output().last(), 80);

        c.set_speed(Motor::Drive, -20, 220);
        assert!(!c.boost_active());
        assert_eq!(current(&c, Motor::Drive), -20);
    }

    #[test]
    fn test_drive_zero_cancels_boost() {
        let mut c = control();
        c.set_speed(Motor::Drive, 70, 0);
        c.set_speed(Motor::Drive, 0, 60);
        assert!(!c.boost_active());
        assert_eq!(current(&c, Motor::Drive), 0);
        c.update(100);
        assert_eq!(current(&c, Motor::Drive), 0);
        assert_eq!(c.drive_output().last(), 0);
    }

    #[test]
    fn test_target_change_during_boost_keeps_window() {
        let mut c = control();
        c.set_speed(Motor::Drive, 40, 0);
        c.set_speed(Motor::Drive, -60, 100);
        assert!(c.boost_active());
        assert_eq!(current(&c, Motor::Drive), -100);
        c.update(200);
        assert_eq!(current(&c, Motor::Drive), -60);
    }

    #[test]
    fn test_drive_halts_rotation_same_call() {
        let mut c = control();
        c.set_speed(Motor::Rotation, 40, 0);
        c.update(0);
        assert_eq!(current(&c, Motor::Rotation), 5);

        c.set_speed(Motor::Drive, 50, 10);
        assert_eq!(c.state(Motor::Rotation), MotorState::default());
        assert_eq!(c.rotation_output().last(), 0);
    }

    #[test]
    fn test_rotation_halts_drive_same_call() {
        let mut c = control();
        c.set_speed(Motor::Drive, 50, 0);
        c.set_speed(Motor::Rotation, -40, 10);
        assert_eq!(c.state(Motor::Drive), MotorState::default());
        assert!(!c.boost_active());
        assert_eq!(c.drive_output().last(), 0);
    }

    #[test]
    fn test_pending_rotation_target_cleared_by_drive() {
        // Rotation target set but not yet ramped: must not resume after Drive stops
        let mut c = control();
        c.set_speed(Motor::Rotation, 40, 0);
        c.set_speed(Motor::Drive, 50, 0);
        c.set_speed(Motor::Drive, 0, 10);
        c.update(100);
        assert_eq!(c.state(Motor::Rotation), MotorState::default());
    }

    #[test]
    fn test_zero_does_not_halt_other() {
        let mut c = control();
        c.set_speed(Motor::Drive, 50, 0);
        c.set_speed(Motor::Rotation, 0, 10);
        assert_eq!(c.state(Motor::Drive).target_speed, 50);
    }

    #[test]
    fn test_stop_bypasses_ramp_and_boost() {
        let mut c = control();
        c.set_speed(Motor::Rotation, 60, 0);
        c.update(0);
        c.update(50);
        c.stop();
        assert_eq!(c.state(Motor::Rotation), MotorState::default());
        assert_eq!(c.rotation_output().last(), 0);

        c.set_speed(Motor::Drive, 90, 100);
        c.stop();
        assert!(!c.boost_active());
        assert_eq!(c.state(Motor::Drive), MotorState::default());
        assert_eq!(c.drive_output().last(), 0);

        c.update(150);
        c.update(400);
        assert_eq!(current(&c, Motor::Drive), 0);
        assert_eq!(current(&c, Motor::Rotation), 0);
    }

    #[test]
    fn test_restart_after_stop_boosts_again() {
        let mut c = control();
        c.set_speed(Motor::Drive, 50, 0);
        c.update(0);
        c.update(200);
        c.stop();
        c.set_speed(Motor::Drive, 50, 300);
        assert!(c.boost_active());
        assert_eq!(current(&c, Motor::Drive), 100);
    }

    proptest! {
        #[test]
        fn prop_target_clamped(speed in any::<i32>()) {
            let mut c = control();
            c.set_speed(Motor::Rotation, speed, 0);
            prop_assert_eq!(c.state(Motor::Rotation).target_speed as i32, speed.clamp(-100, 100));
            c.set_speed(Motor::Drive, speed, 0);
            prop_assert_eq!(c.state(Motor::Drive).target_speed as i32, speed.clamp(-100, 100));
        }

        #[test]
        fn prop_never_both_nonzero(
            commands in proptest::collection::vec((any::<bool>(), -150i32..150, 0u64..120), 1..40)
        ) {
            let mut c = control();
            let mut now = 0u64;
            for (rotation, speed, dt) in commands {
                now += dt;
                let motor = if rotation { Motor::Rotation } else { Motor::Drive };
                c.set_speed(motor, speed, now);
                c.update(now);
                let r = c.state(Motor::Rotation);
                let d = c.state(Motor::Drive);
                prop_assert!(r.target_speed == 0 || d.target_speed == 0);
                prop_assert!(r.current_speed == 0 || d.current_speed == 0);
                prop_assert!((-100..=100).contains(&(r.current_speed as i16)));
                prop_assert!((-100..=100).contains(&(d.current_speed as i16)));
            }
        }
    }
}
