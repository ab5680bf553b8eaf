// H-bridge output stage
//
// Each motor is driven by two complementary PWM legs. Positive speeds put
// the duty on the forward leg, negative speeds on the reverse leg; the
// other leg is held at 0. Requested magnitudes below the motor's deadband
// floor are raised to the floor so the motor actually turns.

use embedded_hal::pwm::{Error as _, ErrorKind, SetDutyCycle};
use std::convert::Infallible;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OutputError {
    #[error("{bridge} {leg} leg rejected duty {duty}: {kind:?}")]
    Pwm {
        bridge: &'static str,
        leg: &'static str,
        duty: u16,
        kind: ErrorKind,
    },
}

/// Anything that can be driven at a signed percentage speed
pub trait Actuator {
    fn drive(&mut self, speed: i8);
}

/// Magnitude actually sent to the bridge after deadband compensation
pub fn compensate_deadband(speed: i8, floor: u8) -> u8 {
    match speed.unsigned_abs() {
        0 => 0,
        magnitude if magnitude < floor => floor,
        magnitude => magnitude,
    }
}

/// duty = round(magnitude / 100 * max_duty)
pub fn duty_cycle(magnitude: u8, max_duty: u16) -> u16 {
    let duty = (magnitude.min(100) as f32 / 100.0 * max_duty as f32).round();
    duty as u16
}

pub struct HBridge<A, B> {
    name: &'static str,
    forward: A,
    reverse: B,
    deadband: u8,
}

impl<A, B> HBridge<A, B>
where
    A: SetDutyCycle,
    B: SetDutyCycle,
{
    pub fn new(name: &'static str, forward: A, reverse: B, deadband: u8) -> Self {
        Self {
            name,
            forward,
            reverse,
            deadband,
        }
    }

    pub fn legs(&self) -> (&A, &B) {
        (&self.forward, &self.reverse)
    }

    fn write(&mut self, forward: u16, reverse: u16) {
        // Idle leg is released before the active leg is driven
        let result = if forward > 0 {
            self.set_reverse(reverse).and_then(|()| self.set_forward(forward))
        } else {
            self.set_forward(forward).and_then(|()| self.set_reverse(reverse))
        };
        if let Err(e) = result {
            warn!("Bridge write failed: {}", e);
        }
    }

    fn set_forward(&mut self, duty: u16) -> Result<(), OutputError> {
        set_leg(&mut self.forward, self.name, "forward", duty)
    }

    fn set_reverse(&mut self, duty: u16) -> Result<(), OutputError> {
        set_leg(&mut self.reverse, self.name, "reverse", duty)
    }
}

fn set_leg<P: SetDutyCycle>(
    leg: &mut P,
    bridge: &'static str,
    name: &'static str,
    duty: u16,
) -> Result<(), OutputError> {
    leg.set_duty_cycle(duty).map_err(|e| OutputError::Pwm {
        bridge,
        leg: name,
        duty,
        kind: e.kind(),
    })
}

impl<A, B> Actuator for HBridge<A, B>
where
    A: SetDutyCycle,
    B: SetDutyCycle,
{
    fn drive(&mut self, speed: i8) {
        let magnitude = compensate_deadband(speed, self.deadband);
        if speed >= 0 {
            let duty = duty_cycle(magnitude, self.forward.max_duty_cycle());
            self.write(duty, 0);
        } else {
            let duty = duty_cycle(magnitude, self.reverse.max_duty_cycle());
            self.write(0, duty);
        }
    }
}

/// PWM leg that only records and logs its duty cycle, for running the Body without hardware
#[derive(Debug, Clone)]
pub struct SimLeg {
    name: &'static str,
    max_duty: u16,
    duty: u16,
}

impl SimLeg {
    pub fn new(name: &'static str, max_duty: u16) -> Self {
        Self {
            name,
            max_duty,
            duty: 0,
        }
    }

    pub fn duty(&self) -> u16 {
        self.duty
    }
}

impl embedded_hal::pwm::ErrorType for SimLeg {
    type Error = Infallible;
}

impl SetDutyCycle for SimLeg {
    fn max_duty_cycle(&self) -> u16 {
        self.max_duty
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        if duty != self.duty {
            debug!("PWM {}: {} -> {}", self.name, self.duty, duty);
        }
        self.duty = duty;
        Ok(())
    }
}
