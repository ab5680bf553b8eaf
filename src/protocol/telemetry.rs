// Telemetry line encoding (Body side) and decoding (Head side)

use crate::messages::{ImuReading, TelemetryMessage};

const IMU: &str = "IMU";
const ALERT: &str = "ALERT";
const INFO: &str = "INFO";
const ACK: &str = "ACK";
const NG: &str = "NG";

/// Render a telemetry message as a line (without terminator)
pub fn encode_telemetry(message: &TelemetryMessage) -> String {
    match message {
        TelemetryMessage::Imu(reading) => {
            let [ax, ay, az, gx, gy, gz] = reading.as_array();
            format!("{IMU},{ax:.2},{ay:.2},{az:.2},{gx:.2},{gy:.2},{gz:.2}")
        }
        TelemetryMessage::Alert(reason) => format!("{ALERT},{reason}"),
        TelemetryMessage::Info(text) => format!("{INFO},{text}"),
        TelemetryMessage::Ack(command) => format!("{ACK},{command}"),
        TelemetryMessage::Ng { command, reason } => format!("{NG},{command},{reason}"),
    }
}

/// Decode one received line. Unknown tags and malformed IMU lines yield `None`.
pub fn decode_telemetry(line: &str) -> Option<TelemetryMessage> {
    let (tag, rest) = line.split_once(',').unwrap_or((line, ""));

    match tag {
        IMU => decode_imu(rest).map(TelemetryMessage::Imu),
        ALERT => Some(TelemetryMessage::Alert(rest.to_string())),
        INFO => Some(TelemetryMessage::Info(rest.to_string())),
        ACK => Some(TelemetryMessage::Ack(rest.to_string())),
        NG => {
            let (command, reason) = rest.split_once(',').unwrap_or((rest, ""));
            Some(TelemetryMessage::Ng {
                command: command.to_string(),
                reason: reason.to_string(),
            })
        }
        _ => None,
    }
}

/// Exactly six finite numbers, or nothing
fn decode_imu(fields: &str) -> Option<ImuReading> {
    let mut values = [0.0f32; 6];
    let mut parts = fields.split(',');

    for slot in values.iter_mut() {
        let value: f32 = parts.next()?.trim().parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        *slot = value;
    }

    if parts.next().is_some() {
        return None;
    }
    Some(ImuReading::from_array(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_imu_two_decimals() {
        let msg = TelemetryMessage::Imu(ImuReading::new([1.234, -4.5, 9.80665], [0.0, -0.016, 0.03]));
        assert_eq!(encode_telemetry(&msg), "IMU,1.23,-4.50,9.81,0.00,-0.02,0.03");
    }

    #[test]
    fn test_imu_round_trip() {
        let values = [1.23, -4.56, 9.80, 0.01, -0.02, 0.03];
        let line = encode_telemetry(&TelemetryMessage::Imu(ImuReading::from_array(values)));
        println!("Encoded: {}", line);

        let Some(TelemetryMessage::Imu(decoded)) = decode_telemetry(&line) else {
            panic!("IMU line did not decode: {line}");
        };
        for (got, want) in decoded.as_array().iter().zip(values) {
            assert!((got - want).abs() < 0.005, "{got} != {want}");
        }
    }

    #[test]
    fn test_imu_requires_six_numbers() {
        assert_eq!(decode_telemetry("IMU,1,2,3,4,5"), None);
        assert_eq!(decode_telemetry("IMU,1,2,3,4,5,6,7"), None);
        assert_eq!(decode_telemetry("IMU,1,2,x,4,5,6"), None);
        assert_eq!(decode_telemetry("IMU,1,2,3,4,5,"), None);
        assert_eq!(decode_telemetry("IMU,1,2,3,4,5,inf"), None);
        assert_eq!(decode_telemetry("IMU"), None);
        assert!(decode_telemetry("IMU,1,2,3,4,5,6").is_some());
    }

    #[test]
    fn test_text_messages_keep_remainder() {
        assert_eq!(
            decode_telemetry("ALERT,FALL"),
            Some(TelemetryMessage::Alert("FALL".into()))
        );
        assert_eq!(
            decode_telemetry("INFO,robot-link 0.1.0, ready"),
            Some(TelemetryMessage::Info("robot-link 0.1.0, ready".into()))
        );
        assert_eq!(decode_telemetry("ALERT"), Some(TelemetryMessage::Alert(String::new())));
    }

    #[test]
    fn test_ack_and_ng() {
        assert_eq!(
            decode_telemetry("ACK,RESET"),
            Some(TelemetryMessage::Ack("RESET".into()))
        );
        let ng = TelemetryMessage::Ng {
            command: "CALIB".into(),
            reason: "IMU_NOT_AVAILABLE".into(),
        };
        assert_eq!(encode_telemetry(&ng), "NG,CALIB,IMU_NOT_AVAILABLE");
        assert_eq!(decode_telemetry("NG,CALIB,IMU_NOT_AVAILABLE"), Some(ng));
    }

    #[test]
    fn test_unknown_tag() {
        assert_eq!(decode_telemetry("Robot Body Starting..."), None);
        assert_eq!(decode_telemetry("imu,1,2,3,4,5,6"), None);
    }
}
