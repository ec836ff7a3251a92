//! Device wiring.
//!
//! Only mock drivers exist so far; they stand in for the enclosure on a
//! bench and are parked at their idle levels.

use safelatch_controller::Devices;
use safelatch_core::ControllerConfig;
use safelatch_hardware::Level;
use safelatch_hardware::mock::{MockCamera, MockInput, MockOutput, MockServo};
use tracing::warn;

/// Build mock devices on the configured pins with inputs at rest.
pub async fn mock_devices(config: &ControllerConfig) -> Devices {
    warn!("No hardware drivers compiled in, running on mock devices");

    let pins = &config.pins;
    let (presence, _) = MockInput::new("presence", pins.presence.pin);
    let (button, button_handle) = MockInput::new("button", pins.button.pin);
    let (door, door_handle) = MockInput::new("door", pins.door.pin);

    // Released button and closed door.
    button_handle
        .set_level(Level::from(pins.button.active_low))
        .await;
    door_handle.set_level(Level::from(pins.door.active_low)).await;

    let (camera, _) = MockCamera::new();
    let (latch, _) = MockServo::with_frequency(pins.latch, config.latch.pwm_hz);

    Devices {
        presence: presence.into(),
        button: button.into(),
        door: door.into(),
        deny: MockOutput::new("deny", pins.deny).0.into(),
        permit: MockOutput::new("permit", pins.permit).0.into(),
        active: MockOutput::new("active", pins.active).0.into(),
        buzzer: MockOutput::new("buzzer", pins.buzzer).0.into(),
        latch: latch.into(),
        camera: camera.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safelatch_hardware::traits::{DigitalInput, PwmOutput};

    #[tokio::test]
    async fn test_servo_runs_at_configured_frequency() {
        let mut config = ControllerConfig::default();
        config.latch.pwm_hz = 330;

        let devices = mock_devices(&config).await;
        assert_eq!(devices.latch.frequency_hz(), 330);
    }

    #[tokio::test]
    async fn test_inputs_start_at_rest() {
        let config = ControllerConfig::default();
        let mut devices = mock_devices(&config).await;

        let button = devices.button.read_level().await.unwrap();
        assert!(!button.is_asserted(config.pins.button.active_low));
        let door = devices.door.read_level().await.unwrap();
        assert!(!door.is_asserted(config.pins.door.active_low));
    }
}
