//! Mock device implementations for testing and development.
//!
//! This module provides simulated device implementations that can be controlled
//! programmatically without requiring physical hardware. Every mock is created
//! together with a handle that shares its state: tests drive inputs and inspect
//! outputs through the handle while the device itself is moved into a loop.

pub mod camera;
pub mod input;
pub mod output;
pub mod servo;

// Re-export commonly used types
pub use camera::{MockCamera, MockCameraHandle};
pub use input::{MockInput, MockInputHandle};
pub use output::{MockOutput, MockOutputHandle};
pub use servo::{MockServo, MockServoHandle};
