//! Mock device implementations for testing and development.
//!
//! This module provides simulated peripherals that can be controlled
//! programmatically without requiring physical hardware.

pub mod button;
pub mod drive;
pub mod indicator;
pub mod logging;
pub mod reader;

// Re-export commonly used types
pub use button::{MockButton, MockButtonHandle};
pub use drive::MockDrive;
pub use indicator::{IndicatorEvent, MockFeedback, MockIndicator};
pub use logging::{LoggingIndicator, LoggingServo};
pub use reader::{MockReader, MockReaderHandle};
