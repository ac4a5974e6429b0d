pub mod telemetry;
pub mod transport;
pub mod views;
