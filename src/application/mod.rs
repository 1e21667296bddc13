pub mod scan_engine;

pub use scan_engine::{EngineState, EngineStatus, ScanEngine};
