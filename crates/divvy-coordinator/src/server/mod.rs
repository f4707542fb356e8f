pub mod allocator;
pub mod config;
pub mod coordinator;
pub mod gate;
pub mod pool;
pub mod session;
pub mod sink;
pub mod telemetry;
