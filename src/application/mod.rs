pub mod blade_runtime;
pub mod supervisor;

pub use blade_runtime::run_blade;
pub use supervisor::Supervisor;
