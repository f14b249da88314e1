mod gpu;
mod logs;
mod service;
mod status;
mod tools;

// Service lifecycle commands
pub use service::{run_restart, run_start, run_stop};

// Status commands
pub use status::run_status;

// Logs commands
pub use logs::run_logs;

// GPU commands
pub use gpu::run_gpu;

// Tool manifest commands
pub use tools::{run_tools_list, run_tools_show};
