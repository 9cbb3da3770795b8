//! Worker - 后台任务处理

mod generation_worker;
mod reaper;

pub use generation_worker::{GenerationWorker, GenerationWorkerConfig};
pub use reaper::{ReaperConfig, StaleTaskReaper};
