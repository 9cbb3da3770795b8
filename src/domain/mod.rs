//! 领域层 - 纯业务类型
//!
//! - credits: 信用点计费策略与交易类型
//! - task: 生成任务状态机

pub mod credits;
pub mod task;

pub use credits::{CreditCalculation, CreditPolicy, TransactionKind};
pub use task::{clamp_progress, TaskStatus};
