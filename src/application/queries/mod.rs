//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：只读投影，不修改任何状态

mod account_queries;
mod task_queries;
mod voice_queries;

pub mod handlers;

pub use account_queries::*;
pub use task_queries::*;
pub use voice_queries::*;
