//! Query Handlers - 查询处理器

mod account_query_handlers;
mod task_query_handlers;
mod voice_query_handlers;

pub use account_query_handlers::{GetAccountHandler, ListTransactionsHandler};
pub use task_query_handlers::{ListTasksHandler, TaskStatusHandler};
pub use voice_query_handlers::{GetVoiceHandler, ListVoicesHandler};
