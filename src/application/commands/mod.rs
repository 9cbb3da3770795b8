//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：处理所有写操作

mod account_commands;
mod generation_commands;
mod voice_commands;

pub mod handlers;

pub use account_commands::*;
pub use generation_commands::*;
pub use voice_commands::*;
