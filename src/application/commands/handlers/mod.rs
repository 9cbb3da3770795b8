//! Command Handlers - 命令处理器

mod account_command_handlers;
mod generation_command_handlers;
mod voice_command_handlers;

pub use account_command_handlers::{CreateAccountHandler, TopUpCreditsHandler};
pub use generation_command_handlers::SubmitGenerationHandler;
pub use voice_command_handlers::{CreateVoiceHandler, DeleteVoiceHandler};
