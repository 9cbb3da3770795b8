//! HTTP Handlers

mod account;
mod ping;
mod tts;
mod voice;

pub use account::*;
pub use ping::*;
pub use tts::*;
pub use voice::*;
