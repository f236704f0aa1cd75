pub mod app_error;
pub mod speech_error;

pub use app_error::{AppError, AppResult};
pub use speech_error::{SpeechError, SpeechResult};
