//! Built-in tool implementations.

mod conversion;
mod media;
mod reminder;
mod web_search;

pub use conversion::{
    fallback_target, mime_for, output_filename, validate_conversion, FileConversion,
};
pub use media::{GenerateAudio, GenerateImage, GenerateVideo, MediaConfig, ModifyImage};
pub use reminder::SetReminder;
pub use web_search::{SearchResult, WebSearch};
