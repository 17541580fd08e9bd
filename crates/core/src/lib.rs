//! Core library for recite: vocabulary study drills, dictionary-page
//! segmentation, and the speech/playback glue around them.

pub mod audio;
pub mod cache;
pub mod clock;
pub mod config;
pub mod dictation;
pub mod files;
pub mod lesson;
pub mod segment;
pub mod synonym;
pub mod term;
pub mod tts;
pub mod types;
