//! The processing stages. Each stage is a method on [`crate::Pipeline`]:
//! it loads what it needs from the object store, talks to one or two
//! external collaborators, writes its artifacts back under the video's
//! deterministic key layout and patches only the record fields it owns.
//! Stages schedule their successors instead of calling them.

mod caption_embed;
mod captions;
mod frames;
mod image_embed;
mod speech;

pub use frames::FrameExtractionReport;
pub use speech::SpeechIndexReport;
