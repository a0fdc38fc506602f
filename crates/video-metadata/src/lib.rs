mod patch;
mod record;
mod status;
mod store;

pub use patch::VideoPatch;
pub use record::{title_from_video_id, VideoRecord};
pub use status::{TranscriptionStatus, VideoStatus};
pub use store::{MemoryMetadataStore, MetadataError, MetadataResult, MetadataStore};
