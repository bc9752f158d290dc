//! Domain services - orchestrate entities over the ports.

mod image_cleanup;
mod images;
mod posts;
mod profiles;

#[cfg(test)]
mod testing;

pub use image_cleanup::{
    CLEANUP_MAX_ATTEMPTS, CleanupReport, CleanupRequest, IMAGE_CLEANUP_JOB, ImageCleanup,
};
pub use images::ImageService;
pub use posts::{ArchiveEntry, PostService};
pub use profiles::ProfileService;
