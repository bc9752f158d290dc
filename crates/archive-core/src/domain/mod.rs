//! Domain entities - the core business objects.

mod account;
mod image;
mod post;
mod profile;
mod slug;

pub use account::Account;
pub use image::{DEFAULT_MAX_UPLOAD_BYTES, ObjectKey, UploadFile, UploadPolicy};
pub use post::{MAX_IMAGES_PER_POST, Post, PostBuckets, PostInput};
pub use profile::{Profile, ProfileOverview};
pub use slug::generate_slug;
