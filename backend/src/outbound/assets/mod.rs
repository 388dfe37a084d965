//! Asset host adapters storing issue photos.

mod cloudinary;
mod filesystem;

pub use cloudinary::{
    CloudinaryAssetHost, CloudinaryCredentials, DEFAULT_CLOUDINARY_API, DEFAULT_CLOUDINARY_FOLDER,
};
pub use filesystem::{FilesystemAssetHost, content_type_for};
