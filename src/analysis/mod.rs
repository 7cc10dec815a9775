//! Collaborators around the classification model
//!
//! - `Classifier`: maps an image to a material and confidence
//! - `ImageFetcher`: downloads images referenced by URL
//! - `UploadDir`: stores analyzed images where the web UI can show them

mod classifier;
mod fetch;
mod uploads;

pub use classifier::{Classifier, CommandClassifier};
pub use fetch::{is_remote_url, HttpFetcher, ImageFetcher};
pub use uploads::UploadDir;
