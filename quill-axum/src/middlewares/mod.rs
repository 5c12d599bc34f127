pub mod multipart;

pub use multipart::{FileEncoding, MultipartConfig, MultipartToJson};
