pub mod response;
pub mod serde_ext;
