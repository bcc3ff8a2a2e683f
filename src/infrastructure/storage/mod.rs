pub mod fs_adapter;
pub mod s3_adapter;
