pub mod local_store;
pub mod s3_store;
pub mod storage;
pub mod upload_service;
