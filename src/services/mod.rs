pub mod storage;
pub mod upload_service;
pub mod product_service;
pub mod event_service;
pub mod user_service;
