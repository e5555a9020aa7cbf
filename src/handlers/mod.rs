pub mod health_handlers;
pub mod lambda_handler;
pub mod upload_handlers;
