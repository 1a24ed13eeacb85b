pub mod report_config;
pub mod request;
pub mod response;
