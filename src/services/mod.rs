pub mod gamification;
pub mod growth;
pub mod otp_store;
pub mod sms_service;
