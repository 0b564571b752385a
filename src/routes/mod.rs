pub mod auth;
pub mod gamification;
pub mod investments;
pub mod products;
pub mod referrals;
pub mod transactions;
