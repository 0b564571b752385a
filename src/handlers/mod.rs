pub(crate) mod auth;
pub(crate) mod gamification;
pub(crate) mod investments;
pub(crate) mod products;
pub(crate) mod referrals;
pub(crate) mod transactions;
