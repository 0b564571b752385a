pub mod achievement;
pub mod investment;
pub mod points;
pub mod product;
pub mod referral;
pub mod transaction;
pub mod user;
