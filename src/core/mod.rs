pub mod account;
pub mod book;
pub mod link;
pub mod transaction;
