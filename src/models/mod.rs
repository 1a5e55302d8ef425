pub mod account;
pub mod catalog;
pub mod extraction;
pub mod predefined;
pub mod quote;
pub mod reference;
