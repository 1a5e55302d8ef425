pub mod catalog;
pub mod mongo;
pub mod quotes;
pub mod references;
pub mod staff;
