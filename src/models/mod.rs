//! Data models for Athenaeum

pub mod author;
pub mod book;
pub mod borrow;
pub mod category;
pub mod contact;
pub mod review;
pub mod user;

// Re-export commonly used types
pub use author::Author;
pub use book::{BookDetails, BookShort};
pub use borrow::{Borrow, BorrowDetails};
pub use category::Category;
pub use review::Review;
pub use user::Member;
