//! Value characteristics - book equity and book-to-market.

pub mod book_equity;
pub mod book_to_market;

pub use book_equity::book_equity;
pub use book_to_market::log_book_to_market;
