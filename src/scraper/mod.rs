//! Page-level scraping building blocks.
//!
//! Browser side (sharp report): [`locator`] → [`signals`] / [`dates`] → [`rows`].
//! Plain HTTP side (generic pages): [`http_client`] → [`page`].

pub mod dates;
pub mod http_client;
pub mod locator;
pub mod page;
pub mod rows;
pub mod selectors;
pub mod signals;

pub use self::dates::DateNavigator;
pub use self::rows::RowExtractor;
