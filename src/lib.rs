//! hf-serve
//!
//! hf画像カタログの上で動くタグ付けブラウザ。
//! hf呼び出しのキャッシュとタグ差分の適用を中核とする。

pub mod browse;
pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod reconciler;
pub mod session;

pub use catalog::{Catalog, ReconcileReport};
pub use error::{HfServeError, Result};
pub use gateway::{CatalogGateway, HfCli};
pub use session::{Session, ViewState};
