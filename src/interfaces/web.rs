//! Web インターフェース
//!
//! ヘルスチェックとメッシュ生成の HTTP エンドポイントを提供します。

mod error_response;
mod handlers;
mod models;

pub mod server;

pub use handlers::GenerationState;
pub(crate) use handlers::{generate, health};
