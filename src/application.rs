//! アプリケーション層
//!
//! ユースケースを通じてドメインとインフラストラクチャを結び付ける

pub mod use_cases;
