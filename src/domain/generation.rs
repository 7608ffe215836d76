//! メッシュ生成集約
//!
//! 画像から3Dメッシュを生成するためのリクエスト、画像処理、モデル境界を定義

pub mod entities;
pub mod errors;
pub mod gateway;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use gateway::*;
pub use value_objects::*;
