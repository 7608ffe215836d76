//! インフラストラクチャ層
//!
//! TripoSR / rembg ランタイムとの連携、GLB のステージングを扱う

pub mod model;
pub mod staging;
