//! # TripoSR Service
//!
//! 単一画像から TripoSR で 3D メッシュ (GLB) を生成する HTTP サービス
//!
//! このクレートは Domain-Driven Design (DDD) 原則に基づいて設計されており、
//! 以下の層に分かれています：
//!
//! - **Domain Layer**: リクエスト検証、画像前処理、メッシュ成果物とモデルゲートウェイ
//! - **Application Layer**: メッシュ生成・サーバー起動・ランタイム情報のユースケース
//! - **Infrastructure Layer**: TripoSR / rembg ランタイムとの統合、GLB のステージング
//! - **Interface Layer**: axum による HTTP API

pub mod application;
pub mod config;
pub mod debug;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;

pub use domain::*;
