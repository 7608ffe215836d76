//! サービス設定
//!
//! CLI / 環境変数から組み立てられ、アプリケーション層へ渡される

use crate::domain::generation::{DevicePreference, ForegroundRatio};
use std::path::PathBuf;

/// HTTP サービス全体の設定
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub foreground_ratio: ForegroundRatio,
    /// リクエストボディの上限 (None なら無制限)
    pub body_limit: Option<usize>,
    /// メッシュ送信前のステージング先 (None ならシステムの一時ディレクトリ)
    pub staging_dir: Option<PathBuf>,
    pub runtime: RuntimeConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            foreground_ratio: ForegroundRatio::default(),
            body_limit: None,
            staging_dir: None,
            runtime: RuntimeConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// TripoSR ランタイムの設定
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// TripoSR を実行する Python インタプリタ
    pub python: PathBuf,
    /// `tsr` パッケージを含む TripoSR のチェックアウト
    pub triposr_dir: PathBuf,
    pub pretrained_model: String,
    pub chunk_size: u32,
    pub device: DevicePreference,
    /// 実ランタイムの代わりにモックゲートウェイを使用
    pub mock: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            python: PathBuf::from("python3"),
            triposr_dir: PathBuf::from("."),
            pretrained_model: "stabilityai/TripoSR".to_string(),
            chunk_size: 8192,
            device: DevicePreference::Auto,
            mock: false,
        }
    }
}
