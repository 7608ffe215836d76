//! デバッグとログ機能
//!
//! サービス全体のログ初期化と計測用マクロを提供

use std::fs;
use std::path::PathBuf;
use tracing::{Level, debug, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "triposr-service.log";

/// ログ設定
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// ログレベル
    pub log_level: Level,
    /// ファイルログを有効にするか (有効時は JSON で日次ローテーション)
    pub enable_file_logging: bool,
    /// ログファイルのディレクトリ
    pub log_directory: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            enable_file_logging: false,
            log_directory: PathBuf::from("logs"),
        }
    }
}

impl LogConfig {
    /// 開発環境用の設定
    pub fn development() -> Self {
        Self {
            log_level: Level::DEBUG,
            ..Self::default()
        }
    }

    /// 本番環境用の設定 (JSON ファイルへ出力)
    pub fn production(log_directory: impl Into<PathBuf>) -> Self {
        Self {
            log_level: Level::INFO,
            enable_file_logging: true,
            log_directory: log_directory.into(),
        }
    }

    /// ログレベルを DEBUG に上げる
    pub fn verbose(mut self) -> Self {
        self.log_level = Level::DEBUG;
        self
    }

    fn default_directive(&self) -> String {
        format!("triposr_service={}", self.log_level)
    }
}

/// ログシステムを初期化
pub fn init_logging(config: &LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if config.enable_file_logging {
        fs::create_dir_all(&config.log_directory)?;
    }

    // RUST_LOG が設定されていればそちらを優先
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.default_directive())?,
    };

    if config.enable_file_logging {
        let file_appender =
            RollingFileAppender::new(Rotation::DAILY, &config.log_directory, LOG_FILE_NAME);

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(file_appender)
            .json()
            .try_init()?;
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .pretty()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .try_init()?;
    }

    info!("ログシステムが初期化されました");
    debug!("ログ設定: {:?}", config);

    Ok(())
}

/// パフォーマンス測定用のマクロ
#[macro_export]
macro_rules! measure_time {
    ($name:expr, $block:block) => {{
        let start = std::time::Instant::now();
        let result = $block;
        let duration = start.elapsed();
        tracing::info!(
            operation = $name,
            duration_ms = duration.as_millis(),
            "操作完了"
        );
        result
    }};
}

/// デバッグ用のヘルパー関数
pub mod debug_helpers {
    use tracing::{error, info};

    /// 実行環境をログに出力
    pub fn log_system_info() {
        info!("=== システム情報 ===");
        info!("OS: {}", std::env::consts::OS);
        info!("アーキテクチャ: {}", std::env::consts::ARCH);
        info!("プロジェクトバージョン: {}", env!("CARGO_PKG_VERSION"));
        info!("ビルド日時: {}", env!("BUILD_TIMESTAMP"));
    }

    /// エラーの詳細情報をログに出力
    pub fn log_error_details(error: &dyn std::error::Error, context: &str) {
        error!(
            context = context,
            error = %error,
            "エラーが発生しました"
        );

        // エラーチェーンをログに出力
        let mut source = error.source();
        let mut level = 1;
        while let Some(err) = source {
            error!(
                context = context,
                level = level,
                source_error = %err,
                "エラーの原因"
            );
            source = err.source();
            level += 1;
        }
    }
}
