use super::errors::GenerationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// マーチングキューブの解像度
///
/// メッシュ抽出時のグリッド密度。範囲は [128, 512] (両端を含む)。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct McResolution(u32);

impl McResolution {
    pub const MIN: u32 = 128;
    pub const MAX: u32 = 512;
    pub const DEFAULT: u32 = 256;

    /// 範囲を検証して作成
    pub fn new(value: i64) -> Result<Self, GenerationError> {
        if value < i64::from(Self::MIN) || value > i64::from(Self::MAX) {
            return Err(GenerationError::ResolutionOutOfRange);
        }
        Ok(Self(value as u32))
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl Default for McResolution {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl fmt::Display for McResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 前景が正方形キャンバスの一辺に占める割合
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForegroundRatio(f32);

impl ForegroundRatio {
    pub const DEFAULT: f32 = 0.85;

    pub fn new(value: f32) -> Result<Self, GenerationError> {
        if !(value > 0.0 && value <= 1.0) {
            return Err(GenerationError::InvalidForegroundRatio(value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

impl Default for ForegroundRatio {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// 推論を実行するデバイス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cuda,
    Cpu,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cuda => "cuda",
            Device::Cpu => "cpu",
        }
    }

    /// ランタイムの `--device` 引数に渡す値
    pub fn runtime_arg(&self) -> &'static str {
        match self {
            Device::Cuda => "cuda:0",
            Device::Cpu => "cpu",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 起動時のデバイス選択方針
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DevicePreference {
    /// アクセラレータがあれば使用し、なければCPU
    #[default]
    Auto,
    Cuda,
    Cpu,
}

impl FromStr for DevicePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(DevicePreference::Auto),
            "cuda" | "gpu" => Ok(DevicePreference::Cuda),
            "cpu" => Ok(DevicePreference::Cpu),
            other => Err(format!(
                "Unknown device '{other}' (expected auto, cuda or cpu)"
            )),
        }
    }
}

impl fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DevicePreference::Auto => write!(f, "auto"),
            DevicePreference::Cuda => write!(f, "cuda"),
            DevicePreference::Cpu => write!(f, "cpu"),
        }
    }
}
