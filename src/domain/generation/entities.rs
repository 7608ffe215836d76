//! メッシュ生成集約のエンティティ

use super::errors::GenerationError;
use super::value_objects::McResolution;
use serde_json::Value;
use std::fmt;

/// 検証済みの生成リクエスト
#[derive(Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// data-URI もしくは生の base64 文字列
    pub image: String,
    pub resolution: McResolution,
}

impl GenerationRequest {
    pub fn new(image: impl Into<String>, resolution: McResolution) -> Self {
        Self {
            image: image.into(),
            resolution,
        }
    }

    /// JSON ボディを検証してリクエストを作成
    ///
    /// `image` が無ければ `MissingImage`、`resolution` が [128, 512] の外なら
    /// `ResolutionOutOfRange`。整数でない `resolution` も範囲外として扱う。
    /// `image` が文字列でない場合はクライアントエラーではなくペイロードエラー。
    pub fn from_json(body: &Value) -> Result<Self, GenerationError> {
        let fields = match body.as_object() {
            Some(fields) if !fields.is_empty() => fields,
            _ => return Err(GenerationError::MissingImage),
        };

        let image = fields.get("image").ok_or(GenerationError::MissingImage)?;

        let resolution = match fields.get("resolution") {
            None | Some(Value::Null) => McResolution::default(),
            Some(value) => {
                let raw = value
                    .as_i64()
                    .ok_or(GenerationError::ResolutionOutOfRange)?;
                McResolution::new(raw)?
            }
        };

        let image = image
            .as_str()
            .ok_or_else(|| GenerationError::InvalidPayload("image must be a string".to_string()))?;

        Ok(Self::new(image, resolution))
    }
}

// base64 の中身はログに出さない
impl fmt::Debug for GenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationRequest")
            .field("image_len", &self.image.len())
            .field("resolution", &self.resolution)
            .finish()
    }
}

/// GLB 形式のメッシュ成果物
#[derive(Clone, PartialEq, Eq)]
pub struct MeshArtifact {
    bytes: Vec<u8>,
}

impl MeshArtifact {
    pub const GLB_MAGIC: &'static [u8; 4] = b"glTF";
    pub const GLB_VERSION: u32 = 2;
    const HEADER_LEN: usize = 12;

    /// GLB ヘッダーを検証して作成
    pub fn from_glb(bytes: Vec<u8>) -> Result<Self, GenerationError> {
        if bytes.len() < Self::HEADER_LEN {
            return Err(GenerationError::Export(format!(
                "GLB output too short ({} bytes)",
                bytes.len()
            )));
        }
        if &bytes[0..4] != Self::GLB_MAGIC {
            return Err(GenerationError::Export(
                "output is not a GLB container".to_string(),
            ));
        }

        let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if version != Self::GLB_VERSION {
            return Err(GenerationError::Export(format!(
                "unsupported GLB version {version}"
            )));
        }

        let declared = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
        if declared != bytes.len() {
            return Err(GenerationError::Export(format!(
                "GLB header declares {declared} bytes but {} were produced",
                bytes.len()
            )));
        }

        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn size_kb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0
    }
}

impl fmt::Debug for MeshArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshArtifact")
            .field("len", &self.bytes.len())
            .finish()
    }
}
