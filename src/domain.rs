//! ドメイン層
//!
//! リクエスト検証、画像の前処理、モデルゲートウェイの契約を含む層

pub mod generation;
