//! # 配信結果
//!
//! ワーカーの識別子と、受信者 1 件ごとの配信結果を定義する。
//!
//! ## 設計方針
//!
//! - **結果は値**: レンダリング・送信の失敗は例外的な制御フローではなく
//!   [`DispatchOutcome`] の値として返し、呼び出し側やテストが直接検査できる
//! - **再試行なし**: 失敗した受信者はその場で破棄され、再配信されない

use derive_more::Display;
use strum::IntoStaticStr;

use crate::error::{RenderError, TransportError};

/// ワーカー ID（1 始まり）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("{_0}")]
pub struct WorkerId(usize);

impl WorkerId {
    pub fn new(value: usize) -> Self {
        Self(value)
    }

    pub fn as_usize(&self) -> usize {
        self.0
    }
}

/// 受信者 1 件の配信結果
///
/// `IntoStaticStr` で snake_case のラベル（`delivered` など）に変換でき、
/// ログの `dispatch.outcome` フィールドに使う。
#[derive(Debug, Clone, PartialEq, Eq, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum DispatchOutcome {
    /// 送信に成功した
    Delivered,
    /// テンプレートレンダリングに失敗した（送信は行っていない）
    RenderFailed(String),
    /// 送信に失敗した
    SendFailed(String),
}

impl DispatchOutcome {
    /// 成功かどうか
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// 失敗理由（成功時は `None`）
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Delivered => None,
            Self::RenderFailed(reason) | Self::SendFailed(reason) => Some(reason),
        }
    }

    /// ログ出力用のラベル
    pub fn label(&self) -> &'static str {
        self.into()
    }
}

impl From<RenderError> for DispatchOutcome {
    fn from(err: RenderError) -> Self {
        Self::RenderFailed(err.to_string())
    }
}

impl From<TransportError> for DispatchOutcome {
    fn from(err: TransportError) -> Self {
        Self::SendFailed(err.to_string())
    }
}
