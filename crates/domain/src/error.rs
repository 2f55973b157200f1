//! # ドメイン層エラー定義
//!
//! 受信者 1 件の処理中に発生するエラー。どちらもその受信者だけに閉じた失敗で、
//! パイプライン全体や他のワーカーには影響しない。
//!
//! | エラー | 発生箇所 | 扱い |
//! |-------|---------|------|
//! | [`RenderError`] | テンプレートレンダラー | 送信せずに破棄 |
//! | [`TransportError`] | メールトランスポート | 再試行せずに破棄 |

use thiserror::Error;

/// テンプレートレンダリングエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// 指定されたテンプレートが登録されていない
    #[error("テンプレートが見つかりません: {0}")]
    TemplateNotFound(String),

    /// 変数展開などテンプレート評価中の失敗
    #[error("テンプレートレンダリングに失敗: {0}")]
    Failed(String),
}

/// メール送信エラー
///
/// 一時的な失敗と恒久的な失敗は区別しない。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// 送信元・宛先アドレスが不正
    #[error("アドレス不正: {0}")]
    InvalidAddress(String),

    /// 接続失敗や送信拒否
    #[error("メール送信に失敗: {0}")]
    Rejected(String),
}
