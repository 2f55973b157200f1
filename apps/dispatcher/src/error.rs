//! # Dispatcher エラー定義
//!
//! 配信実行全体を失敗させるエラーを定義する。
//! 受信者 1 件ごとの失敗は [`mailcast_domain::DispatchOutcome`] で表し、ここには含めない。

use mailcast_domain::RenderError;
use mailcast_infra::SourceError;
use thiserror::Error;

use crate::config::ConfigError;

/// 配信実行で発生する致命的エラー
#[derive(Debug, Error)]
pub enum DispatchError {
    /// 設定が不正
    #[error("設定が不正です: {0}")]
    Config(#[from] ConfigError),

    /// テンプレートを準備できない
    #[error("テンプレートの準備に失敗: {0}")]
    Template(#[from] RenderError),

    /// 受信者ソースが途中で失敗した
    ///
    /// それまでに配信チャネルへ渡した受信者は処理済み。
    #[error("受信者ソースが失敗しました: {0}")]
    Source(#[from] SourceError),

    /// 受信者ソースのタスクが完了しなかった（panic 等）
    #[error("受信者ソースのタスクが異常終了しました: {0}")]
    ProducerAborted(String),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn source_errorから変換できる() {
        let err: DispatchError = SourceError::malformed_record(2, "列数が 1 です").into();

        assert!(matches!(err, DispatchError::Source(_)));
        assert_eq!(
            err.to_string(),
            "受信者ソースが失敗しました: 受信者リストの 2 行目が不正です: 列数が 1 です"
        );
    }

    #[test]
    fn render_errorから変換できる() {
        let err: DispatchError = RenderError::TemplateNotFound("promo.html".to_string()).into();

        assert!(matches!(err, DispatchError::Template(_)));
    }
}
