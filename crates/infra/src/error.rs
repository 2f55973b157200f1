//! # 受信者ソースのエラー定義
//!
//! 受信者リストの読み込みで発生するエラーを表現する。受信者ソースが
//! 処理を続けられないため、配信実行全体にとって致命的なエラーとして扱う。
//!
//! ## 設計方針
//!
//! - **エラーの変換**: `std::io::Error`, `csv::Error` をラップ
//! - **SpanTrace 自動捕捉**: `From` 実装や convenience constructor で
//!   エラー生成時の呼び出し経路を自動記録する
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`SourceError`]: エラー種別（[`SourceErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`SourceErrorKind`]: エラーの具体的な種別

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// 受信者ソースで発生するエラー
#[derive(Display)]
#[display("{kind}")]
pub struct SourceError {
    kind:       SourceErrorKind,
    span_trace: SpanTrace,
}

/// 受信者ソースエラーの種別
#[derive(Debug, Error)]
pub enum SourceErrorKind {
    /// 受信者リストを読み込めない
    #[error("受信者リストの読み込みに失敗: {0}")]
    Io(#[source] std::io::Error),

    /// CSV として解釈できない
    #[error("受信者リストのパースに失敗: {0}")]
    Csv(#[source] csv::Error),

    /// 行の形式が `name,address` ではない
    #[error("受信者リストの {line} 行目が不正です: {reason}")]
    MalformedRecord {
        /// 1 始まりの行番号
        line:   u64,
        /// 不正の内容
        reason: String,
    },

    /// 配信チャネルの受信側がすべて終了している
    ///
    /// ワーカーが全滅した場合にのみ発生する。
    #[error("配信チャネルが閉じられています")]
    SinkClosed,
}

// ===== SourceError のメソッド =====

impl SourceError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &SourceErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// SourceError を分解して SourceErrorKind と SpanTrace を取り出す
    pub fn into_parts(self) -> (SourceErrorKind, SpanTrace) {
        (self.kind, self.span_trace)
    }

    // ===== Convenience constructors =====

    /// 不正な行のエラーを生成する
    pub fn malformed_record(line: u64, reason: impl Into<String>) -> Self {
        Self::from_kind(SourceErrorKind::MalformedRecord {
            line,
            reason: reason.into(),
        })
    }

    /// チャネル切断エラーを生成する
    pub fn sink_closed() -> Self {
        Self::from_kind(SourceErrorKind::SinkClosed)
    }

    fn from_kind(kind: SourceErrorKind) -> Self {
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }
}

// ===== トレイト実装 =====

impl fmt::Debug for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

// ===== From 実装（SpanTrace 自動キャプチャ） =====

impl From<std::io::Error> for SourceError {
    fn from(source: std::io::Error) -> Self {
        Self::from_kind(SourceErrorKind::Io(source))
    }
}

impl From<csv::Error> for SourceError {
    fn from(source: csv::Error) -> Self {
        Self::from_kind(SourceErrorKind::Csv(source))
    }
}
