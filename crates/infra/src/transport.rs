//! # メール送信
//!
//! 組み立て済みのメッセージをメール送信エンドポイントへ渡す。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `MailTransport` trait でメール送信を抽象化
//! - **2 つの実装**: SMTP（Mailpit 等の認証なし SMTP）、Noop（送信しない）
//! - **環境変数切替**: `MAIL_BACKEND` でランタイム選択
//! - **エンドポイントは生成時に束縛**: 呼び出しごとに渡すのは送信元・宛先・本体のみ
//!
//! 実装は複数ワーカーから同時に呼び出されるため `Send + Sync` であること、
//! 呼び出し後にメッセージを保持しないこと、ある宛先の失敗が他の宛先の
//! 送信に影響しないことを求める。

mod noop;
mod smtp;

use async_trait::async_trait;
use mailcast_domain::TransportError;
pub use noop::NoopMailTransport;
pub use smtp::SmtpMailTransport;

/// メール送信トレイト
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// ワイヤ形式のメッセージを送信する
    ///
    /// # 引数
    ///
    /// - `from`: エンベロープの送信元アドレス
    /// - `to`: エンベロープの宛先アドレス
    /// - `raw_message`: ヘッダーと本文を含むメッセージ全体
    async fn send(&self, from: &str, to: &str, raw_message: &[u8]) -> Result<(), TransportError>;
}
