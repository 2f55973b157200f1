//! Noop メール送信実装
//!
//! メールを実際に送信せず、ログ出力のみ行う。
//! 受信者リストやテンプレートの確認（ドライラン）に使用する。

use async_trait::async_trait;
use mailcast_domain::TransportError;

use super::MailTransport;

/// Noop メール送信（ログ出力のみ）
#[derive(Debug, Clone, Default)]
pub struct NoopMailTransport;

#[async_trait]
impl MailTransport for NoopMailTransport {
    async fn send(&self, from: &str, to: &str, raw_message: &[u8]) -> Result<(), TransportError> {
        tracing::info!(
            from,
            to,
            bytes = raw_message.len(),
            "Noop: メール送信をスキップ"
        );
        Ok(())
    }
}
