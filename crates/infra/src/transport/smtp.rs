//! SMTP メール送信実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! 認証・TLS なしで接続するため、Mailpit（ローカル SMTP サーバー）や
//! 社内リレー向け。

use async_trait::async_trait;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor, address::Envelope};
use mailcast_domain::TransportError;

use super::MailTransport;

/// SMTP メール送信
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をラップする。
/// `&self` で送信できるため、複数ワーカーから共有して使う。
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    /// 新しい SMTP 送信インスタンスを作成
    ///
    /// # 引数
    ///
    /// - `host`: SMTP サーバーのホスト名（例: "localhost"）
    /// - `port`: SMTP サーバーのポート番号（例: 1025 for Mailpit）
    pub fn new(host: &str, port: u16) -> Self {
        // builder_dangerous: TLS なしで接続（Mailpit 等のローカル SMTP 向け）
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(port)
            .build();

        Self { transport }
    }
}

/// 送信元・宛先アドレスから SMTP エンベロープを作る
fn build_envelope(from: &str, to: &str) -> Result<Envelope, TransportError> {
    let from: Address = from
        .parse()
        .map_err(|e| TransportError::InvalidAddress(format!("送信元 {from}: {e}")))?;
    let to: Address = to
        .parse()
        .map_err(|e| TransportError::InvalidAddress(format!("宛先 {to}: {e}")))?;

    Envelope::new(Some(from), vec![to])
        .map_err(|e| TransportError::InvalidAddress(format!("エンベロープ構築失敗: {e}")))
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, from: &str, to: &str, raw_message: &[u8]) -> Result<(), TransportError> {
        let envelope = build_envelope(from, to)?;

        self.transport
            .send_raw(&envelope, raw_message)
            .await
            .map_err(|e| TransportError::Rejected(format!("SMTP 送信失敗: {e}")))?;

        Ok(())
    }
}
