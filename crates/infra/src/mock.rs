//! # テスト用モック
//!
//! 配信パイプラインのテストで使用するインメモリ実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! mailcast-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    collections::HashSet,
    sync::{
        Arc,
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use mailcast_domain::{Recipient, TransportError};
use tokio::sync::mpsc;

use crate::{error::SourceError, source::RecipientSource, transport::MailTransport};

// ===== InMemoryRecipientSource =====

/// 固定の受信者一覧を送る受信者ソース
///
/// `fail_after_all` を指定すると、全件送った後に致命的エラーを返す。
/// 送信済み件数はクローン間で共有される。
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecipientSource {
    recipients:     Vec<Recipient>,
    fail_after_all: bool,
    handed_off:     Arc<AtomicUsize>,
}

impl InMemoryRecipientSource {
    pub fn new(recipients: Vec<Recipient>) -> Self {
        Self {
            recipients,
            fail_after_all: false,
            handed_off: Arc::default(),
        }
    }

    /// `(name, address)` の組から作成する
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|(name, address)| Recipient::new(*name, *address))
                .collect(),
        )
    }

    /// 全件送った後に不正行エラーを返すようにする
    pub fn failing_after_all(mut self) -> Self {
        self.fail_after_all = true;
        self
    }

    /// チャネルへの送信が完了した件数
    pub fn handed_off(&self) -> usize {
        self.handed_off.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecipientSource for InMemoryRecipientSource {
    async fn produce(&self, sink: mpsc::Sender<Recipient>) -> Result<(), SourceError> {
        for recipient in &self.recipients {
            sink.send(recipient.clone())
                .await
                .map_err(|_| SourceError::sink_closed())?;
            self.handed_off.fetch_add(1, Ordering::SeqCst);
        }

        if self.fail_after_all {
            let line = self.recipients.len() as u64 + 1;
            return Err(SourceError::malformed_record(line, "テスト用の不正行"));
        }
        Ok(())
    }
}

// ===== MockMailTransport =====

/// 送信されたメール 1 通
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub from: String,
    pub to:   String,
    pub raw:  Vec<u8>,
}

impl SentMail {
    /// 本体を UTF-8 文字列として返す
    pub fn raw_str(&self) -> String {
        String::from_utf8_lossy(&self.raw).into_owned()
    }
}

/// 送信内容を記録するメール送信モック
///
/// `fail_for` で指定した宛先への送信は `TransportError::Rejected` になる。
#[derive(Clone, Default)]
pub struct MockMailTransport {
    sent:       Arc<Mutex<Vec<SentMail>>>,
    attempts:   Arc<Mutex<Vec<String>>>,
    failing_to: Arc<Mutex<HashSet<String>>>,
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定した宛先への送信を失敗させる
    pub fn fail_for(&self, address: impl Into<String>) {
        self.failing_to.lock().unwrap().insert(address.into());
    }

    /// 成功した送信
    pub fn sent_mails(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    /// 送信を試みた宛先（失敗を含む、呼び出し順）
    pub fn attempted_addresses(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    async fn send(&self, from: &str, to: &str, raw_message: &[u8]) -> Result<(), TransportError> {
        self.attempts.lock().unwrap().push(to.to_string());

        if self.failing_to.lock().unwrap().contains(to) {
            return Err(TransportError::Rejected(format!("550 mailbox unavailable: {to}")));
        }

        self.sent.lock().unwrap().push(SentMail {
            from: from.to_string(),
            to:   to.to_string(),
            raw:  raw_message.to_vec(),
        });
        Ok(())
    }
}
