//! # メッセージ
//!
//! テンプレートに渡すコンテキストと、送信トランスポートに渡す送信メッセージを定義する。
//!
//! ## ワイヤ形式
//!
//! [`OutboundMessage::to_bytes`] は以下の形式を厳密に出力する（改行は CRLF）:
//!
//! ```text
//! From: <sender-address>
//! To: <recipient-address>
//! Subject: <subject>
//! MIME-Version: 1.0
//! Content-Type: text/html; charset="UTF-8"
//!
//! <rendered body>
//! ```
//!
//! ヘッダーの順序は固定で、受信側との相互運用性のために変更してはならない。
//! 本文中の単独の LF も CRLF に揃えてから送る。

use crate::recipient::Recipient;

/// ヘッダー名
pub mod header {
    pub const FROM: &str = "From";
    pub const TO: &str = "To";
    pub const SUBJECT: &str = "Subject";
    pub const MIME_VERSION: &str = "MIME-Version";
    pub const CONTENT_TYPE: &str = "Content-Type";
}

/// `MIME-Version` ヘッダーの値
pub const MIME_VERSION: &str = "1.0";

/// `Content-Type` ヘッダーの値
pub const CONTENT_TYPE_HTML_UTF8: &str = r#"text/html; charset="UTF-8""#;

const CRLF: &str = "\r\n";

/// キャンペーン定数
///
/// 全受信者に共通の件名と本文メッセージ。設定から読み込まれ、
/// 配信パイプラインの生成時に渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Campaign {
    subject: String,
    message: String,
}

impl Campaign {
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// レンダリングコンテキスト
///
/// 受信者 1 件ごとにワーカーが生成し、そのワーカーだけが所有する。
/// ワーカー間で共有されることはない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderContext {
    name:    String,
    address: String,
    subject: String,
    message: String,
}

impl RenderContext {
    /// 受信者とキャンペーン定数からコンテキストを組み立てる
    pub fn new(recipient: &Recipient, campaign: &Campaign) -> Self {
        Self {
            name:    recipient.name().to_string(),
            address: recipient.address().to_string(),
            subject: campaign.subject().to_string(),
            message: campaign.message().to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// 送信メッセージのヘッダー 1 行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    name:  &'static str,
    value: String,
}

impl MessageHeader {
    fn new(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// 送信メッセージ
///
/// 受信者 1 件につき 1 度だけ組み立てられ、送信呼び出しで消費される。
/// ヘッダーは生成時に固定順で構築される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    from:    String,
    to:      String,
    body:    String,
    headers: Vec<MessageHeader>,
}

impl OutboundMessage {
    /// 送信メッセージを組み立てる
    ///
    /// 本文中の単独の LF は CRLF に揃える。
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        rendered_body: impl Into<String>,
    ) -> Self {
        let from = from.into();
        let to = to.into();
        let subject = subject.into();
        let body = normalize_line_endings(&rendered_body.into());

        let headers = vec![
            MessageHeader::new(header::FROM, from.as_str()),
            MessageHeader::new(header::TO, to.as_str()),
            MessageHeader::new(header::SUBJECT, subject.as_str()),
            MessageHeader::new(header::MIME_VERSION, MIME_VERSION),
            MessageHeader::new(header::CONTENT_TYPE, CONTENT_TYPE_HTML_UTF8),
        ];

        Self {
            from,
            to,
            body,
            headers,
        }
    }

    /// 送信元アドレス（`From`）
    pub fn sender(&self) -> &str {
        &self.from
    }

    /// 宛先アドレス（`To`）
    pub fn recipient(&self) -> &str {
        &self.to
    }

    /// ヘッダー一覧（ワイヤ形式と同じ順序）
    pub fn headers(&self) -> &[MessageHeader] {
        &self.headers
    }

    /// ワイヤ形式のバイト列に変換する
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut raw = String::with_capacity(256 + self.body.len());
        for header in &self.headers {
            raw.push_str(header.name);
            raw.push_str(": ");
            raw.push_str(&header.value);
            raw.push_str(CRLF);
        }
        raw.push_str(CRLF);
        raw.push_str(&self.body);
        raw.into_bytes()
    }
}

/// 単独の LF を CRLF に変換する（既存の CRLF はそのまま）
fn normalize_line_endings(body: &str) -> String {
    let mut normalized = String::with_capacity(body.len() + body.len() / 32);
    let mut prev = None;
    for c in body.chars() {
        if c == '\n' && prev != Some('\r') {
            normalized.push('\r');
        }
        normalized.push(c);
        prev = Some(c);
    }
    normalized
}
