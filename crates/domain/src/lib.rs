//! # Mailcast ドメイン層
//!
//! キャンペーンメール配信の中核となるドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **不変な値**: 受信者・送信メッセージは生成後に変更しない
//! - **I/O を持たない**: 送信・読み込み・テンプレート評価はインフラ層と
//!   アプリケーション層の責務とし、このクレートは型とワイヤ形式のみを扱う
//! - **結果は値で返す**: 1 件ごとの配信結果を [`DispatchOutcome`] で表現する
//!
//! ## 依存関係の方向
//!
//! ```text
//! dispatcher → infra → domain
//!      ↘                 ↑
//!        ────────────────
//! ```
//!
//! ## モジュール構成
//!
//! - [`recipient`] - 受信者
//! - [`message`] - キャンペーン定数、レンダリングコンテキスト、送信メッセージ
//! - [`dispatch`] - ワーカー ID と 1 件ごとの配信結果
//! - [`error`] - レンダリング・送信エラー
//!
//! ## 使用例
//!
//! ```rust
//! use mailcast_domain::{
//!     message::{Campaign, OutboundMessage, RenderContext},
//!     recipient::Recipient,
//! };
//!
//! let recipient = Recipient::new("Ana", "ana@example.com");
//! let campaign = Campaign::new("Hello", "Welcome aboard");
//! let context = RenderContext::new(&recipient, &campaign);
//! assert_eq!(context.name(), "Ana");
//!
//! let message = OutboundMessage::new(
//!     "noreply@example.com",
//!     recipient.address(),
//!     campaign.subject(),
//!     "<p>Hi Ana</p>",
//! );
//! assert!(message.to_bytes().starts_with(b"From: noreply@example.com\r\n"));
//! ```

pub mod dispatch;
pub mod error;
pub mod message;
pub mod recipient;

pub use dispatch::{DispatchOutcome, WorkerId};
pub use error::{RenderError, TransportError};
pub use recipient::Recipient;
