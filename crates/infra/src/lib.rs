//! # Mailcast インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! 配信パイプラインが依存する協調オブジェクト（受信者ソース、メール送信）を
//! trait で定義し、その具体的な実装を提供する。外部システムの詳細を
//! カプセル化し、パイプラインをインフラの変更から保護する。
//!
//! ## 責務
//!
//! - **受信者ソース**: 受信者リスト（CSV）を読み込み、配信チャネルへ流し込む
//! - **メール送信**: SMTP サーバーへの送信（lettre）、送信しない Noop 実装
//! - **テスト用ダブル**: `test-utils` feature で公開するインメモリ実装
//!
//! ## 依存関係
//!
//! ```text
//! dispatcher → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`error`] - 受信者ソースのエラー定義
//! - [`source`] - 受信者ソース
//! - [`transport`] - メール送信
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use mailcast_infra::{source::CsvRecipientSource, transport::SmtpMailTransport};
//!
//! let source = CsvRecipientSource::new("./emails.csv");
//! let transport = SmtpMailTransport::new("localhost", 1025);
//! ```

pub mod error;
pub mod source;
pub mod transport;

#[cfg(feature = "test-utils")]
pub mod mock;

pub use error::{SourceError, SourceErrorKind};
pub use source::RecipientSource;
pub use transport::MailTransport;
