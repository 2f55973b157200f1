//! # Dispatcher 設定
//!
//! 環境変数から配信の設定を読み込む。起動時に 1 度だけ読み込み、
//! 以降は値として各コンポーネントへ渡す。
//!
//! 不正な値（数値でない、ワーカー数 0、未知のバックエンド）は起動を中止する。

use std::{env, num::NonZeroUsize, path::PathBuf, str::FromStr, time::Duration};

use mailcast_domain::message::Campaign;
use strum::{Display, EnumString};
use thiserror::Error;

use crate::usecase::{
    DEFAULT_TEMPLATE,
    DispatchSettings,
    dispatch::{DEFAULT_POST_SEND_DELAY, DEFAULT_PRE_SEND_DELAY, DEFAULT_WORKER_COUNT},
};

/// 既定の送信元アドレス
pub const DEFAULT_FROM_ADDRESS: &str = "noreply@mailcast.example.com";

/// 既定のキャンペーン件名
pub const DEFAULT_CAMPAIGN_SUBJECT: &str = "Welcome to Our Email Campaign";

/// 既定のキャンペーン本文メッセージ
pub const DEFAULT_CAMPAIGN_MESSAGE: &str = "We're excited to have you join our community!";

/// 設定エラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 値を解釈できない
    #[error("{key} の値が不正です: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    /// ワーカー数が 0
    #[error("{key} は 1 以上である必要があります")]
    ZeroWorkers { key: &'static str },
}

/// メール送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MailBackend {
    /// SMTP サーバー経由で送信
    #[default]
    Smtp,
    /// 送信しない（ログ出力のみ）
    Noop,
}

/// Dispatcher の設定
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// ワーカー数
    pub worker_count:          NonZeroUsize,
    /// 送信前の待機時間
    pub pre_send_delay:        Duration,
    /// 送信成功後の待機時間
    pub post_send_delay:       Duration,
    /// 送信元メールアドレス
    pub from_address:          String,
    /// 送信バックエンド
    pub backend:               MailBackend,
    /// SMTP ホスト（backend=smtp の場合に使用）
    pub smtp_host:             String,
    /// SMTP ポート（backend=smtp の場合に使用）
    pub smtp_port:             u16,
    /// 本文テンプレートの識別子
    pub template_name:         String,
    /// 起動時に追加登録するテンプレートファイル
    pub template_path:         Option<PathBuf>,
    /// 受信者リストのパス
    pub recipients_path:       PathBuf,
    /// 受信者リストの 1 行目がヘッダーかどうか
    pub recipients_has_header: bool,
    /// キャンペーン件名
    pub campaign_subject:      String,
    /// キャンペーン本文メッセージ
    pub campaign_message:      String,
}

impl DispatcherConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// 未設定のキーは既定値になる。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let string_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let worker_count = parse_or(&lookup, "DISPATCH_WORKER_COUNT", DEFAULT_WORKER_COUNT)?;
        let worker_count = NonZeroUsize::new(worker_count).ok_or(ConfigError::ZeroWorkers {
            key: "DISPATCH_WORKER_COUNT",
        })?;

        Ok(Self {
            worker_count,
            pre_send_delay: millis_or(&lookup, "DISPATCH_PRE_SEND_DELAY_MS", DEFAULT_PRE_SEND_DELAY)?,
            post_send_delay: millis_or(
                &lookup,
                "DISPATCH_POST_SEND_DELAY_MS",
                DEFAULT_POST_SEND_DELAY,
            )?,
            from_address: string_or("MAIL_FROM_ADDRESS", DEFAULT_FROM_ADDRESS),
            backend: parse_or(&lookup, "MAIL_BACKEND", MailBackend::default())?,
            smtp_host: string_or("SMTP_HOST", "localhost"),
            smtp_port: parse_or(&lookup, "SMTP_PORT", 1025)?,
            template_name: string_or("TEMPLATE_NAME", DEFAULT_TEMPLATE),
            template_path: lookup("TEMPLATE_PATH")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            recipients_path: PathBuf::from(string_or("RECIPIENTS_PATH", "./emails.csv")),
            recipients_has_header: parse_or(&lookup, "RECIPIENTS_HAS_HEADER", false)?,
            campaign_subject: string_or("CAMPAIGN_SUBJECT", DEFAULT_CAMPAIGN_SUBJECT),
            campaign_message: string_or("CAMPAIGN_MESSAGE", DEFAULT_CAMPAIGN_MESSAGE),
        })
    }

    /// 配信パイプラインの設定を作る
    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            worker_count:    self.worker_count,
            pre_send_delay:  self.pre_send_delay,
            post_send_delay: self.post_send_delay,
            sender_address:  self.from_address.clone(),
            template_name:   self.template_name.clone(),
            campaign:        Campaign::new(&self.campaign_subject, &self.campaign_message),
        }
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(parsed),
            Err(_) => Err(ConfigError::InvalidValue { key, value }),
        },
    }
}

fn millis_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    parse_or(lookup, key, default_ms).map(Duration::from_millis)
}
