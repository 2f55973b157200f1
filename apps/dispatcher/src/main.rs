//! # Mailcast Dispatcher
//!
//! 受信者リストを読み込み、キャンペーンメールを並行して配信するバッチ。
//!
//! ## 処理の流れ
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  emails.csv  │────►│   source     │────►│  worker × N  │────►│ SMTP server  │
//! └──────────────┘     └──────────────┘     └──────────────┘     └──────────────┘
//!                         容量 1 の配信チャネル      render → send
//! ```
//!
//! 全受信者の処理が終わると終了する。個々の受信者の失敗はログに出力して
//! 次へ進み、終了コードには影響しない。受信者リストの読み込み失敗は
//! 処理済みの受信者を配信し終えてから非 0 で終了する。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `DISPATCH_WORKER_COUNT` | No | ワーカー数（デフォルト: `5`） |
//! | `DISPATCH_PRE_SEND_DELAY_MS` | No | 送信前の待機ミリ秒（デフォルト: `200`） |
//! | `DISPATCH_POST_SEND_DELAY_MS` | No | 送信成功後の待機ミリ秒（デフォルト: `50`） |
//! | `MAIL_FROM_ADDRESS` | No | 送信元アドレス |
//! | `MAIL_BACKEND` | No | `smtp` または `noop`（デフォルト: `smtp`） |
//! | `SMTP_HOST` / `SMTP_PORT` | No | SMTP サーバー（デフォルト: `localhost:1025`） |
//! | `TEMPLATE_NAME` | No | 本文テンプレート（デフォルト: `welcome.html`） |
//! | `TEMPLATE_PATH` | No | 起動時に追加登録するテンプレートファイル |
//! | `RECIPIENTS_PATH` | No | 受信者リスト（デフォルト: `./emails.csv`） |
//! | `RECIPIENTS_HAS_HEADER` | No | 1 行目をヘッダーとして読み飛ばす |
//! | `CAMPAIGN_SUBJECT` / `CAMPAIGN_MESSAGE` | No | キャンペーン件名・本文メッセージ |
//! | `LOG_FORMAT` | No | `json` または `pretty` |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（Mailpit の SMTP ポートへ送信）
//! cargo run -p mailcast-dispatcher
//!
//! # ドライラン
//! MAIL_BACKEND=noop RECIPIENTS_PATH=./emails.csv cargo run -p mailcast-dispatcher
//! ```

use std::sync::Arc;

use anyhow::Context as _;
use mailcast_dispatcher::{
    config::{DispatcherConfig, MailBackend},
    error::DispatchError,
    usecase::{DispatchPipeline, LogReporter, MessageRenderer, TemplateRenderer},
};
use mailcast_infra::{
    MailTransport,
    source::CsvRecipientSource,
    transport::{NoopMailTransport, SmtpMailTransport},
};
use mailcast_shared::observability::{self, TracingConfig};
use tracing::Instrument as _;

/// Dispatcher のエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    let tracing_config = TracingConfig::from_env("mailcast-dispatcher");
    observability::init_tracing(&tracing_config);
    let span = observability::service_span(&tracing_config);

    run().instrument(span).await
}

async fn run() -> anyhow::Result<()> {
    // 設定読み込み
    let config = DispatcherConfig::from_env().map_err(DispatchError::from)?;

    tracing::info!(
        workers = config.worker_count.get(),
        backend = %config.backend,
        recipients = %config.recipients_path.display(),
        "Dispatcher を起動します"
    );

    let renderer = build_renderer(&config)?;
    let transport = build_transport(&config);
    let source = CsvRecipientSource::new(&config.recipients_path)
        .with_headers(config.recipients_has_header);

    let pipeline = DispatchPipeline::new(
        config.dispatch_settings(),
        renderer,
        transport,
        Arc::new(LogReporter),
    );

    pipeline
        .run(Arc::new(source))
        .await
        .context("配信を完了できませんでした")?;

    tracing::info!("Dispatcher を終了します");
    Ok(())
}

/// テンプレートレンダラーを構築する
///
/// 参照するテンプレートが未登録でも起動は続ける。その場合は全受信者がレンダリング失敗になる。
fn build_renderer(config: &DispatcherConfig) -> Result<Arc<dyn MessageRenderer>, DispatchError> {
    let mut renderer = TemplateRenderer::new()?;

    if let Some(path) = &config.template_path {
        let name = renderer.register_file(path)?;
        tracing::info!(template = %name, "テンプレートを追加登録しました");
    }

    if !renderer.has_template(&config.template_name) {
        tracing::warn!(
            template = %config.template_name,
            "テンプレートが登録されていません。全受信者のレンダリングが失敗します"
        );
    }

    Ok(Arc::new(renderer))
}

/// 送信バックエンドを構築する
fn build_transport(config: &DispatcherConfig) -> Arc<dyn MailTransport> {
    match config.backend {
        MailBackend::Smtp => {
            tracing::info!(
                host = %config.smtp_host,
                port = config.smtp_port,
                "SMTP バックエンドを使用します"
            );
            Arc::new(SmtpMailTransport::new(&config.smtp_host, config.smtp_port))
        }
        MailBackend::Noop => {
            tracing::info!("Noop バックエンドを使用します（メールは送信されません）");
            Arc::new(NoopMailTransport)
        }
    }
}
