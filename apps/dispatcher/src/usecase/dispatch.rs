//! # 配信パイプライン
//!
//! 受信者ソース 1 つと固定数のワーカーを配信チャネルでつなぎ、
//! 全受信者の処理が終わるまで待つ。
//!
//! ## 構成
//!
//! ```text
//!                          ┌─────────── worker 1 ──┐
//! ┌────────┐  capacity 1   │                       │   render → send → report
//! │ source │ ────────────► ├─────────── worker 2 ──┤
//! └────────┘   (mpsc)      │          ...          │
//!                          └─────────── worker N ──┘
//!                                     │
//!                              JoinSet で全員の終了を待つ
//! ```
//!
//! ## 不変条件
//!
//! - チャネルは容量 1 の有界チャネル。ワーカーが受け取るまで次の受信者は
//!   送れないため、ソースが配信より先行しすぎない
//! - 受信側は全ワーカーで 1 つを共有し、1 件は必ず 1 つのワーカーだけが受け取る
//! - チャネルを閉じるのはソースの送信側ドロップのみ。ワーカーは閉じられて
//!   空になったときだけ終了する
//! - `run` はワーカー全員の終了後にのみ戻る。ワーカー数 > 1 のとき配信順序は保証しない
//! - レンダリング・送信にタイムアウトはない。ハングした呼び出しはそのワーカーを
//!   止め続ける

use std::{num::NonZeroUsize, sync::Arc, time::Duration};

use mailcast_domain::{
    DispatchOutcome,
    Recipient,
    WorkerId,
    message::{Campaign, OutboundMessage, RenderContext},
};
use mailcast_infra::{MailTransport, RecipientSource};
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinSet,
};
use tracing::Instrument as _;

use super::{reporter::DispatchReporter, template_renderer::MessageRenderer};
use crate::error::DispatchError;

/// 配信チャネルの容量
///
/// tokio の有界チャネルで取れる最小値。これ以上のバッファは持たない。
pub const HANDOFF_CAPACITY: usize = 1;

/// 既定のワーカー数
pub const DEFAULT_WORKER_COUNT: usize = 5;

/// 既定の送信前待機時間
pub const DEFAULT_PRE_SEND_DELAY: Duration = Duration::from_millis(200);

/// 既定の送信成功後待機時間
pub const DEFAULT_POST_SEND_DELAY: Duration = Duration::from_millis(50);

/// 配信パイプラインの設定
///
/// 生成時に渡され、実行中は変更されない。
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// ワーカー数
    pub worker_count:    NonZeroUsize,
    /// 送信前の待機時間（成否に関わらず毎回）
    pub pre_send_delay:  Duration,
    /// 送信成功後の待機時間
    pub post_send_delay: Duration,
    /// 送信元アドレス
    pub sender_address:  String,
    /// 本文テンプレートの識別子
    pub template_name:   String,
    /// キャンペーン定数
    pub campaign:        Campaign,
}

/// 配信パイプライン
pub struct DispatchPipeline {
    worker_count: NonZeroUsize,
    processor:    Arc<ItemProcessor>,
}

/// 全ワーカーで共有する読み取り専用の処理本体
struct ItemProcessor {
    settings:  DispatchSettings,
    renderer:  Arc<dyn MessageRenderer>,
    transport: Arc<dyn MailTransport>,
    reporter:  Arc<dyn DispatchReporter>,
}

impl DispatchPipeline {
    pub fn new(
        settings: DispatchSettings,
        renderer: Arc<dyn MessageRenderer>,
        transport: Arc<dyn MailTransport>,
        reporter: Arc<dyn DispatchReporter>,
    ) -> Self {
        Self {
            worker_count: settings.worker_count,
            processor:    Arc::new(ItemProcessor {
                settings,
                renderer,
                transport,
                reporter,
            }),
        }
    }

    /// 全受信者を配信する
    ///
    /// ソースがチャネルを閉じ、全ワーカーが残りを処理し終えるまで戻らない。
    /// 個々の受信者の失敗はエラーにならない。ソースが失敗した場合は、
    /// それまでに渡された受信者を処理し終えてから [`DispatchError::Source`] を返す。
    ///
    /// ワーカーが panic した場合、そのワーカーが処理中だった受信者は報告されずに失われる。
    /// panic はログに出力するだけで、他のワーカーが残りを処理し `Ok(())` を返しうる。
    pub async fn run(&self, source: Arc<dyn RecipientSource>) -> Result<(), DispatchError> {
        let (sink, inbox) = mpsc::channel::<Recipient>(HANDOFF_CAPACITY);
        let inbox = Arc::new(Mutex::new(inbox));

        let mut workers = JoinSet::new();
        for n in 1..=self.worker_count.get() {
            let id = WorkerId::new(n);
            let span = tracing::info_span!("worker", worker.id = %id);
            workers.spawn(
                worker_loop(id, Arc::clone(&inbox), Arc::clone(&self.processor)).instrument(span),
            );
        }
        // 受信側はワーカーだけが持つ。全ワーカーが消えればソースの送信は失敗する
        drop(inbox);

        tracing::info!(workers = self.worker_count.get(), "配信を開始");
        let producer = tokio::spawn(async move { source.produce(sink).await }.in_current_span());

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "ワーカーが異常終了");
            }
        }

        match producer.await {
            Ok(Ok(())) => {
                tracing::info!("配信が完了");
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "受信者ソースが失敗");
                Err(DispatchError::Source(e))
            }
            Err(e) => Err(DispatchError::ProducerAborted(e.to_string())),
        }
    }

    /// 受信者 1 件を処理する
    ///
    /// 送信前待機 → レンダリング → 送信 → 送信後待機（成功時のみ）。
    /// 失敗はその場で結果として返し、再試行しない。
    pub async fn process(&self, worker_id: WorkerId, recipient: &Recipient) -> DispatchOutcome {
        self.processor.process(worker_id, recipient).await
    }
}

impl ItemProcessor {
    async fn process(&self, worker_id: WorkerId, recipient: &Recipient) -> DispatchOutcome {
        let settings = &self.settings;

        pause(settings.pre_send_delay).await;

        let context = RenderContext::new(recipient, &settings.campaign);
        let body = match self.renderer.render(&settings.template_name, &context) {
            Ok(body) => body,
            Err(e) => return e.into(),
        };

        let message = OutboundMessage::new(
            settings.sender_address.as_str(),
            recipient.address(),
            settings.campaign.subject(),
            body,
        );

        tracing::debug!(
            worker.id = %worker_id,
            recipient = recipient.address(),
            "メール送信開始"
        );
        if let Err(e) = self
            .transport
            .send(message.sender(), message.recipient(), &message.to_bytes())
            .await
        {
            return e.into();
        }

        pause(settings.post_send_delay).await;
        DispatchOutcome::Delivered
    }
}

/// 1 ワーカーの受信ループ
///
/// チャネルが閉じられて空になったら終了する。
async fn worker_loop(
    id: WorkerId,
    inbox: Arc<Mutex<mpsc::Receiver<Recipient>>>,
    processor: Arc<ItemProcessor>,
) {
    tracing::debug!("ワーカー起動");
    loop {
        // ロックは受け取りの間だけ保持し、処理中は他のワーカーが受け取れる
        let next = inbox.lock().await.recv().await;
        let Some(recipient) = next else {
            break;
        };

        let outcome = processor.process(id, &recipient).await;
        processor.reporter.report(id, &recipient, &outcome);
    }
    tracing::debug!("ワーカー停止");
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
