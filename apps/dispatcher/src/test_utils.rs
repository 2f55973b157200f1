//! テスト用ユーティリティ
//!
//! 配信パイプラインの統合テストで使う記録用の報告先とレンダラー、
//! およびパイプラインのセットアップを簡略化するビルダーを提供する。

use std::{
    collections::HashSet,
    num::NonZeroUsize,
    sync::{
        Arc,
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use mailcast_domain::{
    DispatchOutcome,
    Recipient,
    RenderError,
    WorkerId,
    message::{Campaign, RenderContext},
};
use mailcast_infra::mock::MockMailTransport;

use crate::usecase::{
    DEFAULT_TEMPLATE,
    DispatchPipeline,
    DispatchReporter,
    DispatchSettings,
    MessageRenderer,
};

/// 報告された配信結果 1 件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedOutcome {
    pub worker_id: WorkerId,
    pub address:   String,
    pub outcome:   DispatchOutcome,
}

/// 報告された結果を順に記録する報告先
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    reports: Arc<Mutex<Vec<ReportedOutcome>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 報告された結果（報告順）
    pub fn reports(&self) -> Vec<ReportedOutcome> {
        self.reports.lock().unwrap().clone()
    }

    /// 指定した宛先の結果
    pub fn outcome_for(&self, address: &str) -> Option<DispatchOutcome> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.address == address)
            .map(|r| r.outcome.clone())
    }
}

impl DispatchReporter for RecordingReporter {
    fn report(&self, worker_id: WorkerId, recipient: &Recipient, outcome: &DispatchOutcome) {
        self.reports.lock().unwrap().push(ReportedOutcome {
            worker_id,
            address: recipient.address().to_string(),
            outcome: outcome.clone(),
        });
    }
}

/// 固定形式の本文を返すレンダラー
///
/// `fail_for_name` で指定した受信者名のときだけ失敗する。
#[derive(Debug, Clone, Default)]
pub struct StubRenderer {
    failing_names: Arc<Mutex<HashSet<String>>>,
    calls:         Arc<AtomicUsize>,
}

impl StubRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定した受信者名のレンダリングを失敗させる
    pub fn fail_for_name(&self, name: impl Into<String>) {
        self.failing_names.lock().unwrap().insert(name.into());
    }

    /// `render` が呼ばれた回数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MessageRenderer for StubRenderer {
    fn render(&self, template: &str, context: &RenderContext) -> Result<String, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing_names.lock().unwrap().contains(context.name()) {
            return Err(RenderError::Failed(format!(
                "{template}: 変数を展開できません ({})",
                context.name()
            )));
        }
        Ok(format!("<p>Hello {}</p>", context.name()))
    }
}

/// パイプラインテストのセットアップ
pub struct PipelineTestSetup {
    pub sut:       DispatchPipeline,
    pub renderer:  StubRenderer,
    pub transport: MockMailTransport,
    pub reporter:  RecordingReporter,
}

/// パイプラインテストビルダー
///
/// 待機時間 0、送信元 `sender@example.com`、件名 `Subject` を既定とする。
///
/// # 使用例
///
/// ```ignore
/// use mailcast_dispatcher::test_utils::PipelineTestBuilder;
///
/// let setup = PipelineTestBuilder::new().worker_count(1).build();
/// setup.sut.run(source).await.unwrap();
/// ```
pub struct PipelineTestBuilder {
    settings:  DispatchSettings,
    renderer:  StubRenderer,
    transport: MockMailTransport,
}

impl Default for PipelineTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineTestBuilder {
    pub fn new() -> Self {
        Self {
            settings:  DispatchSettings {
                worker_count:    NonZeroUsize::MIN,
                pre_send_delay:  Duration::ZERO,
                post_send_delay: Duration::ZERO,
                sender_address:  "sender@example.com".to_string(),
                template_name:   DEFAULT_TEMPLATE.to_string(),
                campaign:        Campaign::new("Subject", "Message"),
            },
            renderer:  StubRenderer::new(),
            transport: MockMailTransport::new(),
        }
    }

    /// ワーカー数を指定する（0 は不可）
    pub fn worker_count(mut self, count: usize) -> Self {
        self.settings.worker_count = NonZeroUsize::new(count).expect("ワーカー数は 1 以上");
        self
    }

    /// 送信前・送信成功後の待機時間を指定する
    pub fn delays(mut self, pre_send: Duration, post_send: Duration) -> Self {
        self.settings.pre_send_delay = pre_send;
        self.settings.post_send_delay = post_send;
        self
    }

    /// キャンペーン定数を指定する
    pub fn campaign(mut self, campaign: Campaign) -> Self {
        self.settings.campaign = campaign;
        self
    }

    /// レンダリングを失敗させる受信者名
    pub fn render_failure_for(self, name: &str) -> Self {
        self.renderer.fail_for_name(name);
        self
    }

    /// 送信を失敗させる宛先
    pub fn send_failure_for(self, address: &str) -> Self {
        self.transport.fail_for(address);
        self
    }

    pub fn build(self) -> PipelineTestSetup {
        let reporter = RecordingReporter::new();
        let sut = DispatchPipeline::new(
            self.settings,
            Arc::new(self.renderer.clone()),
            Arc::new(self.transport.clone()),
            Arc::new(reporter.clone()),
        );

        PipelineTestSetup {
            sut,
            renderer: self.renderer,
            transport: self.transport,
            reporter,
        }
    }
}
