//! # 配信結果の報告
//!
//! ワーカーが 1 件処理するたびに結果を報告する。既定の [`LogReporter`] は
//! 成功・失敗をビジネスイベントとして構造化ログに出力する。
//!
//! ログは調査用であり、機械可読な契約ではない。集計値（成功件数など）は出力しない。

use mailcast_domain::{DispatchOutcome, Recipient, WorkerId};
use mailcast_shared::{event_log::event, log_business_event};

/// 配信結果の報告先
pub trait DispatchReporter: Send + Sync {
    /// 受信者 1 件の処理結果を報告する
    fn report(&self, worker_id: WorkerId, recipient: &Recipient, outcome: &DispatchOutcome);
}

/// 構造化ログへ報告する
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl DispatchReporter for LogReporter {
    fn report(&self, worker_id: WorkerId, recipient: &Recipient, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Delivered => {
                log_business_event!(
                    event.category = event::category::DISPATCH,
                    event.action = event::action::MAIL_DELIVERED,
                    event.result = event::result::SUCCESS,
                    dispatch.worker_id = %worker_id,
                    dispatch.recipient = recipient.address(),
                    dispatch.outcome = outcome.label(),
                    "メール送信成功"
                );
            }
            DispatchOutcome::RenderFailed(reason) => {
                log_business_event!(
                    event.category = event::category::DISPATCH,
                    event.action = event::action::MAIL_RENDER_FAILED,
                    event.result = event::result::FAILURE,
                    dispatch.worker_id = %worker_id,
                    dispatch.recipient = recipient.address(),
                    error = %reason,
                    "テンプレートのレンダリングに失敗"
                );
            }
            DispatchOutcome::SendFailed(reason) => {
                log_business_event!(
                    event.category = event::category::DISPATCH,
                    event.action = event::action::MAIL_SEND_FAILED,
                    event.result = event::result::FAILURE,
                    dispatch.worker_id = %worker_id,
                    dispatch.recipient = recipient.address(),
                    error = %reason,
                    "メール送信失敗"
                );
            }
        }
    }
}
