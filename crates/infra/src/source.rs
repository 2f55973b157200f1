//! # 受信者ソース
//!
//! 受信者リストを読み込み、配信チャネルへ 1 件ずつ流し込む。
//!
//! ## 契約
//!
//! - 受信者はリストの順序どおりに送る
//! - 入力を使い切ったら（0 件の場合も含め）チャネルを 1 度だけ閉じる
//! - 閉じた後に送ることはない
//!
//! `produce` は送信側を値で受け取る。戻った時点で送信側がドロップされ、
//! それがチャネルを閉じる唯一の契機になるため、上記の「1 度だけ」「閉じた後に
//! 送らない」は型で保証される。

mod csv_file;

use async_trait::async_trait;
pub use csv_file::CsvRecipientSource;
use mailcast_domain::Recipient;
use tokio::sync::mpsc;

use crate::error::SourceError;

/// 受信者ソーストレイト
#[async_trait]
pub trait RecipientSource: Send + Sync {
    /// すべての受信者を `sink` に送り、完了後に `sink` を閉じる
    ///
    /// エラーを返した場合も `sink` は閉じられる。それまでに送った受信者は
    /// ワーカーによって処理される。
    async fn produce(&self, sink: mpsc::Sender<Recipient>) -> Result<(), SourceError>;
}
