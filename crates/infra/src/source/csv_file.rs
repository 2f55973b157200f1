//! CSV 受信者ソース
//!
//! `name,address` 形式の CSV ファイルを読み込む。前後の空白は除去し、
//! 空行と空白だけの行は読み飛ばす。列数が 2 でない行やアドレスが空の行は、実行全体を
//! 止める致命的なエラーとして扱う。
//!
//! CSV のパースは同期 I/O のため `spawn_blocking` 上で行い、
//! `blocking_send` でチャネルに渡す。チャネルに空きがない間は読み込みも
//! 止まるため、読み込みが配信より先行しすぎることはない。

use std::{io::Read, path::PathBuf};

use async_trait::async_trait;
use mailcast_domain::Recipient;
use tokio::sync::mpsc;

use super::RecipientSource;
use crate::error::SourceError;

/// CSV ファイルの受信者ソース
#[derive(Debug, Clone)]
pub struct CsvRecipientSource {
    path:        PathBuf,
    has_headers: bool,
}

impl CsvRecipientSource {
    /// 新しい CSV ソースを作成（ヘッダー行なし）
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path:        path.into(),
            has_headers: false,
        }
    }

    /// 先頭行をヘッダーとして読み飛ばすかどうかを指定する
    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }
}

#[async_trait]
impl RecipientSource for CsvRecipientSource {
    #[tracing::instrument(skip_all, level = "debug", fields(path = %self.path.display()))]
    async fn produce(&self, sink: mpsc::Sender<Recipient>) -> Result<(), SourceError> {
        let path = self.path.clone();
        let has_headers = self.has_headers;
        let span = tracing::Span::current();

        let produced = tokio::task::spawn_blocking(move || {
            let _enter = span.enter();
            let file = std::fs::File::open(&path)?;
            stream_records(file, has_headers, &sink)
        })
        .await
        .map_err(|e| SourceError::from(std::io::Error::other(e)))??;

        tracing::info!(count = produced, "受信者リストの読み込みが完了");
        Ok(())
    }
}

/// CSV を 1 行ずつパースしてチャネルへ送る
///
/// 送った件数を返す。ブロッキングコンテキストから呼び出すこと。
fn stream_records<R: Read>(
    reader: R,
    has_headers: bool,
    sink: &mpsc::Sender<Recipient>,
) -> Result<usize, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut produced = 0;
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, csv::Position::line);

        // 空白だけの行はトリム後に空フィールドだけになる
        if record.iter().all(str::is_empty) {
            continue;
        }

        let recipient = match (record.len(), record.get(0), record.get(1)) {
            (2, Some(name), Some(address)) if !address.is_empty() => {
                Recipient::new(name, address)
            }
            (2, _, _) => return Err(SourceError::malformed_record(line, "アドレスが空です")),
            (len, _, _) => {
                return Err(SourceError::malformed_record(
                    line,
                    format!("列数が {len} です（name,address の 2 列が必要）"),
                ));
            }
        };

        sink.blocking_send(recipient)
            .map_err(|_| SourceError::sink_closed())?;
        produced += 1;
    }

    Ok(produced)
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::error::SourceErrorKind;

    fn drain(mut rx: mpsc::Receiver<Recipient>) -> Vec<Recipient> {
        let mut recipients = Vec::new();
        while let Ok(recipient) = rx.try_recv() {
            recipients.push(recipient);
        }
        recipients
    }

    #[test]
    fn ファイルの順序どおりに送る() {
        let (tx, rx) = mpsc::channel(8);
        let input = "Ana,ana@x.com\nBo,bo@x.com\n";

        let produced = stream_records(input.as_bytes(), false, &tx).unwrap();

        assert_eq!(produced, 2);
        assert_eq!(
            drain(rx),
            vec![
                Recipient::new("Ana", "ana@x.com"),
                Recipient::new("Bo", "bo@x.com"),
            ]
        );
    }

    #[test]
    fn 空白を除去し空行を読み飛ばす() {
        let (tx, rx) = mpsc::channel(8);
        let input = " Ana , ana@x.com \n\n\"Bo, Jr\",bo@x.com\n";

        stream_records(input.as_bytes(), false, &tx).unwrap();

        assert_eq!(
            drain(rx),
            vec![
                Recipient::new("Ana", "ana@x.com"),
                Recipient::new("Bo, Jr", "bo@x.com"),
            ]
        );
    }

    #[rstest]
    #[case::空白だけの行("Ana,ana@x.com\n   \nBo,bo@x.com\n")]
    #[case::タブだけの行("Ana,ana@x.com\n\t\nBo,bo@x.com\n")]
    #[case::空フィールドだけの行("Ana,ana@x.com\n , \nBo,bo@x.com\n")]
    fn 空白だけの行は読み飛ばして後続の受信者を送る(#[case] input: &str) {
        let (tx, rx) = mpsc::channel(8);

        let produced = stream_records(input.as_bytes(), false, &tx).unwrap();

        assert_eq!(produced, 2);
        assert_eq!(
            drain(rx),
            vec![
                Recipient::new("Ana", "ana@x.com"),
                Recipient::new("Bo", "bo@x.com"),
            ]
        );
    }

    #[test]
    fn ヘッダー行を読み飛ばせる() {
        let (tx, rx) = mpsc::channel(8);
        let input = "name,email\nCy,cy@x.com\n";

        stream_records(input.as_bytes(), true, &tx).unwrap();

        assert_eq!(drain(rx), vec![Recipient::new("Cy", "cy@x.com")]);
    }

    #[test]
    fn 空の入力は0件で正常終了する() {
        let (tx, rx) = mpsc::channel(1);

        let produced = stream_records("".as_bytes(), false, &tx).unwrap();

        assert_eq!(produced, 0);
        assert!(drain(rx).is_empty());
    }

    #[test]
    fn 列数が不正な行は行番号付きのエラーになる() {
        let (tx, rx) = mpsc::channel(8);
        let input = "Ana,ana@x.com\nBo\n";

        let err = stream_records(input.as_bytes(), false, &tx).unwrap_err();

        assert!(matches!(
            err.kind(),
            SourceErrorKind::MalformedRecord { line: 2, .. }
        ));
        // エラー前の受信者は送られている
        assert_eq!(drain(rx), vec![Recipient::new("Ana", "ana@x.com")]);
    }

    #[test]
    fn アドレスが空の行はエラーになる() {
        let (tx, _rx) = mpsc::channel(8);

        let err = stream_records("Ana,\n".as_bytes(), false, &tx).unwrap_err();

        assert!(matches!(
            err.kind(),
            SourceErrorKind::MalformedRecord { line: 1, reason } if reason == "アドレスが空です"
        ));
    }

    #[rstest]
    #[case::列が1つ("Ana\n", 1)]
    #[case::列が3つ("Ana,ana@x.com,extra\n", 1)]
    #[case::後続行が不正("Ana,ana@x.com\nBo,bo@x.com,x\n", 2)]
    fn 列数が2でない行は不正行になる(#[case] input: &str, #[case] expected_line: u64) {
        let (tx, _rx) = mpsc::channel(8);

        let err = stream_records(input.as_bytes(), false, &tx).unwrap_err();

        assert!(matches!(
            err.kind(),
            SourceErrorKind::MalformedRecord { line, .. } if *line == expected_line
        ));
    }

    #[test]
    fn 受信側が閉じているとsink_closedになる() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);

        let err = stream_records("Ana,ana@x.com\n".as_bytes(), false, &tx).unwrap_err();

        assert!(matches!(err.kind(), SourceErrorKind::SinkClosed));
    }

    #[tokio::test]
    async fn produceはファイルを読み込み完了後にチャネルを閉じる() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Ana,ana@x.com").unwrap();
        writeln!(file, "Bo,bo@x.com").unwrap();

        let source = CsvRecipientSource::new(file.path());
        let (tx, mut rx) = mpsc::channel(1);

        let producer = tokio::spawn(async move { source.produce(tx).await });

        let mut received = Vec::new();
        while let Some(recipient) = rx.recv().await {
            received.push(recipient);
        }

        producer.await.unwrap().unwrap();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].address(), "ana@x.com");
        assert_eq!(received[1].address(), "bo@x.com");
    }

    #[tokio::test]
    async fn 存在しないファイルはioエラーになりチャネルは閉じられる() {
        let source = CsvRecipientSource::new("/nonexistent/mailcast/emails.csv");
        let (tx, mut rx) = mpsc::channel(1);

        let err = source.produce(tx).await.unwrap_err();

        assert!(matches!(err.kind(), SourceErrorKind::Io(_)));
        assert!(rx.recv().await.is_none());
    }
}
