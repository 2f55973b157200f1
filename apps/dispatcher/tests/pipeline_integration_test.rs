//! 配信パイプラインの統合テスト
//!
//! PipelineTestBuilder と infra のテスト用ダブルでパイプライン全体を動かす。

use std::{collections::HashMap, io::Write as _, sync::Arc, time::Duration};

use mailcast_dispatcher::{
    error::DispatchError,
    test_utils::PipelineTestBuilder,
    usecase::HANDOFF_CAPACITY,
};
use mailcast_domain::{DispatchOutcome, message::Campaign};
use mailcast_infra::{SourceErrorKind, mock::InMemoryRecipientSource, source::CsvRecipientSource};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn recipients(count: usize) -> InMemoryRecipientSource {
    let pairs: Vec<(String, String)> = (1..=count)
        .map(|n| (format!("User{n}"), format!("user{n}@x.com")))
        .collect();
    let pairs: Vec<(&str, &str)> = pairs
        .iter()
        .map(|(name, address)| (name.as_str(), address.as_str()))
        .collect();
    InMemoryRecipientSource::from_pairs(&pairs)
}

#[rstest]
#[case(1, 1)]
#[case(1, 7)]
#[case(3, 20)]
#[case(5, 50)]
#[tokio::test]
async fn test_run_全受信者がちょうど1回ずつ処理される(
    #[case] worker_count: usize,
    #[case] recipient_count: usize,
) {
    // Arrange
    let setup = PipelineTestBuilder::new().worker_count(worker_count).build();

    // Act
    setup.sut.run(Arc::new(recipients(recipient_count))).await.unwrap();

    // Assert
    let reports = setup.reporter.reports();
    assert_eq!(reports.len(), recipient_count);

    let mut per_address: HashMap<String, usize> = HashMap::new();
    for report in &reports {
        *per_address.entry(report.address.clone()).or_default() += 1;
        assert!((1..=worker_count).contains(&report.worker_id.as_usize()));
        assert_eq!(report.outcome, DispatchOutcome::Delivered);
    }
    assert_eq!(per_address.len(), recipient_count);
    assert!(per_address.values().all(|&n| n == 1));

    assert_eq!(setup.transport.sent_mails().len(), recipient_count);
    assert_eq!(setup.renderer.calls(), recipient_count);
}

#[tokio::test]
async fn test_run_受信者0件でもワーカーが全員終了して戻る() {
    // Arrange
    let setup = PipelineTestBuilder::new().worker_count(5).build();

    // Act
    let result = setup.sut.run(Arc::new(InMemoryRecipientSource::default())).await;

    // Assert
    assert!(result.is_ok());
    assert!(setup.reporter.reports().is_empty());
    assert!(setup.transport.attempted_addresses().is_empty());
    assert_eq!(setup.renderer.calls(), 0);
}

#[tokio::test]
async fn test_run_ワーカー1つでは受信者の順に送信される() {
    // Arrange
    let setup = PipelineTestBuilder::new()
        .worker_count(1)
        .campaign(Campaign::new("S", "M"))
        .build();
    let source = InMemoryRecipientSource::from_pairs(&[("Ana", "ana@x.com"), ("Bo", "bo@x.com")]);

    // Act
    setup.sut.run(Arc::new(source)).await.unwrap();

    // Assert
    let sent = setup.transport.sent_mails();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, "ana@x.com");
    assert_eq!(sent[1].to, "bo@x.com");
    assert_eq!(
        sent[0].raw_str(),
        "From: sender@example.com\r\n\
         To: ana@x.com\r\n\
         Subject: S\r\n\
         MIME-Version: 1.0\r\n\
         Content-Type: text/html; charset=\"UTF-8\"\r\n\
         \r\n\
         <p>Hello Ana</p>"
    );

    let reports = setup.reporter.reports();
    assert!(reports.iter().all(|r| r.worker_id.as_usize() == 1));
    assert!(reports.iter().all(|r| r.outcome.is_delivered()));
}

#[tokio::test]
async fn test_run_レンダリング失敗の受信者には送信せず他は配信される() {
    // Arrange
    let setup = PipelineTestBuilder::new()
        .worker_count(2)
        .render_failure_for("Cy")
        .build();
    let source = InMemoryRecipientSource::from_pairs(&[
        ("Ana", "ana@x.com"),
        ("Cy", "cy@x.com"),
        ("Bo", "bo@x.com"),
    ]);

    // Act
    setup.sut.run(Arc::new(source)).await.unwrap();

    // Assert
    assert!(matches!(
        setup.reporter.outcome_for("cy@x.com"),
        Some(DispatchOutcome::RenderFailed(_))
    ));
    assert_eq!(setup.reporter.outcome_for("ana@x.com"), Some(DispatchOutcome::Delivered));
    assert_eq!(setup.reporter.outcome_for("bo@x.com"), Some(DispatchOutcome::Delivered));

    let attempted = setup.transport.attempted_addresses();
    assert_eq!(attempted.len(), 2);
    assert!(!attempted.contains(&"cy@x.com".to_string()));
}

#[tokio::test]
async fn test_run_送信失敗は再試行されず他の受信者に影響しない() {
    // Arrange
    let setup = PipelineTestBuilder::new()
        .worker_count(3)
        .send_failure_for("user2@x.com")
        .build();

    // Act
    setup.sut.run(Arc::new(recipients(6))).await.unwrap();

    // Assert
    assert!(matches!(
        setup.reporter.outcome_for("user2@x.com"),
        Some(DispatchOutcome::SendFailed(_))
    ));
    let delivered = setup
        .reporter
        .reports()
        .iter()
        .filter(|r| r.outcome.is_delivered())
        .count();
    assert_eq!(delivered, 5);

    let attempts_to_failed = setup
        .transport
        .attempted_addresses()
        .iter()
        .filter(|a| a.as_str() == "user2@x.com")
        .count();
    assert_eq!(attempts_to_failed, 1);
}

#[tokio::test]
async fn test_run_ワーカー5つで受信者1件はちょうど1つのワーカーが処理する() {
    // Arrange
    let setup = PipelineTestBuilder::new().worker_count(5).build();

    // Act
    setup.sut.run(Arc::new(recipients(1))).await.unwrap();

    // Assert
    let reports = setup.reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].address, "user1@x.com");
    assert_eq!(setup.transport.attempted_addresses(), vec!["user1@x.com".to_string()]);
}

#[tokio::test]
async fn test_run_受信者ソースの失敗は渡し済みの受信者を処理してから返る() {
    // Arrange
    let setup = PipelineTestBuilder::new().worker_count(2).build();
    let source = recipients(3).failing_after_all();

    // Act
    let result = setup.sut.run(Arc::new(source)).await;

    // Assert
    let err = result.unwrap_err();
    assert!(matches!(
        &err,
        DispatchError::Source(e) if matches!(e.kind(), SourceErrorKind::MalformedRecord { line: 4, .. })
    ));
    assert_eq!(setup.reporter.reports().len(), 3);
    assert_eq!(setup.transport.sent_mails().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_run_送信前と送信成功後に待機する() {
    // Arrange
    let setup = PipelineTestBuilder::new()
        .worker_count(1)
        .delays(Duration::from_millis(200), Duration::from_millis(50))
        .send_failure_for("user2@x.com")
        .build();
    let started = tokio::time::Instant::now();

    // Act
    setup.sut.run(Arc::new(recipients(3))).await.unwrap();

    // Assert
    // 成功 2 件 × 250ms + 失敗 1 件 × 200ms
    assert_eq!(started.elapsed(), Duration::from_millis(700));
}

#[tokio::test(start_paused = true)]
async fn test_run_ワーカーが処理中の間ソースはワーカー数とチャネル容量の分しか先行しない() {
    // Arrange
    let worker_count = 3;
    let setup = PipelineTestBuilder::new()
        .worker_count(worker_count)
        .delays(Duration::from_secs(3600), Duration::ZERO)
        .build();
    let source = recipients(100);
    let progress = source.clone();
    let sut = setup.sut;

    // Act
    let running = tokio::spawn(async move { sut.run(Arc::new(source)).await });
    tokio::time::sleep(Duration::from_millis(500)).await;

    // Assert
    // 各ワーカーが 1 件ずつ送信前待機中で、チャネルに残りが詰まっている
    assert_eq!(progress.handed_off(), worker_count + HANDOFF_CAPACITY);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(progress.handed_off(), worker_count + HANDOFF_CAPACITY);
    assert!(setup.transport.attempted_addresses().is_empty());

    running.abort();
}

#[tokio::test]
async fn test_run_csvファイルの受信者を配信する() {
    // Arrange
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "name,address").unwrap();
    writeln!(file, "Ana, ana@x.com").unwrap();
    writeln!(file, "Bo,bo@x.com").unwrap();
    let source = CsvRecipientSource::new(file.path()).with_headers(true);
    let setup = PipelineTestBuilder::new().worker_count(2).build();

    // Act
    setup.sut.run(Arc::new(source)).await.unwrap();

    // Assert
    let mut attempted = setup.transport.attempted_addresses();
    attempted.sort();
    assert_eq!(attempted, vec!["ana@x.com".to_string(), "bo@x.com".to_string()]);
}

#[tokio::test]
async fn test_run_存在しない受信者リストはエラーを返す() {
    // Arrange
    let setup = PipelineTestBuilder::new().worker_count(2).build();
    let source = CsvRecipientSource::new("/nonexistent/mailcast/emails.csv");

    // Act
    let result = setup.sut.run(Arc::new(source)).await;

    // Assert
    assert!(matches!(
        result,
        Err(DispatchError::Source(e)) if matches!(e.kind(), SourceErrorKind::Io(_))
    ));
    assert!(setup.reporter.reports().is_empty());
}
