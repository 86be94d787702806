/// Integration tests for the submission pipeline
/// Uses stub mail transports and temporary log directories
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use servavto_leads::errors::AppError;
use servavto_leads::mailer::{MailTransport, OutgoingMail};
use servavto_leads::models::{FieldMap, RequesterInfo};
use servavto_leads::submission::{LeadSubmitter, MailSettings, SUCCESS_MESSAGE};
use servavto_leads::submission_log::SubmissionLog;

struct StubTransport {
    succeed: bool,
    calls: AtomicUsize,
}

impl StubTransport {
    fn new(succeed: bool) -> Arc<Self> {
        Arc::new(Self {
            succeed,
            calls: AtomicUsize::new(0),
        })
    }
}

impl MailTransport for StubTransport {
    fn send(&self, _mail: &OutgoingMail) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.succeed {
            Ok(())
        } else {
            anyhow::bail!("relay rejected message: 554 transaction failed")
        }
    }
}

struct Fixture {
    dir: tempfile::TempDir,
    submitter: LeadSubmitter,
}

impl Fixture {
    fn new(transport: Arc<dyn MailTransport>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let submitter = LeadSubmitter::new(
            MailSettings {
                to: "service-avto@mail.ru".to_string(),
                from: "noreply@servavto.ru".to_string(),
                reply_to: "noreply@servavto.ru".to_string(),
            },
            transport,
            SubmissionLog::new(
                dir.path().join("form_submissions.log"),
                dir.path().join("form_errors.log"),
            ),
            Duration::from_secs(5),
        );
        Self { dir, submitter }
    }

    fn read(&self, name: &str) -> Option<String> {
        std::fs::read_to_string(self.dir.path().join(name)).ok()
    }

    fn success_log(&self) -> Option<String> {
        self.read("form_submissions.log")
    }

    fn error_log(&self) -> Option<String> {
        self.read("form_errors.log")
    }
}

fn fields(pairs: &[(&str, &str)]) -> FieldMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn ivan() -> FieldMap {
    fields(&[
        ("form_type", "final"),
        ("name", "Иван"),
        ("phone", "89991234567"),
        ("car", "Toyota"),
        ("model", "Camry"),
        ("problem", "не работает стеклоподъемник"),
    ])
}

fn entry_count(log: &str, marker: &str) -> usize {
    log.lines().filter(|line| line.contains(marker)).count()
}

#[tokio::test]
async fn test_successful_final_submission_logs_once() {
    let transport = StubTransport::new(true);
    let fixture = Fixture::new(transport.clone());

    let receipt = fixture
        .submitter
        .submit(&ivan(), &RequesterInfo::default())
        .await
        .unwrap();

    assert_eq!(receipt.message, SUCCESS_MESSAGE);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

    let log = fixture.success_log().expect("success log written");
    assert_eq!(
        entry_count(&log, "Успешно отправлена заявка типа: final"),
        1
    );
    assert!(log.contains("\"phone\":\"+7 (999) 123-45-67\""));
    assert!(log.contains("\"name\":\"Иван\""));
    assert!(log.ends_with("\n\n"));
    assert!(fixture.error_log().is_none());
}

#[tokio::test]
async fn test_failed_dispatch_logs_error_only() {
    let transport = StubTransport::new(false);
    let fixture = Fixture::new(transport.clone());

    let err = fixture
        .submitter
        .submit(&ivan(), &RequesterInfo::default())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::MailDispatch(_)));
    assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!err.to_response_body().success);

    let log = fixture.error_log().expect("error log written");
    assert_eq!(
        entry_count(&log, "Ошибка отправки email для заявки типа: final"),
        1
    );
    assert!(log.contains("Ошибка: relay rejected message: 554 transaction failed"));
    assert!(fixture.success_log().is_none());
}

#[tokio::test]
async fn test_validation_failure_has_no_side_effects() {
    let transport = StubTransport::new(true);
    let fixture = Fixture::new(transport.clone());

    let err = fixture
        .submitter
        .submit(
            &fields(&[
                ("form_type", "calculator"),
                ("problem", "Стук"),
                ("model", "Rio"),
                ("phone", "89991234567"),
            ]),
            &RequesterInfo::default(),
        )
        .await
        .unwrap_err();

    let errors = err.to_response_body().errors.unwrap();
    assert!(errors.iter().any(|e| e.contains("Марка автомобиля")));
    assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    assert!(fixture.success_log().is_none());
    assert!(fixture.error_log().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_do_not_interleave() {
    const SUBMISSIONS: usize = 32;

    let fixture = Arc::new(Fixture::new(StubTransport::new(true)));

    let mut handles = vec![];
    for i in 0..SUBMISSIONS {
        let fixture = fixture.clone();
        handles.push(tokio::spawn(async move {
            let mut lead = ivan();
            lead.insert("name".to_string(), format!("Клиент {}", i));
            fixture
                .submitter
                .submit(&lead, &RequesterInfo::default())
                .await
        }));
    }

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    let log = fixture.success_log().expect("success log written");
    let blocks: Vec<&str> = log.trim_end().split("\n\n").collect();
    assert_eq!(blocks.len(), SUBMISSIONS);

    for block in &blocks {
        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines.len(), 2, "malformed entry: {:?}", block);
        assert!(lines[0].ends_with(" - Успешно отправлена заявка типа: final"));

        let json = lines[1].strip_prefix("Данные: ").expect("payload line");
        let payload: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(payload["phone"], "+7 (999) 123-45-67");
    }

    for i in 0..SUBMISSIONS {
        assert_eq!(
            log.matches(&format!("\"Клиент {}\"", i)).count(),
            1,
            "missing entry for client {}",
            i
        );
    }
}
