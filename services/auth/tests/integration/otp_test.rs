use std::time::Duration;

use chrono::Utc;

use ases_auth::domain::types::OtpChallenge;
use ases_auth::error::{AuthServiceError, NotifyError};
use ases_auth::usecase::otp::{IssueOtpInput, IssueOtpUseCase, VerifyOtpInput, VerifyOtpUseCase};

use crate::helpers::{
    ActivatedAfterLookup, FailingNotifier, HangingNotifier, MAIL_TIMEOUT, MockAccountRepo, MockNotifier,
    pending_account, test_account,
};

async fn submit(repo: &MockAccountRepo, email: &str, otp: &str) -> Result<(), AuthServiceError> {
    VerifyOtpUseCase {
        accounts: repo.clone(),
    }
    .execute(VerifyOtpInput {
        email: Some(email.to_owned()),
        otp: Some(otp.to_owned()),
    })
    .await
}

// ── Issuance ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_issue_and_deliver_code_for_pending_account() {
    let repo = MockAccountRepo::new(vec![pending_account("alice@co.com", "012345")]);
    let notifier = MockNotifier::default();
    let sent = notifier.sent_handle();

    let uc = IssueOtpUseCase {
        accounts: repo.clone(),
        notifier,
        mail_timeout: MAIL_TIMEOUT,
    };
    uc.execute(IssueOtpInput {
        email: Some("Alice@Co.com ".to_owned()),
    })
    .await
    .unwrap();

    let stored = repo.get("alice@co.com").unwrap().pending_otp.unwrap();
    assert_ne!(stored.code, "012345", "new code should replace the old one");
    assert!(stored.expires_at > Utc::now());

    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to_email, "alice@co.com");
    assert_eq!(sent[0].to_name, "Alice Example");
    assert_eq!(sent[0].code, stored.code);
    assert_eq!(sent[0].valid_minutes, 10);
}

#[tokio::test]
async fn should_return_not_found_without_mutation_for_unknown_email() {
    let repo = MockAccountRepo::new(vec![pending_account("alice@co.com", "012345")]);
    let notifier = MockNotifier::default();
    let sent = notifier.sent_handle();

    let uc = IssueOtpUseCase {
        accounts: repo.clone(),
        notifier,
        mail_timeout: MAIL_TIMEOUT,
    };
    let result = uc
        .execute(IssueOtpInput {
            email: Some("nobody@co.com".to_owned()),
        })
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::AccountNotFound)),
        "expected AccountNotFound, got {result:?}"
    );
    assert_eq!(repo.write_count(), 0);
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_refuse_new_code_for_active_account() {
    let repo = MockAccountRepo::new(vec![test_account("alice@co.com", true)]);
    let uc = IssueOtpUseCase {
        accounts: repo.clone(),
        notifier: MockNotifier::default(),
        mail_timeout: MAIL_TIMEOUT,
    };
    let result = uc
        .execute(IssueOtpInput {
            email: Some("alice@co.com".to_owned()),
        })
        .await;

    assert!(matches!(result, Err(AuthServiceError::AccountAlreadyActive)));
    assert!(repo.get("alice@co.com").unwrap().pending_otp.is_none());
}

#[tokio::test]
async fn should_not_reissue_code_when_activation_wins_the_race() {
    let repo = MockAccountRepo::new(vec![pending_account("alice@co.com", "012345")]);
    let notifier = MockNotifier::default();
    let sent = notifier.sent_handle();

    let uc = IssueOtpUseCase {
        accounts: ActivatedAfterLookup { inner: repo.clone() },
        notifier,
        mail_timeout: MAIL_TIMEOUT,
    };
    let result = uc
        .execute(IssueOtpInput {
            email: Some("alice@co.com".to_owned()),
        })
        .await;

    assert!(
        matches!(result, Err(AuthServiceError::AccountAlreadyActive)),
        "got {result:?}"
    );
    let account = repo.get("alice@co.com").unwrap();
    assert!(account.is_active);
    assert!(account.pending_otp.is_none(), "active account holds a live code");
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_require_email_for_issuance() {
    let uc = IssueOtpUseCase {
        accounts: MockAccountRepo::empty(),
        notifier: MockNotifier::default(),
        mail_timeout: MAIL_TIMEOUT,
    };
    let result = uc.execute(IssueOtpInput { email: None }).await;
    assert!(matches!(
        result,
        Err(AuthServiceError::Validation("Email is required"))
    ));
}

#[tokio::test]
async fn should_report_dispatch_failure_distinctly() {
    let repo = MockAccountRepo::new(vec![pending_account("alice@co.com", "012345")]);
    let uc = IssueOtpUseCase {
        accounts: repo,
        notifier: FailingNotifier,
        mail_timeout: MAIL_TIMEOUT,
    };
    let result = uc
        .execute(IssueOtpInput {
            email: Some("alice@co.com".to_owned()),
        })
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::Dispatch(NotifyError::Send(_)))),
        "got {result:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn should_time_out_stalled_relay() {
    let repo = MockAccountRepo::new(vec![pending_account("alice@co.com", "012345")]);
    let uc = IssueOtpUseCase {
        accounts: repo,
        notifier: HangingNotifier,
        mail_timeout: Duration::from_secs(10),
    };
    let result = uc
        .execute(IssueOtpInput {
            email: Some("alice@co.com".to_owned()),
        })
        .await;
    assert!(
        matches!(result, Err(AuthServiceError::Dispatch(NotifyError::Timeout))),
        "got {result:?}"
    );
}

// ── Verification ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_activate_account_on_exact_match() {
    let repo = MockAccountRepo::new(vec![pending_account("alice@co.com", "482193")]);

    submit(&repo, "alice@co.com", "482193").await.unwrap();

    let account = repo.get("alice@co.com").unwrap();
    assert!(account.is_active);
    assert!(account.pending_otp.is_none());
}

#[tokio::test]
async fn should_reject_near_misses() {
    let repo = MockAccountRepo::new(vec![pending_account("alice@co.com", "482193")]);

    for wrong in ["482194", "48219", "4821930", "000000", "abcdef"] {
        let result = submit(&repo, "alice@co.com", wrong).await;
        assert!(
            matches!(result, Err(AuthServiceError::InvalidOtp)),
            "{wrong}: got {result:?}"
        );
    }
    assert!(!repo.get("alice@co.com").unwrap().is_active);
    assert_eq!(repo.write_count(), 0);
}

#[tokio::test]
async fn should_reject_resubmitted_code() {
    let repo = MockAccountRepo::new(vec![pending_account("alice@co.com", "482193")]);

    submit(&repo, "alice@co.com", "482193").await.unwrap();
    let result = submit(&repo, "alice@co.com", "482193").await;

    assert!(matches!(result, Err(AuthServiceError::InvalidOtp)));
}

#[tokio::test]
async fn should_supersede_old_code_after_reissue() {
    let repo = MockAccountRepo::new(vec![pending_account("alice@co.com", "012345")]);
    let notifier = MockNotifier::default();
    let sent = notifier.sent_handle();
    IssueOtpUseCase {
        accounts: repo.clone(),
        notifier,
        mail_timeout: MAIL_TIMEOUT,
    }
    .execute(IssueOtpInput {
        email: Some("alice@co.com".to_owned()),
    })
    .await
    .unwrap();
    let fresh = sent.lock().unwrap()[0].code.clone();

    let old = submit(&repo, "alice@co.com", "012345").await;
    assert!(matches!(old, Err(AuthServiceError::InvalidOtp)));

    submit(&repo, "alice@co.com", &fresh).await.unwrap();
    assert!(repo.get("alice@co.com").unwrap().is_active);
}

#[tokio::test]
async fn should_reject_expired_code() {
    let mut account = pending_account("alice@co.com", "482193");
    account.pending_otp = Some(OtpChallenge::new(
        "482193".to_owned(),
        Utc::now() - chrono::Duration::minutes(11),
    ));
    let repo = MockAccountRepo::new(vec![account]);

    let result = submit(&repo, "alice@co.com", "482193").await;

    assert!(matches!(result, Err(AuthServiceError::OtpExpired)));
    assert!(!repo.get("alice@co.com").unwrap().is_active);
}

#[tokio::test]
async fn should_return_not_found_for_unknown_email_on_verify() {
    let repo = MockAccountRepo::empty();
    let result = submit(&repo, "nobody@co.com", "482193").await;
    assert!(matches!(result, Err(AuthServiceError::AccountNotFound)));
}

#[tokio::test]
async fn should_reject_code_when_none_pending() {
    let repo = MockAccountRepo::new(vec![test_account("alice@co.com", true)]);
    let result = submit(&repo, "alice@co.com", "482193").await;
    assert!(matches!(result, Err(AuthServiceError::InvalidOtp)));
}
