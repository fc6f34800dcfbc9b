use ases_auth::error::{AuthServiceError, NotifyError};
use ases_auth::usecase::register::{RegisterInput, RegisterUseCase};
use ases_domain::account::{Locale, Role};

use crate::helpers::{FailingNotifier, MAIL_TIMEOUT, MockAccountRepo, MockNotifier, test_account};

fn input(email: &str) -> RegisterInput {
    RegisterInput {
        full_name: Some("Alice Example".to_owned()),
        position: Some("Engineer".to_owned()),
        employee_id: Some("E-1001".to_owned()),
        email: Some(email.to_owned()),
        password: Some("s3cret!".to_owned()),
        language: Some("ar".to_owned()),
    }
}

#[tokio::test]
async fn should_create_inactive_account_with_pending_code() {
    let repo = MockAccountRepo::empty();
    let notifier = MockNotifier::default();
    let sent = notifier.sent_handle();
    let uc = RegisterUseCase {
        accounts: repo.clone(),
        notifier,
        mail_timeout: MAIL_TIMEOUT,
    };

    let id = uc.execute(input("Alice@Co.com")).await.unwrap();

    let account = repo.get("alice@co.com").expect("account stored under normalized email");
    assert_eq!(account.id, id);
    assert!(!account.is_active);
    assert_eq!(account.role, Role::User);
    assert_eq!(account.language, Locale::Ar);
    assert!(account.password_hash.starts_with("$argon2id$"));
    assert_ne!(account.password_hash, "s3cret!");

    let pending = account.pending_otp.expect("pending code");
    let sent = sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].code, pending.code);
    assert_eq!(sent[0].to_email, "alice@co.com");
}

#[tokio::test]
async fn should_reject_taken_email() {
    let repo = MockAccountRepo::new(vec![test_account("alice@co.com", false)]);
    let notifier = MockNotifier::default();
    let sent = notifier.sent_handle();
    let uc = RegisterUseCase {
        accounts: repo.clone(),
        notifier,
        mail_timeout: MAIL_TIMEOUT,
    };

    let result = uc.execute(input("alice@co.com")).await;

    assert!(matches!(result, Err(AuthServiceError::EmailTaken)));
    assert_eq!(repo.write_count(), 0);
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_keep_account_when_delivery_fails() {
    let repo = MockAccountRepo::empty();
    let uc = RegisterUseCase {
        accounts: repo.clone(),
        notifier: FailingNotifier,
        mail_timeout: MAIL_TIMEOUT,
    };

    let result = uc.execute(input("alice@co.com")).await;

    assert!(matches!(
        result,
        Err(AuthServiceError::Dispatch(NotifyError::Send(_)))
    ));
    let account = repo.get("alice@co.com").expect("account survives failed delivery");
    assert!(account.pending_otp.is_some());
}

#[tokio::test]
async fn should_validate_before_touching_store() {
    let repo = MockAccountRepo::empty();
    let uc = RegisterUseCase {
        accounts: repo.clone(),
        notifier: MockNotifier::default(),
        mail_timeout: MAIL_TIMEOUT,
    };

    let result = uc
        .execute(RegisterInput {
            employee_id: None,
            ..input("alice@co.com")
        })
        .await;

    assert!(matches!(
        result,
        Err(AuthServiceError::Validation("Employee ID is required"))
    ));
    assert_eq!(repo.write_count(), 0);
}
