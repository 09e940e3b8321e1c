use repairhub_core::AppError;
use repairhub_core::models::{NewBotLog, NewUser, UserRole, UserUpdate};
use repairhub_core::pagination::PageParams;

use crate::integration::common::setup_test_db;

fn web_user(email: &str) -> NewUser {
    NewUser {
        email: Some(email.into()),
        password_hash: Some("$2b$12$hash".into()),
        full_name: Some("Анна Петрова".into()),
        is_active: true,
        ..NewUser::default()
    }
}

#[tokio::test]
async fn emails_are_unique() {
    let (db, _container) = setup_test_db().await;
    let repo = db.user_repo();

    let anna = repo.create(&web_user("anna@example.com")).await.unwrap();
    assert_eq!(anna.role, UserRole::User);
    assert!(matches!(
        repo.create(&web_user("ANNA@example.com")).await,
        Err(AppError::BadRequest(_))
    ));

    let bob = repo.create(&web_user("bob@example.com")).await.unwrap();
    assert!(matches!(
        repo.update(
            bob.id,
            &UserUpdate {
                email: Some("anna@example.com".into()),
                ..UserUpdate::default()
            }
        )
        .await,
        Err(AppError::BadRequest(_))
    ));

    let found = repo.get_by_email("Anna@Example.com").await.unwrap().unwrap();
    assert_eq!(found.id, anna.id);
    assert_eq!(found.password_hash.as_deref(), Some("$2b$12$hash"));
}

#[tokio::test]
async fn roles_and_deactivation() {
    let (db, _container) = setup_test_db().await;
    let repo = db.user_repo();

    let user = repo.create(&web_user("owner@example.com")).await.unwrap();
    repo.set_role(user.id, UserRole::ServiceOwner).await.unwrap();

    let owners = repo.service_owners(PageParams::default()).await.unwrap();
    assert_eq!(owners.total, 1);

    let inactive = repo.deactivate(user.id).await.unwrap();
    assert!(!inactive.is_active);
    assert_eq!(inactive.role, UserRole::ServiceOwner);

    let found = repo.search("петрова", PageParams::default()).await.unwrap();
    assert_eq!(found.total, 1);

    repo.delete(user.id).await.unwrap();
    assert!(matches!(repo.delete(user.id).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn telegram_users_are_created_once() {
    let (db, _container) = setup_test_db().await;
    let repo = db.user_repo();

    let profile = NewUser {
        telegram_id: Some(123456),
        username: Some("ivan".into()),
        ..NewUser::default()
    };
    let first = repo.get_or_create_telegram(&profile).await.unwrap();
    let second = repo.get_or_create_telegram(&profile).await.unwrap();
    assert_eq!(first.id, second.id);
    assert!(first.is_active);
    assert!(first.email.is_none());

    assert!(matches!(
        repo.set_city(first.id, 999).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn bot_logs_round_trip() {
    let (db, _container) = setup_test_db().await;
    let repo = db.bot_log_repo();

    for text in ["/start", "/settings"] {
        repo.record(&NewBotLog {
            telegram_user_id: 42,
            request_text: text.into(),
            response_text: serde_json::json!({"reply": text}),
        })
        .await
        .unwrap();
    }

    let recent = repo.recent_for_user(42, 10).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].request_text, "/settings");
    assert_eq!(recent[0].response_text["reply"], "/settings");
}
