use repairhub_core::AppError;
use repairhub_core::models::{
    LinkType, NewCity, NewClaimRequest, NewRegion, NewReview, NewServiceCenter,
    NewServiceCenterAddress, NewServiceCenterLink, NewUser, RequestStatus, ServiceCenterUpdate,
    UserRole,
};
use repairhub_core::pagination::PageParams;
use repairhub_db::Database;

use crate::integration::common::setup_test_db;

async fn city(db: &Database, name: &str) -> i64 {
    let locations = db.location_repo();
    let region = match locations.search_regions("Тест", PageParams::default()).await {
        Ok(page) if !page.items.is_empty() => page.items[0].id,
        _ => {
            locations
                .create_region(&NewRegion {
                    name: "Тестовая область".into(),
                })
                .await
                .unwrap()
                .id
        }
    };
    locations
        .create_city(&NewCity {
            name: name.into(),
            region_id: region,
            population: 1000,
        })
        .await
        .unwrap()
        .id
}

fn new_center(name: &str, city_id: Option<i64>) -> NewServiceCenter {
    NewServiceCenter {
        name: name.into(),
        city_id,
        owner_id: None,
        phone: Some("+7 999 000-00-00".into()),
    }
}

fn review(center_id: i64, rating: Option<f64>) -> NewReview {
    NewReview {
        service_center_id: center_id,
        author: "Иван".into(),
        rating,
        text: Some("Быстро".into()),
    }
}

#[tokio::test]
async fn names_are_unique_per_city() {
    let (db, _container) = setup_test_db().await;
    let repo = db.service_center_repo();
    let moscow = city(&db, "Москва").await;
    let tula = city(&db, "Тула").await;

    let first = repo.create(&new_center("Ремонт 24", Some(moscow))).await.unwrap();
    assert!(matches!(
        repo.create(&new_center("ремонт 24", Some(moscow))).await,
        Err(AppError::BadRequest(_))
    ));
    let other_city = repo.create(&new_center("Ремонт 24", Some(tula))).await.unwrap();

    assert!(matches!(
        repo.update(
            other_city.id,
            &ServiceCenterUpdate {
                city_id: Some(moscow),
                ..ServiceCenterUpdate::default()
            }
        )
        .await,
        Err(AppError::BadRequest(_))
    ));

    let renamed = repo
        .update(
            first.id,
            &ServiceCenterUpdate {
                name: Some("Ремонт 24/7".into()),
                ..ServiceCenterUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Ремонт 24/7");
    assert_eq!(renamed.city_id, Some(moscow));

    let a = repo.create(&new_center("Pedant", None)).await.unwrap();
    let b = repo.create(&new_center("Pedant", None)).await.unwrap();
    assert_ne!(a.id, b.id);
    assert!(b.city_id.is_none());
}

#[tokio::test]
async fn summaries_carry_rating_and_address() {
    let (db, _container) = setup_test_db().await;
    let repo = db.service_center_repo();
    let moscow = city(&db, "Москва").await;

    let good = repo.create(&new_center("Хороший", Some(moscow))).await.unwrap();
    let plain = repo.create(&new_center("Обычный", Some(moscow))).await.unwrap();
    repo.add_address(&NewServiceCenterAddress::from_line(good.id, "ул. Ленина, 1"))
        .await
        .unwrap();
    for rating in [Some(5.0), Some(4.0), None] {
        repo.add_review(&review(good.id, rating)).await.unwrap();
    }
    repo.add_review(&review(plain.id, Some(3.0))).await.unwrap();

    assert!(matches!(
        repo.add_review(&review(good.id, Some(6.0))).await,
        Err(AppError::BadRequest(_))
    ));

    let rating = repo.rating(good.id).await.unwrap();
    assert_eq!(rating.count, 2);
    assert_eq!(rating.average_rating, 4.5);

    let top = repo.top_rated(10).await.unwrap();
    assert_eq!(top[0].id, good.id);
    assert_eq!(top[0].address.as_deref(), Some("ул. Ленина, 1"));
    assert_eq!(top[0].reviews_count, 3);

    let found = repo.search("хорош", Some(moscow), PageParams::default()).await.unwrap();
    assert_eq!(found.total, 1);

    let page = repo.reviews(good.id, PageParams::new(0, 2)).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);

    let empty = repo.rating(9999).await.unwrap();
    assert_eq!(empty.count, 0);
    assert_eq!(empty.average_rating, 0.0);
}

#[tokio::test]
async fn detail_collects_everything() {
    let (db, _container) = setup_test_db().await;
    let repo = db.service_center_repo();
    let moscow = city(&db, "Москва").await;

    let center = repo.create(&new_center("Сервис", Some(moscow))).await.unwrap();
    repo.add_link(&NewServiceCenterLink {
        service_center_id: center.id,
        link_type: Some(LinkType::Vk),
        link: "https://vk.com/service".into(),
    })
    .await
    .unwrap();
    repo.add_review(&review(center.id, Some(5.0))).await.unwrap();

    let detail = repo.detail(center.id).await.unwrap();
    assert_eq!(detail.city.unwrap().name, "Москва");
    assert!(detail.owner.is_none());
    assert_eq!(detail.links[0].link_type, Some(LinkType::Vk));
    assert_eq!(detail.reviews_count, 1);
    assert_eq!(detail.avg_rating, 5.0);

    assert_eq!(
        repo.detail(555).await.unwrap_err().to_string(),
        "Service center with ID 555 not found"
    );
}

#[tokio::test]
async fn claim_lifecycle() {
    let (db, _container) = setup_test_db().await;
    let repo = db.service_center_repo();
    let users = db.user_repo();

    let center = repo.create(&new_center("Бесхозный", None)).await.unwrap();
    let claimant = users
        .get_or_create_telegram(&NewUser {
            telegram_id: Some(777),
            first_name: Some("Пётр".into()),
            ..NewUser::default()
        })
        .await
        .unwrap();

    let claim = repo
        .create_claim(&NewClaimRequest {
            service_center_id: center.id,
            telegram_id: 777,
            message: "Это мой сервис".into(),
            contact: "+79990000000".into(),
        })
        .await
        .unwrap();
    assert_eq!(claim.status, RequestStatus::Pending);

    assert!(matches!(
        repo.approve_claim(claim.id, Some(4242)).await,
        Err(AppError::NotFound(_))
    ));

    let approved = repo.approve_claim(claim.id, Some(claimant.id)).await.unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(repo.require(center.id).await.unwrap().owner_id, Some(claimant.id));
    assert_eq!(
        users.require(claimant.id).await.unwrap().role,
        UserRole::ServiceOwner
    );

    assert!(matches!(
        repo.reject_claim(claim.id).await,
        Err(AppError::BadRequest(_))
    ));

    // Owned centers cannot be claimed again.
    assert!(matches!(
        repo.create_claim(&NewClaimRequest {
            service_center_id: center.id,
            telegram_id: 888,
            message: "Нет, мой".into(),
            contact: "@someone".into(),
        })
        .await,
        Err(AppError::BadRequest(_))
    ));

    let owned = repo.by_owner(claimant.id, PageParams::default()).await.unwrap();
    assert_eq!(owned.total, 1);
}
