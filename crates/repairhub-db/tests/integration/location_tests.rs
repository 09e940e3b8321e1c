use repairhub_core::AppError;
use repairhub_core::models::{CityUpdate, NewCity, NewRegion, RegionUpdate};
use repairhub_core::pagination::PageParams;

use crate::integration::common::setup_test_db;

fn region(name: &str) -> NewRegion {
    NewRegion { name: name.into() }
}

#[tokio::test]
async fn region_names_are_unique_case_insensitively() {
    let (db, _container) = setup_test_db().await;
    let repo = db.location_repo();

    let created = repo.create_region(&region("Московская область")).await.unwrap();
    assert_eq!(created.name, "Московская область");

    let err = repo
        .create_region(&region("московская область"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let other = repo.create_region(&region("Тверская область")).await.unwrap();
    let err = repo
        .update_region(
            other.id,
            &RegionUpdate {
                name: Some("Московская область".into()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn city_requires_existing_region() {
    let (db, _container) = setup_test_db().await;
    let repo = db.location_repo();

    let err = repo
        .create_city(&NewCity {
            name: "Москва".into(),
            region_id: 999,
            population: 0,
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Region with ID 999 not found");
}

#[tokio::test]
async fn cities_search_largest_and_with_region() {
    let (db, _container) = setup_test_db().await;
    let repo = db.location_repo();

    let r = repo.create_region(&region("Центр")).await.unwrap();
    for (name, population) in [("Москва", 13_000_000), ("Тула", 470_000), ("Тверь", 420_000)] {
        repo.create_city(&NewCity {
            name: name.into(),
            region_id: r.id,
            population,
        })
        .await
        .unwrap();
    }

    let largest = repo.largest_cities(2).await.unwrap();
    let names: Vec<_> = largest.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Москва", "Тула"]);

    let found = repo
        .search_cities(Some("тв"), Some(r.id), PageParams::default())
        .await
        .unwrap();
    assert_eq!(found.total, 1);
    assert_eq!(found.items[0].name, "Тверь");

    let with_cities = repo.region_with_cities(r.id).await.unwrap();
    assert_eq!(with_cities.cities.len(), 3);

    let by_name = repo.find_city_by_name("  ТУЛА ").await.unwrap().unwrap();
    assert_eq!(by_name.population, 470_000);

    let updated = repo
        .update_city(
            by_name.id,
            &CityUpdate {
                population: Some(480_000),
                ..CityUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.population, 480_000);
    assert_eq!(updated.name, "Тула");
}

#[tokio::test]
async fn pagination_reports_pages() {
    let (db, _container) = setup_test_db().await;
    let repo = db.location_repo();

    for i in 0..5 {
        repo.create_region(&region(&format!("Region {i}"))).await.unwrap();
    }

    let page = repo.list_regions(PageParams::new(2, 2)).await.unwrap();
    assert_eq!(page.total, 5);
    assert_eq!(page.page, 2);
    assert_eq!(page.pages, 3);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].name, "Region 2");
}

#[tokio::test]
async fn deleting_missing_region_is_not_found() {
    let (db, _container) = setup_test_db().await;
    let err = db.location_repo().delete_region(42).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
