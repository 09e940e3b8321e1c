use repairhub_core::AppError;
use repairhub_core::models::{
    DeviceType, NewDeviceBrand, NewDeviceModel, NewModelRepair, NewPrice, NewRepair,
    NewRepairPrice, NewRepairType, NewServiceCenter, PriceUpdate, RepairPriceUpdate,
};
use repairhub_core::pagination::PageParams;
use repairhub_db::Database;

use crate::integration::common::setup_test_db;

struct Fixture {
    model_id: i64,
    repair_id: i64,
    repair_type_id: i64,
}

async fn fixture(db: &Database) -> Fixture {
    let devices = db.device_repo();
    let brand = devices
        .create_brand(&NewDeviceBrand {
            name: "Apple".into(),
        })
        .await
        .unwrap();
    let model = devices
        .create_model(&NewDeviceModel {
            device_brand_id: brand.id,
            name: "iPhone 12".into(),
            device_type: DeviceType::Smartphone,
            release_year: None,
            display_size: None,
            processor: None,
            ram: None,
            storage: None,
        })
        .await
        .unwrap();
    let repairs = db.repair_repo();
    let repair = repairs
        .create_repair(&NewRepair {
            name: "Замена дисплея".into(),
            description: None,
            repair_type_ids: Vec::new(),
        })
        .await
        .unwrap();
    let repair_type = repairs
        .create_repair_type(&NewRepairType {
            group_name: "Экран".into(),
            name: "Дисплей".into(),
            description: None,
        })
        .await
        .unwrap();
    Fixture {
        model_id: model.id,
        repair_id: repair.id,
        repair_type_id: repair_type.id,
    }
}

async fn center(db: &Database, name: &str) -> i64 {
    db.service_center_repo()
        .create(&NewServiceCenter {
            name: name.into(),
            city_id: None,
            owner_id: None,
            phone: None,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn model_repair_pairs_are_unique() {
    let (db, _container) = setup_test_db().await;
    let f = fixture(&db).await;
    let repo = db.price_repo();

    let entry = NewModelRepair {
        model_id: f.model_id,
        repair_type_id: f.repair_type_id,
        complexity: Some("medium".into()),
        estimated_time: Some(60),
    };
    repo.create_model_repair(&entry).await.unwrap();
    assert!(matches!(
        repo.create_model_repair(&entry).await,
        Err(AppError::BadRequest(_))
    ));

    let page = repo
        .model_repairs_by_model(f.model_id, PageParams::default())
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].estimated_time, Some(60));
}

#[tokio::test]
async fn repair_prices_and_statistics() {
    let (db, _container) = setup_test_db().await;
    let f = fixture(&db).await;
    let repo = db.price_repo();

    let empty = repo.repair_price_statistics(None, None).await.unwrap();
    assert_eq!(empty.count, 0);
    assert_eq!(empty.avg_price, 0.0);

    let err = repo
        .create_repair_price(&NewRepairPrice {
            device_model_id: 999,
            repair_id: f.repair_id,
            price: Some(100.0),
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Device model with ID 999 not found");

    let rp = repo
        .create_repair_price(&NewRepairPrice {
            device_model_id: f.model_id,
            repair_id: f.repair_id,
            price: Some(5000.0),
        })
        .await
        .unwrap();
    assert!(matches!(
        repo.create_repair_price(&NewRepairPrice {
            device_model_id: f.model_id,
            repair_id: f.repair_id,
            price: None,
        })
        .await,
        Err(AppError::BadRequest(_))
    ));

    let updated = repo
        .update_repair_price(
            rp.id,
            &RepairPriceUpdate {
                price: Some(7000.0),
                ..RepairPriceUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.price, Some(7000.0));

    let stats = repo
        .repair_price_statistics(Some(f.repair_id), Some(f.model_id))
        .await
        .unwrap();
    assert_eq!(stats.count, 1);
    assert_eq!(stats.min_price, 7000.0);
    assert_eq!(stats.max_price, 7000.0);
}

#[tokio::test]
async fn comparison_orders_centers_by_price() {
    let (db, _container) = setup_test_db().await;
    let f = fixture(&db).await;
    let repo = db.price_repo();

    let none = repo.compare_prices(f.model_id, f.repair_id).await.unwrap();
    assert_eq!(none.count, 0);
    assert!(none.service_centers.is_empty());

    let rp = repo
        .create_repair_price(&NewRepairPrice {
            device_model_id: f.model_id,
            repair_id: f.repair_id,
            price: Some(5000.0),
        })
        .await
        .unwrap();

    let expensive = center(&db, "Дорогой сервис").await;
    let cheap = center(&db, "Дешевый сервис").await;
    for (center_id, price) in [(expensive, 9000.0), (cheap, 4000.0)] {
        repo.create_price(&NewPrice {
            service_center_id: center_id,
            repair_price_id: rp.id,
            price,
        })
        .await
        .unwrap();
    }
    assert!(matches!(
        repo.create_price(&NewPrice {
            service_center_id: cheap,
            repair_price_id: rp.id,
            price: 1.0,
        })
        .await,
        Err(AppError::BadRequest(_))
    ));

    let comparison = repo.compare_prices(f.model_id, f.repair_id).await.unwrap();
    assert_eq!(comparison.count, 2);
    assert_eq!(comparison.min_price, 4000.0);
    assert_eq!(comparison.max_price, 9000.0);
    assert_eq!(comparison.avg_price, 6500.0);
    assert_eq!(comparison.service_centers[0].service_center_id, cheap);
    assert_eq!(comparison.service_centers[0].service_center_name, "Дешевый сервис");

    let listed = repo
        .prices_by_model_and_repair(f.model_id, f.repair_id, PageParams::default())
        .await
        .unwrap();
    assert_eq!(listed.total, 2);
}

#[tokio::test]
async fn price_changes_are_recorded() {
    let (db, _container) = setup_test_db().await;
    let f = fixture(&db).await;
    let repo = db.price_repo();
    let center_id = center(&db, "Сервис").await;

    let rp = repo
        .create_repair_price(&NewRepairPrice {
            device_model_id: f.model_id,
            repair_id: f.repair_id,
            price: None,
        })
        .await
        .unwrap();
    let price = repo
        .create_price(&NewPrice {
            service_center_id: center_id,
            repair_price_id: rp.id,
            price: 3000.0,
        })
        .await
        .unwrap();

    // An unchanged price is not recorded again.
    repo.update_price(price.id, &PriceUpdate { price: Some(3000.0) })
        .await
        .unwrap();
    repo.update_price(price.id, &PriceUpdate { price: Some(3500.0) })
        .await
        .unwrap();

    let history = repo.price_history(rp.id, center_id).await.unwrap();
    let points: Vec<_> = history.iter().map(|h| h.price).collect();
    assert_eq!(points, [3500.0, 3000.0]);

    assert!(matches!(
        repo.update_price(price.id, &PriceUpdate { price: Some(-5.0) })
            .await,
        Err(AppError::BadRequest(_))
    ));
}
