use repairhub_core::AppError;
use repairhub_core::models::{
    DeviceBrandUpdate, DeviceType, NewDeviceBrand, NewDeviceModel, NewPart, NewRepair,
    NewRepairPart, NewRepairType, RepairUpdate,
};
use repairhub_core::pagination::PageParams;

use crate::integration::common::setup_test_db;

fn model(brand_id: i64, name: &str) -> NewDeviceModel {
    NewDeviceModel {
        device_brand_id: brand_id,
        name: name.into(),
        device_type: DeviceType::Smartphone,
        release_year: Some(2020),
        display_size: Some(6.1),
        processor: None,
        ram: Some(4),
        storage: Some(128),
    }
}

fn part(name: &str, price: f64, sku: &str) -> NewPart {
    NewPart {
        name: name.into(),
        retail_price: price,
        currency: "RUB".into(),
        manufacturer: None,
        sku: Some(sku.into()),
        description: None,
    }
}

#[tokio::test]
async fn brands_and_models() {
    let (db, _container) = setup_test_db().await;
    let repo = db.device_repo();

    let apple = repo
        .create_brand(&NewDeviceBrand {
            name: "Apple".into(),
        })
        .await
        .unwrap();
    let samsung = repo
        .create_brand(&NewDeviceBrand {
            name: "Samsung".into(),
        })
        .await
        .unwrap();
    assert!(matches!(
        repo.create_brand(&NewDeviceBrand {
            name: "apple".into()
        })
        .await,
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        repo.update_brand(
            samsung.id,
            &DeviceBrandUpdate {
                name: Some("Apple".into())
            }
        )
        .await,
        Err(AppError::BadRequest(_))
    ));

    repo.create_model(&model(apple.id, "iPhone 12")).await.unwrap();
    repo.create_model(&model(apple.id, "iPhone 13")).await.unwrap();
    repo.create_model(&model(samsung.id, "Galaxy S21")).await.unwrap();

    let err = repo.create_model(&model(999, "Ghost")).await.unwrap_err();
    assert_eq!(err.to_string(), "Device brand with ID 999 not found");

    let found = repo
        .search_models(Some("iphone"), Some(apple.id), PageParams::default())
        .await
        .unwrap();
    assert_eq!(found.total, 2);
    assert_eq!(found.items[0].device_type, DeviceType::Smartphone);

    let with_models = repo.brand_with_models(apple.id).await.unwrap();
    assert_eq!(with_models.models.len(), 2);

    assert!(matches!(
        repo.models_by_brand(999, PageParams::default()).await,
        Err(AppError::NotFound(_))
    ));

    let by_name = repo.find_model_by_name("galaxy s21").await.unwrap().unwrap();
    assert_eq!(by_name.device_brand_id, samsung.id);
}

#[tokio::test]
async fn repairs_link_repair_types() {
    let (db, _container) = setup_test_db().await;
    let repo = db.repair_repo();

    let screen = repo
        .create_repair_type(&NewRepairType {
            group_name: "Экран".into(),
            name: "Замена дисплея".into(),
            description: None,
        })
        .await
        .unwrap();
    let power = repo
        .create_repair_type(&NewRepairType {
            group_name: "Питание".into(),
            name: "Замена аккумулятора".into(),
            description: None,
        })
        .await
        .unwrap();

    let repair = repo
        .create_repair(&NewRepair {
            name: "Замена дисплея".into(),
            description: Some("Оригинальный модуль".into()),
            repair_type_ids: vec![screen.id],
        })
        .await
        .unwrap();
    let with_types = repo.repair_with_types(repair.id).await.unwrap();
    assert_eq!(with_types.repair_types.len(), 1);
    assert_eq!(with_types.repair_types[0].id, screen.id);

    repo.update_repair(
        repair.id,
        &RepairUpdate {
            repair_type_ids: Some(vec![screen.id, power.id]),
            ..RepairUpdate::default()
        },
    )
    .await
    .unwrap();
    let with_types = repo.repair_with_types(repair.id).await.unwrap();
    assert_eq!(with_types.repair_types.len(), 2);
    assert_eq!(with_types.repair.description.as_deref(), Some("Оригинальный модуль"));

    let err = repo
        .create_repair(&NewRepair {
            name: "Чистка".into(),
            description: None,
            repair_type_ids: vec![999],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let by_group = repo
        .repair_types_by_group("Экран", PageParams::default())
        .await
        .unwrap();
    assert_eq!(by_group.total, 1);

    let found = repo.search_repairs("модуль", PageParams::default()).await.unwrap();
    assert_eq!(found.total, 1);
}

#[tokio::test]
async fn parts_and_repair_parts() {
    let (db, _container) = setup_test_db().await;
    let repo = db.repair_repo();

    let display = repo.create_part(&part("Дисплей", 9000.0, "DSP-1")).await.unwrap();
    let glue = repo.create_part(&part("Клей", 300.0, "GLU-1")).await.unwrap();
    repo.create_part(&part("Шлейф", 1500.0, "FLX-1")).await.unwrap();

    let cheap = repo
        .parts_by_price_range(0.0, Some(2000.0), PageParams::default())
        .await
        .unwrap();
    let names: Vec<_> = cheap.items.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Клей", "Шлейф"]);

    assert!(matches!(
        repo.parts_by_price_range(100.0, Some(10.0), PageParams::default())
            .await,
        Err(AppError::BadRequest(_))
    ));

    let by_sku = repo.part_by_sku("DSP-1").await.unwrap().unwrap();
    assert_eq!(by_sku.id, display.id);

    let rt = repo
        .create_repair_type(&NewRepairType {
            group_name: "Экран".into(),
            name: "Замена дисплея".into(),
            description: None,
        })
        .await
        .unwrap();
    for (part_id, quantity) in [(display.id, 1), (glue.id, 2)] {
        repo.create_repair_part(&NewRepairPart {
            repair_type_id: rt.id,
            part_id,
            quantity,
        })
        .await
        .unwrap();
    }
    let err = repo
        .create_repair_part(&NewRepairPart {
            repair_type_id: rt.id,
            part_id: glue.id,
            quantity: 0,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let with_parts = repo.repair_type_with_parts(rt.id).await.unwrap();
    assert_eq!(with_parts.repair_parts.len(), 2);
    assert_eq!(with_parts.parts.len(), 2);
}
