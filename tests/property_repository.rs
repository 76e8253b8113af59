use alkifor::attachments::{AttachmentStore, StoredUpload};
use alkifor::models::{PropertyChanges, PropertyDraft, UpdateOutcome};
use alkifor::repository::{PropertyRepository, SqlitePropertyRepository};
use alkifor::store::{self, PropertyFilters};
use alkifor::Error;
use sqlx::SqlitePool;
use tempfile::TempDir;

struct Fixture {
    _tmp: TempDir,
    pool: SqlitePool,
    repo: SqlitePropertyRepository,
    attachments: AttachmentStore,
}

async fn fixture() -> Fixture {
    let tmp = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", tmp.path().join("listings.db").display());
    let pool = store::connect(&url, 2).await.unwrap();
    let attachments = AttachmentStore::new(tmp.path().join("uploads"));
    attachments.ensure_dir().await.unwrap();
    let repo = SqlitePropertyRepository::new(pool.clone(), attachments.clone());
    Fixture {
        _tmp: tmp,
        pool,
        repo,
        attachments,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn draft(price: f64, city: &str, ambientes: &[&str]) -> PropertyDraft {
    PropertyDraft {
        property_type: Some("Casa".to_string()),
        price: Some(price),
        barrio: Some("Centro".to_string()),
        city: Some(city.to_string()),
        province: Some("Córdoba".to_string()),
        ambientes: strings(ambientes),
        user_id: 1,
        ..Default::default()
    }
}

async fn upload(attachments: &AttachmentStore, name: &str) -> StoredUpload {
    attachments
        .save("media", name, "image/jpeg", b"jpeg bytes")
        .await
        .unwrap()
}

fn filters(pairs: &[(&str, &str)]) -> PropertyFilters {
    PropertyFilters::from_pairs(pairs.iter().copied())
}

#[tokio::test]
async fn created_property_reads_back_with_decoded_lists() {
    let f = fixture().await;
    let uploads = vec![
        upload(&f.attachments, "frente.jpg").await,
        upload(&f.attachments, "patio.jpg").await,
    ];
    let mut new = draft(750.0, "Córdoba", &["Cocina", "Living", "Patio"]);
    new.services = strings(&["Agua", "Gas natural"]);
    new.antiquity = Some(15);
    new.description = Some("Luminosa".to_string());

    let id = f.repo.create(new, &uploads).await.unwrap();
    let property = f.repo.find_by_id(id).await.unwrap().expect("property exists");

    assert_eq!(property.ambientes, strings(&["Cocina", "Living", "Patio"]));
    assert_eq!(property.services, strings(&["Agua", "Gas natural"]));
    assert_eq!(
        property.media_urls,
        uploads.iter().map(StoredUpload::public_url).collect::<Vec<_>>()
    );
    assert_eq!(property.property_type, "Casa");
    assert_eq!(property.price, 750.0);
    assert_eq!(property.location.city, "Córdoba");
    assert_eq!(property.antiquity, Some(15));
    assert_eq!(property.user_id, 1);
}

#[tokio::test]
async fn create_without_uploads_stores_empty_media_list() {
    let f = fixture().await;
    let id = f.repo.create(draft(100.0, "Rosario", &[]), &[]).await.unwrap();
    let property = f.repo.find_by_id(id).await.unwrap().unwrap();
    assert!(property.media_urls.is_empty());
    assert!(property.ambientes.is_empty());
    assert!(property.services.is_empty());
}

#[tokio::test]
async fn missing_required_field_fails_and_discards_uploads() {
    let f = fixture().await;
    let saved = upload(&f.attachments, "frente.jpg").await;
    let mut incomplete = draft(500.0, "Rosario", &[]);
    incomplete.province = None;

    let err = f
        .repo
        .create(incomplete, std::slice::from_ref(&saved))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert!(!saved.path.exists());
    assert!(f.repo.find_all(&PropertyFilters::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn store_failure_on_create_discards_uploads() {
    let f = fixture().await;
    let saved = upload(&f.attachments, "frente.jpg").await;
    sqlx::query("DROP TABLE properties")
        .execute(&f.pool)
        .await
        .unwrap();

    let err = f
        .repo
        .create(draft(500.0, "Rosario", &[]), std::slice::from_ref(&saved))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Storage(_)));
    assert!(!saved.path.exists());
}

#[tokio::test]
async fn price_buckets_include_their_boundaries() {
    let f = fixture().await;
    for price in [499.99, 500.0, 750.0, 1000.0, 1000.01] {
        f.repo.create(draft(price, "Rosario", &[]), &[]).await.unwrap();
    }

    let prices = |label: &'static str| {
        let repo = &f.repo;
        async move {
            repo.find_all(&filters(&[("priceRange", label)]))
                .await
                .unwrap()
                .into_iter()
                .map(|p| p.price)
                .collect::<Vec<_>>()
        }
    };

    assert_eq!(prices("Menos de $500").await, vec![499.99]);
    assert_eq!(prices("$500 - $1000").await, vec![500.0, 750.0, 1000.0]);
    assert_eq!(prices("Más de $1000").await, vec![1000.01]);
    assert_eq!(prices("regalado").await.len(), 5);
}

#[tokio::test]
async fn ambientes_filter_requires_every_tag() {
    let f = fixture().await;
    let only_kitchen = f
        .repo
        .create(draft(300.0, "Rosario", &["Cocina"]), &[])
        .await
        .unwrap();
    let both = f
        .repo
        .create(draft(300.0, "Rosario", &["Living", "Cocina", "Patio"]), &[])
        .await
        .unwrap();
    f.repo
        .create(draft(300.0, "Rosario", &["Cocina comedor"]), &[])
        .await
        .unwrap();

    let found = f
        .repo
        .find_all(&filters(&[("ambientes", "Cocina"), ("ambientes", "Living")]))
        .await
        .unwrap();
    assert_eq!(found.iter().map(|p| p.id).collect::<Vec<_>>(), vec![both]);

    let kitchens = f
        .repo
        .find_all(&filters(&[("ambienteFilter", "Cocina")]))
        .await
        .unwrap();
    assert_eq!(
        kitchens.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![only_kitchen, both]
    );
}

#[tokio::test]
async fn comma_separated_ambientes_match_tags_in_any_order() {
    let f = fixture().await;
    let forward = f
        .repo
        .create(draft(300.0, "Rosario", &["Cocina", "Living", "Patio"]), &[])
        .await
        .unwrap();
    let reversed = f
        .repo
        .create(draft(300.0, "Rosario", &["Living", "Cocina"]), &[])
        .await
        .unwrap();
    f.repo
        .create(draft(300.0, "Rosario", &["Cocina"]), &[])
        .await
        .unwrap();

    let found = f
        .repo
        .find_all(&filters(&[("ambienteFilter", "Cocina,Living")]))
        .await
        .unwrap();
    assert_eq!(
        found.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![forward, reversed]
    );
}

#[tokio::test]
async fn search_term_matches_any_text_column_ignoring_case() {
    let f = fixture().await;
    let mut with_pool = draft(900.0, "Rosario", &[]);
    with_pool.description = Some("Casa con PILETA y quincho".to_string());
    let pool_id = f.repo.create(with_pool, &[]).await.unwrap();
    let city_id = f
        .repo
        .create(draft(900.0, "Villa Carlos Paz", &[]), &[])
        .await
        .unwrap();

    let by_description = f
        .repo
        .find_all(&filters(&[("searchTerm", "pileta")]))
        .await
        .unwrap();
    assert_eq!(by_description.len(), 1);
    assert_eq!(by_description[0].id, pool_id);

    let by_city = f
        .repo
        .find_all(&filters(&[("searchTerm", "carlos")]))
        .await
        .unwrap();
    assert_eq!(by_city.len(), 1);
    assert_eq!(by_city[0].id, city_id);

    let wildcard = f
        .repo
        .find_all(&filters(&[("searchTerm", "%")]))
        .await
        .unwrap();
    assert!(wildcard.is_empty());
}

#[tokio::test]
async fn exact_filters_combine() {
    let f = fixture().await;
    let mut gated = draft(2000.0, "Córdoba", &[]);
    gated.urbanization = Some("Barrio cerrado".to_string());
    gated.security = Some("24hs".to_string());
    let gated_id = f.repo.create(gated, &[]).await.unwrap();
    f.repo.create(draft(2000.0, "Córdoba", &[]), &[]).await.unwrap();
    f.repo.create(draft(2000.0, "Rosario", &[]), &[]).await.unwrap();

    let found = f
        .repo
        .find_all(&filters(&[
            ("type", "Casa"),
            ("location", "Córdoba"),
            ("urbanization", "Barrio cerrado"),
            ("security", "24hs"),
            ("unknown", "ignored"),
        ]))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, gated_id);

    let all = f.repo.find_all(&PropertyFilters::default()).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].id < w[1].id));
}

#[tokio::test]
async fn empty_update_reports_not_found_or_unchanged_for_existing_row() {
    let f = fixture().await;
    let id = f.repo.create(draft(500.0, "Rosario", &[]), &[]).await.unwrap();

    let outcome = f
        .repo
        .update(id, PropertyChanges::default(), &[])
        .await
        .unwrap();

    assert_eq!(outcome, UpdateOutcome::NotFoundOrUnchanged);
    assert!(f.repo.find_by_id(id).await.unwrap().is_some());
}

#[tokio::test]
async fn update_changes_only_sent_fields() {
    let f = fixture().await;
    let id = f
        .repo
        .create(draft(500.0, "Rosario", &["Cocina"]), &[])
        .await
        .unwrap();
    let before = f.repo.find_by_id(id).await.unwrap().unwrap();

    let changes = PropertyChanges {
        price: Some(650.0),
        ambientes: Some(strings(&["Cocina", "Balcón"])),
        ..Default::default()
    };
    let outcome = f.repo.update(id, changes, &[]).await.unwrap();
    assert_eq!(outcome, UpdateOutcome::Updated);

    let after = f.repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(after.price, 650.0);
    assert_eq!(after.ambientes, strings(&["Cocina", "Balcón"]));
    assert_eq!(after.location, before.location);
    assert_eq!(after.user_id, before.user_id);
    assert_eq!(after.created_at, before.created_at);
    assert!(after.updated_at >= before.updated_at);

    let same_again = PropertyChanges {
        price: Some(650.0),
        ..Default::default()
    };
    assert_eq!(
        f.repo.update(id, same_again, &[]).await.unwrap(),
        UpdateOutcome::NotFoundOrUnchanged
    );
}

#[tokio::test]
async fn update_media_is_replaced_or_kept_never_merged() {
    let f = fixture().await;
    let original = upload(&f.attachments, "viejo.jpg").await;
    let id = f
        .repo
        .create(draft(500.0, "Rosario", &[]), std::slice::from_ref(&original))
        .await
        .unwrap();

    let fresh = upload(&f.attachments, "nuevo.jpg").await;
    let outcome = f
        .repo
        .update(id, PropertyChanges::default(), std::slice::from_ref(&fresh))
        .await
        .unwrap();
    assert_eq!(outcome, UpdateOutcome::Updated);
    let media = f.repo.find_by_id(id).await.unwrap().unwrap().media_urls;
    assert_eq!(media, vec![fresh.public_url()]);

    let kept = format!(r#"["{}","/uploads/properties/otro.jpg"]"#, fresh.public_url());
    let changes = PropertyChanges {
        existing_media: Some(kept),
        ..Default::default()
    };
    assert_eq!(
        f.repo.update(id, changes, &[]).await.unwrap(),
        UpdateOutcome::Updated
    );
    let media = f.repo.find_by_id(id).await.unwrap().unwrap().media_urls;
    assert_eq!(
        media,
        vec![fresh.public_url(), "/uploads/properties/otro.jpg".to_string()]
    );
}

#[tokio::test]
async fn malformed_existing_media_on_update_clears_the_list() {
    let f = fixture().await;
    let original = upload(&f.attachments, "frente.jpg").await;
    let id = f
        .repo
        .create(draft(500.0, "Rosario", &[]), std::slice::from_ref(&original))
        .await
        .unwrap();

    let changes = PropertyChanges {
        existing_media: Some("[not json".to_string()),
        ..Default::default()
    };
    assert_eq!(
        f.repo.update(id, changes, &[]).await.unwrap(),
        UpdateOutcome::Updated
    );

    let property = f.repo.find_by_id(id).await.unwrap().unwrap();
    assert!(property.media_urls.is_empty());
}

#[tokio::test]
async fn update_of_missing_property_discards_new_uploads() {
    let f = fixture().await;
    let stray = upload(&f.attachments, "huerfano.jpg").await;

    let outcome = f
        .repo
        .update(4242, PropertyChanges::default(), std::slice::from_ref(&stray))
        .await
        .unwrap();

    assert_eq!(outcome, UpdateOutcome::NotFoundOrUnchanged);
    assert!(!stray.path.exists());
}

#[tokio::test]
async fn delete_survives_an_already_missing_attachment() {
    let f = fixture().await;
    let uploads = vec![
        upload(&f.attachments, "uno.jpg").await,
        upload(&f.attachments, "dos.jpg").await,
    ];
    let id = f
        .repo
        .create(draft(500.0, "Rosario", &[]), &uploads)
        .await
        .unwrap();
    tokio::fs::remove_file(&uploads[0].path).await.unwrap();

    assert!(f.repo.delete(id).await.unwrap());

    assert!(f.repo.find_by_id(id).await.unwrap().is_none());
    assert!(!uploads[1].path.exists());
}

#[tokio::test]
async fn delete_of_missing_property_reports_false() {
    let f = fixture().await;
    assert!(!f.repo.delete(99).await.unwrap());
}
