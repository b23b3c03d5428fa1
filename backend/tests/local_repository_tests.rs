//! Integration tests for LocalRepository.
//!
//! These cover the referential rules (cascades and conflicts), the booking
//! calendar, catalog links and concurrent writers on the in-memory backend.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use hosting_api::api::{
    AccommodationDetails, BookingDraft, NewAccommodation, NewAccommodationReview, NewCategory,
    NewCurrency, NewHostReview, NewImage, NewLocation, NewPayment, NewPlan, NewPlanFeature,
    NewUserConfiguration, SearchCriteria, User, UserDraft, UserId, UserRole,
};
use hosting_api::db::repositories::LocalRepository;
use hosting_api::db::repository::{
    AccommodationRepository, BookingRepository, CatalogRepository, RepositoryError,
    ReviewRepository, UserRepository,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn user(repo: &LocalRepository, email: &str, role: UserRole) -> User {
    repo.create_user(UserDraft {
        name: "Nerea".into(),
        surname: "Olaizola".into(),
        email: email.into(),
        phone: Some("+34 600 000 000".into()),
        profile_image: None,
        role,
        password_hash: "salt$digest".into(),
    })
    .await
    .unwrap()
}

fn listing(register_number: &str, host_id: UserId, city: &str) -> NewAccommodation {
    NewAccommodation {
        register_number: register_number.into(),
        details: AccommodationDetails {
            host_id,
            num_of_beds: 2,
            num_of_bathrooms: 1,
            num_of_bedrooms: 1,
            price_per_night: 60.0,
            num_of_guests: 3,
            area: 55.0,
            category_id: None,
            location: NewLocation {
                city: city.into(),
                country: "Spain".into(),
                address: "Plaza Mayor 1".into(),
                latitude: 40.96,
                longitude: -5.66,
            },
        },
    }
}

fn booking(
    register_number: &str,
    user_id: UserId,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> BookingDraft {
    BookingDraft {
        register_number: register_number.into(),
        user_id,
        check_in,
        check_out,
        num_of_guests: 2,
        payment_id: None,
        amount: 120.0,
    }
}

/// A host with one listing in Salamanca and a guest.
async fn seeded() -> (LocalRepository, User, User) {
    let repo = LocalRepository::new();
    let host = user(&repo, "host@example.com", UserRole::Host).await;
    let guest = user(&repo, "guest@example.com", UserRole::Base).await;
    repo.create_accommodation(listing("SA-1", host.id, "Salamanca"))
        .await
        .unwrap();
    (repo, host, guest)
}

// =========================================================
// Accommodations
// =========================================================

#[tokio::test]
async fn test_duplicate_register_number_conflicts() {
    let (repo, host, _) = seeded().await;
    let err = repo
        .create_accommodation(listing("SA-1", host.id, "Salamanca"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { .. }));
}

#[tokio::test]
async fn test_unknown_host_or_category_is_not_found() {
    let repo = LocalRepository::new();
    let err = repo
        .create_accommodation(listing("X-1", UserId(99), "Ávila"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let host = user(&repo, "host@example.com", UserRole::Host).await;
    let mut with_category = listing("X-1", host.id, "Ávila");
    with_category.details.category_id = Some(hosting_api::api::CategoryId(5));
    let err = repo.create_accommodation(with_category).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(repo.list_accommodations().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_by_city_is_exact_and_case_insensitive() {
    let (repo, host, _) = seeded().await;
    repo.create_accommodation(listing("SA-2", host.id, "Salamanca de Bacalar"))
        .await
        .unwrap();

    let found = repo.list_accommodations_by_city("SALAMANCA").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].register_number, "SA-1");
}

#[tokio::test]
async fn test_update_keeps_location_id() {
    let (repo, host, _) = seeded().await;
    let before = repo.get_accommodation("SA-1").await.unwrap();

    let mut details = listing("SA-1", host.id, "Salamanca").details;
    details.price_per_night = 75.0;
    details.location.address = "Rúa Mayor 20".into();
    let after = repo.update_accommodation("SA-1", details).await.unwrap();

    assert_eq!(after.price_per_night, 75.0);
    assert_eq!(after.location.id, before.location.id);
    assert_eq!(after.location.address, "Rúa Mayor 20");
}

#[tokio::test]
async fn test_delete_accommodation_removes_reviews() {
    let (repo, _, guest) = seeded().await;
    repo.attach_image(
        "SA-1",
        NewImage {
            url: "https://img.example.com/sa1.jpg".into(),
        },
    )
    .await
    .unwrap();
    let review = repo
        .create_accommodation_review(NewAccommodationReview {
            register_number: "SA-1".into(),
            user_id: guest.id,
            content: "Great light".into(),
            stars: 5,
        })
        .await
        .unwrap();

    repo.delete_accommodation("SA-1").await.unwrap();

    assert!(repo.get_accommodation("SA-1").await.unwrap_err().is_not_found());
    assert!(repo
        .get_accommodation_review(review.id)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_delete_accommodation_with_bookings_conflicts() {
    let (repo, _, guest) = seeded().await;
    repo.create_booking(booking("SA-1", guest.id, date(2024, 5, 1), date(2024, 5, 3)))
        .await
        .unwrap();

    let err = repo.delete_accommodation("SA-1").await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { .. }));
    assert!(repo.get_accommodation("SA-1").await.is_ok());
}

#[tokio::test]
async fn test_images_attach_list_remove() {
    let (repo, _, _) = seeded().await;
    let first = repo
        .attach_image("SA-1", NewImage { url: "https://img.example.com/1.jpg".into() })
        .await
        .unwrap();
    repo.attach_image("SA-1", NewImage { url: "https://img.example.com/2.jpg".into() })
        .await
        .unwrap();

    repo.remove_image("SA-1", first.id).await.unwrap();
    let images = repo.list_images("SA-1").await.unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].url, "https://img.example.com/2.jpg");

    let err = repo.remove_image("SA-1", first.id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_category_description_is_unique() {
    let repo = LocalRepository::new();
    repo.create_category(NewCategory { description: "Loft".into() })
        .await
        .unwrap();
    let err = repo
        .create_category(NewCategory { description: " loft ".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { .. }));
    assert_eq!(repo.list_categories().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_accented_text_folds_case() {
    let (repo, host, _) = seeded().await;
    let atico = repo
        .create_category(NewCategory { description: "Ático".into() })
        .await
        .unwrap();
    let err = repo
        .create_category(NewCategory { description: "ático".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { .. }));

    user(&repo, "Élodie@example.com", UserRole::Base).await;
    let err = repo
        .create_user(UserDraft {
            name: "Élodie".into(),
            surname: "Martín".into(),
            email: "élodie@example.com".into(),
            phone: None,
            profile_image: None,
            role: UserRole::Base,
            password_hash: "salt$digest".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { .. }));
    let found = repo.get_user_by_email("ÉLODIE@example.com").await.unwrap();
    assert_eq!(found.email, "Élodie@example.com");

    let mut penthouse = listing("SA-2", host.id, "Salamanca");
    penthouse.details.category_id = Some(atico.id);
    repo.create_accommodation(penthouse).await.unwrap();
    let criteria = SearchCriteria {
        category: Some("ÁTICO".into()),
        ..Default::default()
    };
    let page = repo.search_accommodations(&criteria).await.unwrap();
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.items[0].accommodation.register_number, "SA-2");
}

#[tokio::test]
async fn test_search_through_repository() {
    let (repo, host, _) = seeded().await;
    let mut pricey = listing("SA-2", host.id, "Salamanca");
    pricey.details.price_per_night = 300.0;
    repo.create_accommodation(pricey).await.unwrap();

    let criteria = SearchCriteria {
        city: Some("salam".into()),
        max_price: Some(100.0),
        ..Default::default()
    };
    let page = repo.search_accommodations(&criteria).await.unwrap();
    assert_eq!(page.total_elements, 1);
    assert_eq!(page.items[0].accommodation.register_number, "SA-1");
}

// =========================================================
// Users and configuration
// =========================================================

#[tokio::test]
async fn test_delete_user_with_bookings_or_listings_conflicts() {
    let (repo, host, guest) = seeded().await;
    repo.create_booking(booking("SA-1", guest.id, date(2024, 6, 1), date(2024, 6, 2)))
        .await
        .unwrap();

    let err = repo.delete_user(host.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { .. }));
    let err = repo.delete_user(guest.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { .. }));
}

#[tokio::test]
async fn test_delete_user_cascades() {
    let (repo, host, guest) = seeded().await;
    repo.create_user_configuration(NewUserConfiguration {
        user_id: guest.id,
        currency_id: None,
        language: "eu".into(),
        notifications_enabled: true,
    })
    .await
    .unwrap();
    repo.record_search(guest.id, &SearchCriteria::default())
        .await
        .unwrap();
    let review = repo
        .create_host_review(NewHostReview {
            host_id: host.id,
            reviewer_id: guest.id,
            content: "Very welcoming".into(),
            stars: 4,
        })
        .await
        .unwrap();

    repo.delete_user(guest.id).await.unwrap();

    assert!(repo.get_user(guest.id).await.unwrap_err().is_not_found());
    assert!(repo.list_started_users().await.unwrap().is_empty());
    assert!(repo
        .get_host_review(review.id)
        .await
        .unwrap_err()
        .is_not_found());
    assert!(repo.list_host_reviews(host.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_one_configuration_per_user() {
    let (repo, _, guest) = seeded().await;
    let config = NewUserConfiguration {
        user_id: guest.id,
        currency_id: None,
        language: "es".into(),
        notifications_enabled: false,
    };
    repo.create_user_configuration(config.clone()).await.unwrap();
    let err = repo.create_user_configuration(config).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { .. }));

    let started = repo.list_started_users().await.unwrap();
    assert_eq!(started.iter().map(|u| u.id).collect::<Vec<_>>(), vec![guest.id]);
}

#[tokio::test]
async fn test_configuration_currency_must_exist() {
    let (repo, _, guest) = seeded().await;
    let err = repo
        .create_user_configuration(NewUserConfiguration {
            user_id: guest.id,
            currency_id: Some(hosting_api::api::CurrencyId(3)),
            language: "es".into(),
            notifications_enabled: true,
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_search_history_newest_first() {
    let (repo, _, guest) = seeded().await;
    for city in ["Zamora", "León"] {
        let criteria = SearchCriteria {
            city: Some(city.into()),
            ..Default::default()
        };
        repo.record_search(guest.id, &criteria).await.unwrap();
    }

    let history = repo.list_searches(guest.id).await.unwrap();
    let cities: Vec<_> = history
        .iter()
        .map(|s| s.criteria.city.clone().unwrap_or_default())
        .collect();
    assert_eq!(cities, vec!["León", "Zamora"]);
}

// =========================================================
// Bookings and payments
// =========================================================

#[tokio::test]
async fn test_overlapping_booking_conflicts() {
    let (repo, _, guest) = seeded().await;
    repo.create_booking(booking("SA-1", guest.id, date(2024, 7, 10), date(2024, 7, 15)))
        .await
        .unwrap();

    let err = repo
        .create_booking(booking("SA-1", guest.id, date(2024, 7, 14), date(2024, 7, 16)))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { .. }));

    // Back-to-back stays share the changeover day.
    repo.create_booking(booking("SA-1", guest.id, date(2024, 7, 15), date(2024, 7, 17)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_booking_ignores_itself() {
    let (repo, _, guest) = seeded().await;
    let stay = repo
        .create_booking(booking("SA-1", guest.id, date(2024, 9, 1), date(2024, 9, 5)))
        .await
        .unwrap();

    let mut moved = booking("SA-1", guest.id, date(2024, 9, 2), date(2024, 9, 6));
    moved.amount = 240.0;
    let updated = repo.update_booking(stay.id, moved).await.unwrap();
    assert_eq!(updated.check_in, date(2024, 9, 2));
    assert_eq!(updated.amount, 240.0);
    assert_eq!(updated.created_at, stay.created_at);
}

#[tokio::test]
async fn test_booking_queries() {
    let (repo, _, guest) = seeded().await;
    repo.create_booking(booking("SA-1", guest.id, date(2024, 3, 1), date(2024, 3, 4)))
        .await
        .unwrap();
    repo.create_booking(booking("SA-1", guest.id, date(2024, 3, 20), date(2024, 4, 2)))
        .await
        .unwrap();

    let march = repo
        .list_bookings_between(date(2024, 3, 1), date(2024, 3, 31))
        .await
        .unwrap();
    assert_eq!(march.len(), 1);

    let this_year = repo.list_bookings_by_year(Utc::now().year()).await.unwrap();
    assert_eq!(this_year.len(), 2);
    assert!(repo.list_bookings_by_year(1999).await.unwrap().is_empty());

    assert_eq!(repo.list_bookings_by_user(guest.id).await.unwrap().len(), 2);
    assert_eq!(repo.count_bookings_by_user(guest.id).await.unwrap(), 2);
    assert!(repo
        .count_bookings_by_user(UserId(404))
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_payment_lifecycle() {
    let (repo, _, guest) = seeded().await;
    let card = repo
        .create_payment(NewPayment {
            title: "Visa".into(),
            description: Some("ending 4242".into()),
        })
        .await
        .unwrap();

    let mut draft = booking("SA-1", guest.id, date(2024, 10, 1), date(2024, 10, 3));
    draft.payment_id = Some(card.id);
    let stay = repo.create_booking(draft).await.unwrap();

    assert_eq!(repo.get_booking_payment(stay.id).await.unwrap().id, card.id);
    let err = repo.delete_payment(card.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { .. }));

    repo.delete_booking(stay.id).await.unwrap();
    repo.delete_payment(card.id).await.unwrap();
    assert!(repo.list_payments().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_booking_without_payment_has_no_payment() {
    let (repo, _, guest) = seeded().await;
    let stay = repo
        .create_booking(booking("SA-1", guest.id, date(2024, 11, 1), date(2024, 11, 2)))
        .await
        .unwrap();
    assert!(repo
        .get_booking_payment(stay.id)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_concurrent_bookings_same_dates() {
    let (repo, _, guest) = seeded().await;
    let repo = Arc::new(repo);
    let guest_id = guest.id;

    let mut handles = vec![];
    for _ in 0..8 {
        let repo = Arc::clone(&repo);
        handles.push(tokio::spawn(async move {
            repo.create_booking(booking("SA-1", guest_id, date(2025, 1, 10), date(2025, 1, 12)))
                .await
        }));
    }

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(RepositoryError::Conflict { .. }) => conflicts += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);
}

// =========================================================
// Catalog
// =========================================================

#[tokio::test]
async fn test_currency_code_is_unique() {
    let repo = LocalRepository::new();
    let currency = NewCurrency {
        alphanumeric_code: "eur".into(),
        name: "Euro".into(),
        entity: "European Union".into(),
        code: "978".into(),
    };
    let created = repo.create_currency(currency.clone()).await.unwrap();
    assert_eq!(created.alphanumeric_code, "EUR");

    let err = repo.create_currency(currency).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict { .. }));
    assert_eq!(repo.get_currency(created.id).await.unwrap().name, "Euro");
}

#[tokio::test]
async fn test_plan_feature_links() {
    let repo = LocalRepository::new();
    let plan = repo
        .create_plan(NewPlan {
            name: "Pro".into(),
            price: 9.99,
        })
        .await
        .unwrap();
    let feature = repo
        .create_feature(NewPlanFeature {
            detail: "Unlimited listings".into(),
        })
        .await
        .unwrap();

    repo.add_feature_to_plan(plan.id, feature.id).await.unwrap();
    let linked = repo.add_feature_to_plan(plan.id, feature.id).await.unwrap();
    assert_eq!(linked.features.len(), 1);
    assert_eq!(repo.list_plans().await.unwrap()[0].features.len(), 1);

    let unlinked = repo.remove_feature_from_plan(plan.id, feature.id).await.unwrap();
    assert!(unlinked.features.is_empty());
    let err = repo
        .remove_feature_from_plan(plan.id, feature.id)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(repo.list_features().await.unwrap().len(), 1);
}
