//! In-memory repository for unit testing and local development.
//!
//! All tables live behind a single `RwLock`, so every multi-table write
//! (image attachment, cascading deletes, booking overlap checks) happens
//! under one write guard and is observed atomically by readers.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use parking_lot::RwLock;

use crate::api::{
    Accommodation, AccommodationCategory, AccommodationDetails, AccommodationImage,
    AccommodationReview, AppPlan, Booking, BookingDraft, BookingId, CategoryId, Currency,
    CurrencyId, FeatureId, HostReview, HostReviewId, ImageId, LocationId, NewAccommodation,
    NewAccommodationReview, NewCategory, NewCurrency, NewHostReview, NewImage, NewPayment,
    NewPlan, NewPlanFeature, NewUserConfiguration, Page, Payment, PaymentId, PlanFeature, PlanId,
    ReviewId, ReviewUpdate, SearchCriteria, SearchHit, SearchId, SearchRecord, User, UserChanges,
    UserConfiguration, UserConfigurationId, UserConfigurationUpdate, UserDraft, UserId,
};
use crate::db::repository::{
    AccommodationRepository, BookingRepository, CatalogRepository, RepositoryError,
    RepositoryResult, ReviewRepository, UserRepository,
};
use crate::services::search::search_in_memory;

struct StoredUser {
    user: User,
    password_hash: String,
}

struct StoredPlan {
    id: PlanId,
    name: String,
    price: f64,
    features: BTreeSet<FeatureId>,
}

#[derive(Default)]
struct LocalState {
    sequences: HashMap<&'static str, i64>,
    users: BTreeMap<UserId, StoredUser>,
    configurations: BTreeMap<UserConfigurationId, UserConfiguration>,
    searches: BTreeMap<SearchId, SearchRecord>,
    currencies: BTreeMap<CurrencyId, Currency>,
    categories: BTreeMap<CategoryId, AccommodationCategory>,
    accommodations: BTreeMap<String, Accommodation>,
    reviews: BTreeMap<ReviewId, AccommodationReview>,
    host_reviews: BTreeMap<HostReviewId, HostReview>,
    bookings: BTreeMap<BookingId, Booking>,
    payments: BTreeMap<PaymentId, Payment>,
    plans: BTreeMap<PlanId, StoredPlan>,
    features: BTreeMap<FeatureId, PlanFeature>,
}

impl LocalState {
    fn next_id(&mut self, table: &'static str) -> i64 {
        let seq = self.sequences.entry(table).or_insert(0);
        *seq += 1;
        *seq
    }

    fn user(&self, op: &str, id: UserId) -> RepositoryResult<&StoredUser> {
        self.users
            .get(&id)
            .ok_or_else(|| RepositoryError::missing(op, "user", id))
    }

    fn accommodation(&self, op: &str, register_number: &str) -> RepositoryResult<&Accommodation> {
        self.accommodations
            .get(register_number)
            .ok_or_else(|| RepositoryError::missing(op, "accommodation", register_number))
    }

    fn accommodation_mut(
        &mut self,
        op: &str,
        register_number: &str,
    ) -> RepositoryResult<&mut Accommodation> {
        self.accommodations
            .get_mut(register_number)
            .ok_or_else(|| RepositoryError::missing(op, "accommodation", register_number))
    }

    fn category(&self, op: &str, id: Option<CategoryId>) -> RepositoryResult<Option<AccommodationCategory>> {
        id.map(|id| {
            self.categories
                .get(&id)
                .cloned()
                .ok_or_else(|| RepositoryError::missing(op, "category", id))
        })
        .transpose()
    }

    fn ensure_currency(&self, op: &str, id: Option<CurrencyId>) -> RepositoryResult<()> {
        match id {
            Some(id) if !self.currencies.contains_key(&id) => {
                Err(RepositoryError::missing(op, "currency", id))
            }
            _ => Ok(()),
        }
    }

    fn ensure_payment(&self, op: &str, id: Option<PaymentId>) -> RepositoryResult<()> {
        match id {
            Some(id) if !self.payments.contains_key(&id) => {
                Err(RepositoryError::missing(op, "payment", id))
            }
            _ => Ok(()),
        }
    }

    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        let email = email.trim().to_lowercase();
        self.users
            .values()
            .any(|stored| Some(stored.user.id) != except && stored.user.email.to_lowercase() == email)
    }

    fn find_by_email(&self, email: &str) -> Option<&StoredUser> {
        let email = email.trim().to_lowercase();
        self.users
            .values()
            .find(|stored| stored.user.email.to_lowercase() == email)
    }

    /// Check a booking draft against the references it needs and the
    /// calendar of its accommodation.
    fn check_booking(
        &self,
        op: &str,
        booking: &BookingDraft,
        except: Option<BookingId>,
    ) -> RepositoryResult<()> {
        self.accommodation(op, &booking.register_number)?;
        self.user(op, booking.user_id)?;
        self.ensure_payment(op, booking.payment_id)?;

        let clash = self.bookings.values().find(|existing| {
            Some(existing.id) != except
                && existing.register_number == booking.register_number
                && existing.overlaps(booking.check_in, booking.check_out)
        });
        if let Some(existing) = clash {
            return Err(RepositoryError::conflict_on(
                op,
                "accommodation",
                &booking.register_number,
                format!(
                    "{} is already booked from {} to {} (booking {})",
                    booking.register_number, existing.check_in, existing.check_out, existing.id
                ),
            ));
        }
        Ok(())
    }

    fn plan(&self, op: &str, id: PlanId) -> RepositoryResult<AppPlan> {
        let stored = self
            .plans
            .get(&id)
            .ok_or_else(|| RepositoryError::missing(op, "plan", id))?;
        Ok(AppPlan {
            id: stored.id,
            name: stored.name.clone(),
            price: stored.price,
            features: stored
                .features
                .iter()
                .filter_map(|fid| self.features.get(fid).cloned())
                .collect(),
        })
    }
}

/// In-memory implementation of every repository trait.
pub struct LocalRepository {
    state: RwLock<LocalState>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LocalState::default()),
        }
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccommodationRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }

    async fn create_accommodation(
        &self,
        accommodation: NewAccommodation,
    ) -> RepositoryResult<Accommodation> {
        const OP: &str = "create_accommodation";
        let mut state = self.state.write();
        let NewAccommodation {
            register_number,
            details,
        } = accommodation;

        if state.accommodations.contains_key(&register_number) {
            return Err(RepositoryError::conflict_on(
                OP,
                "accommodation",
                &register_number,
                format!("Register number {} already exists", register_number),
            ));
        }
        state.user(OP, details.host_id)?;
        let category = state.category(OP, details.category_id)?;
        let location_id = LocationId(state.next_id("locations"));

        let created = Accommodation {
            register_number: register_number.clone(),
            host_id: details.host_id,
            num_of_beds: details.num_of_beds,
            num_of_bathrooms: details.num_of_bathrooms,
            num_of_bedrooms: details.num_of_bedrooms,
            price_per_night: details.price_per_night,
            num_of_guests: details.num_of_guests,
            area: details.area,
            category,
            location: details.location.into_location(location_id),
            images: Vec::new(),
            created_at: Utc::now(),
        };
        state.accommodations.insert(register_number, created.clone());
        Ok(created)
    }

    async fn get_accommodation(&self, register_number: &str) -> RepositoryResult<Accommodation> {
        self.state
            .read()
            .accommodation("get_accommodation", register_number)
            .cloned()
    }

    async fn list_accommodations(&self) -> RepositoryResult<Vec<Accommodation>> {
        Ok(self.state.read().accommodations.values().cloned().collect())
    }

    async fn list_accommodations_by_city(&self, city: &str) -> RepositoryResult<Vec<Accommodation>> {
        let city = city.trim().to_lowercase();
        Ok(self
            .state
            .read()
            .accommodations
            .values()
            .filter(|acc| acc.location.city.to_lowercase() == city)
            .cloned()
            .collect())
    }

    async fn update_accommodation(
        &self,
        register_number: &str,
        details: AccommodationDetails,
    ) -> RepositoryResult<Accommodation> {
        const OP: &str = "update_accommodation";
        let mut state = self.state.write();
        state.accommodation(OP, register_number)?;
        state.user(OP, details.host_id)?;
        let category = state.category(OP, details.category_id)?;

        let acc = state.accommodation_mut(OP, register_number)?;
        acc.host_id = details.host_id;
        acc.num_of_beds = details.num_of_beds;
        acc.num_of_bathrooms = details.num_of_bathrooms;
        acc.num_of_bedrooms = details.num_of_bedrooms;
        acc.price_per_night = details.price_per_night;
        acc.num_of_guests = details.num_of_guests;
        acc.area = details.area;
        acc.category = category;
        acc.location = details.location.into_location(acc.location.id);
        Ok(acc.clone())
    }

    async fn delete_accommodation(&self, register_number: &str) -> RepositoryResult<()> {
        const OP: &str = "delete_accommodation";
        let mut state = self.state.write();
        state.accommodation(OP, register_number)?;
        if state
            .bookings
            .values()
            .any(|b| b.register_number == register_number)
        {
            return Err(RepositoryError::conflict_on(
                OP,
                "accommodation",
                register_number,
                format!("Accommodation {} still has bookings", register_number),
            ));
        }
        state
            .reviews
            .retain(|_, review| review.register_number != register_number);
        state.accommodations.remove(register_number);
        Ok(())
    }

    async fn search_accommodations(
        &self,
        criteria: &SearchCriteria,
    ) -> RepositoryResult<Page<SearchHit>> {
        let state = self.state.read();
        Ok(search_in_memory(
            state.accommodations.values().cloned(),
            criteria,
        ))
    }

    async fn attach_image(
        &self,
        register_number: &str,
        image: NewImage,
    ) -> RepositoryResult<AccommodationImage> {
        const OP: &str = "attach_image";
        let mut state = self.state.write();
        state.accommodation(OP, register_number)?;
        let image = AccommodationImage {
            id: ImageId(state.next_id("images")),
            url: image.url,
            created_at: Utc::now(),
        };
        state
            .accommodation_mut(OP, register_number)?
            .images
            .push(image.clone());
        Ok(image)
    }

    async fn list_images(&self, register_number: &str) -> RepositoryResult<Vec<AccommodationImage>> {
        Ok(self
            .state
            .read()
            .accommodation("list_images", register_number)?
            .images
            .clone())
    }

    async fn remove_image(&self, register_number: &str, image_id: ImageId) -> RepositoryResult<()> {
        const OP: &str = "remove_image";
        let mut state = self.state.write();
        let acc = state.accommodation_mut(OP, register_number)?;
        let before = acc.images.len();
        acc.images.retain(|img| img.id != image_id);
        if acc.images.len() == before {
            return Err(RepositoryError::missing(OP, "image", image_id));
        }
        Ok(())
    }

    async fn list_categories(&self) -> RepositoryResult<Vec<AccommodationCategory>> {
        Ok(self.state.read().categories.values().cloned().collect())
    }

    async fn create_category(
        &self,
        category: NewCategory,
    ) -> RepositoryResult<AccommodationCategory> {
        let mut state = self.state.write();
        let description = category.description.trim().to_string();
        let folded = description.to_lowercase();
        if state
            .categories
            .values()
            .any(|c| c.description.to_lowercase() == folded)
        {
            return Err(RepositoryError::conflict_on(
                "create_category",
                "category",
                &description,
                format!("Category {} already exists", description),
            ));
        }
        let created = AccommodationCategory {
            id: CategoryId(state.next_id("categories")),
            description,
        };
        state.categories.insert(created.id, created.clone());
        Ok(created)
    }
}

#[async_trait]
impl UserRepository for LocalRepository {
    async fn create_user(&self, user: UserDraft) -> RepositoryResult<User> {
        let mut state = self.state.write();
        if state.email_taken(&user.email, None) {
            return Err(RepositoryError::conflict_on(
                "create_user",
                "user",
                &user.email,
                format!("Email {} is already registered", user.email),
            ));
        }
        let created = User {
            id: UserId(state.next_id("users")),
            name: user.name,
            surname: user.surname,
            email: user.email,
            phone: user.phone,
            profile_image: user.profile_image,
            role: user.role,
            created_at: Utc::now(),
        };
        state.users.insert(
            created.id,
            StoredUser {
                user: created.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(created)
    }

    async fn get_user(&self, id: UserId) -> RepositoryResult<User> {
        Ok(self.state.read().user("get_user", id)?.user.clone())
    }

    async fn get_user_by_email(&self, email: &str) -> RepositoryResult<User> {
        self.state
            .read()
            .find_by_email(email)
            .map(|stored| stored.user.clone())
            .ok_or_else(|| RepositoryError::missing("get_user_by_email", "user", email))
    }

    async fn find_credentials(&self, email: &str) -> RepositoryResult<Option<(User, String)>> {
        Ok(self
            .state
            .read()
            .find_by_email(email)
            .map(|stored| (stored.user.clone(), stored.password_hash.clone())))
    }

    async fn list_users(&self) -> RepositoryResult<Vec<User>> {
        Ok(self
            .state
            .read()
            .users
            .values()
            .map(|stored| stored.user.clone())
            .collect())
    }

    async fn list_started_users(&self) -> RepositoryResult<Vec<User>> {
        let state = self.state.read();
        let started: BTreeSet<UserId> = state.configurations.values().map(|c| c.user_id).collect();
        Ok(started
            .into_iter()
            .filter_map(|id| state.users.get(&id).map(|stored| stored.user.clone()))
            .collect())
    }

    async fn update_user(&self, id: UserId, changes: UserChanges) -> RepositoryResult<User> {
        const OP: &str = "update_user";
        let mut state = self.state.write();
        state.user(OP, id)?;
        if let Some(email) = &changes.email {
            if state.email_taken(email, Some(id)) {
                return Err(RepositoryError::conflict_on(
                    OP,
                    "user",
                    email,
                    format!("Email {} is already registered", email),
                ));
            }
        }
        let stored = state
            .users
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::missing(OP, "user", id))?;
        changes.apply(&mut stored.user, &mut stored.password_hash);
        Ok(stored.user.clone())
    }

    async fn delete_user(&self, id: UserId) -> RepositoryResult<()> {
        const OP: &str = "delete_user";
        let mut state = self.state.write();
        state.user(OP, id)?;
        if state.accommodations.values().any(|acc| acc.host_id == id) {
            return Err(RepositoryError::conflict_on(
                OP,
                "user",
                id,
                format!("User {} still hosts accommodations", id),
            ));
        }
        if state.bookings.values().any(|b| b.user_id == id) {
            return Err(RepositoryError::conflict_on(
                OP,
                "user",
                id,
                format!("User {} still has bookings", id),
            ));
        }
        state.configurations.retain(|_, c| c.user_id != id);
        state.searches.retain(|_, s| s.user_id != id);
        state.reviews.retain(|_, r| r.user_id != id);
        state
            .host_reviews
            .retain(|_, r| r.host_id != id && r.reviewer_id != id);
        state.users.remove(&id);
        Ok(())
    }

    async fn create_user_configuration(
        &self,
        config: NewUserConfiguration,
    ) -> RepositoryResult<UserConfiguration> {
        const OP: &str = "create_user_configuration";
        let mut state = self.state.write();
        state.user(OP, config.user_id)?;
        state.ensure_currency(OP, config.currency_id)?;
        if state
            .configurations
            .values()
            .any(|c| c.user_id == config.user_id)
        {
            return Err(RepositoryError::conflict_on(
                OP,
                "user_configuration",
                config.user_id,
                format!("User {} already has a configuration", config.user_id),
            ));
        }
        let created = UserConfiguration {
            id: UserConfigurationId(state.next_id("configurations")),
            user_id: config.user_id,
            currency_id: config.currency_id,
            language: config.language,
            notifications_enabled: config.notifications_enabled,
        };
        state.configurations.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_user_configuration(&self, user_id: UserId) -> RepositoryResult<UserConfiguration> {
        self.state
            .read()
            .configurations
            .values()
            .find(|c| c.user_id == user_id)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::missing("get_user_configuration", "user_configuration", user_id)
            })
    }

    async fn update_user_configuration(
        &self,
        user_id: UserId,
        update: UserConfigurationUpdate,
    ) -> RepositoryResult<UserConfiguration> {
        const OP: &str = "update_user_configuration";
        let mut state = self.state.write();
        state.ensure_currency(OP, update.currency_id)?;
        let config = state
            .configurations
            .values_mut()
            .find(|c| c.user_id == user_id)
            .ok_or_else(|| RepositoryError::missing(OP, "user_configuration", user_id))?;
        update.apply(config);
        Ok(config.clone())
    }

    async fn delete_user_configuration(&self, id: UserConfigurationId) -> RepositoryResult<()> {
        self.state
            .write()
            .configurations
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| {
                RepositoryError::missing("delete_user_configuration", "user_configuration", id)
            })
    }

    async fn delete_user_configuration_by_user(&self, user_id: UserId) -> RepositoryResult<()> {
        let mut state = self.state.write();
        let before = state.configurations.len();
        state.configurations.retain(|_, c| c.user_id != user_id);
        if state.configurations.len() == before {
            return Err(RepositoryError::missing(
                "delete_user_configuration_by_user",
                "user_configuration",
                user_id,
            ));
        }
        Ok(())
    }

    async fn record_search(
        &self,
        user_id: UserId,
        criteria: &SearchCriteria,
    ) -> RepositoryResult<SearchRecord> {
        let mut state = self.state.write();
        state.user("record_search", user_id)?;
        let record = SearchRecord {
            id: SearchId(state.next_id("searches")),
            user_id,
            criteria: criteria.clone(),
            created_at: Utc::now(),
        };
        state.searches.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_searches(&self, user_id: UserId) -> RepositoryResult<Vec<SearchRecord>> {
        let state = self.state.read();
        state.user("list_searches", user_id)?;
        Ok(state
            .searches
            .values()
            .rev()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BookingRepository for LocalRepository {
    async fn create_booking(&self, booking: BookingDraft) -> RepositoryResult<Booking> {
        let mut state = self.state.write();
        state.check_booking("create_booking", &booking, None)?;
        let created = Booking {
            id: BookingId(state.next_id("bookings")),
            register_number: booking.register_number,
            user_id: booking.user_id,
            check_in: booking.check_in,
            check_out: booking.check_out,
            num_of_guests: booking.num_of_guests,
            amount: booking.amount,
            payment_id: booking.payment_id,
            created_at: Utc::now(),
        };
        state.bookings.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_booking(&self, id: BookingId) -> RepositoryResult<Booking> {
        self.state
            .read()
            .bookings
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::missing("get_booking", "booking", id))
    }

    async fn update_booking(
        &self,
        id: BookingId,
        booking: BookingDraft,
    ) -> RepositoryResult<Booking> {
        const OP: &str = "update_booking";
        let mut state = self.state.write();
        if !state.bookings.contains_key(&id) {
            return Err(RepositoryError::missing(OP, "booking", id));
        }
        state.check_booking(OP, &booking, Some(id))?;
        let stored = state
            .bookings
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::missing(OP, "booking", id))?;
        stored.check_in = booking.check_in;
        stored.check_out = booking.check_out;
        stored.num_of_guests = booking.num_of_guests;
        stored.payment_id = booking.payment_id;
        stored.amount = booking.amount;
        Ok(stored.clone())
    }

    async fn delete_booking(&self, id: BookingId) -> RepositoryResult<()> {
        self.state
            .write()
            .bookings
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::missing("delete_booking", "booking", id))
    }

    async fn list_bookings_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<Booking>> {
        Ok(self
            .state
            .read()
            .bookings
            .values()
            .filter(|b| b.check_in >= from && b.check_out <= to)
            .cloned()
            .collect())
    }

    async fn list_bookings_by_year(&self, year: i32) -> RepositoryResult<Vec<Booking>> {
        Ok(self
            .state
            .read()
            .bookings
            .values()
            .filter(|b| b.created_at.year() == year)
            .cloned()
            .collect())
    }

    async fn list_bookings_by_user(&self, user_id: UserId) -> RepositoryResult<Vec<Booking>> {
        let state = self.state.read();
        state.user("list_bookings_by_user", user_id)?;
        Ok(state
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn count_bookings_by_user(&self, user_id: UserId) -> RepositoryResult<u64> {
        let state = self.state.read();
        state.user("count_bookings_by_user", user_id)?;
        Ok(state
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .count() as u64)
    }

    async fn create_payment(&self, payment: NewPayment) -> RepositoryResult<Payment> {
        let mut state = self.state.write();
        let created = Payment {
            id: PaymentId(state.next_id("payments")),
            title: payment.title,
            description: payment.description,
            created_at: Utc::now(),
        };
        state.payments.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_payment(&self, id: PaymentId) -> RepositoryResult<Payment> {
        self.state
            .read()
            .payments
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::missing("get_payment", "payment", id))
    }

    async fn update_payment(&self, id: PaymentId, payment: NewPayment) -> RepositoryResult<Payment> {
        let mut state = self.state.write();
        let stored = state
            .payments
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::missing("update_payment", "payment", id))?;
        stored.title = payment.title;
        stored.description = payment.description;
        Ok(stored.clone())
    }

    async fn delete_payment(&self, id: PaymentId) -> RepositoryResult<()> {
        const OP: &str = "delete_payment";
        let mut state = self.state.write();
        if !state.payments.contains_key(&id) {
            return Err(RepositoryError::missing(OP, "payment", id));
        }
        if state.bookings.values().any(|b| b.payment_id == Some(id)) {
            return Err(RepositoryError::conflict_on(
                OP,
                "payment",
                id,
                format!("Payment {} is referenced by bookings", id),
            ));
        }
        state.payments.remove(&id);
        Ok(())
    }

    async fn list_payments(&self) -> RepositoryResult<Vec<Payment>> {
        Ok(self.state.read().payments.values().cloned().collect())
    }

    async fn get_booking_payment(&self, booking_id: BookingId) -> RepositoryResult<Payment> {
        const OP: &str = "get_booking_payment";
        let state = self.state.read();
        let booking = state
            .bookings
            .get(&booking_id)
            .ok_or_else(|| RepositoryError::missing(OP, "booking", booking_id))?;
        let payment_id = booking.payment_id.ok_or_else(|| {
            RepositoryError::not_found(format!("Booking {} has no payment", booking_id))
                .with_operation(OP)
        })?;
        state
            .payments
            .get(&payment_id)
            .cloned()
            .ok_or_else(|| RepositoryError::missing(OP, "payment", payment_id))
    }
}

#[async_trait]
impl ReviewRepository for LocalRepository {
    async fn create_accommodation_review(
        &self,
        review: NewAccommodationReview,
    ) -> RepositoryResult<AccommodationReview> {
        const OP: &str = "create_accommodation_review";
        let mut state = self.state.write();
        state.accommodation(OP, &review.register_number)?;
        state.user(OP, review.user_id)?;
        let created = AccommodationReview {
            id: ReviewId(state.next_id("reviews")),
            register_number: review.register_number,
            user_id: review.user_id,
            content: review.content,
            stars: review.stars,
            created_at: Utc::now(),
        };
        state.reviews.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_accommodation_review(&self, id: ReviewId) -> RepositoryResult<AccommodationReview> {
        self.state
            .read()
            .reviews
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::missing("get_accommodation_review", "review", id))
    }

    async fn update_accommodation_review(
        &self,
        id: ReviewId,
        update: ReviewUpdate,
    ) -> RepositoryResult<AccommodationReview> {
        let mut state = self.state.write();
        let review = state
            .reviews
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::missing("update_accommodation_review", "review", id))?;
        update.apply(review);
        Ok(review.clone())
    }

    async fn delete_accommodation_review(&self, id: ReviewId) -> RepositoryResult<()> {
        self.state
            .write()
            .reviews
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::missing("delete_accommodation_review", "review", id))
    }

    async fn list_accommodation_reviews(
        &self,
        register_number: &str,
    ) -> RepositoryResult<Vec<AccommodationReview>> {
        let state = self.state.read();
        state.accommodation("list_accommodation_reviews", register_number)?;
        Ok(state
            .reviews
            .values()
            .filter(|r| r.register_number == register_number)
            .cloned()
            .collect())
    }

    async fn create_host_review(&self, review: NewHostReview) -> RepositoryResult<HostReview> {
        const OP: &str = "create_host_review";
        let mut state = self.state.write();
        state.user(OP, review.host_id)?;
        state.user(OP, review.reviewer_id)?;
        let created = HostReview {
            id: HostReviewId(state.next_id("host_reviews")),
            host_id: review.host_id,
            reviewer_id: review.reviewer_id,
            content: review.content,
            stars: review.stars,
            created_at: Utc::now(),
        };
        state.host_reviews.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_host_review(&self, id: HostReviewId) -> RepositoryResult<HostReview> {
        self.state
            .read()
            .host_reviews
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::missing("get_host_review", "host_review", id))
    }

    async fn list_host_reviews(&self, host_id: UserId) -> RepositoryResult<Vec<HostReview>> {
        let state = self.state.read();
        state.user("list_host_reviews", host_id)?;
        Ok(state
            .host_reviews
            .values()
            .filter(|r| r.host_id == host_id)
            .cloned()
            .collect())
    }

    async fn delete_host_review(&self, id: HostReviewId) -> RepositoryResult<()> {
        self.state
            .write()
            .host_reviews
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::missing("delete_host_review", "host_review", id))
    }
}

#[async_trait]
impl CatalogRepository for LocalRepository {
    async fn list_currencies(&self) -> RepositoryResult<Vec<Currency>> {
        Ok(self.state.read().currencies.values().cloned().collect())
    }

    async fn get_currency(&self, id: CurrencyId) -> RepositoryResult<Currency> {
        self.state
            .read()
            .currencies
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::missing("get_currency", "currency", id))
    }

    async fn create_currency(&self, currency: NewCurrency) -> RepositoryResult<Currency> {
        let mut state = self.state.write();
        let code = currency.alphanumeric_code.trim().to_uppercase();
        if state
            .currencies
            .values()
            .any(|c| c.alphanumeric_code.to_uppercase() == code)
        {
            return Err(RepositoryError::conflict_on(
                "create_currency",
                "currency",
                &code,
                format!("Currency {} already exists", code),
            ));
        }
        let created = Currency {
            id: CurrencyId(state.next_id("currencies")),
            alphanumeric_code: code,
            name: currency.name,
            entity: currency.entity,
            code: currency.code,
        };
        state.currencies.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_plans(&self) -> RepositoryResult<Vec<AppPlan>> {
        let state = self.state.read();
        state
            .plans
            .keys()
            .map(|id| state.plan("list_plans", *id))
            .collect()
    }

    async fn get_plan(&self, id: PlanId) -> RepositoryResult<AppPlan> {
        self.state.read().plan("get_plan", id)
    }

    async fn create_plan(&self, plan: NewPlan) -> RepositoryResult<AppPlan> {
        let mut state = self.state.write();
        let id = PlanId(state.next_id("plans"));
        state.plans.insert(
            id,
            StoredPlan {
                id,
                name: plan.name,
                price: plan.price,
                features: BTreeSet::new(),
            },
        );
        state.plan("create_plan", id)
    }

    async fn list_features(&self) -> RepositoryResult<Vec<PlanFeature>> {
        Ok(self.state.read().features.values().cloned().collect())
    }

    async fn create_feature(&self, feature: NewPlanFeature) -> RepositoryResult<PlanFeature> {
        let mut state = self.state.write();
        let created = PlanFeature {
            id: FeatureId(state.next_id("features")),
            detail: feature.detail,
        };
        state.features.insert(created.id, created.clone());
        Ok(created)
    }

    async fn add_feature_to_plan(
        &self,
        plan_id: PlanId,
        feature_id: FeatureId,
    ) -> RepositoryResult<AppPlan> {
        const OP: &str = "add_feature_to_plan";
        let mut state = self.state.write();
        if !state.features.contains_key(&feature_id) {
            return Err(RepositoryError::missing(OP, "feature", feature_id));
        }
        state
            .plans
            .get_mut(&plan_id)
            .ok_or_else(|| RepositoryError::missing(OP, "plan", plan_id))?
            .features
            .insert(feature_id);
        state.plan(OP, plan_id)
    }

    async fn remove_feature_from_plan(
        &self,
        plan_id: PlanId,
        feature_id: FeatureId,
    ) -> RepositoryResult<AppPlan> {
        const OP: &str = "remove_feature_from_plan";
        let mut state = self.state.write();
        let plan = state
            .plans
            .get_mut(&plan_id)
            .ok_or_else(|| RepositoryError::missing(OP, "plan", plan_id))?;
        if !plan.features.remove(&feature_id) {
            return Err(RepositoryError::missing(OP, "feature", feature_id));
        }
        state.plan(OP, plan_id)
    }
}
