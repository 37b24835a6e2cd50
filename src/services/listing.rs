use crate::{
    error::{AppError, AppResult},
    models::{
        apartment_details, house_details, listing, ApartmentDetails, ApartmentType, HouseDetails,
        Listing, ListingModel, Location, PropertyType, RoomType,
    },
    response::CursorPage,
    services::{
        cache::{listing_key, CacheService, LISTING_TTL_SECS},
        store::bounded,
    },
    utils::ListingCursor,
};
use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Select, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use validator::Validate;

pub const DEFAULT_PAGE_SIZE: u64 = 12;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApartmentInfo {
    pub room_type: RoomType,
    pub apartment_type: ApartmentType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HouseInfo {
    pub num_bathrooms: f64,
    pub num_rooms: i32,
}

/// Property-type specific attributes. The variant always agrees with the
/// listing's `property_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ListingDetails {
    Apartment(ApartmentInfo),
    House(HouseInfo),
}

impl ListingDetails {
    pub fn property_type(&self) -> PropertyType {
        match self {
            ListingDetails::Apartment(_) => PropertyType::Apartment,
            ListingDetails::House(_) => PropertyType::House,
        }
    }

    fn check(&self) -> AppResult<()> {
        if let ListingDetails::House(house) = self {
            if !house.num_bathrooms.is_finite() || house.num_bathrooms < 0.0 {
                return Err(AppError::Validation(
                    "num_bathrooms must be a non-negative number".to_string(),
                ));
            }
            if house.num_rooms < 0 {
                return Err(AppError::Validation(
                    "num_rooms must not be negative".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl From<apartment_details::Model> for ListingDetails {
    fn from(m: apartment_details::Model) -> Self {
        ListingDetails::Apartment(ApartmentInfo {
            room_type: m.room_type,
            apartment_type: m.apartment_type,
        })
    }
}

impl From<house_details::Model> for ListingDetails {
    fn from(m: house_details::Model) -> Self {
        ListingDetails::House(HouseInfo {
            num_bathrooms: m.num_bathrooms,
            num_rooms: m.num_rooms,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListingWithDetails {
    #[serde(flatten)]
    pub listing: ListingModel,
    pub details: Option<ListingDetails>,
}

/// Optional predicates for [`ListingService::list_page`]. Every field is
/// independent; `None` means no constraint on that dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilters {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub property_type: Option<PropertyType>,
    pub location: Option<Location>,
    pub min_rooms: Option<i32>,
    /// Listing must be available on or before this date.
    pub move_in: Option<NaiveDate>,
    /// Listing must still be available on this date.
    pub move_out: Option<NaiveDate>,
}

impl ListingFilters {
    pub fn validate(&self) -> AppResult<()> {
        for (name, price) in [("min_price", self.min_price), ("max_price", self.max_price)] {
            if let Some(p) = price {
                if !p.is_finite() || p < 0.0 {
                    return Err(AppError::Validation(format!(
                        "{name} must be a non-negative number"
                    )));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(AppError::Validation(
                    "min_price cannot exceed max_price".to_string(),
                ));
            }
        }
        if matches!(self.min_rooms, Some(n) if n < 0) {
            return Err(AppError::Validation(
                "min_rooms must not be negative".to_string(),
            ));
        }
        if let (Some(move_in), Some(move_out)) = (self.move_in, self.move_out) {
            if move_in > move_out {
                return Err(AppError::Validation(
                    "move_in cannot be after move_out".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn apply(&self, mut query: Select<Listing>) -> Select<Listing> {
        if let Some(min) = self.min_price {
            query = query.filter(listing::Column::Price.gte(min));
        }
        if let Some(max) = self.max_price {
            query = query.filter(listing::Column::Price.lte(max));
        }
        if let Some(property_type) = self.property_type {
            query = query.filter(listing::Column::PropertyType.eq(property_type));
        }
        if let Some(location) = self.location {
            query = query.filter(listing::Column::Location.eq(location));
        }
        if let Some(rooms) = self.min_rooms {
            query = query.filter(listing::Column::RoomsAvailable.gte(rooms));
        }
        if let Some(move_in) = self.move_in {
            query = query.filter(listing::Column::StartDate.lte(move_in));
        }
        if let Some(move_out) = self.move_out {
            query = query.filter(listing::Column::EndDate.gte(move_out));
        }
        query
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewListing {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 300))]
    pub address: String,
    #[validate(length(max = 5000))]
    pub description: String,
    pub property_type: PropertyType,
    pub location: Location,
    #[validate(range(min = 0.0))]
    pub distance_in_miles: f64,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[validate(range(min = 0))]
    pub rooms_available: i32,
    #[validate(range(min = 1))]
    pub total_rooms: i32,
    #[validate(range(min = 0))]
    pub roommates: i32,
    pub utilities_included: bool,
    #[validate(range(min = 0))]
    pub sqft: i32,
    #[validate(length(max = 20))]
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub details: Option<ListingDetails>,
}

/// Partial update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ListingPatch {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 300))]
    pub address: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub property_type: Option<PropertyType>,
    pub location: Option<Location>,
    #[validate(range(min = 0.0))]
    pub distance_in_miles: Option<f64>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    #[validate(range(min = 0))]
    pub rooms_available: Option<i32>,
    #[validate(range(min = 1))]
    pub total_rooms: Option<i32>,
    #[validate(range(min = 0))]
    pub roommates: Option<i32>,
    pub utilities_included: Option<bool>,
    #[validate(range(min = 0))]
    pub sqft: Option<i32>,
    #[validate(length(max = 20))]
    pub image_urls: Option<Vec<String>>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Replaces the details record.
    pub details: Option<ListingDetails>,
}

impl ListingPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.address.is_none()
            && self.description.is_none()
            && self.property_type.is_none()
            && self.location.is_none()
            && self.distance_in_miles.is_none()
            && self.price.is_none()
            && self.rooms_available.is_none()
            && self.total_rooms.is_none()
            && self.roommates.is_none()
            && self.utilities_included.is_none()
            && self.sqft.is_none()
            && self.image_urls.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.details.is_none()
    }
}

fn check_shape(
    property_type: PropertyType,
    details: Option<&ListingDetails>,
    rooms_available: i32,
    total_rooms: i32,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> AppResult<()> {
    if let Some(details) = details {
        details.check()?;
        if details.property_type() != property_type {
            return Err(AppError::Validation(
                "Listing details do not match the property type".to_string(),
            ));
        }
    }
    if rooms_available > total_rooms {
        return Err(AppError::Validation(
            "rooms_available cannot exceed total_rooms".to_string(),
        ));
    }
    if end_date < start_date {
        return Err(AppError::Validation(
            "end_date cannot be before start_date".to_string(),
        ));
    }
    Ok(())
}

pub struct ListingService {
    db: DatabaseConnection,
    cache: Option<CacheService>,
}

impl ListingService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db, cache: None }
    }

    pub fn with_cache(mut self, cache: CacheService) -> Self {
        self.cache = Some(cache);
        self
    }

    /// One keyset page in `(created_at DESC, id DESC)` order.
    ///
    /// `cursor` is the `next_cursor` of the previous page; `total_count`
    /// covers every row matching `filters`, independent of the cursor.
    pub async fn list_page(
        &self,
        cursor: Option<&str>,
        limit: u64,
        filters: &ListingFilters,
    ) -> AppResult<CursorPage<ListingWithDetails>> {
        if limit == 0 {
            return Err(AppError::Validation("limit must be at least 1".to_string()));
        }
        let limit = limit.min(MAX_PAGE_SIZE);
        filters.validate()?;
        let after = cursor.map(ListingCursor::decode).transpose()?;

        bounded("list_page", async {
            let base = filters.apply(Listing::find());
            let total_count = base.clone().count(&self.db).await?;

            let mut query = base;
            if let Some(after) = &after {
                query = query.filter(
                    Condition::any()
                        .add(listing::Column::CreatedAt.lt(after.created_at))
                        .add(
                            Condition::all()
                                .add(listing::Column::CreatedAt.eq(after.created_at))
                                .add(listing::Column::Id.lt(after.id)),
                        ),
                );
            }

            // One extra row tells us whether another page exists.
            let mut rows = query
                .order_by_desc(listing::Column::CreatedAt)
                .order_by_desc(listing::Column::Id)
                .limit(limit + 1)
                .all(&self.db)
                .await?;

            let has_more = (rows.len() as u64) > limit;
            rows.truncate(limit as usize);

            let next_cursor = match rows.last() {
                Some(last) if has_more => {
                    Some(ListingCursor::new(last.created_at, last.id).encode()?)
                }
                _ => None,
            };

            let items = self.attach_details(rows).await?;
            Ok(CursorPage {
                items,
                next_cursor,
                total_count,
            })
        })
        .await
    }

    pub async fn get(&self, id: i32) -> AppResult<ListingWithDetails> {
        let key = listing_key(id);
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get::<ListingWithDetails>(&key).await {
                return Ok(cached);
            }
        }

        let listing = bounded("get_listing", async {
            let found = Listing::find_by_id(id)
                .one(&self.db)
                .await?
                .ok_or_else(|| AppError::not_found("Listing"))?;
            let mut with_details = self.attach_details(vec![found]).await?;
            with_details
                .pop()
                .ok_or_else(|| AppError::not_found("Listing"))
        })
        .await?;

        if let Some(cache) = &self.cache {
            cache.set(&key, &listing, LISTING_TTL_SECS).await;
        }
        Ok(listing)
    }

    pub async fn create(&self, lister_id: i32, input: NewListing) -> AppResult<ListingWithDetails> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        check_shape(
            input.property_type,
            input.details.as_ref(),
            input.rooms_available,
            input.total_rooms,
            input.start_date,
            input.end_date,
        )?;

        let now = chrono::Utc::now().naive_utc();
        let created = bounded("create_listing", async {
            let txn = self.db.begin().await?;

            let model = listing::ActiveModel {
                title: Set(input.title.trim().to_string()),
                address: Set(input.address.trim().to_string()),
                description: Set(input.description),
                property_type: Set(input.property_type),
                location: Set(input.location),
                distance_in_miles: Set(input.distance_in_miles),
                price: Set(input.price),
                rooms_available: Set(input.rooms_available),
                total_rooms: Set(input.total_rooms),
                roommates: Set(input.roommates),
                utilities_included: Set(input.utilities_included),
                sqft: Set(input.sqft),
                image_urls: Set(input.image_urls),
                start_date: Set(input.start_date),
                end_date: Set(input.end_date),
                created_at: Set(now),
                updated_at: Set(now),
                lister_id: Set(lister_id),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            if let Some(details) = &input.details {
                write_details(&txn, model.id, details).await?;
            }
            txn.commit().await?;

            Ok(ListingWithDetails {
                listing: model,
                details: input.details,
            })
        })
        .await?;

        tracing::info!(listing_id = created.listing.id, lister_id, "listing created");
        Ok(created)
    }

    /// Applies `patch` to a listing owned by `actor_id`.
    pub async fn update(
        &self,
        actor_id: i32,
        id: i32,
        patch: ListingPatch,
    ) -> AppResult<ListingWithDetails> {
        if patch.is_empty() {
            return Err(AppError::Validation("No fields to update".to_string()));
        }
        patch
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let updated = bounded("update_listing", async {
            let txn = self.db.begin().await?;
            let existing = owned_listing(&txn, actor_id, id).await?;

            let property_type = patch.property_type.unwrap_or(existing.property_type);
            check_shape(
                property_type,
                patch.details.as_ref(),
                patch.rooms_available.unwrap_or(existing.rooms_available),
                patch.total_rooms.unwrap_or(existing.total_rooms),
                patch.start_date.unwrap_or(existing.start_date),
                patch.end_date.unwrap_or(existing.end_date),
            )?;
            let type_changed = property_type != existing.property_type;

            let mut active: listing::ActiveModel = existing.into();
            if let Some(title) = patch.title {
                active.title = Set(title.trim().to_string());
            }
            if let Some(address) = patch.address {
                active.address = Set(address.trim().to_string());
            }
            if let Some(description) = patch.description {
                active.description = Set(description);
            }
            if let Some(location) = patch.location {
                active.location = Set(location);
            }
            if let Some(distance) = patch.distance_in_miles {
                active.distance_in_miles = Set(distance);
            }
            if let Some(price) = patch.price {
                active.price = Set(price);
            }
            if let Some(rooms) = patch.rooms_available {
                active.rooms_available = Set(rooms);
            }
            if let Some(total) = patch.total_rooms {
                active.total_rooms = Set(total);
            }
            if let Some(roommates) = patch.roommates {
                active.roommates = Set(roommates);
            }
            if let Some(utilities) = patch.utilities_included {
                active.utilities_included = Set(utilities);
            }
            if let Some(sqft) = patch.sqft {
                active.sqft = Set(sqft);
            }
            if let Some(urls) = patch.image_urls {
                active.image_urls = Set(urls);
            }
            if let Some(start) = patch.start_date {
                active.start_date = Set(start);
            }
            if let Some(end) = patch.end_date {
                active.end_date = Set(end);
            }
            active.property_type = Set(property_type);
            active.updated_at = Set(chrono::Utc::now().naive_utc());
            let model = active.update(&txn).await?;

            if type_changed || patch.details.is_some() {
                clear_details(&txn, id).await?;
            }
            if let Some(details) = &patch.details {
                write_details(&txn, id, details).await?;
            }
            let details = load_details(&txn, &[id]).await?.remove(&id);
            txn.commit().await?;

            Ok(ListingWithDetails {
                listing: model,
                details,
            })
        })
        .await?;

        self.evict(id).await;
        Ok(updated)
    }

    /// Deletes a listing owned by `actor_id`. Details and saves cascade.
    pub async fn delete(&self, actor_id: i32, id: i32) -> AppResult<()> {
        bounded("delete_listing", async {
            let txn = self.db.begin().await?;
            owned_listing(&txn, actor_id, id).await?;
            Listing::delete_by_id(id).exec(&txn).await?;
            txn.commit().await?;
            Ok(())
        })
        .await?;

        self.evict(id).await;
        tracing::info!(listing_id = id, actor_id, "listing deleted");
        Ok(())
    }

    /// A lister's own listings, newest first.
    pub async fn list_by_lister(
        &self,
        lister_id: i32,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ListingModel>, u64)> {
        bounded("list_by_lister", async {
            let paginator = Listing::find()
                .filter(listing::Column::ListerId.eq(lister_id))
                .order_by_desc(listing::Column::CreatedAt)
                .order_by_desc(listing::Column::Id)
                .paginate(&self.db, per_page);

            let total = paginator.num_items().await?;
            let items = paginator.fetch_page(page.saturating_sub(1)).await?;
            Ok((items, total))
        })
        .await
    }

    async fn attach_details(&self, rows: Vec<ListingModel>) -> AppResult<Vec<ListingWithDetails>> {
        let ids: Vec<i32> = rows.iter().map(|l| l.id).collect();
        let mut details = load_details(&self.db, &ids).await?;
        Ok(rows
            .into_iter()
            .map(|listing| {
                let details = details.remove(&listing.id);
                ListingWithDetails { listing, details }
            })
            .collect())
    }

    async fn evict(&self, id: i32) {
        if let Some(cache) = &self.cache {
            cache.invalidate(&listing_key(id)).await;
        }
    }
}

async fn owned_listing(
    txn: &DatabaseTransaction,
    actor_id: i32,
    id: i32,
) -> AppResult<ListingModel> {
    let existing = Listing::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| AppError::not_found("Listing"))?;

    if existing.lister_id != actor_id {
        return Err(AppError::Forbidden(
            "You can only modify your own listings".to_string(),
        ));
    }
    Ok(existing)
}

async fn load_details<C: sea_orm::ConnectionTrait>(
    conn: &C,
    ids: &[i32],
) -> AppResult<HashMap<i32, ListingDetails>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut out = HashMap::with_capacity(ids.len());
    let apartments = ApartmentDetails::find()
        .filter(apartment_details::Column::ListingId.is_in(ids.to_vec()))
        .all(conn)
        .await?;
    for row in apartments {
        out.insert(row.listing_id, row.into());
    }

    let houses = HouseDetails::find()
        .filter(house_details::Column::ListingId.is_in(ids.to_vec()))
        .all(conn)
        .await?;
    for row in houses {
        out.insert(row.listing_id, row.into());
    }
    Ok(out)
}

async fn clear_details(txn: &DatabaseTransaction, listing_id: i32) -> AppResult<()> {
    ApartmentDetails::delete_many()
        .filter(apartment_details::Column::ListingId.eq(listing_id))
        .exec(txn)
        .await?;
    HouseDetails::delete_many()
        .filter(house_details::Column::ListingId.eq(listing_id))
        .exec(txn)
        .await?;
    Ok(())
}

async fn write_details(
    txn: &DatabaseTransaction,
    listing_id: i32,
    details: &ListingDetails,
) -> AppResult<()> {
    match details {
        ListingDetails::Apartment(info) => {
            apartment_details::ActiveModel {
                listing_id: Set(listing_id),
                room_type: Set(info.room_type),
                apartment_type: Set(info.apartment_type),
                ..Default::default()
            }
            .insert(txn)
            .await?;
        }
        ListingDetails::House(info) => {
            house_details::ActiveModel {
                listing_id: Set(listing_id),
                num_bathrooms: Set(info.num_bathrooms),
                num_rooms: Set(info.num_rooms),
                ..Default::default()
            }
            .insert(txn)
            .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn inverted_price_range_rejected() {
        let filters = ListingFilters {
            min_price: Some(900.0),
            max_price: Some(500.0),
            ..Default::default()
        };
        assert!(matches!(filters.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn open_ended_filters_accepted() {
        let filters = ListingFilters {
            max_price: Some(1000.0),
            location: Some(Location::Midtown),
            ..Default::default()
        };
        assert!(filters.validate().is_ok());
        assert!(ListingFilters::default().validate().is_ok());
    }

    #[test]
    fn negative_price_rejected() {
        let filters = ListingFilters {
            min_price: Some(-1.0),
            ..Default::default()
        };
        assert!(filters.validate().is_err());
    }

    #[test]
    fn details_must_match_property_type() {
        let house = ListingDetails::House(HouseInfo {
            num_bathrooms: 1.5,
            num_rooms: 3,
        });
        let err = check_shape(
            PropertyType::Apartment,
            Some(&house),
            1,
            3,
            date(2025, 5, 1),
            date(2025, 8, 1),
        );
        assert!(matches!(err, Err(AppError::Validation(_))));
        assert!(check_shape(
            PropertyType::House,
            Some(&house),
            1,
            3,
            date(2025, 5, 1),
            date(2025, 8, 1),
        )
        .is_ok());
    }

    #[test]
    fn dates_and_rooms_checked() {
        assert!(check_shape(
            PropertyType::House,
            None,
            4,
            3,
            date(2025, 5, 1),
            date(2025, 8, 1)
        )
        .is_err());
        assert!(check_shape(
            PropertyType::House,
            None,
            1,
            3,
            date(2025, 8, 1),
            date(2025, 5, 1)
        )
        .is_err());
    }

    #[test]
    fn details_wire_shape() {
        let details = ListingDetails::Apartment(ApartmentInfo {
            room_type: RoomType::Single,
            apartment_type: ApartmentType::FourByFour,
        });
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["kind"], "apartment");
        assert_eq!(json["room_type"], "SINGLE");
        assert_eq!(json["apartment_type"], "FourByFour");
    }

    #[test]
    fn empty_patch_detected() {
        assert!(ListingPatch::default().is_empty());
        let patch = ListingPatch {
            price: Some(800.0),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
