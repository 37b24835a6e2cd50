use super::enums::{Location, PropertyType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "listings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub address: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub property_type: PropertyType,
    pub location: Location,
    pub distance_in_miles: f64,
    pub price: f64,
    pub rooms_available: i32,
    pub total_rooms: i32,
    pub roommates: i32,
    pub utilities_included: bool,
    pub sqft: i32,
    pub image_urls: Vec<String>,
    #[schema(value_type = String, format = Date)]
    pub start_date: Date,
    #[schema(value_type = String, format = Date)]
    pub end_date: Date,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub lister_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ListerId",
        to = "super::user::Column::Id"
    )]
    Lister,
    #[sea_orm(has_one = "super::apartment_details::Entity")]
    ApartmentDetails,
    #[sea_orm(has_one = "super::house_details::Entity")]
    HouseDetails,
    #[sea_orm(has_many = "super::saved::Entity")]
    Saved,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lister.def()
    }
}

impl Related<super::apartment_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApartmentDetails.def()
    }
}

impl Related<super::house_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HouseDetails.def()
    }
}

impl Related<super::saved::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Saved.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
