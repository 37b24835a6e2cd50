use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum PropertyType {
    #[sea_orm(string_value = "APARTMENT")]
    Apartment,
    #[sea_orm(string_value = "HOUSE")]
    House,
}

/// Named areas a listing can be in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum Location {
    #[sea_orm(string_value = "Midtown")]
    Midtown,
    #[sea_orm(string_value = "WestMidtown")]
    WestMidtown,
    #[sea_orm(string_value = "HomePark")]
    HomePark,
    #[sea_orm(string_value = "NorthAvenue")]
    NorthAvenue,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum RoomType {
    #[sea_orm(string_value = "SINGLE")]
    Single,
    #[sea_orm(string_value = "DOUBLE")]
    Double,
}

/// Floor plan as bedrooms-by-bathrooms.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ApartmentType {
    #[sea_orm(string_value = "SixBySix")]
    SixBySix,
    #[sea_orm(string_value = "FiveByFive")]
    FiveByFive,
    #[sea_orm(string_value = "FourByFour")]
    FourByFour,
    #[sea_orm(string_value = "ThreeByThree")]
    ThreeByThree,
    #[sea_orm(string_value = "TwoByTwo")]
    TwoByTwo,
    #[sea_orm(string_value = "Studio")]
    Studio,
    #[sea_orm(string_value = "FiveByThree")]
    FiveByThree,
    #[sea_orm(string_value = "FiveByFour")]
    FiveByFour,
}
