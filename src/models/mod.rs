pub mod apartment_details;
pub mod email_verification;
pub mod enums;
pub mod house_details;
pub mod listing;
pub mod saved;
pub mod user;

pub use apartment_details::{Entity as ApartmentDetails, Model as ApartmentDetailsModel};
pub use email_verification::{Entity as EmailVerification, Model as EmailVerificationModel};
pub use enums::{ApartmentType, Location, PropertyType, RoomType};
pub use house_details::{Entity as HouseDetails, Model as HouseDetailsModel};
pub use listing::{Entity as Listing, Model as ListingModel};
pub use saved::{Entity as Saved, Model as SavedModel};
pub use user::{Entity as User, Model as UserModel};
