//! Entity definitions (database row mappings).

pub mod circle;
pub mod invitation;
pub mod membership;
pub mod rating;
pub mod ride;
pub mod user;

pub use circle::{CircleEntity, CircleWithCountEntity};
pub use invitation::InvitationEntity;
pub use membership::{MemberWithUserEntity, MembershipEntity};
pub use rating::RatingEntity;
pub use ride::{RideEntity, RideWithOwnerEntity};
pub use user::{UserAuthEntity, UserPublicEntity, UserWithProfileEntity};
