//! Repository implementations.
//!
//! Every operation that mutates more than one row runs as a single
//! transaction here; the API layer never composes partial writes.

pub mod circle;
pub mod invitation;
pub mod membership;
pub mod rating;
pub mod ride;
pub mod user;

pub use circle::CircleRepository;
pub use invitation::InvitationRepository;
pub use membership::MembershipRepository;
pub use rating::RatingRepository;
pub use ride::RideRepository;
pub use user::UserRepository;
