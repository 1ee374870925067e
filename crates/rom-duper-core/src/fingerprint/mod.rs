pub mod normalize;
pub mod shingle;

pub use normalize::normalize;
pub use shingle::ShingleProfile;
