pub mod analysis;
pub mod exit;
pub mod input;
pub mod normalize;
pub mod projection;
pub mod returns;
pub mod year_one;
