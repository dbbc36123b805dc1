pub mod animation;
pub mod basemap;
pub mod bind;
pub mod dates;
pub mod geo;
pub mod models;
pub mod projection;
