pub mod libraries;
pub mod media_files;
pub mod movies;
pub mod reconcile;
pub mod series;
pub mod tracks;
