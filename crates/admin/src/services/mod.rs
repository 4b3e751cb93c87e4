//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Password login restricted to admin accounts
//! - `iconscout` - IconScout icon search
//! - `stable_diffusion` - Product image generation
//! - `uploads` - Product image files on disk

pub mod auth;
pub mod iconscout;
pub mod stable_diffusion;
pub mod uploads;

pub use auth::{AdminAuthError, AdminAuthService};
pub use iconscout::{IconScoutClient, IconScoutError};
pub use stable_diffusion::{GeneratedImage, StableDiffusionClient, StableDiffusionError};
pub use uploads::{ImageUpload, remove_images, store_images};
