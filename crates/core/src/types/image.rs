//! Product image reference.

use serde::{Deserialize, Serialize};

use super::ProductImageId;

/// An image attached to a product. At most one image per product is primary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct ProductImage {
    pub id: ProductImageId,
    pub image_url: String,
    pub is_primary: bool,
}

impl ProductImage {
    /// Pick the primary image, falling back to the first one.
    #[must_use]
    pub fn primary(images: &[Self]) -> Option<&Self> {
        images.iter().find(|i| i.is_primary).or_else(|| images.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: i32, is_primary: bool) -> ProductImage {
        ProductImage {
            id: ProductImageId::new(id),
            image_url: format!("/uploads/{id}.png"),
            is_primary,
        }
    }

    #[test]
    fn test_primary_prefers_flagged_image() {
        let images = vec![image(1, false), image(2, true)];
        assert_eq!(ProductImage::primary(&images).map(|i| i.id.as_i32()), Some(2));
    }

    #[test]
    fn test_primary_falls_back_to_first() {
        let images = vec![image(5, false), image(6, false)];
        assert_eq!(ProductImage::primary(&images).map(|i| i.id.as_i32()), Some(5));
        assert!(ProductImage::primary(&[]).is_none());
    }
}
