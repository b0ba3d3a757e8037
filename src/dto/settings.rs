use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{CarouselSlide, CategorySlider, NavMenu};

/// Partial update of a store's storefront settings. Omitted sections are kept.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PatchSettingsRequest {
    pub navbar_menus: Option<Vec<NavMenu>>,
    pub carousel_slides: Option<Vec<CarouselSlide>>,
    pub appearance: Option<AppearancePatch>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AppearancePatch {
    pub show_search: Option<bool>,
    pub show_wishlist: Option<bool>,
    pub show_category_sliders: Option<bool>,
    pub show_carousel: Option<bool>,
    pub show_chat_assistant: Option<bool>,
    pub dark_mode: Option<bool>,
    pub primary_color: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSliderRequest {
    pub title: String,
    pub category: String,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub position: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSliderRequest {
    pub title: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub position: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SliderList {
    pub items: Vec<CategorySlider>,
}
