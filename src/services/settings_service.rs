use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    dto::settings::{
        AppearancePatch, CreateSliderRequest, PatchSettingsRequest, SliderList,
        UpdateSliderRequest,
    },
    entity::{
        category_sliders::{ActiveModel as SliderActive, Column as SliderCol, Entity as CategorySliders},
        store_settings::{ActiveModel as SettingsActive, Entity as StoreSettingsEntity},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Appearance, CarouselSlide, CategorySlider, NavMenu, StoreSettings},
    response::{ApiResponse, Meta},
    services::store_service::{ensure_store_owner, find_active_by_slug},
    state::AppState,
};

pub const MAX_NAVBAR_MENUS: usize = 12;

pub async fn get_settings(state: &AppState, slug: &str) -> AppResult<ApiResponse<StoreSettings>> {
    let store = find_active_by_slug(state, slug).await?;
    let settings = load_settings(state, store.id).await?;
    Ok(ApiResponse::success("Settings", settings, None))
}

async fn load_settings(state: &AppState, store_id: Uuid) -> AppResult<StoreSettings> {
    let settings = StoreSettingsEntity::find_by_id(store_id)
        .one(&state.orm)
        .await?
        .map(StoreSettings::from)
        .unwrap_or_else(|| StoreSettings {
            store_id,
            navbar_menus: Vec::new(),
            carousel_slides: Vec::new(),
            appearance: Appearance::default(),
            updated_at: Utc::now(),
        });
    Ok(settings)
}

pub async fn patch_settings(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    payload: PatchSettingsRequest,
) -> AppResult<ApiResponse<StoreSettings>> {
    ensure_store_owner(state, user, store_id).await?;

    let current = load_settings(state, store_id).await?;
    let PatchSettingsRequest {
        navbar_menus,
        carousel_slides,
        appearance,
    } = payload;

    if let Some(menus) = &navbar_menus {
        validate_menus(menus)?;
    }
    if let Some(slides) = &carousel_slides {
        validate_slides(slides)?;
    }
    let changed: Vec<&str> = [
        navbar_menus.as_ref().map(|_| "navbar_menus"),
        carousel_slides.as_ref().map(|_| "carousel_slides"),
        appearance.as_ref().map(|_| "appearance"),
    ]
    .into_iter()
    .flatten()
    .collect();

    let navbar_menus = navbar_menus.unwrap_or(current.navbar_menus);
    let carousel_slides = carousel_slides.unwrap_or(current.carousel_slides);
    let appearance = match appearance {
        Some(patch) => merge_appearance(current.appearance, patch)?,
        None => current.appearance,
    };

    let exists = StoreSettingsEntity::find_by_id(store_id)
        .one(&state.orm)
        .await?
        .is_some();
    let active = SettingsActive {
        store_id: Set(store_id),
        navbar_menus: Set(to_json(&navbar_menus)?),
        carousel_slides: Set(to_json(&carousel_slides)?),
        appearance: Set(to_json(&appearance)?),
        updated_at: Set(Utc::now().into()),
    };
    let saved = if exists {
        active.update(&state.orm).await?
    } else {
        active.insert(&state.orm).await?
    };

    audit::record(
        &state.pool,
        Some(user.user_id),
        "settings_update",
        "store_settings",
        serde_json::json!({ "store_id": store_id, "sections": changed }),
    )
    .await;

    Ok(ApiResponse::success(
        "Settings updated",
        StoreSettings::from(saved),
        None,
    ))
}

fn to_json<T: serde::Serialize>(value: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| AppError::Internal(e.into()))
}

pub fn validate_menus(menus: &[NavMenu]) -> AppResult<()> {
    if menus.len() > MAX_NAVBAR_MENUS {
        return Err(AppError::BadRequest(format!(
            "At most {MAX_NAVBAR_MENUS} navbar menus are allowed"
        )));
    }
    let blank_label = menus.iter().any(|menu| {
        menu.label.trim().is_empty() || menu.children.iter().any(|c| c.label.trim().is_empty())
    });
    if blank_label {
        return Err(AppError::BadRequest("Menu labels must not be empty".into()));
    }
    Ok(())
}

fn validate_slides(slides: &[CarouselSlide]) -> AppResult<()> {
    if slides.iter().any(|s| s.image_url.trim().is_empty()) {
        return Err(AppError::BadRequest(
            "Carousel slides need an image_url".into(),
        ));
    }
    Ok(())
}

pub fn merge_appearance(mut current: Appearance, patch: AppearancePatch) -> AppResult<Appearance> {
    if let Some(v) = patch.show_search {
        current.show_search = v;
    }
    if let Some(v) = patch.show_wishlist {
        current.show_wishlist = v;
    }
    if let Some(v) = patch.show_category_sliders {
        current.show_category_sliders = v;
    }
    if let Some(v) = patch.show_carousel {
        current.show_carousel = v;
    }
    if let Some(v) = patch.show_chat_assistant {
        current.show_chat_assistant = v;
    }
    if let Some(v) = patch.dark_mode {
        current.dark_mode = v;
    }
    if let Some(color) = patch.primary_color {
        let color = color.trim().to_ascii_lowercase();
        if !is_hex_color(&color) {
            return Err(AppError::BadRequest(
                "primary_color must look like #rrggbb".into(),
            ));
        }
        current.primary_color = color;
    }
    Ok(current)
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].bytes().all(|b| b.is_ascii_hexdigit())
}

pub async fn list_sliders(state: &AppState, slug: &str) -> AppResult<ApiResponse<SliderList>> {
    let store = find_active_by_slug(state, slug).await?;
    let items: Vec<CategorySlider> = CategorySliders::find()
        .filter(SliderCol::StoreId.eq(store.id))
        .filter(SliderCol::IsActive.eq(true))
        .order_by_asc(SliderCol::Position)
        .order_by_asc(SliderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(CategorySlider::from)
        .collect();
    Ok(ApiResponse::success(
        "Sliders",
        SliderList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_slider(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    payload: CreateSliderRequest,
) -> AppResult<ApiResponse<CategorySlider>> {
    ensure_store_owner(state, user, store_id).await?;
    let title = required(&payload.title, "title")?;
    let category = required(&payload.category, "category")?;
    let position = match payload.position {
        Some(p) if p < 0 => {
            return Err(AppError::BadRequest("position must be >= 0".into()));
        }
        Some(p) => p,
        None => next_position(state, store_id).await?,
    };

    let slider = SliderActive {
        id: Set(Uuid::new_v4()),
        store_id: Set(store_id),
        title: Set(title),
        category: Set(category),
        image_url: Set(payload.image_url),
        link_url: Set(payload.link_url),
        position: Set(position),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "slider_create",
        "category_sliders",
        serde_json::json!({ "store_id": store_id, "slider_id": slider.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Slider created",
        CategorySlider::from(slider),
        None,
    ))
}

async fn next_position(state: &AppState, store_id: Uuid) -> AppResult<i32> {
    let last = CategorySliders::find()
        .filter(SliderCol::StoreId.eq(store_id))
        .order_by_desc(SliderCol::Position)
        .limit(1)
        .one(&state.orm)
        .await?;
    Ok(last.map(|s| s.position + 1).unwrap_or(0))
}

pub async fn update_slider(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    id: Uuid,
    payload: UpdateSliderRequest,
) -> AppResult<ApiResponse<CategorySlider>> {
    ensure_store_owner(state, user, store_id).await?;
    let slider = find_slider(state, store_id, id).await?;

    let mut active: SliderActive = slider.into();
    if let Some(title) = payload.title {
        active.title = Set(required(&title, "title")?);
    }
    if let Some(category) = payload.category {
        active.category = Set(required(&category, "category")?);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    if let Some(link_url) = payload.link_url {
        active.link_url = Set(Some(link_url));
    }
    if let Some(position) = payload.position {
        if position < 0 {
            return Err(AppError::BadRequest("position must be >= 0".into()));
        }
        active.position = Set(position);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());
    let slider = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "slider_update",
        "category_sliders",
        serde_json::json!({ "store_id": store_id, "slider_id": slider.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Slider updated",
        CategorySlider::from(slider),
        None,
    ))
}

pub async fn delete_slider(
    state: &AppState,
    user: &AuthUser,
    store_id: Uuid,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_store_owner(state, user, store_id).await?;
    let result = CategorySliders::delete_many()
        .filter(SliderCol::Id.eq(id))
        .filter(SliderCol::StoreId.eq(store_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "slider_delete",
        "category_sliders",
        serde_json::json!({ "store_id": store_id, "slider_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Slider deleted",
        serde_json::json!({ "id": id }),
        None,
    ))
}

async fn find_slider(
    state: &AppState,
    store_id: Uuid,
    id: Uuid,
) -> AppResult<crate::entity::category_sliders::Model> {
    CategorySliders::find_by_id(id)
        .filter(SliderCol::StoreId.eq(store_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

fn required(value: &str, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NavLink;

    fn menu(label: &str) -> NavMenu {
        NavMenu {
            label: label.into(),
            href: "/".into(),
            children: vec![],
        }
    }

    #[test]
    fn rejects_too_many_or_blank_menus() {
        let menus: Vec<NavMenu> = (0..13).map(|i| menu(&format!("m{i}"))).collect();
        assert!(validate_menus(&menus).is_err());
        assert!(validate_menus(&menus[..12]).is_ok());

        assert!(validate_menus(&[menu("  ")]).is_err());
        let mut parent = menu("Shop");
        parent.children.push(NavLink {
            label: "".into(),
            href: "/x".into(),
        });
        assert!(validate_menus(&[parent]).is_err());
    }

    #[test]
    fn appearance_merges_only_given_fields() {
        let merged = merge_appearance(
            Appearance::default(),
            AppearancePatch {
                dark_mode: Some(true),
                primary_color: Some("#A1B2C3".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(merged.dark_mode);
        assert!(merged.show_search);
        assert_eq!(merged.primary_color, "#a1b2c3");
    }

    #[test]
    fn rejects_bad_colors() {
        for color in ["red", "#12345", "#12345g", "123456"] {
            let patch = AppearancePatch {
                primary_color: Some(color.into()),
                ..Default::default()
            };
            assert!(merge_appearance(Appearance::default(), patch).is_err(), "{color}");
        }
    }
}
