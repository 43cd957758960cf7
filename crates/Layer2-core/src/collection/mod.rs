//! Collection - 카테고리별 아이템 수집
//!
//! 카테고리 수집 결과는 [`CollectionCache`]에 기억되고 명시적으로 무효화될 때까지
//! 재사용된다.

mod cache;
mod category;
pub(crate) mod collector;
mod source;

pub use cache::CollectionCache;
pub use category::{
    validate_category_name, Category, CategoryRegistry, ItemProcessor, DEFAULT_KEY_PROPERTY,
};
pub use source::{ItemSource, JsonItemSource, StaticItemSource};
