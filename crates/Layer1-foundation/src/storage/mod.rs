//! Storage module for Prana
//!
//! - `json`: JSON - 설정/선언 파일 저장 및 로드 (JSONC 허용)

mod json;

pub use json::{parse_jsonc, strip_json_comments, JsonStore, PROJECT_DIR};
