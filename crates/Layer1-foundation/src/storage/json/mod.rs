mod comments;
mod store;

pub use comments::{parse_jsonc, strip_json_comments};
pub use store::{JsonStore, PROJECT_DIR};
