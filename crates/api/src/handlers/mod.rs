pub mod ask_ai;
pub mod corrections;
pub mod health;
pub mod rules;
pub mod search;
pub mod tables;

use alchemist_domain::EntityKind;

use crate::error::{ApiError, ApiResult};

/// 路径中的实体名，接受单复数和大小写变体
pub(crate) fn parse_entity(entity: &str) -> ApiResult<EntityKind> {
    entity
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("未知的实体种类: {entity}")))
}
