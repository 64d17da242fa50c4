use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use bson::oid::ObjectId;

use crate::error::ApiError;

/// The single `{..._id}` segment of the matched route, parsed as an ObjectId.
#[derive(Debug, Clone, Copy)]
pub struct PathId(pub ObjectId);

impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::BadRequest("Missing path parameter".to_string()))?;

        let id = ObjectId::parse_str(&raw)
            .map_err(|_| ApiError::BadRequest(format!("Invalid id: {raw}")))?;

        Ok(PathId(id))
    }
}
