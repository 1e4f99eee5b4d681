//! Toolbar palette handler.

use axum::extract::Path;
use axum::Json;

use archboard_core::palette;

use crate::error::ApiError;
use crate::handlers::parse_kind;
use crate::schema::palette::{PaletteResponse, PaletteSection};

/// Node kinds offered for a diagram kind, grouped by family, with their
/// renderer styles.
///
/// `GET /palette/{kind}`
pub async fn get_palette(Path(kind): Path<String>) -> Result<Json<PaletteResponse>, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(Json(PaletteResponse {
        kind,
        sections: palette(kind).iter().map(PaletteSection::from).collect(),
    }))
}
