//! Converting coordinate text.

use crate::config::Direction;
use crate::geo::GeoPoint;
use crate::import;
use crate::projection::LocalProjection;


/// Converts coordinate text in one direction.
///
/// The text is parsed into sequences, every point converted, and the
/// sequences written back in the same format.
pub fn convert_text(
    text: &str, origin: GeoPoint, direction: Direction,
) -> Result<String, import::Error> {
    let projection = LocalProjection::spherical(origin);
    Ok(match direction {
        Direction::ToLocal => {
            let sets: Vec<_> = import::parse_global_sets(text)?.into_iter()
                .map(|set| {
                    set.into_iter().map(|p| projection.to_local(p)).collect()
                }).collect();
            import::format_sets(&sets)
        }
        Direction::ToGlobal => {
            let sets: Vec<_> = import::parse_local_sets(text)?.into_iter()
                .map(|set| {
                    set.into_iter().map(|p| projection.to_global(p)).collect()
                }).collect();
            import::format_sets(&sets)
        }
    })
}


//============ Tests =========================================================
