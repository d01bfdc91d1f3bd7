/*!
 * Markers
 *
 * Sequence-numbered lock markers and the ordered set tracking which of them
 * currently exist in the namespace.
 */

mod id;
mod set;

pub use id::MarkerId;
pub use set::MarkerSet;
