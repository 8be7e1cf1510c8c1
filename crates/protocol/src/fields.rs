//! Field-ownership rules shared by the model and the wire layer.

/// Fields a user-facing edit or an inbound payload must never set.
///
/// `startPos`/`endPos` are derived from segment order, `color` comes from the
/// catalog, and `id`/`name`/`status` are assigned by the model. The names are
/// the wire spellings used by the simulation service and import payloads.
pub const RESERVED_FIELDS: [&str; 6] = ["color", "startPos", "endPos", "name", "id", "status"];

/// Whether `field` is system- or catalog-owned.
pub fn is_reserved(field: &str) -> bool {
    RESERVED_FIELDS.contains(&field)
}
