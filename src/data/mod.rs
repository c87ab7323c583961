pub mod loader;
pub mod stats;
pub mod unit;
pub mod validate;

pub use loader::{
    combine_documents, load_unit, load_unit_document, normalize_lookup, resolve_unit_path,
    write_unit_document, DEFAULT_LIBRARY_DIR,
};
pub use unit::{ModelGroup, Unit, UnitDocument, WeaponCategory, WeaponProfile};
pub use validate::{validate_unit_document, ValidationReport, ValidationSeverity};
