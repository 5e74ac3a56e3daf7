// ==========================================
// Asset inventory - import layer
// ==========================================
// Reference lists and count files (CSV, Excel) -> persisted rows
// ==========================================

pub mod count_importer;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod importer_trait;
pub mod reference_source;
pub mod templates;

pub use count_importer::{CountImporter, ImportOutcome, ImportRequest, ImportSource};
pub use error::{ImportError, ImportResult};
pub use field_mapper::{coerce_quantity, FieldMapper, MappingContext};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use importer_trait::{FileParser, ReferenceDataSource};
pub use reference_source::{FileReferenceSource, StaticReferenceSource};
pub use templates::create_default_templates;
