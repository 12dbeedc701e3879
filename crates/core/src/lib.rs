mod apply;
mod config;
mod destination;
mod digest;
mod discovery;
mod duplicates;
mod error;
mod exif_reader;
mod exiftool_reader;
mod metadata;
mod model;
mod planner;
mod tables;
mod timestamp;

pub use apply::{apply_plan, organize, ApplyResult, OrganizeReport};
pub use config::{
    app_paths, load_config, load_config_from, save_config, save_config_to, AppConfig, AppPaths,
    DEFAULT_ZERO_PAD,
};
pub use destination::{build_destination, Destination, Layout, Naming};
pub use digest::{content_digest, files_identical, size_of, DIGEST_LEN};
pub use discovery::discover_files;
pub use duplicates::{find_duplicates, group_by_size, DuplicatePair};
pub use error::OrganizeError;
pub use exif_reader::ExifReader;
pub use exiftool_reader::{parse_exiftool_json, ExiftoolReader};
pub use metadata::{FileRecord, MetadataReader, ReaderKind, StaticMetadataReader, TagMap};
pub use model::{normalize_label, resolve_model};
pub use planner::{
    generate_plan, OrganizeOptions, OrganizePlan, OrganizeStats, PlannedMove, SkipReason,
    SkippedFile,
};
pub use tables::{LookupTables, TableOverrides, FILE_MODIFY_DATE_TAG, FILE_TYPE_TAG, MODEL_TAG};
pub use timestamp::{
    parse_filename_timestamp, parse_tag_timestamp, resolve_timestamp, TimestampFallbacks,
};
