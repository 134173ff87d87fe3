//! Defaults shared by the CLI, the config file loader and the exporter.

/// Number of document ids covered by one `searchDocuments` request.
pub const SEARCH_WINDOW_SIZE: u64 = 50;

/// Default hostname of the ecoDMS server.
pub const DEFAULT_HOST: &str = "ecodms";

/// Default port of the ecoDMS REST API.
pub const DEFAULT_PORT: u16 = 8180;

/// Default archive id. A stock ecoDMS installation has exactly one archive.
pub const DEFAULT_ARCHIVE_ID: u32 = 1;

/// Default template for exported file names (relative to the export root).
pub const DEFAULT_NAME_TEMPLATE: &str = "{year}/{folder}/{docart}/{cdate}_{docid}_{bemerkung}";

/// Display name for folder/type id `0`, which ecoDMS uses for unclassified documents.
pub const NOT_ASSIGNED: &str = "not_assigned";

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP idle-read timeout (5 minutes without a single byte).
pub const READ_TIMEOUT_SECS: u64 = 300;
