// Shared constants for the RÚV URL scheme and the on-disk formats

/// Date format used in probe URLs and in the ledger
pub const DATE_FORMAT: &str = "%Y/%m/%d";
pub const DATE_FORMATS: &[&str] = &[DATE_FORMAT, "%Y-%m-%d"];

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATETIME_FORMATS: &[&str] = &[DATETIME_FORMAT, "%Y-%m-%dT%H:%M:%S"];

/// Length of the leading `YYYY/MM/DD` part of a stream token
pub const DATE_PART_LENGTH: usize = 4 + 1 + 2 + 1 + 2;

pub const URL_HOST: &str = "http://smooth.ruv.cache.is";
pub const OPEN_ACCESS: &str = "opid";
pub const RESTRICTED_ACCESS: &str = "lokad";
pub const BITRATE: &str = "2400kbps";
pub const MEDIA_EXTENSION: &str = "mp4";

pub const API_BASE: &str = "https://api.ruv.is/api/programs";

pub const PROGRAM_INFO_FN: &str = "program_info.json";
pub const PROGRAM_KEY: &str = "program";
pub const VERSION_KEY: &str = "__version__";

// Bump CACHE_VERSION whenever the cache layout changes; old caches are dropped.
pub const CACHE_VERSION_KEY: &str = "__cache_version__";
pub const CACHE_VERSION: &str = "1";

/// Filename delimiters splitting `<episode id><delimiter><remainder>`, tried in order
pub const FILENAME_DELIMITERS: &[char] = &['A', 'T', 'S', 'U'];

/// Entries closer than this many days belong to the same season
pub const SEASON_GAP_DAYS: i64 = 10;

/// Build the probe URL for a date/filename pair
pub fn probe_url(date_str: &str, filename: &str, prefer_open: bool) -> String {
    let access = if prefer_open {
        OPEN_ACCESS
    } else {
        RESTRICTED_ACCESS
    };
    format!(
        "{}/{}/{}/{}/{}.{}",
        URL_HOST, access, date_str, BITRATE, filename, MEDIA_EXTENSION
    )
}
