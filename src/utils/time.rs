use time::OffsetDateTime;
use time::macros::format_description;

use crate::error::{Error, Result};

/// Format a timestamp as `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(datetime: OffsetDateTime) -> Result<String> {
    datetime
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .map_err(|e| Error::encoding(format!("failed to format timestamp: {e}"), Some(Box::new(e))))
}

/// The current wall-clock time, in the local offset when it can be determined.
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}
