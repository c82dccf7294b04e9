/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Timestamp formatting for signing.

use crate::error::SigningError;
use std::time::SystemTime;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

/// `YYYYMMDDThhmmssZ`
const DATE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[year][month][day]T[hour][minute][second]Z");

/// `YYYYMMDD`
const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year][month][day]");

pub(crate) fn format_date_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&DATE_TIME_FORMAT)
        .expect("formatting a timestamp into a string cannot fail")
}

pub(crate) fn format_date(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&DATE_FORMAT)
        .expect("formatting a date into a string cannot fail")
}

/// Formats `time` with a caller-supplied format description.
///
/// The rendered string is passed through unvalidated, matching the behavior
/// services see from other SigV4 implementations.
pub(crate) fn format_with(time: SystemTime, pattern: &str) -> Result<String, SigningError> {
    let format = time::format_description::parse(pattern)
        .map_err(SigningError::invalid_time_format)?;
    OffsetDateTime::from(time)
        .format(&format)
        .map_err(SigningError::time_formatting)
}

#[cfg(test)]
pub(crate) mod test_parsers {
    use std::time::SystemTime;
    use time::format_description::FormatItem;
    use time::macros::format_description;
    use time::PrimitiveDateTime;

    const DATE_TIME_PARSE_FORMAT: &[FormatItem<'static>] =
        format_description!("[year][month][day]T[hour][minute][second]Z");

    pub(crate) fn parse_date_time(date_time: &str) -> SystemTime {
        let parsed = PrimitiveDateTime::parse(date_time, &DATE_TIME_PARSE_FORMAT)
            .expect("test timestamps are well-formed")
            .assume_utc();
        parsed.into()
    }
}
