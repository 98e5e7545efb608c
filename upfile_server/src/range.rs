/// A resolved inclusive byte range against a file of known size.
///
/// Resolution clamps to the file where possible; satisfiability (416) is
/// judged by the caller against the file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRequest {
    pub start: u64,
    pub end: u64,
}

/// Interprets a `Range` header value against a file of `size` bytes.
///
/// Returns `None` when no range was requested. Only the `bytes` unit and a
/// single range are understood; anything else resolves as if its bounds were
/// absent rather than being rejected.
pub fn resolve_range(header: Option<&str>, size: u64) -> Option<RangeRequest> {
    let header = header?.trim();
    if header.is_empty() {
        return None;
    }

    let last = size.saturating_sub(1);
    let range = match parse_bounds(header) {
        (Some(start), Some(end)) => RangeRequest { start, end },
        (Some(start), None) => RangeRequest { start, end: last },
        // Suffix form: the final `end` bytes of the file.
        (None, Some(end)) => RangeRequest {
            start: size.saturating_sub(end),
            end: last,
        },
        (None, None) => RangeRequest { start: 0, end: last },
    };
    Some(range)
}

fn parse_bounds(header: &str) -> (Option<u64>, Option<u64>) {
    let Some(spec) = header.strip_prefix("bytes=") else {
        return (None, None);
    };
    let Some((start, end)) = spec.split_once('-') else {
        return (None, None);
    };
    (start.trim().parse().ok(), end.trim().parse().ok())
}
