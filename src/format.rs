/// Render an elapsed recording time as `HH:MM:SS`.
///
/// The minutes field is the total elapsed seconds divided by 60 and is not
/// reduced modulo 60, so `3661` renders as `01:61:01`. Fields below 10 are
/// zero-padded to two digits; larger values keep their natural width.
pub fn format_seconds(seconds: u64) -> String {
    format!(
        "{}:{}:{}",
        two_digits(seconds / 3600),
        two_digits(seconds / 60),
        two_digits(seconds % 60)
    )
}

fn two_digits(value: u64) -> String {
    format!("{:02}", value)
}
