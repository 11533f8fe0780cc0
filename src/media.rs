use crate::error::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

pub const FILENAME_FORMAT: &str = "%Y-%m-%d-%H-%M-%S-%3f";
pub const PHOTO_EXTENSION: &str = ".jpg";
pub const VIDEO_EXTENSION: &str = ".mp4";

/// Extensions (upper case, no dot) shown as gallery thumbnails
pub const EXTENSION_WHITELIST: [&str; 2] = ["JPG", "MP4"];

/// Resolve configured timezone, falling back to UTC on parse errors
pub fn resolve_timezone(tz_name: &str) -> Tz {
    match tz_name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            warn!("Invalid timezone '{}', falling back to UTC", tz_name);
            chrono_tz::UTC
        }
    }
}

/// Timestamped file name such as `2024-05-01-13-45-10-123.mp4`
pub fn file_name(at: DateTime<Utc>, timezone: &Tz, extension: &str) -> String {
    format!(
        "{}{}",
        at.with_timezone(timezone).format(FILENAME_FORMAT),
        extension
    )
}

/// Path for a new capture in `base` stamped with the current time
pub fn create_file(base: &Path, timezone: &Tz, extension: &str) -> PathBuf {
    base.join(file_name(Utc::now(), timezone, extension))
}

fn is_whitelisted(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_uppercase();
            EXTENSION_WHITELIST.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Most recent whitelisted media file in `dir`, by path order.
///
/// File names are timestamps, so the greatest path is the newest capture.
/// A missing directory has no media.
pub async fn latest_media(dir: &Path) -> Result<Option<PathBuf>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Media directory {} does not exist yet", dir.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let mut latest: Option<PathBuf> = None;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file() || !is_whitelisted(&path) {
            continue;
        }
        if latest.as_ref().map_or(true, |current| path > *current) {
            latest = Some(path);
        }
    }

    Ok(latest)
}

/// Whether `dir` contains any entry at all
pub async fn has_entries(dir: &Path) -> Result<bool> {
    match fs::read_dir(dir).await {
        Ok(mut entries) => Ok(entries.next_entry().await?.is_some()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_name_format() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 13, 45, 10).unwrap()
            + chrono::Duration::milliseconds(123);
        assert_eq!(
            file_name(at, &chrono_tz::UTC, VIDEO_EXTENSION),
            "2024-05-01-13-45-10-123.mp4"
        );
        assert_eq!(
            file_name(at, &chrono_tz::Europe::Berlin, PHOTO_EXTENSION),
            "2024-05-01-15-45-10-123.jpg"
        );
    }

    #[test]
    fn test_resolve_timezone_fallback() {
        assert_eq!(resolve_timezone("Not/AZone"), chrono_tz::UTC);
        assert_eq!(resolve_timezone("Asia/Tokyo"), chrono_tz::Asia::Tokyo);
    }

    #[test]
    fn test_create_file_in_base() {
        let path = create_file(Path::new("/tmp/videos"), &chrono_tz::UTC, VIDEO_EXTENSION);
        assert!(path.starts_with("/tmp/videos"));
        assert_eq!(path.extension().unwrap(), "mp4");
    }

    #[tokio::test]
    async fn test_latest_media_picks_greatest_whitelisted() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "2024-01-01-00-00-00-000.mp4",
            "2024-03-01-00-00-00-000.JPG",
            "2024-02-01-00-00-00-000.mp4",
            "2025-01-01-00-00-00-000.txt",
        ] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("2026.mp4")).unwrap();

        let latest = latest_media(dir.path()).await.unwrap().unwrap();
        assert_eq!(latest, dir.path().join("2024-03-01-00-00-00-000.JPG"));
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(latest_media(&missing).await.unwrap().is_none());
        assert!(!has_entries(&missing).await.unwrap());
    }

    #[tokio::test]
    async fn test_has_entries() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!has_entries(dir.path()).await.unwrap());
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        assert!(has_entries(dir.path()).await.unwrap());
    }
}
