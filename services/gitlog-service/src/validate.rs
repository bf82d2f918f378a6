//! Field checks for incoming log entries.
//!
//! The username is an identity field and rejects the request when malformed.
//! Commit, repo and location are provenance fields: anything that does not
//! parse becomes null instead of failing the write.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::ServiceError;
use crate::models::{Coordinates, LogRequest, NewLogEntry};

pub const MAX_USERNAME_LEN: usize = 39;

// Alphanumerics separated by single hyphens, never at either end.
static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9]+(?:-[A-Za-z0-9]+)*$")
        .expect("hard-coded regular expression to be valid")
});
static COMMIT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([a-f0-9]{40})\b").expect("hard-coded regular expression to be valid")
});
static REPO_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:git|ssh|https?|git@[-\w.]+):(//)?(.*?)(\.git)(/?|#[-\d\w._]+?)$")
        .expect("hard-coded regular expression to be valid")
});

pub fn parse_username(value: &Value) -> Result<String, ServiceError> {
    match value.as_str() {
        Some(name) if name.len() <= MAX_USERNAME_LEN && USERNAME_REGEX.is_match(name) => {
            Ok(name.to_string())
        }
        _ => Err(ServiceError::InvalidIdentifier),
    }
}

/// Returns the first whole-word 40 digit hex SHA-1 found in `value`.
pub fn parse_commit(value: &Value) -> Option<String> {
    let text = value.as_str()?;
    COMMIT_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|sha| sha.as_str().to_string())
}

pub fn parse_repo(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|url| REPO_REGEX.is_match(url))
        .map(str::to_string)
}

/// `[lon, lat]` with both components finite, or nothing at all.
pub fn parse_location(value: &Value) -> Option<Coordinates> {
    let [lon, lat] = value.as_array()?.as_slice() else {
        return None;
    };
    let lon = lon.as_f64().filter(|lon| lon.is_finite())?;
    let lat = lat.as_f64().filter(|lat| lat.is_finite())?;
    Some(Coordinates { lon, lat })
}

pub fn normalize(request: &LogRequest) -> Result<NewLogEntry, ServiceError> {
    let username = parse_username(&request.name)?;
    Ok(NewLogEntry {
        username,
        commit: parse_commit(&request.commit),
        repo: parse_repo(&request.repo),
        location: parse_location(&request.loc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SHA: &str = "a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4e5f6a1b2";

    #[test]
    fn accepts_github_style_usernames() {
        let longest = "a".repeat(MAX_USERNAME_LEN);
        for name in ["ArnavMeh", "a", "a-b", "A1-b2-C3", "0day", longest.as_str()] {
            assert_eq!(parse_username(&json!(name)).unwrap(), name);
        }
    }

    #[test]
    fn rejects_malformed_usernames() {
        let too_long = "a".repeat(MAX_USERNAME_LEN + 1);
        for name in [
            "",
            "-lead",
            "trail-",
            "dou--ble",
            "under_score",
            "sp ace",
            "o'brien",
            "x'; DROP TABLE git_log; --",
            "ünicode",
            too_long.as_str(),
        ] {
            assert!(
                matches!(parse_username(&json!(name)), Err(ServiceError::InvalidIdentifier)),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_non_string_usernames() {
        for value in [Value::Null, json!(42), json!(["ArnavMeh"]), json!({"name": "x"})] {
            assert!(parse_username(&value).is_err());
        }
    }

    #[test]
    fn commit_keeps_only_a_full_sha() {
        assert_eq!(parse_commit(&json!(SHA)).as_deref(), Some(SHA));
        assert_eq!(parse_commit(&json!("abc123")), None);
        assert_eq!(parse_commit(&json!("")), None);
        assert_eq!(parse_commit(&Value::Null), None);
        assert_eq!(parse_commit(&json!(12345)), None);
        // Uppercase hex and 41 digit runs are not SHA-1 hashes.
        assert_eq!(parse_commit(&json!(SHA.to_uppercase())), None);
        assert_eq!(parse_commit(&json!(format!("{SHA}0"))), None);
    }

    #[test]
    fn commit_is_extracted_from_surrounding_text() {
        let value = json!(format!("commit {SHA} (HEAD -> main)"));
        assert_eq!(parse_commit(&value).as_deref(), Some(SHA));
    }

    #[test]
    fn repo_accepts_git_remotes() {
        for url in [
            "https://github.com/user/repo.git",
            "http://example.com/user/repo.git/",
            "ssh://git@github.com/user/repo.git",
            "git://host.xz/path/to/repo.git",
            "git@github.com:user/repo.git",
            "https://github.com/user/repo.git#v1.0.2",
        ] {
            assert_eq!(parse_repo(&json!(url)).as_deref(), Some(url), "{url}");
        }
    }

    #[test]
    fn repo_rejects_everything_else() {
        for value in [
            json!("not-a-url"),
            json!("https://github.com/user/repo"),
            json!("ftp://github.com/user/repo.git"),
            json!(""),
            Value::Null,
            json!(7),
        ] {
            assert_eq!(parse_repo(&value), None, "{value}");
        }
    }

    #[test]
    fn location_is_all_or_nothing() {
        assert_eq!(
            parse_location(&json!([30, -70])),
            Some(Coordinates {
                lon: 30.0,
                lat: -70.0
            })
        );
        assert_eq!(
            parse_location(&json!([-122.41, 37.77])),
            Some(Coordinates {
                lon: -122.41,
                lat: 37.77
            })
        );
        for value in [
            json!(["x", -70]),
            json!([30, null]),
            json!([30]),
            json!([30, -70, 5]),
            json!([]),
            json!({"lon": 30, "lat": -70}),
            json!("30,-70"),
            Value::Null,
        ] {
            assert_eq!(parse_location(&value), None, "{value}");
        }
    }

    #[test]
    fn normalize_degrades_provenance_but_not_identity() {
        let request = LogRequest {
            name: json!("ArnavMeh"),
            loc: json!(["x", -70]),
            commit: json!("abc123"),
            repo: json!("not-a-url"),
        };
        let entry = normalize(&request).unwrap();
        assert_eq!(entry.username, "ArnavMeh");
        assert_eq!(entry.commit, None);
        assert_eq!(entry.repo, None);
        assert_eq!((entry.lon(), entry.lat()), (None, None));

        let request = LogRequest {
            name: json!("bad--name"),
            commit: json!(SHA),
            ..LogRequest::default()
        };
        assert!(matches!(
            normalize(&request),
            Err(ServiceError::InvalidIdentifier)
        ));
    }
}
