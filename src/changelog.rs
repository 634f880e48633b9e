//! Release-notes notification for tool upgrades.
//!
//! Everything here is best-effort: a failed fetch surfaces as a
//! [`FetchError`], which the migration pipeline only logs.

use similar::TextDiff;
use thiserror::Error;
use tracing::debug;

use crate::settings::ChangelogSettings;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unable to fetch the changelog from {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("unable to fetch the changelog from {url}: HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Somewhere release notes can be read from.
pub trait ChangelogSource {
    /// Returns the notes at `reference` (tag or branch), or the latest notes
    /// when `reference` is `None`.
    fn fetch(&self, reference: Option<&str>) -> Result<String, FetchError>;
}

/// Reads `CHANGELOG.md` from a GitHub repository over HTTPS.
pub struct GithubChangelog {
    settings: ChangelogSettings,
}

impl GithubChangelog {
    pub fn new(settings: &ChangelogSettings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }
}

impl ChangelogSource for GithubChangelog {
    fn fetch(&self, reference: Option<&str>) -> Result<String, FetchError> {
        let url = self.settings.url(reference);
        debug!(%url, "fetching changelog");

        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.clone(),
            reason: e.to_string(),
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(self.settings.timeout())
            .build()
            .map_err(transport)?;
        let response = client.get(&url).send().map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }
        response.text().map_err(transport)
    }
}

/// What to show the operator after the tool version changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangelogNotice {
    /// No version was recorded before: the head of the latest notes.
    Latest { lines: Vec<String> },
    /// The tool moved away from `previous`: lines of the notes that differ.
    Changes { previous: String, lines: Vec<String> },
}

/// Fetches whatever is needed to describe the upgrade from `previous`.
pub fn notice(
    source: &dyn ChangelogSource,
    settings: &ChangelogSettings,
    previous: Option<&str>,
) -> Result<ChangelogNotice, FetchError> {
    let latest = source.fetch(None)?;

    match previous {
        None => Ok(ChangelogNotice::Latest {
            lines: latest
                .lines()
                .take(settings.preview_lines)
                .map(str::to_string)
                .collect(),
        }),
        Some(previous) => {
            let old = source.fetch(Some(previous))?;
            Ok(ChangelogNotice::Changes {
                previous: previous.to_string(),
                lines: difference(&old, &latest),
            })
        }
    }
}

/// Lines of every hunk between `old` and `new`, without diff markers.
///
/// Hunk and file headers are not part of the output; context lines are.
pub fn difference(old: &str, new: &str) -> Vec<String> {
    let diff = TextDiff::from_lines(old, new);
    let mut lines = Vec::new();

    for group in diff.grouped_ops(3) {
        for op in &group {
            for change in diff.iter_changes(op) {
                lines.push(change.value().trim_end_matches(['\r', '\n']).to_string());
            }
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<(Option<&'static str>, String)>);

    impl ChangelogSource for Fixed {
        fn fetch(&self, reference: Option<&str>) -> Result<String, FetchError> {
            self.0
                .iter()
                .find(|(r, _)| *r == reference)
                .map(|(_, text)| text.clone())
                .ok_or_else(|| FetchError::Status {
                    url: format!("{reference:?}"),
                    status: 404,
                })
        }
    }

    #[test]
    fn first_notice_shows_preview_lines_only() {
        let text = (1..=30).map(|i| format!("line {i}\n")).collect::<String>();
        let source = Fixed(vec![(None, text)]);

        let notice = notice(&source, &ChangelogSettings::default(), None).expect("fetch");
        let ChangelogNotice::Latest { lines } = notice else {
            panic!("expected first-time notice");
        };
        assert_eq!(lines.len(), 20);
        assert_eq!(lines[0], "line 1");
        assert_eq!(lines[19], "line 20");
    }

    #[test]
    fn changes_notice_diffs_old_against_latest() {
        let source = Fixed(vec![
            (None, "# Changelog\n## 2.1.0\n- new thing\n## 2.0.0\n- old thing\n".to_string()),
            (Some("2.0.0"), "# Changelog\n## 2.0.0\n- old thing\n".to_string()),
        ]);

        let notice = notice(&source, &ChangelogSettings::default(), Some("2.0.0")).expect("fetch");
        let ChangelogNotice::Changes { previous, lines } = notice else {
            panic!("expected changes notice");
        };
        assert_eq!(previous, "2.0.0");
        assert!(lines.contains(&"## 2.1.0".to_string()));
        assert!(lines.contains(&"- new thing".to_string()));
        assert!(lines.iter().all(|l| !l.starts_with("@@") && !l.starts_with("+++")));
    }

    #[test]
    fn identical_notes_have_no_difference() {
        assert!(difference("a\nb\n", "a\nb\n").is_empty());
    }

    #[test]
    fn missing_reference_is_a_fetch_error() {
        let source = Fixed(vec![(None, "latest\n".to_string())]);
        let result = notice(&source, &ChangelogSettings::default(), Some("0.0.1"));
        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
    }
}
