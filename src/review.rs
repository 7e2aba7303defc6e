//! Group review: bulk "smart actions" over one suggestion's members

use crate::domain::{FileId, FileRecord};
use crate::suggest::{Suggestion, SuggestionKind, SuggestionThresholds};
use chrono::{DateTime, Duration, Utc};

/// A focused sub-session over exactly the members of one suggestion.
#[derive(Debug)]
pub struct ReviewContext {
    pub suggestion: Suggestion,
    /// Members still present in the working list when the review opened,
    /// minus whatever later bulk actions already processed.
    pub members: Vec<FileRecord>,
}

impl ReviewContext {
    pub fn member_ids(&self) -> Vec<FileId> {
        self.members.iter().map(|r| r.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Drops processed members; the review closes implicitly (caller-side)
    /// once nothing is left.
    pub fn retain_unprocessed(&mut self, processed: &[FileId]) {
        self.members.retain(|m| !processed.contains(&m.id));
    }
}

/// A precomputed bulk decision proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartAction {
    pub label: String,
    pub keep: Vec<FileId>,
    pub bin: Vec<FileId>,
}

/// Ranked bulk actions for the context's suggestion kind. Kinds without a
/// sensible bulk move return nothing and the caller falls back to manual
/// per-file decisions.
pub fn derive_smart_actions(
    context: &ReviewContext,
    thresholds: &SuggestionThresholds,
    now: DateTime<Utc>,
) -> Vec<SmartAction> {
    let members = &context.members;
    if members.is_empty() {
        return Vec::new();
    }

    match &context.suggestion.kind {
        SuggestionKind::Duplicate { .. } => {
            let ranked = newest_first(members);
            let keep = vec![ranked[0].id];
            let bin: Vec<FileId> = ranked[1..].iter().map(|r| r.id).collect();

            vec![SmartAction {
                label: format!("Keep the newest copy, bin the other {}", bin.len()),
                keep,
                bin,
            }]
        }

        SuggestionKind::SimilarNames { .. } => {
            let ranked = newest_first(members);
            let k = thresholds.keep_newest.min(ranked.len());
            let keep: Vec<FileId> = ranked[..k].iter().map(|r| r.id).collect();
            let bin: Vec<FileId> = ranked[k..].iter().map(|r| r.id).collect();

            let mut actions = vec![SmartAction {
                label: format!("Keep the newest {}, bin the rest", k),
                keep,
                bin,
            }];

            let aged: Vec<FileId> = members
                .iter()
                .filter(|r| now.signed_duration_since(r.created) > Duration::days(thresholds.aged_after_days))
                .map(|r| r.id)
                .collect();
            if !aged.is_empty() {
                actions.push(SmartAction {
                    label: format!("Bin the {} older than a week", aged.len()),
                    keep: Vec::new(),
                    bin: aged,
                });
            }

            actions
        }

        SuggestionKind::SameSession { .. } => {
            let all: Vec<FileId> = members.iter().map(|r| r.id).collect();
            vec![
                SmartAction {
                    label: "Keep the whole batch".to_string(),
                    keep: all.clone(),
                    bin: Vec::new(),
                },
                SmartAction {
                    label: "Bin the whole batch".to_string(),
                    keep: Vec::new(),
                    bin: all,
                },
            ]
        }

        SuggestionKind::OldFile | SuggestionKind::LargeFile | SuggestionKind::TemporaryFile => {
            Vec::new()
        }
    }
}

fn newest_first(members: &[FileRecord]) -> Vec<&FileRecord> {
    let mut ranked: Vec<&FileRecord> = members.iter().collect();
    ranked.sort_by(|a, b| b.created.cmp(&a.created));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FileKind;
    use crate::suggest::compute_suggestions;
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn record(id: u64, name: &str, created: DateTime<Utc>) -> FileRecord {
        let mut r = FileRecord::new(
            PathBuf::from(format!("/desk/{}", name)),
            10,
            created,
            created,
            FileKind::Image,
            Some(7),
        );
        r.id = FileId(id);
        r
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn context_for(kind_members: Vec<FileRecord>) -> ReviewContext {
        // Build a real suggestion by focusing the first member.
        let focused = kind_members[0].clone();
        let suggestions = compute_suggestions(
            &focused,
            &kind_members,
            &SuggestionThresholds::default(),
            at(0),
        );
        ReviewContext {
            suggestion: suggestions.into_iter().next().expect("a suggestion"),
            members: kind_members,
        }
    }

    mod duplicate_action_tests {
        use super::*;

        #[test]
        fn test_keep_newest_bin_rest() {
            let members = vec![
                record(1, "report.pdf", at(0)),
                record(2, "report copy.pdf", at(100)),
                record(3, "report copy 2.pdf", at(200)),
                record(4, "report copy 3.pdf", at(50)),
            ];
            let ctx = context_for(members);

            let actions = derive_smart_actions(&ctx, &SuggestionThresholds::default(), at(300));

            assert_eq!(actions.len(), 1);
            // Newest by creation time is id 3.
            assert_eq!(actions[0].keep, vec![FileId(3)]);
            assert_eq!(actions[0].bin.len(), 3);
            assert!(!actions[0].bin.contains(&FileId(3)));
        }
    }

    mod similar_names_action_tests {
        use super::*;

        fn series(n: usize, base_time: i64) -> Vec<FileRecord> {
            (0..n)
                .map(|i| {
                    let mut r = record(
                        i as u64 + 1,
                        &format!("IMG_{:04}.jpg", 100 + i),
                        at(base_time + i as i64 * 10),
                    );
                    // Distinct content so duplicate detection stays out.
                    r.size = 100 + i as u64;
                    r.fingerprint = Some(i as u32);
                    r
                })
                .collect()
        }

        #[test]
        fn test_keep_newest_five() {
            let ctx = context_for(series(8, 0));
            let actions = derive_smart_actions(&ctx, &SuggestionThresholds::default(), at(1000));

            assert_eq!(actions[0].keep.len(), 5);
            assert_eq!(actions[0].bin.len(), 3);
            // The newest five are the last five created.
            assert!(actions[0].keep.contains(&FileId(8)));
            assert!(actions[0].bin.contains(&FileId(1)));
        }

        #[test]
        fn test_small_group_keeps_all() {
            let ctx = context_for(series(3, 0));
            let actions = derive_smart_actions(&ctx, &SuggestionThresholds::default(), at(1000));

            assert_eq!(actions[0].keep.len(), 3);
            assert!(actions[0].bin.is_empty());
        }

        #[test]
        fn test_aged_members_get_second_action() {
            let mut members = series(3, 0);
            // Two members are far older than a week relative to `now`.
            let now = at(0) + Duration::days(30);
            members[2].created = now - Duration::days(2);

            let ctx = context_for(members);
            let actions = derive_smart_actions(&ctx, &SuggestionThresholds::default(), now);

            assert_eq!(actions.len(), 2);
            assert_eq!(actions[1].bin, vec![FileId(1), FileId(2)]);
            assert!(actions[1].keep.is_empty());
        }
    }

    mod same_session_action_tests {
        use super::*;

        #[test]
        fn test_keep_all_or_bin_all() {
            let members = vec![
                record(1, "a.png", at(0)),
                record(2, "b.png", at(30)),
                record(3, "c.png", at(60)),
            ];
            // Distinct sizes/fingerprints so duplicate detection stays out.
            let members: Vec<FileRecord> = members
                .into_iter()
                .enumerate()
                .map(|(i, mut r)| {
                    r.size = 10 + i as u64;
                    r.fingerprint = Some(i as u32);
                    r
                })
                .collect();

            let ctx = context_for(members);
            assert!(matches!(
                ctx.suggestion.kind,
                SuggestionKind::SameSession { .. }
            ));

            let actions = derive_smart_actions(&ctx, &SuggestionThresholds::default(), at(100));

            assert_eq!(actions.len(), 2);
            assert_eq!(actions[0].keep.len(), 3);
            assert!(actions[0].bin.is_empty());
            assert!(actions[1].keep.is_empty());
            assert_eq!(actions[1].bin.len(), 3);
        }
    }

    mod single_kind_tests {
        use super::*;
        use crate::suggest::Suggestion;

        #[test]
        fn test_old_file_has_no_derived_actions() {
            let member = record(1, "ancient.txt", at(0));
            let suggestions = compute_suggestions(
                &member,
                &[member.clone()],
                &SuggestionThresholds::default(),
                at(0) + Duration::days(120),
            );
            let old: Suggestion = suggestions
                .into_iter()
                .find(|s| s.kind == SuggestionKind::OldFile)
                .unwrap();

            let ctx = ReviewContext {
                suggestion: old,
                members: vec![member],
            };

            assert!(derive_smart_actions(&ctx, &SuggestionThresholds::default(), at(0)).is_empty());
        }
    }

    mod context_tests {
        use super::*;

        #[test]
        fn test_retain_unprocessed_shrinks_context() {
            let mut ctx = context_for(vec![
                record(1, "a.pdf", at(0)),
                record(2, "a copy.pdf", at(10)),
                record(3, "a copy 2.pdf", at(20)),
            ]);

            ctx.retain_unprocessed(&[FileId(1), FileId(3)]);

            assert_eq!(ctx.member_ids(), vec![FileId(2)]);
            assert!(!ctx.is_empty());

            ctx.retain_unprocessed(&[FileId(2)]);
            assert!(ctx.is_empty());
        }
    }
}
