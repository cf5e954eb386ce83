use std::collections::{BTreeSet, HashMap, HashSet};

use rand::Rng;

use crate::models::{AnimeId, Annotation, Mark, UserWatchRecord};

/// Turns the raw `dup` query value into a usable threshold.
///
/// Missing, non-integer, or larger-than-the-group values fall back to
/// `num_users - 1`. The result is always within `[1, num_users]`.
pub fn resolve_threshold(raw: Option<&str>, num_users: usize) -> usize {
    match raw.and_then(|value| value.trim().parse::<i64>().ok()) {
        Some(dup) if dup < 1 => 1,
        Some(dup) => {
            let dup = usize::try_from(dup).unwrap_or(usize::MAX);
            normalize_threshold(dup, num_users)
        }
        None => normalize_threshold(usize::MAX, num_users),
    }
}

/// Applies the group-size rule to an already numeric threshold.
///
/// A threshold larger than the group becomes `num_users - 1`; the result is
/// then kept within `[1, num_users]`.
pub fn normalize_threshold(dup: usize, num_users: usize) -> usize {
    let dup = if dup > num_users {
        num_users.saturating_sub(1)
    } else {
        dup
    };
    clamp_threshold(dup, num_users)
}

/// Keeps a threshold within `[1, num_users]`
pub fn clamp_threshold(dup: usize, num_users: usize) -> usize {
    dup.clamp(1, num_users.max(1))
}

/// Anime IDs completed by at least `dup` of the given users.
///
/// Each user counts at most once per ID. Returned as a set so that an ID shared
/// by five users is no more likely to be picked than one shared by two.
pub fn qualifying_candidates(records: &[UserWatchRecord], dup: usize) -> BTreeSet<AnimeId> {
    let mut counts: HashMap<AnimeId, usize> = HashMap::new();

    for record in records {
        let unique: HashSet<AnimeId> = record.completed.iter().map(|e| e.anime_id).collect();
        for anime_id in unique {
            *counts.entry(anime_id).or_default() += 1;
        }
    }

    counts
        .into_iter()
        .filter(|&(_, count)| count >= dup)
        .map(|(anime_id, _)| anime_id)
        .collect()
}

/// Uniformly picks one candidate, or `None` if there are none
pub fn pick_candidate<R: Rng>(candidates: &BTreeSet<AnimeId>, rng: &mut R) -> Option<AnimeId> {
    if candidates.is_empty() {
        return None;
    }
    let index = rng.gen_range(0..candidates.len());
    candidates.iter().nth(index).copied()
}

/// Per-user annotations for the picked anime, in input order.
///
/// A completed entry wins over an in-progress one. Users that have the anime on
/// neither list are left out.
pub fn annotate(records: &[UserWatchRecord], anime_id: AnimeId) -> Vec<Annotation> {
    records
        .iter()
        .filter_map(|record| {
            let mark = match record.score_for(anime_id) {
                Some(score) => Mark::Score(score),
                None => Mark::Status(record.status_for(anime_id)?),
            };
            Some(Annotation {
                username: record.username.clone(),
                avatar_url: record.avatar_url.clone(),
                mark,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompletedEntry, InProgressEntry, WatchStatus};
    use rand::{rngs::StdRng, SeedableRng};

    fn user(
        name: &str,
        completed: &[(AnimeId, f64)],
        in_progress: &[(AnimeId, WatchStatus)],
    ) -> UserWatchRecord {
        UserWatchRecord {
            username: name.to_string(),
            avatar_url: format!("https://img.example/{}.png", name),
            completed: completed
                .iter()
                .map(|&(anime_id, score)| CompletedEntry { anime_id, score })
                .collect(),
            in_progress: in_progress
                .iter()
                .map(|&(anime_id, status)| InProgressEntry { anime_id, status })
                .collect(),
        }
    }

    #[test]
    fn test_resolve_threshold_accepts_valid_value() {
        assert_eq!(resolve_threshold(Some("2"), 3), 2);
        assert_eq!(resolve_threshold(Some(" 3 "), 3), 3);
    }

    #[test]
    fn test_resolve_threshold_defaults_to_one_less_than_group() {
        assert_eq!(resolve_threshold(None, 4), 3);
        assert_eq!(resolve_threshold(Some("abc"), 4), 3);
        assert_eq!(resolve_threshold(Some("1.5"), 4), 3);
        assert_eq!(resolve_threshold(Some(""), 4), 3);
        assert_eq!(resolve_threshold(Some("5"), 4), 3);
    }

    #[test]
    fn test_resolve_threshold_never_below_one() {
        assert_eq!(resolve_threshold(Some("0"), 3), 1);
        assert_eq!(resolve_threshold(Some("-4"), 3), 1);
        // A lone user has no "one less" to fall back to
        assert_eq!(resolve_threshold(None, 1), 1);
        assert_eq!(resolve_threshold(Some("7"), 1), 1);
    }

    #[test]
    fn test_normalize_threshold_oversized_falls_back() {
        assert_eq!(normalize_threshold(10, 3), 2);
        assert_eq!(normalize_threshold(4, 3), 2);
        assert_eq!(normalize_threshold(3, 3), 3);
        assert_eq!(normalize_threshold(0, 3), 1);
        assert_eq!(normalize_threshold(2, 1), 1);
    }

    #[test]
    fn test_resolve_threshold_huge_value_falls_back() {
        assert_eq!(resolve_threshold(Some("99999999999999999999"), 3), 2);
        assert_eq!(resolve_threshold(Some("9223372036854775807"), 3), 2);
    }

    #[test]
    fn test_clamp_threshold() {
        assert_eq!(clamp_threshold(0, 3), 1);
        assert_eq!(clamp_threshold(2, 3), 2);
        assert_eq!(clamp_threshold(9, 3), 3);
        assert_eq!(clamp_threshold(5, 0), 1);
    }

    #[test]
    fn test_qualifying_candidates_threshold() {
        let records = vec![
            user("alice", &[(1, 8.0), (2, 7.0), (3, 5.0)], &[]),
            user("bob", &[(1, 9.0), (2, 6.0)], &[]),
            user("carol", &[(1, 10.0), (4, 3.0)], &[]),
        ];

        assert_eq!(qualifying_candidates(&records, 3), BTreeSet::from([1]));
        assert_eq!(qualifying_candidates(&records, 2), BTreeSet::from([1, 2]));
        assert_eq!(qualifying_candidates(&records, 1), BTreeSet::from([1, 2, 3, 4]));
    }

    #[test]
    fn test_qualifying_candidates_counts_each_user_once() {
        // Same ID twice on one user's list must not satisfy dup = 2 alone
        let records = vec![
            user("alice", &[(1, 8.0), (1, 8.0)], &[]),
            user("bob", &[(2, 9.0)], &[]),
        ];
        assert!(qualifying_candidates(&records, 2).is_empty());
    }

    #[test]
    fn test_qualifying_candidates_ignores_in_progress() {
        let records = vec![
            user("alice", &[(1, 8.0)], &[]),
            user("bob", &[], &[(1, WatchStatus::Current)]),
        ];
        assert!(qualifying_candidates(&records, 2).is_empty());
    }

    #[test]
    fn test_pick_candidate_empty() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(pick_candidate(&BTreeSet::new(), &mut rng), None);
    }

    #[test]
    fn test_pick_candidate_is_seeded_and_in_set() {
        let candidates = BTreeSet::from([3, 11, 42, 99]);
        let first = pick_candidate(&candidates, &mut StdRng::seed_from_u64(1234));
        let second = pick_candidate(&candidates, &mut StdRng::seed_from_u64(1234));

        assert_eq!(first, second);
        assert!(candidates.contains(&first.unwrap()));
    }

    #[test]
    fn test_pick_candidate_reaches_every_candidate() {
        let candidates = BTreeSet::from([1, 2, 3]);
        let mut rng = StdRng::seed_from_u64(0);
        let mut seen = BTreeSet::new();
        for _ in 0..200 {
            seen.insert(pick_candidate(&candidates, &mut rng).unwrap());
        }
        assert_eq!(seen, candidates);
    }

    #[test]
    fn test_annotate_score_status_and_omission() {
        let records = vec![
            user("alice", &[(1, 8.0)], &[]),
            user("bob", &[], &[(1, WatchStatus::Paused)]),
            user("carol", &[(2, 4.0)], &[(3, WatchStatus::Planning)]),
            user("dave", &[(1, 9.0)], &[]),
        ];

        let annotations = annotate(&records, 1);
        let marks: Vec<(&str, &Mark)> = annotations
            .iter()
            .map(|a| (a.username.as_str(), &a.mark))
            .collect();

        assert_eq!(
            marks,
            vec![
                ("alice", &Mark::Score(8.0)),
                ("bob", &Mark::Status(WatchStatus::Paused)),
                ("dave", &Mark::Score(9.0)),
            ]
        );
        assert_eq!(annotations[0].avatar_url, "https://img.example/alice.png");
    }

    #[test]
    fn test_annotate_prefers_completed_when_on_both_lists() {
        let records = vec![user("alice", &[(1, 8.0)], &[(1, WatchStatus::Dropped)])];
        let annotations = annotate(&records, 1);
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].mark, Mark::Score(8.0));
    }
}
