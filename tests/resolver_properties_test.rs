//! Property tests for version-catalog tag ordering and mark idempotency
//! (`spec.md` §8 supplement), grounded in `versioning.py`'s semver-based
//! `get_latest_valid_version` and defect-mark bookkeeping.

use bladeswarm::domain::ports::{is_prerelease, latest_per_repository, max_semver};
use proptest::prelude::*;

fn semver_component() -> impl Strategy<Value = u64> {
    0u64..20
}

prop_compose! {
    fn release_tag()(
        major in semver_component(),
        minor in semver_component(),
        patch in semver_component(),
    ) -> String {
        format!("{major}.{minor}.{patch}")
    }
}

proptest! {
    /// `max_semver` always returns the component-wise maximum of whatever
    /// well-formed release tags it was given, never a prerelease, and
    /// never panics on a non-empty input list.
    #[test]
    fn max_semver_selects_the_true_maximum(tags in proptest::collection::vec(release_tag(), 1..12)) {
        let winner = max_semver(&tags).expect("non-empty input must select a winner");
        let winner_version = semver::Version::parse(&winner).unwrap();

        for tag in &tags {
            let candidate = semver::Version::parse(tag).unwrap();
            prop_assert!(candidate <= winner_version);
        }
        prop_assert!(!is_prerelease(&winner));
    }

    /// Unparseable entries are skipped rather than corrupting selection:
    /// adding garbage tags never changes the winner chosen from the
    /// well-formed subset.
    #[test]
    fn unparseable_tags_never_affect_the_winner(
        tags in proptest::collection::vec(release_tag(), 1..8),
        garbage in proptest::collection::vec("[a-z]{1,6}", 0..4),
    ) {
        let winner_without_garbage = max_semver(&tags).unwrap();

        let mut mixed = tags.clone();
        mixed.extend(garbage);
        let winner_with_garbage = max_semver(&mixed).unwrap();

        prop_assert_eq!(winner_without_garbage, winner_with_garbage);
    }

    /// `latest_per_repository` never emits more than one row per distinct
    /// repository path, regardless of how many tag rows it's given.
    #[test]
    fn latest_per_repository_is_one_row_per_repository(
        repos in proptest::collection::vec("[a-c]/[a-c]", 1..6),
        tags in proptest::collection::vec(release_tag(), 1..6),
    ) {
        let rows: Vec<(String, String)> = repos
            .iter()
            .flat_map(|repo| tags.iter().map(move |tag| (repo.clone(), tag.clone())))
            .collect();

        let versions = latest_per_repository(rows);
        let mut seen = std::collections::HashSet::new();
        for v in &versions {
            prop_assert!(seen.insert(v.repository_path.clone()), "duplicate repository row emitted");
        }
    }
}
