//! Property-based tests for the composite registry

use proptest::prelude::*;
use terminable::testing::{CloseLog, MockCloseError, MockResource};
use terminable::{CompositeCloseError, CompositeTerminable, Semigroup};

fn registry_of(
    failures: &[bool],
    log: &CloseLog,
) -> (CompositeTerminable<MockCloseError>, Vec<std::sync::Arc<MockResource>>) {
    let registry = CompositeTerminable::new();
    let mocks = failures
        .iter()
        .enumerate()
        .map(|(i, &fails)| {
            let mock = MockResource::new(format!("r{}", i), log);
            let mock = if fails {
                mock.failing(format!("e{}", i))
            } else {
                mock
            };
            registry.bind(mock.build())
        })
        .collect();
    (registry, mocks)
}

proptest! {
    #[test]
    fn prop_close_all_is_reverse_registration_order(
        failures in prop::collection::vec(any::<bool>(), 0..40)
    ) {
        let log = CloseLog::new();
        let (registry, mocks) = registry_of(&failures, &log);

        let _ = registry.close_all();

        let expected: Vec<String> = (0..failures.len()).rev().map(|i| format!("r{}", i)).collect();
        prop_assert_eq!(log.entries(), expected);
        for mock in &mocks {
            prop_assert_eq!(mock.close_count(), 1);
        }
        prop_assert!(registry.is_empty());
    }

    #[test]
    fn prop_causes_match_failures_in_encounter_order(
        failures in prop::collection::vec(any::<bool>(), 0..40)
    ) {
        let log = CloseLog::new();
        let (registry, _mocks) = registry_of(&failures, &log);

        let expected: Vec<MockCloseError> = failures
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, &fails)| fails)
            .map(|(i, _)| MockCloseError(format!("e{}", i)))
            .collect();

        match registry.close_all() {
            Ok(()) => prop_assert!(expected.is_empty()),
            Err(err) => prop_assert_eq!(err.into_causes().into_vec(), expected),
        }
    }

    #[test]
    fn prop_close_specific_touches_only_target(
        count in 1usize..30,
        pick in any::<prop::sample::Index>()
    ) {
        let log = CloseLog::new();
        let (registry, mocks) = registry_of(&vec![false; count], &log);
        let target = pick.index(count);

        prop_assert!(registry.close_specific(&mocks[target]).is_ok());

        prop_assert_eq!(registry.len(), count - 1);
        for (i, mock) in mocks.iter().enumerate() {
            prop_assert_eq!(mock.close_count(), usize::from(i == target));
        }
    }

    #[test]
    fn prop_reset_keeps_exactly_the_open_resources(
        closed in prop::collection::vec(any::<bool>(), 0..40)
    ) {
        let log = CloseLog::new();
        let registry = CompositeTerminable::<MockCloseError>::new();
        for (i, &is_closed) in closed.iter().enumerate() {
            let mock = registry.bind(MockResource::new(format!("r{}", i), &log).queryable().build());
            if is_closed {
                mock.mark_closed();
            }
        }

        registry.reset();

        prop_assert_eq!(registry.len(), closed.iter().filter(|c| !**c).count());
        prop_assert!(log.is_empty());
    }

    #[test]
    fn prop_combine_is_associative(
        a in prop::collection::vec(any::<u8>(), 1..10),
        b in prop::collection::vec(any::<u8>(), 1..10),
        c in prop::collection::vec(any::<u8>(), 1..10)
    ) {
        let err = |v: &Vec<u8>| CompositeCloseError::new(v.clone());

        let left = err(&a).combine(err(&b)).combine(err(&c));
        let right = err(&a).combine(err(&b).combine(err(&c)));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn prop_flatten_preserves_every_cause(
        levels in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..6), 1..8)
    ) {
        let expected: Vec<u8> = levels.iter().flatten().copied().collect();
        let nested = CompositeCloseError::new(
            levels.into_iter().map(CompositeCloseError::new).collect(),
        );

        prop_assert_eq!(nested.flatten().into_causes().into_vec(), expected);
    }
}
