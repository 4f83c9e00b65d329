// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Property tests: membership diffing, overlay invariants, and inverse
//! symmetry on reflexive and cyclic fixtures.

use std::collections::HashSet;

use proptest::prelude::*;
use proptest::test_runner::{Config as PropConfig, RngAlgorithm, TestRng, TestRunner};

use relcache_core::{
    Graph, Lid, MembershipSet, NullSink, ResourceKey, StaticSchema, TrackedMembership,
};
use relcache_dry_tests::{many, people_schema};

const PEOPLE: usize = 6;

fn tag(n: u16) -> ResourceKey {
    ResourceKey::persisted("tag", &n.to_string(), Lid::new(&format!("@lid:tag-{n}")).unwrap())
        .unwrap()
}

fn tags(ns: &[u16]) -> Vec<ResourceKey> {
    ns.iter().copied().map(tag).collect()
}

fn person(n: usize) -> ResourceKey {
    ResourceKey::persisted(
        "person",
        &n.to_string(),
        Lid::new(&format!("@lid:person-{n}")).unwrap(),
    )
    .unwrap()
}

fn people(ns: &[usize]) -> Vec<ResourceKey> {
    ns.iter().copied().map(person).collect()
}

/// Ordered list of distinct ids.
fn unique_ids() -> impl Strategy<Value = Vec<u16>> {
    prop::collection::hash_set(0u16..48, 0..16)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

// ── Membership diff ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn push_state_reports_exact_set_difference(prior in unique_ids(), next in unique_ids()) {
        let mut set = MembershipSet::new();
        set.push_state(tags(&prior)).unwrap();
        let diff = set.push_state(tags(&next)).unwrap();

        let prior_set: HashSet<u16> = prior.iter().copied().collect();
        let next_set: HashSet<u16> = next.iter().copied().collect();
        prop_assert_eq!(diff.reordered, prior_set == next_set && prior != next);
        let added: HashSet<ResourceKey> = diff.additions.into_iter().collect();
        let removed: HashSet<ResourceKey> = diff.removals.into_iter().collect();
        let want_added: HashSet<ResourceKey> =
            next_set.difference(&prior_set).copied().map(tag).collect();
        let want_removed: HashSet<ResourceKey> =
            prior_set.difference(&next_set).copied().map(tag).collect();

        prop_assert_eq!(added, want_added);
        prop_assert_eq!(removed, want_removed);
        prop_assert_eq!(set.to_vec(), tags(&next));
    }

    #[test]
    fn unchanged_push_is_idempotent(ids in unique_ids()) {
        let mut set = MembershipSet::new();
        set.push_state(tags(&ids)).unwrap();
        let diff = set.push_state(tags(&ids)).unwrap();
        prop_assert!(diff.is_empty());
        prop_assert_eq!(set.to_vec(), tags(&ids));
    }
}

// ── Overlay invariants ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum OverlayStep {
    Add(u16),
    Remove(u16),
    Push(Vec<u16>),
    Rollback,
}

fn overlay_step() -> impl Strategy<Value = OverlayStep> {
    prop_oneof![
        3 => (0u16..12).prop_map(OverlayStep::Add),
        3 => (0u16..12).prop_map(OverlayStep::Remove),
        2 => prop::collection::hash_set(0u16..12, 0..8)
            .prop_map(|set| OverlayStep::Push(set.into_iter().collect())),
        1 => Just(OverlayStep::Rollback),
    ]
}

fn apply_overlay_step(members: &mut TrackedMembership, step: &OverlayStep) {
    match step {
        OverlayStep::Add(n) => {
            let key = tag(*n);
            if !members.has(&key) {
                members.add(key).unwrap();
            }
        }
        OverlayStep::Remove(n) => {
            let key = tag(*n);
            if members.has(&key) {
                members.remove(&key).unwrap();
            }
        }
        OverlayStep::Push(ids) => {
            members.push_state(tags(ids)).unwrap();
        }
        OverlayStep::Rollback => {
            members.rollback();
        }
    }
}

proptest! {
    #[test]
    fn overlay_never_double_tracks(steps in prop::collection::vec(overlay_step(), 1..40)) {
        let mut members = TrackedMembership::new();
        for step in &steps {
            apply_overlay_step(&mut members, step);

            members.verify().unwrap();
            let pending = members.pending_additions();
            let additions: HashSet<&ResourceKey> = pending.iter().collect();
            prop_assert!(members.pending_removals().iter().all(|k| !additions.contains(k)));

            let data = members.data().to_vec();
            let distinct: HashSet<&ResourceKey> = data.iter().collect();
            prop_assert_eq!(distinct.len(), data.len());
            for n in 0u16..12 {
                let key = tag(n);
                prop_assert_eq!(members.has(&key), data.contains(&key));
            }
        }
    }

    #[test]
    fn local_add_then_remote_confirm_is_not_a_change(ids in unique_ids(), extra in 48u16..64) {
        let mut members = TrackedMembership::new();
        members.push_state(tags(&ids)).unwrap();
        members.add(tag(extra)).unwrap();

        let mut confirmed = ids.clone();
        confirmed.push(extra);
        let update = members.push_state(tags(&confirmed)).unwrap();

        prop_assert!(update.effective.is_empty());
        prop_assert_eq!(update.remote.additions, vec![tag(extra)]);
        prop_assert!(!members.is_dirty());
        prop_assert_eq!(members.canonical(), tags(&confirmed));
    }
}

// ── Inverse symmetry on the people fixture ─────────────────────────────

#[derive(Debug, Clone)]
enum PeopleStep {
    AddFriends(usize, Vec<usize>),
    RemoveFriends(usize, Vec<usize>),
    ReplaceFriends(usize, Vec<usize>),
    PushFriends(usize, Vec<usize>),
    SetSpouse(usize, Option<usize>),
    SetMentor(usize, Option<usize>),
    SetMentees(usize, Vec<usize>),
    Rollback(usize),
}

fn someone() -> impl Strategy<Value = usize> {
    0..PEOPLE
}

fn group() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(someone(), 0..4)
}

fn people_step() -> impl Strategy<Value = PeopleStep> {
    prop_oneof![
        (someone(), group()).prop_map(|(a, b)| PeopleStep::AddFriends(a, b)),
        (someone(), group()).prop_map(|(a, b)| PeopleStep::RemoveFriends(a, b)),
        (someone(), group()).prop_map(|(a, b)| PeopleStep::ReplaceFriends(a, b)),
        (someone(), group()).prop_map(|(a, b)| PeopleStep::PushFriends(a, b)),
        (someone(), prop::option::of(someone())).prop_map(|(a, b)| PeopleStep::SetSpouse(a, b)),
        (someone(), prop::option::of(someone())).prop_map(|(a, b)| PeopleStep::SetMentor(a, b)),
        (someone(), group()).prop_map(|(a, b)| PeopleStep::SetMentees(a, b)),
        someone().prop_map(PeopleStep::Rollback),
    ]
}

type PeopleGraph = Graph<StaticSchema, NullSink>;

fn apply_people_step(graph: &mut PeopleGraph, step: &PeopleStep) {
    match step {
        PeopleStep::AddFriends(a, bs) => graph.add_to_relationship(&person(*a), "friends", people(bs)),
        PeopleStep::RemoveFriends(a, bs) => {
            graph.remove_from_relationship(&person(*a), "friends", people(bs))
        }
        PeopleStep::ReplaceFriends(a, bs) => {
            graph.replace_relationship(&person(*a), "friends", people(bs))
        }
        PeopleStep::PushFriends(a, bs) => {
            graph.push(&person(*a), "friends", many(&people(bs)), false)
        }
        PeopleStep::SetSpouse(a, b) => {
            graph.replace_related_resource(&person(*a), "spouse", b.map(person))
        }
        PeopleStep::SetMentor(a, b) => {
            graph.replace_related_resource(&person(*a), "mentor", b.map(person))
        }
        PeopleStep::SetMentees(a, bs) => graph.set_state(&person(*a), "mentees", people(bs)),
        PeopleStep::Rollback(a) => graph.rollback(&person(*a)),
    }
    .unwrap();
}

fn assert_symmetric(graph: &mut PeopleGraph) -> Result<(), TestCaseError> {
    prop_assert!(graph.verify().is_ok(), "{:?}", graph.verify());
    for n in 0..PEOPLE {
        let me = person(n);
        let spouse = graph.data(&me, "spouse").unwrap().into_keys();
        prop_assert!(spouse.len() <= 1);
        for partner in &spouse {
            let back = graph.data(partner, "spouse").unwrap().into_keys();
            prop_assert_eq!(back, vec![me.clone()]);
        }
        for friend in graph.data(&me, "friends").unwrap().into_keys() {
            let back = graph.data(&friend, "friends").unwrap().into_keys();
            prop_assert!(back.contains(&me));
        }
    }
    Ok(())
}

fn fresh_people_graph() -> PeopleGraph {
    Graph::new(people_schema(), NullSink)
}

proptest! {
    #[test]
    fn inverses_stay_symmetric_on_reflexive_and_cyclic_fixtures(
        steps in prop::collection::vec(people_step(), 1..32)
    ) {
        let mut graph = fresh_people_graph();
        for step in &steps {
            apply_people_step(&mut graph, step);
            assert_symmetric(&mut graph)?;
        }
    }
}

// Pinned seed so a failing symmetry case reproduces identically everywhere.
//
// To explore a different seed locally, set PROPTEST_SEED or change
// `SEED_BYTES` below.
#[test]
fn proptest_seed_pinned_inverse_symmetry() {
    const SEED_BYTES: [u8; 32] = [
        0x42, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0,
    ];

    let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &SEED_BYTES);
    let mut runner = TestRunner::new_with_rng(PropConfig::default(), rng);

    runner
        .run(&prop::collection::vec(people_step(), 1..48), |steps| {
            let mut graph = fresh_people_graph();
            for step in &steps {
                apply_people_step(&mut graph, step);
                assert_symmetric(&mut graph)?;
            }
            Ok(())
        })
        .expect("pinned-seed symmetry run");
}
