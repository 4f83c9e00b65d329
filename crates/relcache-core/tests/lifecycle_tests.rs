// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Identity merges, unload, deletion, and rollback.

use relcache_core::{EdgeData, IdentityRegistry, Operation};
use relcache_dry_tests::{blog_schema, library_schema, many, one, KeyFactory};

mod common;
use common::{graph, members, notified, notified_sorted};

// ── merge-identifier ───────────────────────────────────────────────────

#[test]
fn merge_relabels_in_place_without_notifying() {
    let mut keys = KeyFactory::new();
    let post = keys.key("post", "1").unwrap();
    let c1 = keys.key("comment", "1").unwrap();
    let c9 = keys.key("comment", "9").unwrap();
    let c2 = keys.key("comment", "2").unwrap();
    let created = keys.new_key("comment").unwrap();
    let mut graph = graph(blog_schema());

    graph
        .push(&post, "comments", many(&[c1.clone(), c9.clone(), c2.clone()]), false)
        .unwrap();
    notified(&mut graph);

    let outcome = keys.registry().update_id(&created, "9").unwrap().unwrap();
    assert_eq!(outcome.kept, created);
    assert_eq!(outcome.abandoned, c9);
    graph.merge_identifiers(&outcome).unwrap();

    assert_eq!(
        members(&mut graph, &post, "comments"),
        vec![c1, created.clone(), c2]
    );
    assert_eq!(
        graph.data(&created, "post").unwrap(),
        EdgeData::One(Some(post))
    );
    assert!(graph.edge(&c9, "post").is_none());
    assert!(notified(&mut graph).is_empty());
    graph.verify().unwrap();
}

#[test]
fn merge_notifies_edges_whose_overlay_referenced_the_old_identity() {
    let mut keys = KeyFactory::new();
    let post = keys.key("post", "1").unwrap();
    let c9 = keys.key("comment", "9").unwrap();
    let created = keys.new_key("comment").unwrap();
    let mut graph = graph(blog_schema());

    graph
        .add_to_relationship(&post, "comments", vec![c9.clone()])
        .unwrap();
    notified(&mut graph);

    let outcome = keys.registry().update_id(&created, "9").unwrap().unwrap();
    graph
        .update(Operation::MergeIdentifiers(outcome), false)
        .unwrap();

    let changes = graph.get_changes(&post, "comments").unwrap();
    assert_eq!(changes.additions, vec![created.clone()]);
    assert_eq!(notified(&mut graph), vec!["post:1.comments"]);
    graph.verify().unwrap();
}

#[test]
fn merge_relabels_inverse_less_references() {
    let mut keys = KeyFactory::new();
    let post = keys.key("post", "1").unwrap();
    let t7 = keys.key("tag", "7").unwrap();
    let created = keys.new_key("tag").unwrap();
    let mut graph = graph(blog_schema());

    graph.push(&post, "tags", many(&[t7.clone()]), false).unwrap();

    let outcome = keys.registry().update_id(&created, "7").unwrap().unwrap();
    graph.merge_identifiers(&outcome).unwrap();
    assert_eq!(members(&mut graph, &post, "tags"), vec![created.clone()]);

    // The reverse index now tracks the kept identity.
    graph.unload(&created).unwrap();
    assert!(members(&mut graph, &post, "tags").is_empty());
}

#[test]
fn assigning_a_fresh_id_needs_no_merge() {
    let mut keys = KeyFactory::new();
    let created = keys.new_key("comment").unwrap();
    assert!(keys.registry().update_id(&created, "3").unwrap().is_none());
    assert_eq!(created.to_string(), "comment:3");
    assert!(!created.is_new());
}

// ── unload ─────────────────────────────────────────────────────────────

#[test]
fn unloading_drops_the_resource_from_sync_partners() {
    let mut keys = KeyFactory::new();
    let post = keys.key("post", "1").unwrap();
    let c = keys.keys("comment", 2).unwrap();
    let mut graph = graph(blog_schema());

    graph.push(&post, "comments", many(&c), false).unwrap();
    notified(&mut graph);
    let before = graph.edge_count();

    graph.unload(&c[0]).unwrap();

    assert_eq!(members(&mut graph, &post, "comments"), vec![c[1].clone()]);
    assert!(graph.edge(&c[0], "post").is_none());
    assert_eq!(graph.edge_count(), before - 1);
    assert_eq!(notified(&mut graph), vec!["post:1.comments"]);
}

#[test]
fn unloading_dematerializes_async_partners() {
    let mut keys = KeyFactory::new();
    let author = keys.key("author", "1").unwrap();
    let book = keys.key("book", "1").unwrap();
    let mut graph = graph(library_schema());

    graph.push(&author, "books", many(&[book.clone()]), false).unwrap();
    notified(&mut graph);

    graph.unload(&book).unwrap();

    let view = graph.get_relationship(&author, "books").unwrap();
    assert_eq!(view.data, Some(EdgeData::Many(vec![book])));
    assert!(view.state.has_dematerialized_inverse);
    assert!(view.needs_fetch());
    assert_eq!(notified(&mut graph), vec!["author:1.books"]);
}

#[test]
fn unloading_a_new_resource_drops_it_even_from_async_partners() {
    let mut keys = KeyFactory::new();
    let author = keys.key("author", "1").unwrap();
    let draft = keys.new_key("book").unwrap();
    let mut graph = graph(library_schema());

    graph
        .add_to_relationship(&author, "books", vec![draft.clone()])
        .unwrap();
    graph.unload(&draft).unwrap();

    assert!(members(&mut graph, &author, "books").is_empty());
    assert!(!graph
        .get_relationship(&author, "books")
        .unwrap()
        .state
        .has_dematerialized_inverse);
}

#[test]
fn unloading_a_target_of_an_inverse_less_relationship_drops_it() {
    let mut keys = KeyFactory::new();
    let post = keys.key("post", "1").unwrap();
    let tags = keys.keys("tag", 2).unwrap();
    let mut graph = graph(blog_schema());

    graph.push(&post, "tags", many(&tags), false).unwrap();
    notified(&mut graph);

    graph.unload(&tags[0]).unwrap();

    assert_eq!(members(&mut graph, &post, "tags"), vec![tags[1].clone()]);
    assert_eq!(notified(&mut graph), vec!["post:1.tags"]);
}

// ── deletion ───────────────────────────────────────────────────────────

#[test]
fn commit_deletion_detaches_from_every_partner() {
    let mut keys = KeyFactory::new();
    let post = keys.key("post", "1").unwrap();
    let comment = keys.key("comment", "1").unwrap();
    let user = keys.key("user", "1").unwrap();
    let mut graph = graph(blog_schema());

    graph.push(&comment, "post", one(&post), false).unwrap();
    graph.push(&comment, "flagged_by", one(&user), false).unwrap();
    notified(&mut graph);

    graph.commit_deletion(&comment).unwrap();

    assert!(members(&mut graph, &post, "comments").is_empty());
    assert_eq!(graph.data(&comment, "post").unwrap(), EdgeData::One(None));
    assert_eq!(
        graph.data(&comment, "flagged_by").unwrap(),
        EdgeData::One(None)
    );
    assert!(graph.edge(&comment, "post").is_some());
    assert_eq!(
        notified_sorted(&mut graph),
        vec!["comment:1.flagged_by", "comment:1.post", "post:1.comments"]
    );
}

#[test]
fn delete_record_operation_includes_local_additions() {
    let mut keys = KeyFactory::new();
    let posts = keys.keys("post", 2).unwrap();
    let mut graph = graph(blog_schema());
    let comments = keys.keys("comment", 2).unwrap();

    graph.push(&posts[0], "comments", many(&comments), false).unwrap();
    graph
        .add_to_relationship(&posts[1], "comments", vec![comments[0].clone()])
        .unwrap();

    graph
        .update(Operation::DeleteRecord { key: comments[0].clone() }, true)
        .unwrap();

    assert_eq!(
        members(&mut graph, &posts[0], "comments"),
        vec![comments[1].clone()]
    );
    assert!(members(&mut graph, &posts[1], "comments").is_empty());
    graph.verify().unwrap();
}

// ── rollback ───────────────────────────────────────────────────────────

#[test]
fn rolling_back_a_to_many_restores_remote_state_on_both_sides() {
    let mut keys = KeyFactory::new();
    let post = keys.key("post", "1").unwrap();
    let c = keys.keys("comment", 3).unwrap();
    let mut graph = graph(blog_schema());

    graph
        .push(&post, "comments", many(&c[..2]), false)
        .unwrap();
    graph
        .remove_from_relationship(&post, "comments", vec![c[0].clone()])
        .unwrap();
    graph
        .add_to_relationship(&post, "comments", vec![c[2].clone()])
        .unwrap();
    assert!(graph.is_dirty(&c[0], "post"));
    notified(&mut graph);

    graph.rollback_relationship(&post, "comments").unwrap();

    assert_eq!(members(&mut graph, &post, "comments"), c[..2].to_vec());
    assert!(!graph.is_dirty(&post, "comments"));
    assert_eq!(
        graph.data(&c[0], "post").unwrap(),
        EdgeData::One(Some(post.clone()))
    );
    assert!(!graph.is_dirty(&c[0], "post"));
    assert_eq!(graph.data(&c[2], "post").unwrap(), EdgeData::One(None));
    assert_eq!(
        notified_sorted(&mut graph),
        vec!["comment:1.post", "comment:3.post", "post:1.comments"]
    );
    graph.verify().unwrap();
}

#[test]
fn rolling_back_a_resource_restores_its_to_one() {
    let mut keys = KeyFactory::new();
    let posts = keys.keys("post", 2).unwrap();
    let comment = keys.key("comment", "1").unwrap();
    let mut graph = graph(blog_schema());

    graph.push(&comment, "post", one(&posts[0]), false).unwrap();
    graph
        .replace_related_resource(&comment, "post", Some(posts[1].clone()))
        .unwrap();
    assert!(members(&mut graph, &posts[0], "comments").is_empty());

    graph.rollback(&comment).unwrap();

    assert_eq!(
        graph.data(&comment, "post").unwrap(),
        EdgeData::One(Some(posts[0].clone()))
    );
    assert_eq!(
        members(&mut graph, &posts[0], "comments"),
        vec![comment.clone()]
    );
    assert!(members(&mut graph, &posts[1], "comments").is_empty());
    assert!(!graph.is_dirty(&posts[0], "comments"));
    assert!(!graph.is_dirty(&posts[1], "comments"));
    graph.verify().unwrap();
}

#[test]
fn rolling_back_a_clean_edge_is_silent() {
    let mut keys = KeyFactory::new();
    let post = keys.key("post", "1").unwrap();
    let tag = keys.key("tag", "1").unwrap();
    let mut graph = graph(blog_schema());

    graph.push(&post, "tags", many(&[tag]), false).unwrap();
    notified(&mut graph);
    graph.rollback_relationship(&post, "tags").unwrap();
    graph.rollback(&post).unwrap();

    assert!(notified(&mut graph).is_empty());
    assert!(graph.rollback_relationship(&post, "likes").is_err());
}

#[test]
fn rolling_back_a_move_returns_the_member_to_its_previous_owner() {
    let mut keys = KeyFactory::new();
    let posts = keys.keys("post", 2).unwrap();
    let comment = keys.key("comment", "1").unwrap();
    let mut graph = graph(blog_schema());

    graph
        .push(&posts[0], "comments", many(&[comment.clone()]), false)
        .unwrap();
    graph
        .add_to_relationship(&posts[1], "comments", vec![comment.clone()])
        .unwrap();
    assert!(members(&mut graph, &posts[0], "comments").is_empty());
    notified(&mut graph);

    graph.rollback(&posts[1]).unwrap();

    assert_eq!(
        graph.data(&comment, "post").unwrap(),
        EdgeData::One(Some(posts[0].clone()))
    );
    assert_eq!(
        members(&mut graph, &posts[0], "comments"),
        vec![comment.clone()]
    );
    assert!(members(&mut graph, &posts[1], "comments").is_empty());
    assert!(!graph.is_dirty(&comment, "post"));
    assert!(!graph.is_dirty(&posts[0], "comments"));
    assert!(!graph.is_dirty(&posts[1], "comments"));
    assert_eq!(
        notified_sorted(&mut graph),
        vec!["comment:1.post", "post:1.comments", "post:2.comments"]
    );
    graph.verify().unwrap();
}
