// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Schema fixtures.
//!
//! Each fixture covers one shape of relationship graph:
//!
//! - [`blog_schema`]: one-to-many with an inverse, plus an inverse-less
//!   to-many (`post.tags`) and an inverse-less to-one (`comment.flagged_by`).
//! - [`people_schema`]: reflexive to-one (`person.spouse`) and reflexive
//!   many-to-many (`person.friends`), plus a non-reflexive self-referencing
//!   pair (`person.mentor` / `person.mentees`).
//! - [`canvas_schema`]: polymorphic to-many (`canvas.shapes`) over the base
//!   type `shape` with subtypes `circle` and `square`; `sticker` is not a
//!   shape.
//! - [`library_schema`]: async relationships (`author.books`,
//!   `book.author`) and a sync one (`book.shelf`).

use relcache_core::{RelationshipDefinition, StaticSchema};

/// `post.comments` ↔ `comment.post`; `post.tags` and `comment.flagged_by`
/// have no inverse.
pub fn blog_schema() -> StaticSchema {
    StaticSchema::builder()
        .relationship(
            "post",
            RelationshipDefinition::to_many("comments", "comment").inverse("post"),
        )
        .relationship(
            "comment",
            RelationshipDefinition::to_one("post", "post").inverse("comments"),
        )
        .relationship("post", RelationshipDefinition::to_many("tags", "tag").no_inverse())
        .relationship(
            "comment",
            RelationshipDefinition::to_one("flagged_by", "user").no_inverse(),
        )
        .resource("tag")
        .resource("user")
        .build()
}

/// Reflexive and self-referencing relationships on `person`.
pub fn people_schema() -> StaticSchema {
    StaticSchema::builder()
        .relationship(
            "person",
            RelationshipDefinition::to_one("spouse", "person").inverse("spouse"),
        )
        .relationship(
            "person",
            RelationshipDefinition::to_many("friends", "person").inverse("friends"),
        )
        .relationship(
            "person",
            RelationshipDefinition::to_one("mentor", "person").inverse("mentees"),
        )
        .relationship(
            "person",
            RelationshipDefinition::to_many("mentees", "person").inverse("mentor"),
        )
        .build()
}

/// Polymorphic `canvas.shapes` ↔ `shape.canvas`.
pub fn canvas_schema() -> StaticSchema {
    StaticSchema::builder()
        .relationship(
            "canvas",
            RelationshipDefinition::to_many("shapes", "shape")
                .inverse("canvas")
                .polymorphic(),
        )
        .relationship(
            "shape",
            RelationshipDefinition::to_one("canvas", "canvas").inverse("shapes"),
        )
        .subtype("shape", "circle")
        .subtype("shape", "square")
        .resource("sticker")
        .build()
}

/// Async `author.books` ↔ `book.author`; sync `book.shelf` ↔ `shelf.books`.
pub fn library_schema() -> StaticSchema {
    StaticSchema::builder()
        .relationship(
            "author",
            RelationshipDefinition::to_many("books", "book")
                .inverse("author")
                .asynchronous(),
        )
        .relationship(
            "book",
            RelationshipDefinition::to_one("author", "author")
                .inverse("books")
                .asynchronous(),
        )
        .relationship(
            "book",
            RelationshipDefinition::to_one("shelf", "shelf").inverse("books"),
        )
        .relationship(
            "shelf",
            RelationshipDefinition::to_many("books", "book").inverse("shelf"),
        )
        .build()
}
