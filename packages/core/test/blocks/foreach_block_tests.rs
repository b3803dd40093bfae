//! Repeating Block Tests
//!
//! Keyed reconciliation keeps item instances alive across reorders; unkeyed
//! sequences grow and shrink at the end; the empty placeholder tracks the
//! item count.

#[path = "../util.rs"]
mod util;
use util::{model, numbers, set, strings, Harness, Lcg};

use std::any::Any;

use trellis_core::testing::ProbeClass;
use trellis_core::{el, Object, Rendered, Template, TemplateError, TemplateMap, Value};

/// Content no embed can host.
struct Opaque;

impl Object for Opaque {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn keyed_items() -> TemplateMap {
    TemplateMap::new()
        .with("items", Template::dynamic(|m, _| m.get("items")))
        .with("item_key", Template::dynamic(|item, _| item.clone()))
}

fn keys_in(h: &Harness) -> Vec<String> {
    h.doc
        .find_all(h.root, "li")
        .into_iter()
        .filter_map(|li| h.doc.attribute(li, "data-key"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_keep_item_instances_across_a_reorder() {
        let h = Harness::new();
        let probe = ProbeClass::new("*");
        let m = model().with("items", strings(&["a", "b", "c", "d"])).into_value();
        let mut instance = h.render(
            el("ul").child(
                el("li")
                    .with("foreach", keyed_items())
                    .with("data-key", Template::dynamic(|item, _| item.clone()))
                    .child(probe.template()),
            ),
            m.clone(),
        );
        assert_eq!(keys_in(&h), vec!["a", "b", "c", "d"]);
        let li_b = h.doc.find_all(h.root, "li")[1];

        set(&m, "items", strings(&["a", "c", "d", "b"]));
        instance.update().unwrap();
        assert_eq!(keys_in(&h), vec!["a", "c", "d", "b"]);
        assert_eq!(h.doc.find_all(h.root, "li")[3], li_b);
        assert_eq!(probe.created(), 4);
        assert_eq!(probe.destroyed(), 0);
        assert_eq!(probe.mounted(), 4);
    }

    #[test]
    fn should_write_nothing_for_an_unchanged_sequence() {
        let h = Harness::new();
        let m = model().with("items", strings(&["a", "b"])).into_value();
        let mut instance = h.render(
            el("ul").child(
                el("li")
                    .with("foreach", keyed_items())
                    .with("data-key", Template::dynamic(|item, _| item.clone())),
            ),
            m.clone(),
        );
        h.doc.reset_writes();
        set(&m, "items", strings(&["a", "b"]));
        instance.update().unwrap();
        assert_eq!(h.doc.writes(), 0);
    }

    #[test]
    fn should_reuse_a_removed_item_for_an_adjacent_insert() {
        let h = Harness::new();
        let probe = ProbeClass::new("*");
        let m = model().with("items", strings(&["a", "b"])).into_value();
        let mut instance = h.render(
            el("ul").child(
                el("li")
                    .with("foreach", keyed_items())
                    .with("data-key", Template::dynamic(|item, _| item.clone()))
                    .child(probe.template()),
            ),
            m.clone(),
        );
        set(&m, "items", strings(&["a", "x"]));
        instance.update().unwrap();
        assert_eq!(keys_in(&h), vec!["a", "x"]);
        assert_eq!(probe.created(), 2);
        assert_eq!(probe.destroyed(), 0);
    }

    #[test]
    fn should_destroy_removed_items() {
        let h = Harness::new();
        let probe = ProbeClass::new("*");
        let m = model().with("items", strings(&["a", "b", "c"])).into_value();
        let mut instance = h.render(
            el("ul").child(
                el("li")
                    .with("foreach", keyed_items())
                    .with("data-key", Template::dynamic(|item, _| item.clone()))
                    .child(probe.template()),
            ),
            m.clone(),
        );
        set(&m, "items", strings(&["c"]));
        instance.update().unwrap();
        assert_eq!(keys_in(&h), vec!["c"]);
        assert_eq!(probe.alive(), 1);
        assert_eq!(probe.mounted(), 1);
    }

    #[test]
    fn should_patch_indexes_after_a_move() {
        let h = Harness::new();
        let m = model().with("items", strings(&["a", "b", "c"])).into_value();
        let mut instance = h.render(
            el("ol").child(
                el("li")
                    .with("foreach", keyed_items())
                    .with("data-key", Template::dynamic(|item, _| item.clone()))
                    .with("text", Template::dynamic(|_, ctx| ctx.index())),
            ),
            m.clone(),
        );
        assert_eq!(h.text(), "012");

        set(&m, "items", strings(&["c", "a", "b"]));
        instance.update().unwrap();
        assert_eq!(keys_in(&h), vec!["c", "a", "b"]);
        assert_eq!(h.text(), "012");
    }

    #[test]
    fn should_grow_and_shrink_unkeyed_items_at_the_end() {
        let h = Harness::new();
        let m = model().with("items", strings(&["a", "b"])).into_value();
        let mut instance = h.render(
            el("ul").child(
                el("li")
                    .with("foreach", Template::dynamic(|m, _| m.get("items")))
                    .with("text", Template::dynamic(|item, _| item.clone())),
            ),
            m.clone(),
        );
        assert_eq!(h.text(), "ab");

        set(&m, "items", strings(&["a", "b", "c"]));
        instance.update().unwrap();
        assert_eq!(h.text(), "abc");

        set(&m, "items", strings(&["x"]));
        instance.update().unwrap();
        assert_eq!(h.text(), "x");
        assert_eq!(h.doc.find_all(h.root, "li").len(), 1);
    }

    #[test]
    fn should_filter_items_by_condition() {
        let h = Harness::new();
        let m = model().with("items", numbers(&[1, 2, 3, 4])).into_value();
        let _instance = h.render(
            el("ul").child(
                el("li")
                    .with(
                        "foreach",
                        TemplateMap::new()
                            .with("items", Template::dynamic(|m, _| m.get("items")))
                            .with(
                                "condition",
                                Template::dynamic(|item, _| {
                                    item.as_number().map_or(false, |n| n % 2.0 == 0.0)
                                }),
                            ),
                    )
                    .with("text", Template::dynamic(|item, _| item.clone())),
            ),
            m,
        );
        assert_eq!(h.text(), "24");
    }

    #[test]
    fn should_show_the_placeholder_only_while_empty() {
        let h = Harness::new();
        let empty = ProbeClass::new("none");
        let m = model().with("items", strings(&[])).into_value();
        let mut instance = h.render(
            el("ul").child(
                el("li")
                    .with(
                        "foreach",
                        TemplateMap::new()
                            .with("items", Template::dynamic(|m, _| m.get("items")))
                            .with("empty", empty.template()),
                    )
                    .with("text", Template::dynamic(|item, _| item.clone())),
            ),
            m.clone(),
        );
        assert_eq!(h.text(), "none");
        assert_eq!(empty.mounted(), 1);

        set(&m, "items", strings(&["a"]));
        instance.update().unwrap();
        assert_eq!(h.text(), "a");
        assert_eq!(empty.destroyed(), 1);

        set(&m, "items", Value::Null);
        instance.update().unwrap();
        assert_eq!(h.text(), "none");
        assert_eq!(empty.created(), 2);
        assert_eq!(h.html(), "<ul>none</ul>");
    }

    #[test]
    fn should_rebuild_nested_repeats_when_their_branch_toggles() {
        let h = Harness::new();
        let probe = ProbeClass::new("*");
        let m = model()
            .with("show", true)
            .with("items", numbers(&[1, 2, 3]))
            .into_value();
        let mut instance = h.render(
            el("div").child(
                el("section")
                    .with("if", Template::dynamic(|m, _| m.get("show")))
                    .child(
                        el("span")
                            .with("foreach", Template::dynamic(|m, _| m.get("items")))
                            .child(probe.template()),
                    ),
            ),
            m.clone(),
        );
        assert_eq!(probe.alive(), 3);

        set(&m, "show", false);
        instance.update().unwrap();
        assert_eq!(probe.alive(), 0);
        assert_eq!(h.html(), "<div></div>");

        set(&m, "show", true);
        instance.update().unwrap();
        assert_eq!(probe.created(), 6);
        assert_eq!(probe.alive(), 3);
        assert_eq!(h.doc.find_all(h.root, "span").len(), 3);
    }

    #[test]
    fn should_reject_items_that_are_not_a_list() {
        let h = Harness::new();
        let compiled = h.compile(
            el("ul").child(el("li").with("foreach", Template::dynamic(|m, _| m.get("items")))),
        );
        let m = model().with("items", 5).into_value();
        let err = compiled.create(&h.env, m).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidValue { ref key, .. } if key == "items"));
    }

    #[test]
    fn should_track_random_reorders() {
        let h = Harness::new();
        let probe = ProbeClass::new("*");
        let mut rng = Lcg::new(42);
        let alphabet = ["a", "b", "c", "d", "e", "f", "g", "h"];
        let m = model().with("items", strings(&alphabet)).into_value();
        let mut instance = h.render(
            el("ul").child(
                el("li")
                    .with("foreach", keyed_items())
                    .with("data-key", Template::dynamic(|item, _| item.clone()))
                    .child(probe.template()),
            ),
            m.clone(),
        );

        for _ in 0..50 {
            let mut next: Vec<&str> = alphabet
                .iter()
                .copied()
                .filter(|_| rng.below(3) != 0)
                .collect();
            for i in (1..next.len()).rev() {
                let j = rng.below(i + 1);
                next.swap(i, j);
            }
            set(&m, "items", strings(&next));
            instance.update().unwrap();
            assert_eq!(keys_in(&h), next);
            assert_eq!(probe.alive(), next.len());
            assert_eq!(probe.mounted(), next.len());
        }
    }

    #[test]
    fn should_destroy_every_item_with_the_block() {
        let h = Harness::new();
        let probe = ProbeClass::new("*");
        let m = model().with("items", numbers(&[1, 2])).into_value();
        let mut instance = h.render(
            el("ul").child(
                el("li")
                    .with("foreach", Template::dynamic(|m, _| m.get("items")))
                    .child(probe.template()),
            ),
            m,
        );
        instance.destroy();
        assert_eq!(probe.destroyed(), 2);
    }

    #[test]
    fn should_destroy_detached_items_when_an_update_fails() {
        let h = Harness::new();
        let probe = ProbeClass::new("*");
        let m = model().with("items", strings(&["a", "b", "c", "d"])).into_value();
        let mut instance = h.render(
            el("ul").child(
                el("li")
                    .with("foreach", keyed_items())
                    .with("data-key", Template::dynamic(|item, _| item.clone()))
                    .child(el("span").with(
                        "embed",
                        Template::dynamic(|item, _| match item.as_str() {
                            Some("x") => Value::object(Opaque),
                            _ => item.clone(),
                        }),
                    ))
                    .child(probe.template()),
            ),
            m.clone(),
        );
        assert_eq!(probe.alive(), 4);

        set(&m, "items", strings(&["d", "c", "x"]));
        assert!(matches!(
            instance.update(),
            Err(TemplateError::UnsupportedContent(_))
        ));
        assert_eq!(probe.alive(), probe.mounted());

        set(&m, "items", strings(&["a"]));
        instance.update().unwrap();
        assert_eq!(keys_in(&h), vec!["a"]);
        assert_eq!(probe.alive(), 1);
        assert_eq!(probe.mounted(), 1);
    }
}
