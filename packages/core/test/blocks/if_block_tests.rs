//! Conditional Block Tests
//!
//! Branch selection, in-place updates, keyed rebuilds and swaps through
//! manually driven transitions.

#[path = "../util.rs"]
mod util;
use util::{model, set, Harness};

use trellis_core::blocks::IfBlockClass;
use trellis_core::testing::{ProbeClass, TransitionRecorder};
use trellis_core::{el, Rendered, Template, TemplateMap, Value};

fn sign(m: &Value) -> f64 {
    m.get("x").as_number().unwrap_or(0.0)
}

/// A conditional authored directly, with a transition and a single branch.
fn toggled(recorder: &TransitionRecorder) -> TemplateMap {
    let branch = TemplateMap::new()
        .with("condition", Template::dynamic(|m, _| m.get("on")))
        .with("template", el("p").child("on"));
    el("div").child(
        TemplateMap::new()
            .with("type", Template::integrated(IfBlockClass))
            .with("branches", vec![Template::from(branch)])
            .with("transition", Template::transition(recorder.factory())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_show_exactly_one_branch_of_a_chain() {
        let h = Harness::new();
        let neg = ProbeClass::new("neg");
        let zero = ProbeClass::new("zero");
        let pos = ProbeClass::new("pos");
        let m = model().with("x", 5).into_value();
        let mut instance = h.render(
            el("div")
                .child(neg.node().with("if", Template::dynamic(|m, _| sign(m) < 0.0)))
                .child(zero.node().with("elseif", Template::dynamic(|m, _| sign(m) == 0.0)))
                .child(pos.node().with("else", true)),
            m.clone(),
        );
        assert_eq!(h.text(), "pos");

        let steps = [(0, "zero"), (-3, "neg"), (0, "zero")];
        for (x, shown) in steps {
            set(&m, "x", x);
            instance.update().unwrap();
            assert_eq!(h.text(), shown);
            assert_eq!(neg.alive() + zero.alive() + pos.alive(), 1);
        }
        assert_eq!((neg.created(), zero.created(), pos.created()), (1, 2, 1));
        assert_eq!((neg.destroyed(), zero.destroyed(), pos.destroyed()), (1, 1, 1));
    }

    #[test]
    fn should_not_need_a_sentinel_when_every_branch_has_one_root() {
        let h = Harness::new();
        let m = model().with("a", true).into_value();
        let _instance = h.render(
            el("div")
                .child(el("b").with("if", Template::dynamic(|m, _| m.get("a"))))
                .child(el("i").with("else", true)),
            m,
        );
        assert_eq!(h.raw_html(), "<div><b></b></div>");
    }

    #[test]
    fn should_update_the_active_branch_in_place() {
        let h = Harness::new();
        let probe = ProbeClass::new("probe");
        let m = model().with("show", true).with("name", "a").into_value();
        let mut instance = h.render(
            el("section").child(
                el("p")
                    .with("if", Template::dynamic(|m, _| m.get("show")))
                    .child(probe.template())
                    .child(Template::dynamic(|m, _| m.get("name"))),
            ),
            m.clone(),
        );
        assert_eq!(h.html(), "<section><p>probea</p></section>");

        set(&m, "name", "b");
        instance.update().unwrap();
        assert_eq!(h.html(), "<section><p>probeb</p></section>");
        assert_eq!(probe.created(), 1);

        set(&m, "show", false);
        instance.update().unwrap();
        assert_eq!(h.html(), "<section></section>");
        assert_eq!(probe.destroyed(), 1);
    }

    #[test]
    fn should_keep_multi_root_branches_in_place_between_siblings() {
        let h = Harness::new();
        let m = model().with("show", true).into_value();
        let mut instance = h.render(
            el("div")
                .child(el("h1"))
                .child(
                    TemplateMap::new()
                        .with("if", Template::dynamic(|m, _| m.get("show")))
                        .child(el("a"))
                        .child(el("b")),
                )
                .child(el("footer")),
            m.clone(),
        );
        let div = h.doc.find(h.root, "div").unwrap();
        assert_eq!(h.doc.element_tags(div), vec!["h1", "a", "b", "footer"]);

        set(&m, "show", false);
        instance.update().unwrap();
        assert_eq!(h.doc.element_tags(div), vec!["h1", "footer"]);

        set(&m, "show", true);
        instance.update().unwrap();
        assert_eq!(h.doc.element_tags(div), vec!["h1", "a", "b", "footer"]);
    }

    #[test]
    fn should_rebuild_when_the_key_changes() {
        let h = Harness::new();
        let probe = ProbeClass::new("p");
        let branch = TemplateMap::new().with("template", probe.template());
        let m = model().with("id", 1).into_value();
        let mut instance = h.render(
            TemplateMap::new()
                .with("type", Template::integrated(IfBlockClass))
                .with("branches", vec![Template::from(branch)])
                .with("key", Template::dynamic(|m, _| m.get("id"))),
            m.clone(),
        );
        instance.update().unwrap();
        assert_eq!(probe.created(), 1);

        set(&m, "id", 2);
        instance.update().unwrap();
        assert_eq!(probe.created(), 2);
        assert_eq!(probe.alive(), 1);
        assert_eq!(h.text(), "p");
    }

    #[test]
    fn should_splice_only_when_the_transition_calls_back() {
        let h = Harness::new();
        let recorder = TransitionRecorder::new();
        let m = model().with("on", true).into_value();
        let mut instance = h.render(toggled(&recorder), m.clone());
        assert_eq!(h.raw_html(), "<div><!--if--><p>on</p></div>");
        assert_eq!(recorder.count(), 0);

        set(&m, "on", false);
        instance.update().unwrap();
        let leaving = recorder.last().unwrap();
        assert!(leaving.is_started());
        assert_eq!(leaving.leaving().len(), 1);
        assert!(leaving.entering().is_empty());
        assert_eq!(h.raw_html(), "<div><!--if--><p>on</p></div>");

        leaving.fire_leave();
        assert_eq!(h.raw_html(), "<div><!--if--></div>");
        leaving.fire_enter();
        assert!(!leaving.is_pending());
        assert_eq!(h.raw_html(), "<div><!--if--></div>");
    }

    #[test]
    fn should_finish_a_pending_swap_before_starting_another() {
        let h = Harness::new();
        let recorder = TransitionRecorder::new();
        let m = model().with("on", false).into_value();
        let mut instance = h.render(toggled(&recorder), m.clone());
        assert_eq!(h.raw_html(), "<div><!--if--></div>");

        set(&m, "on", true);
        instance.update().unwrap();
        let entering = recorder.last().unwrap();
        assert_eq!(h.raw_html(), "<div><!--if--></div>");

        set(&m, "on", false);
        instance.update().unwrap();
        assert!(entering.is_finished());
        assert_eq!(recorder.count(), 2);
        // the forced enter landed; the new leave is still waiting
        assert_eq!(h.raw_html(), "<div><!--if--><p>on</p></div>");

        let leaving = recorder.last().unwrap();
        leaving.fire_enter();
        leaving.fire_leave();
        assert_eq!(h.raw_html(), "<div><!--if--></div>");
    }

    #[test]
    fn should_swap_without_transitions_before_mounting() {
        let h = Harness::new();
        let recorder = TransitionRecorder::new();
        let m = model().with("on", false).into_value();
        let compiled = h.compile(toggled(&recorder));
        let mut instance = compiled.create(&h.env, m.clone()).unwrap();
        set(&m, "on", true);
        instance.update().unwrap();
        assert_eq!(recorder.count(), 0);
        let div = instance.root_nodes()[0];
        assert_eq!(h.doc.inner_html(div), "<!--if--><p>on</p>");
    }

    #[test]
    fn should_destroy_the_shown_branch_with_its_instance() {
        let h = Harness::new();
        let probe = ProbeClass::new("p");
        let mut instance = h.render(
            el("div").child(probe.node().with("if", true)),
            Value::Null,
        );
        assert_eq!(probe.mounted(), 1);
        instance.destroy();
        assert_eq!(probe.destroyed(), 1);
        assert_eq!(probe.mounted(), 0);
    }
}
