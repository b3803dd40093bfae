//! Content-Embedding Block Tests
//!
//! Hosting markup, text, bare nodes and rendered instances between sentinels,
//! with placeholders and ownership of embedded instances.

#[path = "../util.rs"]
mod util;
use util::{model, set, Harness};

use std::any::Any;

use trellis_core::testing::{ProbeClass, TransitionRecorder};
use trellis_core::{
    el, Html, Object, Rendered, RenderedRef, Renderer, Template, TemplateError, TemplateMap, Value,
};

/// An object that only knows how to render itself as markup.
struct Badge(&'static str);

impl Object for Badge {
    fn render(&self) -> Option<Html> {
        Some(Html::new(format!("<em>{}</em>", self.0)))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// An object with nothing to show.
struct Opaque;

impl Object for Opaque {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn body() -> Template {
    Template::dynamic(|m, _| m.get("body"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_embed_markup_between_sentinels() {
        let h = Harness::new();
        let m = model().with("body", Value::html("<b>x</b>")).into_value();
        let _instance = h.render(el("div").with("embed", body()), m);
        assert_eq!(h.raw_html(), "<div><!--embed--><b>x</b><!--/embed--></div>");
    }

    #[test]
    fn should_ignore_equal_content() {
        let h = Harness::new();
        let m = model().with("body", Value::html("<b>x</b>")).into_value();
        let mut instance = h.render(el("div").with("embed", body()), m.clone());
        let bold = h.doc.find(h.root, "b").unwrap();

        h.doc.reset_writes();
        set(&m, "body", Value::html("<b>x</b>"));
        instance.update().unwrap();
        assert_eq!(h.doc.writes(), 0);
        assert_eq!(h.doc.find(h.root, "b"), Some(bold));
    }

    #[test]
    fn should_replace_content_when_it_changes() {
        let h = Harness::new();
        let m = model().with("body", "plain").into_value();
        let mut instance = h.render(el("div").with("embed", body()), m.clone());
        assert_eq!(h.html(), "<div>plain</div>");

        set(&m, "body", Value::html("<i>rich</i>"));
        instance.update().unwrap();
        assert_eq!(h.html(), "<div><i>rich</i></div>");

        set(&m, "body", 42);
        instance.update().unwrap();
        assert_eq!(h.html(), "<div>42</div>");
    }

    #[test]
    fn should_swap_the_placeholder_in_and_out() {
        let h = Harness::new();
        let placeholder = ProbeClass::new("loading");
        let m = model().with("body", Value::html("<i>a</i>")).into_value();
        let mut instance = h.render(
            el("div").with(
                "embed",
                TemplateMap::new()
                    .with("content", body())
                    .with("placeholder", placeholder.template()),
            ),
            m.clone(),
        );
        assert_eq!(placeholder.created(), 0);

        set(&m, "body", Value::Undefined);
        instance.update().unwrap();
        assert_eq!(h.html(), "<div>loading</div>");
        assert_eq!(placeholder.mounted(), 1);

        // nullish over nullish keeps the placeholder
        set(&m, "body", Value::Null);
        instance.update().unwrap();
        assert_eq!(placeholder.created(), 1);

        set(&m, "body", Value::html("<i>a</i>"));
        instance.update().unwrap();
        assert_eq!(h.html(), "<div><i>a</i></div>");
        assert_eq!(placeholder.destroyed(), 1);
        assert_eq!(h.doc.find_all(h.root, "i").len(), 1);
    }

    #[test]
    fn should_embed_bare_nodes() {
        let h = Harness::new();
        let node = h.doc.create_element("hr");
        let m = model().with("body", Value::Node(node)).into_value();
        let mut instance = h.render(el("div").with("embed", body()), m.clone());
        assert_eq!(h.html(), "<div><hr></div>");

        set(&m, "body", Value::Undefined);
        instance.update().unwrap();
        assert_eq!(h.html(), "<div></div>");
        assert_eq!(h.doc.parent(node), None);
    }

    #[test]
    fn should_render_objects_that_render_themselves() {
        let h = Harness::new();
        let m = model().with("body", Value::object(Badge("new"))).into_value();
        let _instance = h.render(el("p").with("embed", body()), m);
        assert_eq!(h.html(), "<p><em>new</em></p>");
    }

    #[test]
    fn should_reject_content_it_cannot_host() {
        let h = Harness::new();
        let compiled = h.compile(el("p").with("embed", body()));
        let m = model().with("body", Value::object(Opaque)).into_value();
        assert!(matches!(
            compiled.create(&h.env, m),
            Err(TemplateError::UnsupportedContent(_))
        ));
    }

    #[test]
    fn should_destroy_owned_instances_when_replaced() {
        let h = Harness::new();
        let inner = h.compile(el("span").child("inner"));
        let embedded = RenderedRef::new(inner.create(&h.env, Value::Null).unwrap());
        let m = model().with("body", Value::Instance(embedded.clone())).into_value();
        let mut instance = h.render(el("div").with("embed", body()), m.clone());
        assert_eq!(h.html(), "<div><span>inner</span></div>");

        set(&m, "body", Value::Undefined);
        instance.update().unwrap();
        assert_eq!(h.html(), "<div></div>");
        assert!(embedded.root_nodes().is_empty());
    }

    #[test]
    fn should_leave_borrowed_instances_alive() {
        let h = Harness::new();
        let inner = h.compile(el("span").child("inner"));
        let embedded = RenderedRef::new(inner.create(&h.env, Value::Null).unwrap());
        let m = model().with("body", Value::Instance(embedded.clone())).into_value();
        let mut instance = h.render(
            el("div").with(
                "embed",
                TemplateMap::new()
                    .with("content", body())
                    .with("owns_content", false),
            ),
            m.clone(),
        );
        set(&m, "body", Value::Undefined);
        instance.update().unwrap();
        assert_eq!(h.html(), "<div></div>");
        assert_eq!(embedded.root_nodes().len(), 1);

        instance.destroy();
        assert_eq!(embedded.root_nodes().len(), 1);
    }

    #[test]
    fn should_unbind_borrowed_instances_once_superseded() {
        let h = Harness::new();
        let inner = h.compile(el("span").with("bind", "label").child("inner"));
        let inner_model = model().into_value();
        let embedded = RenderedRef::new(inner.create(&h.env, inner_model.clone()).unwrap());
        let span = embedded.root_nodes()[0];
        let m = model().with("body", Value::Instance(embedded.clone())).into_value();
        let mut instance = h.render(
            el("div").with(
                "embed",
                TemplateMap::new()
                    .with("content", body())
                    .with("owns_content", false),
            ),
            m.clone(),
        );
        assert_eq!(inner_model.get("label"), Value::Node(span));

        set(&m, "body", "text");
        instance.update().unwrap();
        assert_eq!(h.html(), "<div>text</div>");
        assert_eq!(inner_model.get("label"), Value::Undefined);
        assert_eq!(embedded.root_nodes().len(), 1);
    }

    #[test]
    fn should_accept_content_set_through_an_export() {
        let h = Harness::new();
        let instance = h.render(
            el("div").child(TemplateMap::new().with("embed", "initial").with("export", "slot")),
            Value::Null,
        );
        assert_eq!(h.html(), "<div>initial</div>");

        let slot = match instance.export("slot") {
            Some(Value::Instance(slot)) => slot,
            other => panic!("expected an exported block, got {:?}", other),
        };
        slot.borrow_mut().set_property("content", Value::html("<b>late</b>"));
        assert_eq!(h.html(), "<div><b>late</b></div>");
    }

    #[test]
    fn should_transition_content_swaps_when_mounted() {
        let h = Harness::new();
        let recorder = TransitionRecorder::new();
        let m = model().with("body", "old").into_value();
        let mut instance = h.render(
            el("div").with(
                "embed",
                TemplateMap::new()
                    .with("content", body())
                    .with("transition", Template::transition(recorder.factory())),
            ),
            m.clone(),
        );
        set(&m, "body", "new");
        instance.update().unwrap();
        let swap = recorder.last().unwrap();
        assert_eq!(h.html(), "<div>old</div>");

        swap.fire_enter();
        assert_eq!(h.html(), "<div>newold</div>");
        swap.fire_leave();
        assert_eq!(h.html(), "<div>new</div>");
    }

    #[test]
    fn should_embed_content_callables() {
        let h = Harness::new();
        let m = model().with("body", "hi").into_value();
        let _instance = h.render(
            el("div").child(Template::content(|m, _| m.get("body"))),
            m,
        );
        assert_eq!(h.html(), "<div>hi</div>");
    }
}
