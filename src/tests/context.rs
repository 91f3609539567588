use super::{ActivationOutcome, Collapsible, INIT_ATTRIBUTE};
use crate::config::Config;
use crate::dom::{Activation, Document, HostTree, Modifiers, NodeDesc, NodeId};
use crate::store::{BlobStore, MemoryStore};
use std::time::{Duration, Instant};

fn nodes() -> Vec<NodeDesc> {
    vec![
        NodeDesc::new("h1", "Guide"),
        NodeDesc::new("p", "intro"),
        NodeDesc::new("h2", "Install"),
        NodeDesc::new("p", "install body"),
        NodeDesc::new("h3", "From source"),
        NodeDesc::new("p", "source body"),
        NodeDesc::new("h2", "Usage"),
        NodeDesc::new("p", "usage body"),
    ]
}

fn installed(store: MemoryStore) -> (Document, Collapsible<MemoryStore>) {
    let mut doc = Document::from_nodes(&nodes());
    let mut ctx = Collapsible::new(Config::default(), store);
    assert!(ctx.install(&mut doc));
    (doc, ctx)
}

fn heading(ctx: &Collapsible<MemoryStore>, doc: &Document, key: &str) -> NodeId {
    ctx.section_for_key(doc, key).unwrap().heading
}

fn click(doc: &Document, target: NodeId, secondary: bool) -> Activation {
    let modifiers = Modifiers {
        ctrl: secondary,
        ..Modifiers::default()
    };
    doc.dispatch_activation(target, modifiers).unwrap()
}

fn activate(
    ctx: &mut Collapsible<MemoryStore>,
    doc: &mut Document,
    target: NodeId,
    secondary: bool,
) -> ActivationOutcome {
    let activation = click(doc, target, secondary);
    ctx.handle_activation(doc, &activation)
}

fn blob(ctx: &Collapsible<MemoryStore>) -> Option<String> {
    let key = ctx.config().storage_key.clone();
    ctx.store().backend().raw(&key).map(str::to_string)
}

fn collapsed_keys(ctx: &Collapsible<MemoryStore>, doc: &Document) -> Vec<String> {
    ctx.registry()
        .iter()
        .filter(|s| s.is_collapsed(doc))
        .map(|s| s.key.clone())
        .collect()
}

#[test]
fn test_install_processes_once() {
    let (mut doc, mut ctx) = installed(MemoryStore::new());
    assert!(ctx.is_installed());
    assert_eq!(ctx.registry().len(), 4);
    assert_eq!(doc.attribute(doc.root(), INIT_ATTRIBUTE), Some("true"));

    assert!(!ctx.install(&mut doc));
    assert_eq!(ctx.registry().len(), 4);
}

#[test]
fn test_second_context_on_same_document_is_inert() {
    let (mut doc, _first) = installed(MemoryStore::new());
    let mut second = Collapsible::new(Config::default(), MemoryStore::new());

    assert!(!second.install(&mut doc));
    assert!(second.registry().is_empty());
}

#[test]
fn test_install_leaves_no_pending_rescan() {
    let (mut doc, mut ctx) = installed(MemoryStore::new());
    assert!(!ctx.on_mutations(&mut doc, Instant::now()));
    assert_eq!(ctx.pending_rescan(), None);
}

#[test]
fn test_plain_activation_toggles_and_persists() {
    let (mut doc, mut ctx) = installed(MemoryStore::new());
    let install = heading(&ctx, &doc, "h2:Install");

    let outcome = activate(&mut ctx, &mut doc, install, false);

    assert_eq!(
        outcome,
        ActivationOutcome::Toggled {
            key: "h2:Install".to_string(),
            collapsed: true,
        }
    );
    assert_eq!(collapsed_keys(&ctx, &doc), vec!["h2:Install"]);
    assert_eq!(blob(&ctx).as_deref(), Some(r#"{"h2:Install":true}"#));
}

#[test]
fn test_expanding_deletes_key() {
    let (mut doc, mut ctx) = installed(MemoryStore::new());
    let install = heading(&ctx, &doc, "h2:Install");
    let usage = heading(&ctx, &doc, "h2:Usage");

    activate(&mut ctx, &mut doc, install, false);
    activate(&mut ctx, &mut doc, usage, false);
    activate(&mut ctx, &mut doc, install, false);

    let stored = blob(&ctx).unwrap();
    assert_eq!(stored, r#"{"h2:Usage":true}"#);
    assert!(!stored.contains("Install"));
}

#[test]
fn test_activation_from_inner_text_bubbles() {
    let (mut doc, mut ctx) = installed(MemoryStore::new());
    let guide = heading(&ctx, &doc, "h1:Guide");
    let text = *doc
        .children(guide)
        .iter()
        .find(|&&c| doc.text(c).is_some())
        .unwrap();

    let outcome = activate(&mut ctx, &mut doc, text, false);

    assert!(matches!(outcome, ActivationOutcome::Toggled { collapsed: true, .. }));
}

#[test]
fn test_links_and_buttons_in_headings_are_ignored() {
    let mut doc = Document::from_nodes(&[
        NodeDesc::new("h2", "API ").with_children(vec![
            NodeDesc::new("a", "#").with_attribute("href", "#api"),
            NodeDesc::new("button", "copy"),
        ]),
        NodeDesc::new("p", "body"),
    ]);
    let mut ctx = Collapsible::new(Config::default(), MemoryStore::new());
    ctx.install(&mut doc);
    let h2 = doc.children(doc.root())[0];
    let inner: Vec<NodeId> = doc
        .children(h2)
        .iter()
        .copied()
        .filter(|&c| matches!(doc.tag(c), Some("a" | "button")))
        .collect();
    assert_eq!(inner.len(), 2);

    for target in inner {
        let outcome = activate(&mut ctx, &mut doc, target, false);
        assert_eq!(outcome, ActivationOutcome::Ignored);
    }
    assert!(collapsed_keys(&ctx, &doc).is_empty());
    assert_eq!(ctx.registry().iter().next().unwrap().key, "h2:API #copy");
}

#[test]
fn test_unregistered_heading_is_ignored() {
    let (mut doc, mut ctx) = installed(MemoryStore::new());
    let stray = doc.append_nodes(doc.root(), &[NodeDesc::new("h6", "Stray")])[0];
    let activation = Activation {
        target: stray,
        current: stray,
        modifiers: Modifiers::default(),
    };

    assert_eq!(ctx.handle_activation(&mut doc, &activation), ActivationOutcome::Ignored);
}

#[test]
fn test_secondary_collapses_when_none_collapsed() {
    let (mut doc, mut ctx) = installed(MemoryStore::new());
    let guide = heading(&ctx, &doc, "h1:Guide");

    let outcome = activate(&mut ctx, &mut doc, guide, true);

    assert_eq!(
        outcome,
        ActivationOutcome::ToggledSubtree {
            collapsed: true,
            sections: 4,
        }
    );
    assert_eq!(collapsed_keys(&ctx, &doc).len(), 4);
    assert_eq!(ctx.persisted().len(), 4);
}

#[test]
fn test_secondary_expands_when_majority_collapsed() {
    let (mut doc, mut ctx) = installed(MemoryStore::new());
    for key in ["h1:Guide", "h2:Install", "h3:From source"] {
        let target = heading(&ctx, &doc, key);
        activate(&mut ctx, &mut doc, target, false);
    }
    let guide = heading(&ctx, &doc, "h1:Guide");

    let outcome = activate(&mut ctx, &mut doc, guide, true);

    assert_eq!(
        outcome,
        ActivationOutcome::ToggledSubtree {
            collapsed: false,
            sections: 4,
        }
    );
    assert!(collapsed_keys(&ctx, &doc).is_empty());
    assert_eq!(blob(&ctx).as_deref(), Some("{}"));
}

#[test]
fn test_secondary_collapses_on_even_split() {
    let (mut doc, mut ctx) = installed(MemoryStore::new());
    for key in ["h2:Install", "h2:Usage"] {
        let target = heading(&ctx, &doc, key);
        activate(&mut ctx, &mut doc, target, false);
    }
    let guide = heading(&ctx, &doc, "h1:Guide");

    let outcome = activate(&mut ctx, &mut doc, guide, true);

    assert!(matches!(
        outcome,
        ActivationOutcome::ToggledSubtree { collapsed: true, .. }
    ));
}

#[test]
fn test_secondary_alternates() {
    let (mut doc, mut ctx) = installed(MemoryStore::new());
    let install = heading(&ctx, &doc, "h2:Install");

    let first = activate(&mut ctx, &mut doc, install, true);
    let second = activate(&mut ctx, &mut doc, install, true);

    assert_eq!(
        first,
        ActivationOutcome::ToggledSubtree {
            collapsed: true,
            sections: 2,
        }
    );
    assert_eq!(
        second,
        ActivationOutcome::ToggledSubtree {
            collapsed: false,
            sections: 2,
        }
    );
    assert!(ctx.persisted().is_empty());
}

#[test]
fn test_state_survives_reload() {
    let (mut doc, mut ctx) = installed(MemoryStore::new());
    let source = heading(&ctx, &doc, "h3:From source");
    activate(&mut ctx, &mut doc, source, false);
    let store = ctx.store().backend().clone();

    let (reloaded_doc, reloaded) = installed(store);

    assert_eq!(collapsed_keys(&reloaded, &reloaded_doc), vec!["h3:From source"]);
}

#[test]
fn test_non_bool_entries_survive_reload_and_toggle() {
    let mut store = MemoryStore::new();
    store
        .set_string(
            &Config::default().storage_key,
            r#"{"h2:Usage":true,"h2:Install":1}"#,
        )
        .unwrap();
    let (mut doc, mut ctx) = installed(store);
    assert_eq!(collapsed_keys(&ctx, &doc), vec!["h2:Install", "h2:Usage"]);

    let guide = heading(&ctx, &doc, "h1:Guide");
    activate(&mut ctx, &mut doc, guide, false);

    assert_eq!(
        blob(&ctx).as_deref(),
        Some(r#"{"h1:Guide":true,"h2:Install":1,"h2:Usage":true}"#)
    );
}

#[test]
fn test_set_all() {
    let (mut doc, mut ctx) = installed(MemoryStore::new());

    assert_eq!(ctx.set_all(&mut doc, true), 4);
    assert_eq!(collapsed_keys(&ctx, &doc).len(), 4);
    assert_eq!(ctx.persisted().len(), 4);

    assert_eq!(ctx.set_all(&mut doc, false), 4);
    assert!(collapsed_keys(&ctx, &doc).is_empty());
    assert!(ctx.persisted().is_empty());
}

#[test]
fn test_unavailable_storage_still_toggles() {
    let (mut doc, mut ctx) = installed(MemoryStore::unavailable());
    let install = heading(&ctx, &doc, "h2:Install");

    let outcome = activate(&mut ctx, &mut doc, install, false);

    assert!(matches!(outcome, ActivationOutcome::Toggled { collapsed: true, .. }));
    assert_eq!(collapsed_keys(&ctx, &doc), vec!["h2:Install"]);
    assert!(ctx.persisted().is_empty());
}

#[test]
fn test_appended_content_is_picked_up_after_debounce() {
    let (mut doc, mut ctx) = installed(MemoryStore::new());
    let install = heading(&ctx, &doc, "h2:Install");
    activate(&mut ctx, &mut doc, install, false);
    let start = Instant::now();

    let root = doc.root();
    doc.append_nodes(
        root,
        &[NodeDesc::new("h1", "Changelog"), NodeDesc::new("p", "v0.1.0")],
    );
    assert!(ctx.on_mutations(&mut doc, start));
    assert_eq!(ctx.poll(&mut doc, start), 0, "not yet due");
    assert!(ctx.section_for_key(&doc, "h1:Changelog").is_none());

    let due = start + ctx.config().debounce();
    assert_eq!(ctx.poll(&mut doc, due), 1);

    let changelog = heading(&ctx, &doc, "h1:Changelog");
    assert!(doc.is_listening(changelog));
    assert_eq!(collapsed_keys(&ctx, &doc), vec!["h2:Install"]);

    activate(&mut ctx, &mut doc, changelog, false);
    assert!(ctx.persisted().is_collapsed("h1:Changelog"));
    assert!(ctx.persisted().is_collapsed("h2:Install"));
}

#[test]
fn test_rescan_does_not_reschedule_itself() {
    let (mut doc, mut ctx) = installed(MemoryStore::new());
    let start = Instant::now();
    let root = doc.root();
    doc.append_nodes(root, &[NodeDesc::new("h2", "Late"), NodeDesc::new("p", "x")]);
    ctx.on_mutations(&mut doc, start);
    ctx.poll(&mut doc, start + Duration::from_secs(1));

    assert!(!ctx.on_mutations(&mut doc, start + Duration::from_secs(2)));
    assert_eq!(ctx.pending_rescan(), None);
}

#[test]
fn test_full_rerender_restores_state() {
    let (mut doc, mut ctx) = installed(MemoryStore::new());
    let usage = heading(&ctx, &doc, "h2:Usage");
    activate(&mut ctx, &mut doc, usage, false);
    let start = Instant::now();

    let root = doc.root();
    doc.replace_children(root, &nodes());
    assert!(ctx.on_mutations(&mut doc, start));
    assert_eq!(ctx.poll(&mut doc, start + Duration::from_secs(1)), 4);

    assert_eq!(ctx.registry().len(), 8);
    let live = ctx.section_for_key(&doc, "h2:Usage").unwrap();
    assert_ne!(live.heading, usage);
    assert!(live.is_collapsed(&doc));
    let collapsed_live: Vec<&str> = ctx
        .registry()
        .connected(&doc)
        .into_iter()
        .filter(|s| s.is_collapsed(&doc))
        .map(|s| s.key.as_str())
        .collect();
    assert_eq!(collapsed_live, vec!["h2:Usage"]);
}

#[test]
fn test_mutations_before_install_are_ignored() {
    let mut doc = Document::from_nodes(&nodes());
    let mut ctx = Collapsible::new(Config::default(), MemoryStore::new());
    let root = doc.root();
    doc.append_nodes(root, &[NodeDesc::new("h2", "Early")]);

    assert!(!ctx.on_mutations(&mut doc, Instant::now()));
    assert_eq!(ctx.pending_rescan(), None);
}
