//! Elixir Term Conversion Utilities
//!
//! Converts viewer state and search results to Elixir terms, and host
//! atoms back to viewer enums.

use crate::dom::{NodeKind, XmlNode};
use crate::drag::Modifiers;
use crate::focus::ViewOrigin;
use crate::search::{PanelUpdate, ScalarValue, SearchResult};
use rustler::{Atom, Encoder, Env, Term};

rustler::atoms! {
    ok,
    error,
    // views
    main,
    outline,
    search,
    // click targets
    switcher,
    name,
    // modifiers
    meta,
    alt,
    shift,
    ctrl,
    // panel updates
    hidden,
    unchanged,
    results,
    inline,
    // search results
    node,
    scalar,
    // node kinds
    document,
    element,
    text,
    cdata,
    comment,
    pi,
}

pub fn origin_from_atom(atom: Atom) -> Option<ViewOrigin> {
    if atom == main() {
        Some(ViewOrigin::Main)
    } else if atom == outline() {
        Some(ViewOrigin::Outline)
    } else if atom == search() {
        Some(ViewOrigin::Search)
    } else {
        None
    }
}

pub fn modifiers_from_atoms(atoms: &[Atom]) -> Modifiers {
    Modifiers {
        meta: atoms.contains(&meta()),
        alt: atoms.contains(&alt()),
        shift: atoms.contains(&shift()),
        ctrl: atoms.contains(&ctrl()),
    }
}

pub fn kind_atom(kind: NodeKind) -> Atom {
    match kind {
        NodeKind::Document => document(),
        NodeKind::Element => element(),
        NodeKind::Text => text(),
        NodeKind::CData => cdata(),
        NodeKind::Comment => comment(),
        NodeKind::ProcessingInstruction => pi(),
    }
}

/// `{kind, name, xpath}`
pub fn node_info_to_term<'a>(env: Env<'a>, node: &XmlNode, xpath: &str) -> Term<'a> {
    (kind_atom(node.kind()), node.name(), xpath).encode(env)
}

pub fn scalar_to_term<'a>(env: Env<'a>, value: &ScalarValue) -> Term<'a> {
    match value {
        ScalarValue::String(s) => s.encode(env),
        ScalarValue::Number(n) => n.encode(env),
        ScalarValue::Boolean(b) => b.encode(env),
    }
}

/// `{:node, label, {start, end} | nil, xpath}` or `{:scalar, value}`
pub fn search_result_to_term<'a>(env: Env<'a>, result: &SearchResult) -> Term<'a> {
    match result {
        SearchResult::Node(m) => {
            let highlight = match m.highlight {
                Some(range) => range.encode(env),
                None => rustler::types::atom::nil().encode(env),
            };
            (node(), m.label.as_str(), highlight, m.xpath.as_str()).encode(env)
        }
        SearchResult::Scalar(value) => (scalar(), scalar_to_term(env, value)).encode(env),
    }
}

pub fn results_to_term<'a>(env: Env<'a>, items: &[SearchResult]) -> Term<'a> {
    let mut list = Term::list_new_empty(env);
    for result in items.iter().rev() {
        list = list.list_prepend(search_result_to_term(env, result));
    }
    list
}

/// `:hidden`, `:unchanged`, `{:results, overflow, [result]}` or `{:inline, value}`
pub fn panel_update_to_term<'a>(env: Env<'a>, update: &PanelUpdate, items: &[SearchResult]) -> Term<'a> {
    match update {
        PanelUpdate::Hidden => hidden().encode(env),
        PanelUpdate::Unchanged => unchanged().encode(env),
        PanelUpdate::Results { overflow, .. } => (results(), *overflow, results_to_term(env, items)).encode(env),
        PanelUpdate::Inline(value) => (inline(), scalar_to_term(env, value)).encode(env),
    }
}
