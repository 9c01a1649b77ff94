//! XmlView - Interactive XML tree viewer core
//!
//! Components:
//! - dom: well-formedness-checking parser into a node arena
//! - view: lazy tree rendering, node ids, expand/collapse, markup
//! - search: substring and XPath search, popup state
//! - focus: cross-view focus relay
//! - session: one loaded document with all of the above

pub mod core;
pub mod dom;
pub mod drag;
pub mod error;
pub mod focus;
mod resource;
pub mod search;
pub mod session;
pub mod settings;
mod term;
pub mod view;
pub mod xpath;

use focus::ViewOrigin;
use resource::{SessionRef, SessionResource};
use rustler::{Atom, Binary, Encoder, Env, NifResult, ResourceArc, Term};
use session::{HostEvent, ViewerSession};
use settings::{MemoryStore, ViewerConfig};
use view::NodeId;

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Helpers
// ============================================================================

fn nil(env: Env<'_>) -> Term<'_> {
    rustler::types::atom::nil().encode(env)
}

fn view_origin(view: Atom) -> NifResult<ViewOrigin> {
    term::origin_from_atom(view).ok_or(rustler::Error::BadArg)
}

/// Run `f` on the session, turning a closed or poisoned session into `{:error, reason}`
fn with_session<'a, F>(env: Env<'a>, session: &SessionRef, f: F) -> NifResult<Term<'a>>
where
    F: FnOnce(&mut ViewerSession) -> Term<'a>,
{
    match session.with_session(f) {
        Ok(term) => Ok(term),
        Err(e) => Ok((term::error(), e.to_string()).encode(env)),
    }
}

fn optional<'a, T: Encoder>(env: Env<'a>, value: Option<T>) -> Term<'a> {
    match value {
        Some(v) => v.encode(env),
        None => nil(env),
    }
}

// ============================================================================
// Session Lifecycle
// ============================================================================

/// Parse a document and render both views.
/// Returns `{:ok, session}` or `{:error, reason}`.
#[rustler::nif(schedule = "DirtyCpu")]
fn open<'a>(env: Env<'a>, input: Binary<'a>, settings: Vec<(String, String)>) -> NifResult<Term<'a>> {
    let store: MemoryStore = settings.into_iter().collect();
    let config = ViewerConfig::from_store(&store);

    match ViewerSession::load(input.as_slice(), config) {
        Ok(session) => {
            let arc = ResourceArc::new(SessionResource::new(session));
            Ok((term::ok(), arc).encode(env))
        }
        Err(e) => Ok((term::error(), e.to_string()).encode(env)),
    }
}

/// Drop the session before the resource is garbage collected
#[rustler::nif]
fn close<'a>(env: Env<'a>, session: SessionRef) -> NifResult<Term<'a>> {
    match session.close() {
        Ok(closed) => Ok(closed.encode(env)),
        Err(e) => Ok((term::error(), e.to_string()).encode(env)),
    }
}

// ============================================================================
// Views
// ============================================================================

/// Full markup of a view
#[rustler::nif]
fn markup<'a>(env: Env<'a>, session: SessionRef, view: Atom) -> NifResult<Term<'a>> {
    let origin = view_origin(view)?;
    with_session(env, &session, |s| optional(env, s.markup(origin)))
}

/// Markup of one node's subtree, e.g. after expanding it
#[rustler::nif]
fn node_markup<'a>(env: Env<'a>, session: SessionRef, view: Atom, id: u64) -> NifResult<Term<'a>> {
    let origin = view_origin(view)?;
    with_session(env, &session, |s| {
        optional(env, s.node_markup(origin, NodeId::from_u64(id)))
    })
}

#[rustler::nif]
fn expand<'a>(env: Env<'a>, session: SessionRef, view: Atom, id: u64, recursive: bool) -> NifResult<Term<'a>> {
    let origin = view_origin(view)?;
    with_session(env, &session, |s| {
        s.expand(origin, NodeId::from_u64(id), recursive).encode(env)
    })
}

#[rustler::nif]
fn collapse<'a>(env: Env<'a>, session: SessionRef, view: Atom, id: u64, recursive: bool) -> NifResult<Term<'a>> {
    let origin = view_origin(view)?;
    with_session(env, &session, |s| {
        s.collapse(origin, NodeId::from_u64(id), recursive).encode(env)
    })
}

/// Host click: `target` is `:switcher` or `:name`; `view` is the view clicked in
#[rustler::nif]
fn click<'a>(env: Env<'a>, session: SessionRef, target: Atom, view: Atom, id: u64, alt: bool) -> NifResult<Term<'a>> {
    let origin = view_origin(view)?;
    let id = NodeId::from_u64(id);
    let event = if target == term::switcher() {
        HostEvent::SwitcherClick { view: origin, id, alt }
    } else if target == term::name() && origin == ViewOrigin::Main {
        HostEvent::NameClick { id, alt }
    } else if target == term::name() && origin == ViewOrigin::Outline {
        HostEvent::OutlineClick { id }
    } else {
        return Err(rustler::Error::BadArg);
    };
    with_session(env, &session, |s| s.handle(event).encode(env))
}

/// Reveal and select a node in every view except `origin`
#[rustler::nif(name = "focus")]
fn focus_node<'a>(env: Env<'a>, session: SessionRef, id: u64, origin: Atom) -> NifResult<Term<'a>> {
    let origin = view_origin(origin)?;
    with_session(env, &session, |s| match s.original_node(NodeId::from_u64(id)) {
        Some(node) => {
            s.focus(node, origin);
            true.encode(env)
        }
        None => false.encode(env),
    })
}

#[rustler::nif]
fn selected<'a>(env: Env<'a>, session: SessionRef, view: Atom) -> NifResult<Term<'a>> {
    let origin = view_origin(view)?;
    with_session(env, &session, |s| {
        optional(env, s.selected(origin).map(NodeId::as_u64))
    })
}

/// `{kind, name, xpath}` of a node
#[rustler::nif]
fn node_info<'a>(env: Env<'a>, session: SessionRef, id: u64) -> NifResult<Term<'a>> {
    with_session(env, &session, |s| {
        let info = s.original_node(NodeId::from_u64(id)).and_then(|node| {
            let doc = s.document();
            Some(term::node_info_to_term(env, doc.node(node)?, doc.xpath_of(node)?))
        });
        info.unwrap_or_else(|| nil(env))
    })
}

// ============================================================================
// Search
// ============================================================================

#[rustler::nif(name = "search", schedule = "DirtyCpu")]
fn run_search<'a>(env: Env<'a>, session: SessionRef, query: &str) -> NifResult<Term<'a>> {
    with_session(env, &session, |s| {
        let update = s.search(query);
        term::panel_update_to_term(env, &update, s.panel().results())
    })
}

/// Move the result selection (clamped); returns the selected index
#[rustler::nif]
fn select_result<'a>(env: Env<'a>, session: SessionRef, ix: i64) -> NifResult<Term<'a>> {
    let ix = isize::try_from(ix).unwrap_or(if ix < 0 { isize::MIN } else { isize::MAX });
    with_session(env, &session, |s| s.panel_mut().select(ix).encode(env))
}

/// Focus a result (`nil` = the selected one); returns its main-view id
#[rustler::nif]
fn apply_result<'a>(env: Env<'a>, session: SessionRef, ix: Option<usize>) -> NifResult<Term<'a>> {
    with_session(env, &session, |s| {
        let id = s.apply_search_result(ix).and_then(|node| s.node_id(node));
        optional(env, id.map(NodeId::as_u64))
    })
}

// ============================================================================
// Drag-to-XPath
// ============================================================================

/// Transfer text for dragging a node name (`attribute = nil`) or attribute name
#[rustler::nif]
fn drag_text<'a>(
    env: Env<'a>,
    session: SessionRef,
    id: u64,
    attribute: Option<String>,
    modifiers: Vec<Atom>,
) -> NifResult<Term<'a>> {
    let mods = term::modifiers_from_atoms(&modifiers);
    with_session(env, &session, |s| {
        optional(env, s.drag_text(NodeId::from_u64(id), attribute.as_deref(), mods))
    })
}

// ============================================================================
// NIF Initialization
// ============================================================================

rustler::init!("Elixir.XmlView.Native");
