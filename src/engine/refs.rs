//! The link-reference registry.
//!
//! Reference links and images (`[text][name]`, `![alt][name]`) may appear
//! before or after the `[name]: target "title"` definition they point at.
//! Resolution is eventual, via two maps on the parse state:
//!
//! - `defs`: definitions seen so far, by normalized name.
//! - `refs`: every reference slot emitted so far, by normalized name.
//!
//! A reference resolves immediately when its definition is already known,
//! and is queued in `refs` either way — a later (re)definition back-patches
//! every queued slot, so the last definition in the document wins. A name
//! with no definition simply stays unresolved; that is data, not an error.

use std::cell::RefCell;
use std::rc::Rc;

use crate::{LinkDef, ParseState, RefSlot, SharedRefSlot};

/// Normalize a reference name: collapse whitespace runs, lowercase.
pub fn normalize_ref(name: &str) -> String {
    regex!(r"\s+").replace_all(name, " ").to_lowercase()
}

/// Record a definition and back-patch every slot queued under `name`.
pub fn register_def(state: &mut ParseState, name: &str, target: &str, title: Option<&str>) {
    if let Some(slots) = state.refs.get(name) {
        for slot in slots {
            let mut slot = slot.borrow_mut();
            slot.target = Some(target.to_string());
            slot.title = title.map(str::to_string);
        }
    }

    state.defs.insert(
        name.to_string(),
        LinkDef { target: target.to_string(), title: title.map(str::to_string) },
    );
}

/// Create the shared slot for a new reference node, resolving it from an
/// existing definition when possible, and queue it for back-patching.
pub fn register_ref(state: &mut ParseState, name: &str) -> SharedRefSlot {
    let mut slot = RefSlot::default();
    if let Some(def) = state.defs.get(name) {
        slot.target = Some(def.target.clone());
        slot.title = def.title.clone();
    }

    let slot = Rc::new(RefCell::new(slot));
    state.refs.entry(name.to_string()).or_default().push(Rc::clone(&slot));
    slot
}
