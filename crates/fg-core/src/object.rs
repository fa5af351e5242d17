//! Object identity and lifecycle.
//!
//! Every engine object (Frame, Mapping, FrameSet) carries an [`Ident`] token
//! allocated at construction. Deep copies get a fresh token, so `same()` is
//! true only for two handles onto the identical underlying instance, and the
//! process-wide live-instance registry counts every construction and copy.
//!
//! Containers own deep copies of everything inserted into them and queries
//! hand back deep copies, so `ref_count()` is 1 for every independently owned
//! object; the counter exists because the `same`/`ref_count` contract is an
//! explicit, tested part of the object model.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{LazyLock, Mutex, PoisonError};

use crate::repr::ReprNode;

/// Live-instance counts per class, process-wide.
static LIVE_COUNTS: LazyLock<Mutex<HashMap<&'static str, usize>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Number of live instances of the named class.
pub fn live_instances(class: &str) -> usize {
    LIVE_COUNTS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(class)
        .copied()
        .unwrap_or(0)
}

fn count_up(class: &'static str) {
    *LIVE_COUNTS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(class)
        .or_insert(0) += 1;
}

fn count_down(class: &'static str) {
    let mut counts = LIVE_COUNTS.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(n) = counts.get_mut(class) {
        *n = n.saturating_sub(1);
    }
}

/// Identity token held by every engine object.
///
/// Cloning allocates a fresh token (deep-copy semantics) and registers a new
/// live instance; dropping unregisters it. The `Rc` makes holders
/// intentionally `!Send`/`!Sync` — the engine is single-threaded by design.
#[derive(Debug)]
pub(crate) struct Ident {
    class: &'static str,
    token: Rc<()>,
}

impl Ident {
    pub(crate) fn new(class: &'static str) -> Self {
        count_up(class);
        Self {
            class,
            token: Rc::new(()),
        }
    }

    pub(crate) fn same(&self, other: &Ident) -> bool {
        Rc::ptr_eq(&self.token, &other.token)
    }

    pub(crate) fn ref_count(&self) -> usize {
        Rc::strong_count(&self.token)
    }

    pub(crate) fn class(&self) -> &'static str {
        self.class
    }
}

impl Clone for Ident {
    fn clone(&self) -> Self {
        Ident::new(self.class)
    }
}

impl Drop for Ident {
    fn drop(&mut self) {
        count_down(self.class);
    }
}

/// Common surface of every engine object.
pub trait Object {
    /// Stable class tag ("Frame", "ZoomMap", "FrameSet", ...).
    fn class_name(&self) -> &'static str;

    /// Free-form identification string, preserved by copy and persistence,
    /// never interpreted.
    fn ident(&self) -> &str;

    fn set_ident(&mut self, ident: &str);

    /// Self-describing representation tree (the persistence image).
    fn to_repr(&self) -> ReprNode;

    /// Identity test: true only if both handles wrap the identical underlying
    /// instance. False for any deep copy, however attribute-equal.
    fn same(&self, other: &Self) -> bool
    where
        Self: Sized;

    /// Number of live handles sharing this instance's state.
    fn ref_count(&self) -> usize;

    /// Live instances of this object's class, process-wide.
    fn instance_count(&self) -> usize {
        live_instances(self.class_name())
    }

    /// Independent deep copy: fresh identity, `ref_count() == 1`, bumps the
    /// live-instance count for the class; the source is unaffected.
    fn copy(&self) -> Self
    where
        Self: Sized + Clone,
    {
        self.clone()
    }

    /// Canonical textual dump. Deterministic, equal between an object and any
    /// of its deep copies, and stable across a persistence round trip.
    fn show(&self) -> String {
        crate::repr::render_text(&self.to_repr())
    }
}
