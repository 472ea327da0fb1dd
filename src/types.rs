//! Core types for spark-dom.
//!
//! These types define the foundation that everything builds on.
//! They flow through the reactive graph, the animation algebra and the
//! reconciler.

use std::cell::Cell;

use bitflags::bitflags;

// =============================================================================
// Time
// =============================================================================

/// Milliseconds, as reported by the host clock.
///
/// Animation frames and scheduler slices are measured in fractional
/// milliseconds, the unit `requestAnimationFrame` hands out.
pub type Millis = f64;

// =============================================================================
// Fresh identities
// =============================================================================

thread_local! {
    /// Counter for generating unique identities (Var ids, element keys).
    static FRESH_COUNTER: Cell<u64> = const { Cell::new(0) };
}

/// Allocate a fresh, monotonically increasing identity.
pub(crate) fn fresh_id() -> u64 {
    FRESH_COUNTER.with(|counter| {
        let id = counter.get() + 1;
        counter.set(id);
        id
    })
}

/// Identity of a live element under runtime control.
///
/// Two [`DocElemNode`](crate::doc::DocElemNode)s are the same node iff their
/// keys are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElemKey(pub u64);

impl ElemKey {
    /// Allocate a fresh key.
    pub fn fresh() -> Self {
        Self(fresh_id())
    }
}

// =============================================================================
// Animation flags
// =============================================================================

bitflags! {
    /// Which animations an attribute (or attribute tree) declares.
    ///
    /// The reconciler only asks an element for an animation kind when the
    /// element's attributes carry the matching flag.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AnimFlags: u8 {
        /// Plays when the element enters the document.
        const ENTER = 0b0000_0001;
        /// Plays when the element leaves the document.
        const EXIT = 0b0000_0010;
        /// Plays when a bound value changes while the element stays.
        const CHANGE = 0b0000_0100;
    }
}

// =============================================================================
// Checked input
// =============================================================================

/// The parsed content of an input field bound through
/// [`Attr::int_value`](crate::attr::Attr::int_value) or
/// [`Attr::float_value`](crate::attr::Attr::float_value).
///
/// The raw text is always kept so the field is never rewritten under the
/// user's cursor.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckedInput<T> {
    /// The text parsed to a value.
    Valid(T, String),
    /// The text did not parse.
    Invalid(String),
    /// The field is blank (only whitespace).
    Blank(String),
}

impl<T> CheckedInput<T> {
    /// The raw text of the field.
    pub fn input(&self) -> &str {
        match self {
            CheckedInput::Valid(_, s) | CheckedInput::Invalid(s) | CheckedInput::Blank(s) => s,
        }
    }

    /// The parsed value, if any.
    pub fn value(&self) -> Option<&T> {
        match self {
            CheckedInput::Valid(v, _) => Some(v),
            _ => None,
        }
    }

    /// Build a valid input whose text is the value's display form.
    pub fn make(value: T) -> Self
    where
        T: ToString,
    {
        let text = value.to_string();
        CheckedInput::Valid(value, text)
    }
}

// =============================================================================
// Tree reduction
// =============================================================================

/// Reduce `items` pairwise as a balanced tree.
///
/// Concatenating many small structures this way keeps their depth
/// logarithmic. Returns `empty` for no items.
pub(crate) fn tree_reduce<T: Clone>(empty: T, items: &[T], reduce: &dyn Fn(&T, &T) -> T) -> T {
    match items {
        [] => empty,
        [single] => single.clone(),
        _ => {
            let (left, right) = items.split_at(items.len() / 2);
            reduce(&tree_reduce(empty.clone(), left, reduce), &tree_reduce(empty, right, reduce))
        }
    }
}

/// Whether a string is empty or only whitespace.
pub(crate) fn is_blank(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}

// =============================================================================
// Tests
// =============================================================================
