//! Two-way bindings between form fields and Vars.
//!
//! Every binding is built on [`Attr::custom_var`]: the field is written when
//! the Var changes, and `change`, `input` and `keypress` events read it back
//! into the Var when the parsed value differs.

use std::rc::Rc;

use super::Attr;
use crate::dom::{Dom, NodeId, PropValue, input_value};
use crate::reactive::Var;
use crate::types::{CheckedInput, is_blank};

/// Events that read a field back into its Var.
const READ_BACK_EVENTS: [&str; 3] = ["change", "input", "keypress"];

type GetFn<T> = Rc<dyn Fn(&Rc<dyn Dom>, NodeId) -> Option<T>>;

impl Attr {
    /// Bind `var` to an element through `set` and `get`.
    ///
    /// `get` returns `None` when the element holds no usable value; the Var
    /// is then left alone. `set` is skipped when the element already reads
    /// back as the new value.
    pub fn custom_var<T: Clone + PartialEq + 'static>(
        var: &Var<T>,
        set: impl Fn(&Rc<dyn Dom>, NodeId, &T) + 'static,
        get: impl Fn(&Rc<dyn Dom>, NodeId) -> Option<T> + 'static,
    ) -> Attr {
        let get: GetFn<T> = Rc::new(get);

        let mut attrs: Vec<Attr> = READ_BACK_EVENTS
            .iter()
            .map(|event| {
                let (var, get) = (var.clone(), get.clone());
                Attr::element_handler(event, move |dom, el| {
                    var.update_maybe(|current| get(dom, el).filter(|v| v != current));
                })
            })
            .collect();

        attrs.push(Attr::dynamic_custom(&var.view(), move |dom, el, v: &T| {
            if get(dom, el).as_ref() != Some(v) {
                set(dom, el, v);
            }
        }));
        Attr::concat(attrs)
    }

    /// Bind `var` to the field's `value` through a text conversion.
    pub fn custom_value<T: Clone + PartialEq + 'static>(
        var: &Var<T>,
        to_text: impl Fn(&T) -> String + 'static,
        from_text: impl Fn(&str) -> Option<T> + 'static,
    ) -> Attr {
        Attr::custom_var(
            var,
            move |dom, el, v| dom.set_property(el, "value", PropValue::Text(to_text(v))),
            move |dom, el| from_text(&input_value(&**dom, el)),
        )
    }

    /// Bind a text Var to the field's `value`.
    pub fn value(var: &Var<String>) -> Attr {
        Attr::custom_value(var, String::clone, |s| Some(s.to_string()))
    }

    /// Bind a boolean Var to a checkbox.
    pub fn checked(var: &Var<bool>) -> Attr {
        let read_back = |var: &Var<bool>| {
            let var = var.clone();
            move |dom: &Rc<dyn Dom>, el: NodeId| {
                let checked = dom
                    .get_property(el, "checked")
                    .and_then(|p| p.as_bool())
                    .unwrap_or(false);
                if var.get() != checked {
                    var.set(checked);
                }
            }
        };
        Attr::concat([
            Attr::dynamic_prop("checked", &var.view().map(|b| PropValue::Bool(*b))),
            Attr::element_handler("change", read_back(var)),
            Attr::element_handler("click", read_back(var)),
        ])
    }

    /// Bind an integer Var, keeping the raw text and its validity.
    pub fn int_value(var: &Var<CheckedInput<i32>>) -> Attr {
        Attr::custom_var(var, set_checked_input, |dom, el| {
            Some(read_checked(&**dom, el, parse_i32))
        })
    }

    /// Bind an integer Var. Blank reads as 0; unparsable text is ignored.
    pub fn int_value_unchecked(var: &Var<i32>) -> Attr {
        Attr::custom_value(var, i32::to_string, |s| {
            if is_blank(s) { Some(0) } else { parse_i32(s) }
        })
    }

    /// Bind a float Var, keeping the raw text and its validity.
    pub fn float_value(var: &Var<CheckedInput<f64>>) -> Attr {
        Attr::custom_var(var, set_checked_input, |dom, el| {
            Some(read_checked(&**dom, el, parse_f64))
        })
    }

    /// Bind a float Var. Blank reads as 0; unparsable text is ignored.
    pub fn float_value_unchecked(var: &Var<f64>) -> Attr {
        Attr::custom_value(var, f64::to_string, |s| {
            if is_blank(s) { Some(0.0) } else { parse_f64(s) }
        })
    }
}

// =============================================================================
// Parsing
// =============================================================================

fn set_checked_input<T>(dom: &Rc<dyn Dom>, el: NodeId, v: &CheckedInput<T>) {
    if input_value(&**dom, el) != v.input() {
        dom.set_property(el, "value", PropValue::Text(v.input().to_string()));
    }
}

/// Read a field as a checked input. A blank field is `Blank` when the host
/// considers it valid and `Invalid` otherwise.
fn read_checked<T>(dom: &dyn Dom, el: NodeId, parse: fn(&str) -> Option<T>) -> CheckedInput<T> {
    let text = input_value(dom, el);
    if is_blank(&text) {
        return if dom.check_validity(el) {
            CheckedInput::Blank(text)
        } else {
            CheckedInput::Invalid(text)
        };
    }
    match parse(&text) {
        Some(v) => CheckedInput::Valid(v, text),
        None => CheckedInput::Invalid(text),
    }
}

/// A number with no fractional part that fits in an `i32`.
fn parse_i32(s: &str) -> Option<i32> {
    let n = parse_f64(s)?;
    let in_range = n >= f64::from(i32::MIN) && n <= f64::from(i32::MAX);
    (n.fract() == 0.0 && in_range).then_some(n as i32)
}

fn parse_f64(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| !n.is_nan())
}
