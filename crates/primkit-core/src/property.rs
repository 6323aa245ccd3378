#![forbid(unsafe_code)]

//! Typed observable properties.
//!
//! A [`Property<T>`] is a plain value with an optional validator and a list
//! of change observers. Setting a rejected value leaves the old value in
//! place and returns the [`ConfigError`]; nothing is notified.
//!
//! # Invariants
//!
//! 1. `get()` always returns a value that passed validation (or the initial
//!    value).
//! 2. Observers run only when an accepted value differs from the old one,
//!    receiving `(old, new)`. Two unordered values (NaN) count as equal.

use std::fmt;

use tracing::warn;

use crate::error::ConfigError;
use crate::logging::CONFIG;

type Validator<T> = fn(&'static str, &T) -> Result<(), ConfigError>;
type Observer<T> = Box<dyn FnMut(&T, &T)>;

/// A named, validated value with change notification.
pub struct Property<T> {
    name: &'static str,
    value: T,
    validator: Option<Validator<T>>,
    observers: Vec<Observer<T>>,
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + fmt::Debug> Property<T> {
    /// Create an unvalidated property.
    #[must_use]
    pub fn new(name: &'static str, value: T) -> Self {
        Self {
            name,
            value,
            validator: None,
            observers: Vec::new(),
        }
    }

    /// Create a property whose values must pass `validator`.
    ///
    /// The initial value is trusted.
    #[must_use]
    pub fn validated(name: &'static str, value: T, validator: Validator<T>) -> Self {
        Self {
            name,
            value,
            validator: Some(validator),
            observers: Vec::new(),
        }
    }

    /// Property name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.value.clone()
    }

    /// Borrow the current value.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Check a candidate value without applying it.
    pub fn validate(&self, value: &T) -> Result<(), ConfigError> {
        match self.validator {
            Some(check) => check(self.name, value),
            None => Ok(()),
        }
    }

    /// Set a new value. Returns whether the value changed.
    pub fn set(&mut self, value: T) -> Result<bool, ConfigError> {
        if let Err(err) = self.validate(&value) {
            warn!(target: CONFIG, property = self.name, ?value, %err, "rejected property value");
            return Err(err);
        }
        if same_value(&value, &self.value) {
            return Ok(false);
        }
        let old = std::mem::replace(&mut self.value, value);
        for observer in &mut self.observers {
            observer(&old, &self.value);
        }
        Ok(true)
    }

    /// Register a change observer.
    pub fn observe(&mut self, observer: impl FnMut(&T, &T) + 'static) {
        self.observers.push(Box::new(observer));
    }
}

/// Equality that also treats two self-unequal values (NaN) as the same.
#[allow(clippy::eq_op)]
fn same_value<T: PartialEq>(a: &T, b: &T) -> bool {
    a == b || (a != a && b != b)
}

/// Validator: `>= 0`.
pub fn non_negative_i32(name: &'static str, v: &i32) -> Result<(), ConfigError> {
    if *v < 0 {
        return Err(ConfigError::Negative {
            property: name,
            value: f64::from(*v),
        });
    }
    Ok(())
}

/// Validator: `> 0`.
pub fn positive_i32(name: &'static str, v: &i32) -> Result<(), ConfigError> {
    if *v <= 0 {
        return Err(ConfigError::NotPositive {
            property: name,
            value: f64::from(*v),
        });
    }
    Ok(())
}

/// Validator: finite and `>= 0`.
pub fn non_negative_finite(name: &'static str, v: &f64) -> Result<(), ConfigError> {
    if !v.is_finite() {
        return Err(ConfigError::NotFinite {
            property: name,
            value: *v,
        });
    }
    if *v < 0.0 {
        return Err(ConfigError::Negative {
            property: name,
            value: *v,
        });
    }
    Ok(())
}

/// Validator: NaN ("auto") or finite and `>= 0`.
pub fn auto_or_non_negative(name: &'static str, v: &f64) -> Result<(), ConfigError> {
    if v.is_nan() {
        return Ok(());
    }
    non_negative_finite(name, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn rejected_value_keeps_previous() {
        let mut delay = Property::validated("Delay", 250, non_negative_i32);
        assert!(delay.set(-1).is_err());
        assert_eq!(delay.get(), 250);
        assert_eq!(delay.set(300), Ok(true));
        assert_eq!(delay.get(), 300);
    }

    #[test]
    fn observers_only_see_real_changes() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let mut p = Property::validated("Interval", 33, positive_i32);
        p.observe(move |old, new| s.borrow_mut().push((*old, *new)));
        assert_eq!(p.set(33), Ok(false));
        assert!(p.set(0).is_err());
        assert_eq!(p.set(50), Ok(true));
        assert_eq!(*seen.borrow(), vec![(33, 50)]);
    }

    #[test]
    fn repeated_nan_is_not_a_change() {
        let changes = Rc::new(RefCell::new(0));
        let c = Rc::clone(&changes);
        let mut wrap = Property::validated("WrapWidth", 40.0, auto_or_non_negative);
        wrap.observe(move |_, _| *c.borrow_mut() += 1);
        assert_eq!(wrap.set(f64::NAN), Ok(true));
        assert_eq!(wrap.set(f64::NAN), Ok(false));
        assert_eq!(wrap.set(40.0), Ok(true));
        assert_eq!(*changes.borrow(), 2);
    }

    #[test]
    fn wrap_width_validator() {
        assert!(auto_or_non_negative("WrapWidth", &f64::NAN).is_ok());
        assert!(auto_or_non_negative("WrapWidth", &10.0).is_ok());
        assert!(auto_or_non_negative("WrapWidth", &-1.0).is_err());
        assert!(auto_or_non_negative("WrapWidth", &f64::INFINITY).is_err());
    }
}
