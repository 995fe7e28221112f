//! Test hook reporting whether bridged values outlive their last strong reference.
//!
//! Objects are reference counted, so a value is reclaimed as soon as nothing holds it. The
//! tracker only keeps weak references and reports which of them still upgrade. Sandboxed
//! realms have no such hook.

use std::rc::Rc;

use tracing::debug;

use crate::runner::bridge::error::BridgeError;
use crate::runner::ds::object::{JsObjectType, JsObjectWeakType};
use crate::runner::ds::value::JsValue;

pub struct WeakTracker {
    sandboxed: bool,
    tracked: Vec<JsObjectWeakType>,
}
impl WeakTracker {
    pub fn new(sandboxed: bool) -> Self {
        WeakTracker {
            sandboxed,
            tracked: vec![],
        }
    }

    fn ensure_available(&self) -> Result<(), BridgeError> {
        if self.sandboxed {
            Err(BridgeError::WeakTrackingUnavailable)
        } else {
            Ok(())
        }
    }

    /// Starts tracking `value`. Primitives have no lifetime to observe and are ignored.
    pub fn track(&mut self, value: &JsValue) -> Result<(), BridgeError> {
        self.ensure_available()?;
        if let JsValue::Object(o) = value {
            self.tracked.push(Rc::downgrade(o));
        }
        Ok(())
    }

    /// Tracked values that are still alive.
    pub fn live_values(&self) -> Result<Vec<JsObjectType>, BridgeError> {
        self.ensure_available()?;
        Ok(self.tracked.iter().filter_map(|w| w.upgrade()).collect())
    }

    pub fn live_count(&self) -> Result<usize, BridgeError> {
        self.ensure_available()?;
        Ok(self.tracked.iter().filter(|w| w.strong_count() > 0).count())
    }

    /// Forgets reclaimed values. Returns how many were dropped.
    pub fn prune(&mut self) -> usize {
        let before = self.tracked.len();
        self.tracked.retain(|w| w.strong_count() > 0);
        let pruned = before - self.tracked.len();
        if pruned > 0 {
            debug!(pruned, "weakly tracked values reclaimed");
        }
        pruned
    }

    pub fn clear(&mut self) {
        self.tracked.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::agent::Agent;

    #[test]
    fn test_reports_only_live_values() {
        let realm = Agent::new().create_realm(0, None).unwrap();
        let kept = realm.borrow().new_object();
        let dropped = realm.borrow().new_object();
        let mut tracker = WeakTracker::new(false);
        tracker.track(&JsValue::Object(kept.clone())).unwrap();
        tracker.track(&JsValue::Object(dropped.clone())).unwrap();
        tracker.track(&JsValue::from(1)).unwrap();
        assert_eq!(tracker.live_count().unwrap(), 2);

        drop(dropped);
        assert_eq!(tracker.live_count().unwrap(), 1);
        assert!(Rc::ptr_eq(&tracker.live_values().unwrap()[0], &kept));
        assert_eq!(tracker.prune(), 1);
    }

    #[test]
    fn test_sandboxed_tracker_is_unavailable() {
        let mut tracker = WeakTracker::new(true);
        assert!(matches!(
            tracker.track(&JsValue::Null),
            Err(BridgeError::WeakTrackingUnavailable)
        ));
        assert!(tracker.live_count().is_err());
    }
}
