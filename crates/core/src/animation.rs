//! Property animations driven by the host.
//!
//! `animate` turns a property map into a native animation object. The host
//! runs it and reports `Start` and `Completion`; the client mirrors that in an
//! [`AnimationState`] and re-emits it on the target as the local
//! `animationstart` / `animationend` events.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use native_bridge_protocol::{ObjectId, Properties};
use serde_json::{Value, json};

use crate::bridge::WeakBridge;
use crate::codec;
use crate::error::{BridgeError, InvalidValue, UsageError};
use crate::proxy::Proxy;

/// Catalog type of the native animation object.
pub const ANIMATION_TYPE: &str = "Animation";

/// Default animation length in milliseconds.
pub const DEFAULT_DURATION: f64 = 250.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
}

impl Easing {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseIn => "ease-in",
            Self::EaseOut => "ease-out",
            Self::EaseInOut => "ease-in-out",
        }
    }

    /// Control points of the equivalent CSS cubic bezier curve.
    fn control_points(self) -> (f64, f64, f64, f64) {
        match self {
            Self::Linear => (0.0, 0.0, 1.0, 1.0),
            Self::EaseIn => (0.42, 0.0, 1.0, 1.0),
            Self::EaseOut => (0.0, 0.0, 0.58, 1.0),
            Self::EaseInOut => (0.42, 0.0, 0.58, 1.0),
        }
    }

    /// Eased progress for linear progress `t` in `[0, 1]`.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        if self == Self::Linear {
            return t;
        }
        let (x1, y1, x2, y2) = self.control_points();
        let bezier = |p1: f64, p2: f64, s: f64| {
            let inv = 1.0 - s;
            3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
        };
        // x(s) is monotonic for these curves; bisect for the parameter.
        let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
        for _ in 0..40 {
            let mid = (lo + hi) / 2.0;
            if bezier(x1, x2, mid) < t {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        bezier(y1, y2, (lo + hi) / 2.0)
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Easing {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Self::Linear),
            "ease-in" => Ok(Self::EaseIn),
            "ease-out" => Ok(Self::EaseOut),
            "ease-in-out" => Ok(Self::EaseInOut),
            other => Err(InvalidValue::new("easing", Value::String(other.to_string()))),
        }
    }
}

/// Timing options of an animation. Times are in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationOptions {
    pub delay: f64,
    pub duration: f64,
    /// Extra cycles after the first one.
    pub repeat: u32,
    /// Alternate direction every cycle.
    pub reverse: bool,
    pub easing: Easing,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            delay: 0.0,
            duration: DEFAULT_DURATION,
            repeat: 0,
            reverse: false,
            easing: Easing::Linear,
        }
    }
}

fn non_negative(key: &str, value: &Value) -> Result<f64, InvalidValue> {
    value
        .as_f64()
        .filter(|n| n.is_finite() && *n >= 0.0)
        .ok_or_else(|| InvalidValue::new(key, value.clone()))
}

impl AnimationOptions {
    /// Parse options from a JSON map. Missing keys take their defaults; an
    /// unknown key or a value outside its domain is an error.
    pub fn from_properties(options: &Properties) -> Result<Self, InvalidValue> {
        let mut parsed = Self::default();
        for (key, value) in options {
            match key.as_str() {
                "delay" => parsed.delay = non_negative(key, value)?,
                "duration" => parsed.duration = non_negative(key, value)?,
                "repeat" => {
                    parsed.repeat = value
                        .as_u64()
                        .and_then(|n| u32::try_from(n).ok())
                        .ok_or_else(|| InvalidValue::new(key.as_str(), value.clone()))?;
                }
                "reverse" => {
                    parsed.reverse = value
                        .as_bool()
                        .ok_or_else(|| InvalidValue::new(key.as_str(), value.clone()))?;
                }
                "easing" => {
                    parsed.easing = value
                        .as_str()
                        .ok_or_else(|| InvalidValue::new(key.as_str(), value.clone()))?
                        .parse()?;
                }
                _ => return Err(InvalidValue::new(key.as_str(), value.clone())),
            }
        }
        Ok(parsed)
    }

    /// Time from start until the last cycle ends.
    pub fn total_duration(&self) -> f64 {
        self.delay + self.duration * (f64::from(self.repeat) + 1.0)
    }

    /// Eased position in `[0, 1]` at `elapsed` ms after the animation was
    /// started, taking the delay and the direction of the current cycle into
    /// account. `1.0` is the target value, `0.0` the starting value.
    pub fn progress_at(&self, elapsed: f64) -> f64 {
        if elapsed <= self.delay {
            return 0.0;
        }
        if self.duration <= 0.0 || elapsed >= self.total_duration() {
            let backwards = self.reverse && self.repeat % 2 == 1;
            return if backwards { 0.0 } else { 1.0 };
        }
        let running = elapsed - self.delay;
        let cycle = (running / self.duration).floor();
        let local = (running - cycle * self.duration) / self.duration;
        let eased = self.easing.apply(local);
        if self.reverse && cycle % 2.0 == 1.0 {
            1.0 - eased
        } else {
            eased
        }
    }

    fn to_properties(self) -> Properties {
        let mut out = Properties::new();
        out.insert("delay".into(), json!(self.delay));
        out.insert("duration".into(), json!(self.duration));
        out.insert("repeat".into(), json!(self.repeat));
        out.insert("reverse".into(), json!(self.reverse));
        out.insert("easing".into(), json!(self.easing.as_str()));
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    Scheduled,
    Running,
    Completed,
    Cancelled,
}

impl AnimationState {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Handle to a running or scheduled animation.
#[derive(Debug, Clone)]
pub struct Animation {
    proxy: Proxy,
    target: ObjectId,
    options: AnimationOptions,
    state: Rc<Cell<AnimationState>>,
}

fn notify(bridge: &WeakBridge, target: ObjectId, animation: ObjectId, event: &str) {
    if let Some(bridge) = bridge.upgrade() {
        let mut payload = Properties::new();
        payload.insert("animation".into(), Value::String(animation.to_string()));
        bridge.trigger(target, event, payload);
    }
}

impl Animation {
    pub fn id(&self) -> ObjectId {
        self.proxy.id()
    }

    pub fn target(&self) -> ObjectId {
        self.target
    }

    pub fn options(&self) -> AnimationOptions {
        self.options
    }

    pub fn state(&self) -> AnimationState {
        self.state.get()
    }

    /// Stop the animation and dispose the native animation object. Emits
    /// `animationend` on the target unless the animation already finished.
    ///
    /// An animation whose `create` is still queued never reaches the host.
    /// Otherwise `cancel` is sent right away, ahead of the queued `destroy`.
    pub fn cancel(&self) -> Result<(), BridgeError> {
        if self.state.get().is_finished() {
            return Ok(());
        }
        let id = self.proxy.id();
        let bridge = self.proxy.bridge();
        if !bridge.has_pending_create(id) {
            bridge.call_now(id, "cancel", Properties::new())?;
        }
        self.state.set(AnimationState::Cancelled);
        log::debug!("animation {id} cancelled");
        notify(&bridge.downgrade(), self.target, id, "animationend");
        self.proxy.dispose()
    }
}

impl Proxy {
    /// Animate `properties` of this object towards the given values.
    ///
    /// Options and target values are validated up front; a bad value is
    /// returned as an error and nothing is queued.
    pub fn animate(&self, properties: Properties, options: &Properties) -> Result<Animation, BridgeError> {
        if self.is_disposed() {
            return Err(UsageError::Disposed(self.id()).into());
        }
        let options = AnimationOptions::from_properties(options)?;
        let table = codec::lookup(self.type_name());
        let mut targets = Properties::new();
        for (key, value) in &properties {
            let (wire_key, wire_value) = codec::encode(table, key, value)?;
            targets.insert(wire_key, wire_value);
        }

        let mut create = options.to_properties();
        create.insert("target".into(), Value::String(self.id().to_string()));
        create.insert("properties".into(), Value::Object(targets));
        let bridge = self.bridge();
        let proxy = bridge.create_child(self, ANIMATION_TYPE, create)?;
        let state = Rc::new(Cell::new(AnimationState::Scheduled));
        let target = self.id();

        let weak = bridge.downgrade();
        let started = Rc::clone(&state);
        proxy.on("Start", move |event| {
            if started.get() == AnimationState::Scheduled {
                started.set(AnimationState::Running);
                notify(&weak, target, event.target, "animationstart");
            }
        })?;

        let weak = bridge.downgrade();
        let finished = Rc::clone(&state);
        proxy.on("Completion", move |event| {
            if !finished.get().is_finished() {
                finished.set(AnimationState::Completed);
                notify(&weak, target, event.target, "animationend");
            }
            if let Some(bridge) = weak.upgrade()
                && let Err(err) = bridge.dispose(event.target)
            {
                log::warn!("could not dispose animation {}: {err}", event.target);
            }
        })?;

        // Disposing the target takes the animation with it.
        let weak = bridge.downgrade();
        let dropped = Rc::clone(&state);
        proxy.on("dispose", move |event| {
            if !dropped.get().is_finished() {
                dropped.set(AnimationState::Cancelled);
                notify(&weak, target, event.target, "animationend");
            }
        })?;

        proxy.call("start", Properties::new())?;
        log::debug!("animation {} on {target} scheduled", proxy.id());
        Ok(Animation {
            proxy,
            target,
            options,
            state,
        })
    }
}
