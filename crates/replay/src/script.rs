//! Replay scripts: a JSON list of proxy operations run against a bridge
//! whose host is a [`RecordingChannel`].

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow, bail};
use native_bridge_core::{
    Bridge, BridgeConfig, CanvasContext, Diagnostic, FlushReport, ListenerId, Proxy, RecordingChannel,
};
use native_bridge_protocol::{HostEvent, Operation, Properties};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub config: Option<BridgeConfig>,
    pub steps: Vec<Step>,
}

/// One scripted action. Objects are named by `ref`, chosen by the script.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Step {
    Create {
        #[serde(rename = "ref")]
        name: String,
        #[serde(rename = "type")]
        type_name: String,
        #[serde(default)]
        properties: Properties,
        #[serde(default)]
        parent: Option<String>,
    },
    Set {
        #[serde(rename = "ref")]
        name: String,
        properties: Properties,
    },
    Get {
        #[serde(rename = "ref")]
        name: String,
        property: String,
    },
    Call {
        #[serde(rename = "ref")]
        name: String,
        method: String,
        #[serde(default)]
        parameters: Properties,
    },
    Listen {
        #[serde(rename = "ref")]
        name: String,
        event: String,
    },
    Unlisten {
        #[serde(rename = "ref")]
        name: String,
        event: String,
    },
    Dispose {
        #[serde(rename = "ref")]
        name: String,
    },
    /// A notification coming from the host.
    Event {
        #[serde(rename = "ref")]
        name: String,
        event: String,
        #[serde(default)]
        payload: Properties,
    },
    Animate {
        #[serde(rename = "ref")]
        name: String,
        properties: Properties,
        #[serde(default)]
        options: Properties,
    },
    /// Acquire the drawing context of a canvas.
    Context {
        #[serde(rename = "ref")]
        name: String,
        width: f64,
        height: f64,
    },
    /// Canvas calls, each written as `[method, args...]`.
    Draw {
        #[serde(rename = "ref")]
        name: String,
        calls: Vec<Vec<Value>>,
    },
    Flush,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Set { .. } => "set",
            Self::Get { .. } => "get",
            Self::Call { .. } => "call",
            Self::Listen { .. } => "listen",
            Self::Unlisten { .. } => "unlisten",
            Self::Dispose { .. } => "dispose",
            Self::Event { .. } => "event",
            Self::Animate { .. } => "animate",
            Self::Context { .. } => "context",
            Self::Draw { .. } => "draw",
            Self::Flush => "flush",
        }
    }
}

pub struct Replay {
    bridge: Bridge,
    channel: RecordingChannel,
    proxies: HashMap<String, Proxy>,
    contexts: HashMap<String, CanvasContext>,
    listeners: HashMap<(String, String), ListenerId>,
}

impl Replay {
    pub fn new(config: BridgeConfig) -> Self {
        let channel = RecordingChannel::new();
        Self {
            bridge: Bridge::with_config(channel.clone(), config),
            channel,
            proxies: HashMap::new(),
            contexts: HashMap::new(),
            listeners: HashMap::new(),
        }
    }

    fn proxy(&self, name: &str) -> Result<&Proxy> {
        self.proxies
            .get(name)
            .ok_or_else(|| anyhow!("no object named {name:?}"))
    }

    pub fn run(&mut self, step: &Step) -> Result<()> {
        match step {
            Step::Create {
                name,
                type_name,
                properties,
                parent,
            } => {
                let proxy = match parent {
                    Some(parent) => {
                        let parent = self.proxy(parent)?;
                        self.bridge.create_child(parent, type_name, properties.clone())?
                    }
                    None => self.bridge.create(type_name, properties.clone())?,
                };
                log::debug!("{name} is {}", proxy.id());
                self.proxies.insert(name.clone(), proxy);
            }
            Step::Set { name, properties } => self.proxy(name)?.set_all(properties.clone())?,
            Step::Get { name, property } => {
                let value = self.proxy(name)?.get(property)?;
                log::info!("{name}.{property} = {value}");
            }
            Step::Call {
                name,
                method,
                parameters,
            } => self.proxy(name)?.call(method, parameters.clone())?,
            Step::Listen { name, event } => {
                let key = (name.clone(), event.clone());
                if self.listeners.contains_key(&key) {
                    bail!("{name} already listens for {event}");
                }
                let label = format!("{name}.{event}");
                let listener = self.proxy(name)?.on(event, move |e| {
                    log::info!("{label} fired: {}", Value::Object(e.payload.clone()));
                })?;
                self.listeners.insert(key, listener);
            }
            Step::Unlisten { name, event } => {
                let Some(listener) = self.listeners.remove(&(name.clone(), event.clone())) else {
                    bail!("{name} has no listener for {event}");
                };
                self.proxy(name)?.off(event, listener)?;
            }
            Step::Dispose { name } => self.proxy(name)?.dispose()?,
            Step::Event {
                name,
                event,
                payload,
            } => {
                let mut host_event = HostEvent::new(self.proxy(name)?.id(), event.as_str());
                host_event.payload = payload.clone();
                self.bridge.dispatch(host_event);
            }
            Step::Animate {
                name,
                properties,
                options,
            } => {
                let animation = self.proxy(name)?.animate(properties.clone(), options)?;
                log::debug!("{name} animated by {}", animation.id());
            }
            Step::Context {
                name,
                width,
                height,
            } => {
                let context = self.bridge.get_context(self.proxy(name)?, *width, *height)?;
                self.contexts.insert(name.clone(), context);
            }
            Step::Draw { name, calls } => {
                let context = self
                    .contexts
                    .get(name)
                    .ok_or_else(|| anyhow!("{name} has no drawing context"))?;
                for call in calls {
                    draw(context, call)?;
                }
            }
            Step::Flush => {
                let report = self.bridge.flush();
                if !report.is_clean() {
                    log::warn!("{} operations failed", report.failures.len());
                }
            }
        }
        Ok(())
    }

    /// Operations that reached the host since the last call.
    pub fn transmitted(&self) -> Vec<Operation> {
        let calls = self.channel.calls();
        self.channel.reset_calls();
        calls
    }

    /// Flush whatever the script left pending.
    pub fn finish(&self) -> FlushReport {
        self.bridge.flush()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.bridge.diagnostics()
    }
}

fn number(call: &[Value], index: usize) -> Result<f64> {
    call.get(index)
        .and_then(Value::as_f64)
        .with_context(|| format!("argument {index} must be a number"))
}

fn text(call: &[Value], index: usize) -> Result<&str> {
    call.get(index)
        .and_then(Value::as_str)
        .with_context(|| format!("argument {index} must be a string"))
}

fn numbers<const N: usize>(call: &[Value]) -> Result<[f64; N]> {
    let mut out = [0.0; N];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = number(call, i + 1)?;
    }
    Ok(out)
}

/// Apply one `[method, args...]` canvas call.
fn draw(context: &CanvasContext, call: &[Value]) -> Result<()> {
    let method = text(call, 0)?;
    match method {
        "beginPath" => context.begin_path(),
        "closePath" => context.close_path(),
        "fill" => context.fill(),
        "stroke" => context.stroke(),
        "save" => context.save(),
        "restore" => context.restore(),
        "moveTo" => {
            let [x, y] = numbers(call)?;
            context.move_to(x, y);
        }
        "lineTo" => {
            let [x, y] = numbers(call)?;
            context.line_to(x, y);
        }
        "rect" | "fillRect" | "strokeRect" | "clearRect" => {
            let [x, y, w, h] = numbers(call)?;
            match method {
                "rect" => context.rect(x, y, w, h),
                "fillRect" => context.fill_rect(x, y, w, h),
                "strokeRect" => context.stroke_rect(x, y, w, h),
                _ => context.clear_rect(x, y, w, h),
            }
        }
        "arc" => {
            let [x, y, r, start, end] = numbers(call)?;
            let anticlockwise = call.get(6).and_then(Value::as_bool).unwrap_or(false);
            context.arc(x, y, r, start, end, anticlockwise);
        }
        "quadraticCurveTo" => {
            let [cpx, cpy, x, y] = numbers(call)?;
            context.quadratic_curve_to(cpx, cpy, x, y);
        }
        "bezierCurveTo" => {
            let [a, b, c, d, x, y] = numbers(call)?;
            context.bezier_curve_to(a, b, c, d, x, y);
        }
        "translate" => {
            let [x, y] = numbers(call)?;
            context.translate(x, y);
        }
        "scale" => {
            let [x, y] = numbers(call)?;
            context.scale(x, y);
        }
        "rotate" => context.rotate(number(call, 1)?),
        "transform" | "setTransform" => {
            let [a, b, c, d, e, f] = numbers(call)?;
            if method == "transform" {
                context.transform(a, b, c, d, e, f);
            } else {
                context.set_transform(a, b, c, d, e, f);
            }
        }
        "fillText" => context.fill_text(text(call, 1)?, number(call, 2)?, number(call, 3)?),
        "strokeText" => context.stroke_text(text(call, 1)?, number(call, 2)?, number(call, 3)?),
        "lineWidth" => context.set_line_width(number(call, 1)?),
        "globalAlpha" => context.set_global_alpha(number(call, 1)?),
        "lineCap" => context.set_line_cap(text(call, 1)?),
        "lineJoin" => context.set_line_join(text(call, 1)?),
        "textAlign" => context.set_text_align(text(call, 1)?),
        "textBaseline" => context.set_text_baseline(text(call, 1)?),
        "fillStyle" => context.set_fill_style(text(call, 1)?),
        "strokeStyle" => context.set_stroke_style(text(call, 1)?),
        "font" => context.set_font(text(call, 1)?),
        other => bail!("unknown canvas method {other:?}"),
    }
    Ok(())
}
