//! Signal logging for any node.

use std::{fmt::Debug, rc::Rc};

use tracing::info;

use crate::{
  binding::{Binding, Listener},
  node::NodeRef,
  signal::Channel,
};

/// The sink behind `Observable::log`.
pub fn trace_sink(name: &str, channel: Channel, payload: String) {
  info!(target: "rxflow::log", node = name, channel = channel.label(), "{payload}");
}

/// Subscribes value, error and end listeners on `node` that describe every
/// signal to `sink`. Values and errors are `Debug` formatted; the end has an
/// empty payload.
pub fn attach<T, E, F>(node: &NodeRef<T, E>, name: Rc<str>, sink: F)
where
  T: Debug + Clone + 'static,
  E: Debug + Clone + 'static,
  F: Fn(&str, Channel, String) + 'static,
{
  let sink = Rc::new(sink);
  let (values, value_name) = (sink.clone(), name.clone());
  node.subscribe(Listener::Value(Binding::new(move |v: T| {
    values(&value_name, Channel::Value, format!("{v:?}"))
  })));
  let (errors, error_name) = (sink.clone(), name.clone());
  node.subscribe(Listener::Error(Binding::new(move |e: E| {
    errors(&error_name, Channel::Error, format!("{e:?}"))
  })));
  node.subscribe(Listener::End(Binding::new(move |_: ()| {
    sink(&name, Channel::End, String::new())
  })));
}
