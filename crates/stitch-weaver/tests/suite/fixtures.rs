//! Shared builders for weaver tests.

use std::sync::Arc;

use parking_lot::Mutex;
use stitch_classfile::{ClassMetadata, MethodMetadata, Modifiers};
use stitch_config::{AdviceConfig, Binding};
use stitch_value::{Thrown, Value};
use stitch_weaver::{Advice, BoundArg, HookImpls};

pub fn interface(name: &str) -> ClassMetadata {
    ClassMetadata::new(name).with_modifiers(Modifiers::PUBLIC | Modifiers::INTERFACE | Modifiers::ABSTRACT)
}

pub fn abstract_method(name: &str, descriptor: &str) -> MethodMetadata {
    MethodMetadata::new(name, descriptor).with_modifiers(Modifiers::PUBLIC | Modifiers::ABSTRACT)
}

pub fn advice_config(name: &str, class_name: &str, method_name: &str) -> AdviceConfig {
    let mut config = AdviceConfig::new(name);
    config.class_name = class_name.to_owned();
    config.method_name = method_name.to_owned();
    config
}

/// Records hook calls as `"<advice>:<hook>"`.
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries.lock().iter().filter(|e| *e == entry).count()
    }
}

/// An advice that declares all four lifecycle hooks and journals each call.
/// Its before-hook returns `traveler` (or nothing).
pub fn journaling_advice(mut config: AdviceConfig, journal: &Journal, traveler: Option<Value>) -> Advice {
    config.hooks.before = Some(vec![]);
    config.hooks.on_return = Some(vec![Binding::Traveler]);
    config.hooks.on_throw = Some(vec![Binding::Throwable]);
    config.hooks.after = Some(vec![Binding::Traveler]);
    let name = config.name.clone();

    let hooks = HookImpls::new()
        .before({
            let (journal, name) = (journal.clone(), name.clone());
            move |_: &[BoundArg]| {
                journal.push(format!("{name}:before"));
                Ok(traveler.clone())
            }
        })
        .on_return({
            let (journal, name) = (journal.clone(), name.clone());
            move |_: &[BoundArg]| {
                journal.push(format!("{name}:on_return"));
                Ok(None)
            }
        })
        .on_throw({
            let (journal, name) = (journal.clone(), name.clone());
            move |_: &[BoundArg]| {
                journal.push(format!("{name}:on_throw"));
                Ok(None)
            }
        })
        .after({
            let (journal, name) = (journal.clone(), name.clone());
            move |args: &[BoundArg]| {
                let traveler = args.first().and_then(BoundArg::as_value).cloned().unwrap_or_default();
                journal.push(format!("{name}:after({traveler})"));
                Ok(None)
            }
        });
    Advice::new(config, &hooks).expect("valid advice")
}

pub fn failing(type_name: &str, message: &str) -> Thrown {
    Thrown::new(type_name, message)
}
