use std::cmp::Ordering;
use std::sync::Arc;

use crate::advice::Advice;

/// Sort key of an advice within one join point: priority ascending, then tag
/// ascending. Advices with equal keys keep their registration order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AdviceOrderKey {
    pub priority: i32,
    pub tag: String,
}

impl AdviceOrderKey {
    pub fn new(priority: i32, tag: impl Into<String>) -> Self {
        Self {
            priority,
            tag: tag.into(),
        }
    }
}

pub fn compare_advices(a: &Advice, b: &Advice) -> Ordering {
    a.order_key().cmp(b.order_key())
}

/// Stable sort into execution order.
pub fn sort_advices(advices: &mut [Arc<Advice>]) {
    advices.sort_by(|a, b| compare_advices(a, b));
}
